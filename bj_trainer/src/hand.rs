use serde::Serialize;
use strum_macros::Display;

use crate::{Action, Card};

/// Blackjack total of a set of cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandTotal {
    pub total: u8,
    /// An Ace is still counted as 11.
    pub soft: bool,
}

impl HandTotal {
    pub fn bust(&self) -> bool {
        self.total > 21
    }
}

/// Sums the cards, counting Aces as 1 whenever 11 would bust.
pub fn hand_total(cards: &[Card]) -> HandTotal {
    let mut total: u16 = 0;
    let mut high_aces = 0;
    for card in cards {
        total += card.rank_value() as u16;
        if card.is_ace() {
            high_aces += 1;
        }
    }
    while total > 21 && high_aces > 0 {
        total -= 10;
        high_aces -= 1;
    }
    HandTotal {
        total: total.min(u8::MAX as u16) as u8,
        soft: high_aces > 0,
    }
}

/// Exactly two cards of equal blackjack value. `K,Q` is a pair of tens.
pub fn is_pair(cards: &[Card]) -> bool {
    cards.len() == 2 && cards[0].rank_value() == cards[1].rank_value()
}

/// An ordered set of cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Hand {
            cards: Vec::with_capacity(4),
        }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        Hand { cards }
    }

    pub fn receive_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn total(&self) -> HandTotal {
        hand_total(&self.cards)
    }

    pub fn is_pair(&self) -> bool {
        is_pair(&self.cards)
    }

    /// Two cards totalling 21. Callers rule out split hands.
    pub fn is_natural(&self) -> bool {
        self.cards.len() == 2 && self.total().total == 21
    }
}

/// Identifies a player hand within a shoe. Split children get fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HandId(pub u32);

impl std::fmt::Display for HandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum Outcome {
    #[strum(serialize = "WIN")]
    #[serde(rename = "WIN")]
    Win,
    #[strum(serialize = "LOSS")]
    #[serde(rename = "LOSS")]
    Loss,
    #[strum(serialize = "PUSH")]
    #[serde(rename = "PUSH")]
    Push,
}

impl Outcome {
    /// Derived from the hand's net result in units.
    pub fn from_win_amount(win_amount: f64) -> Outcome {
        if win_amount > 0.0 {
            Outcome::Win
        } else if win_amount < 0.0 {
            Outcome::Loss
        } else {
            Outcome::Push
        }
    }
}

/// What the player chose and what the oracle wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub chosen: Action,
    pub correct: Action,
}

impl ActionRecord {
    pub fn is_correct(&self) -> bool {
        self.chosen == self.correct
    }
}

/// One of the player's hands in a round, with the state settlement needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerHand {
    pub id: HandId,
    /// Split ancestry, oldest first. Empty for a dealt hand.
    pub lineage: Vec<HandId>,
    pub hand: Hand,
    pub doubled: bool,
    pub surrendered: bool,
    /// Split from a pair of Aces; receives one card and stands.
    pub split_ace: bool,
    pub first_decision: Option<ActionRecord>,
    pub result: Option<Outcome>,
    pub win_amount: f64,
    pub final_total: Option<u8>,
}

impl PlayerHand {
    pub fn new(id: HandId) -> Self {
        PlayerHand {
            id,
            lineage: Vec::new(),
            hand: Hand::new(),
            doubled: false,
            surrendered: false,
            split_ace: false,
            first_decision: None,
            result: None,
            win_amount: 0.0,
            final_total: None,
        }
    }

    /// A child created by splitting `parent`, holding `card` plus whatever
    /// it is dealt next.
    pub fn from_split(id: HandId, parent: &PlayerHand, card: Card) -> Self {
        let mut lineage = parent.lineage.clone();
        lineage.push(parent.id);
        PlayerHand {
            id,
            lineage,
            hand: Hand::with_cards(vec![card]),
            split_ace: card.is_ace(),
            ..PlayerHand::new(id)
        }
    }

    /// The hand this one was split from, if any.
    pub fn origin(&self) -> Option<HandId> {
        self.lineage.last().copied()
    }

    pub fn is_from_split(&self) -> bool {
        !self.lineage.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        self.hand.cards()
    }

    pub fn total(&self) -> HandTotal {
        self.hand.total()
    }

    pub fn is_bust(&self) -> bool {
        self.total().bust()
    }

    pub fn is_blackjack(&self) -> bool {
        !self.is_from_split() && self.hand.is_natural()
    }

    /// Ids whose mistakes this hand's outcome should be attached to.
    pub fn attribution(&self) -> impl Iterator<Item = HandId> + '_ {
        self.lineage.iter().copied().chain(std::iter::once(self.id))
    }

    pub fn settle(&mut self, win_amount: f64) {
        self.win_amount = win_amount;
        self.result = Some(Outcome::from_win_amount(win_amount));
        self.final_total = Some(self.total().total);
    }
}
