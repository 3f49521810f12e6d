use serde::Serialize;
use strum_macros::Display;

use crate::{
    hand::{hand_total, is_pair, HandId, Outcome},
    Action, Card, Rank,
};

/// A decision that disagreed with the oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MistakeRecord {
    pub hand_id: HandId,
    /// The player's cards when the decision was made.
    pub player_cards: Vec<Card>,
    pub dealer_up: Card,
    pub chosen: Action,
    pub correct: Action,
    /// Results of every hand that grew out of this decision. Empty until the
    /// round settles.
    pub results: Vec<Outcome>,
}

impl MistakeRecord {
    pub fn verdict(&self) -> Verdict {
        if self.results.contains(&Outcome::Win) {
            Verdict::Lucky
        } else if self.results.contains(&Outcome::Loss) {
            Verdict::Costly
        } else {
            Verdict::Neutral
        }
    }

    pub fn explanation(&self) -> String {
        explain(self)
    }
}

/// How a mistake turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Verdict {
    #[strum(serialize = "you got lucky")]
    Lucky,
    #[strum(serialize = "the wrong move cost you")]
    Costly,
    #[strum(serialize = "it made no difference")]
    Neutral,
}

/// Mistakes made during the current shoe, in the order they happened.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MistakeLog {
    records: Vec<MistakeRecord>,
}

impl MistakeLog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record(&mut self, record: MistakeRecord) {
        self.records.push(record);
    }

    /// Attaches a settled outcome to every record made on one of `hands`.
    pub fn annotate<I>(&mut self, hands: I, outcome: Outcome)
    where
        I: IntoIterator<Item = HandId>,
    {
        for id in hands {
            for record in self.records.iter_mut().filter(|r| r.hand_id == id) {
                record.results.push(outcome);
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&MistakeRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MistakeRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a MistakeLog {
    type Item = &'a MistakeRecord;
    type IntoIter = std::slice::Iter<'a, MistakeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A short reason for the correct play.
pub fn explain(record: &MistakeRecord) -> String {
    let cards = &record.player_cards;
    let total = hand_total(cards);
    let player = total.total;
    let dealer = record.dealer_up.rank_value();

    if is_pair(cards) {
        match cards[0].rank.chart_rank() {
            Rank::Ace | Rank::Eight => {
                return String::from(
                    "Always split Aces and 8s. Two 8s make 16, the weakest total there is, \
                     while each 8 alone is a fair start. Two Aces become two hands that \
                     each start from 11.",
                )
            }
            Rank::Ten | Rank::Five => {
                return String::from(
                    "Never split 10s or 5s. Twenty already wins most of the time, and a \
                     total of 10 is a doubling hand, not two weak ones.",
                )
            }
            _ => {}
        }
    }

    match record.correct {
        Action::Stand if player >= 17 && !total.soft => {
            return format!(
                "Hard {} is strong enough. Hitting risks a bust for little gain, so stand \
                 and make the dealer beat it.",
                player
            )
        }
        Action::Stand if (13..=16).contains(&player) && (2..=6).contains(&dealer) => {
            return format!(
                "{} is a stiff hand that one card can bust. The dealer shows {}, a bust \
                 card, so stand and let the dealer take the risk.",
                player, dealer
            )
        }
        Action::Hit if player <= 11 => {
            return format!(
                "No card can bust a total of {}. Hitting can only help.",
                player
            )
        }
        Action::Hit if (12..=16).contains(&player) && dealer >= 7 => {
            return format!(
                "{} loses to the hands a dealer {} usually makes. You have to hit to get \
                 a total that can win.",
                player, dealer
            )
        }
        Action::Double if player == 11 => {
            return String::from(
                "Eleven is the best total to draw to. Double down to get more money out \
                 on a hand that wins most of the time.",
            )
        }
        Action::Double if player == 10 && dealer <= 9 => {
            return String::from(
                "Ten is a strong total against anything below a ten. Doubling makes the \
                 most of the edge.",
            )
        }
        Action::Double if total.soft => {
            return format!(
                "A soft {} cannot bust on one card. A low card leaves a good total and a \
                 high one turns the Ace into 1, so the double is cheap to take.",
                player
            )
        }
        Action::Split => {
            return String::from(
                "Splitting this pair returns more over time than playing it as one hand.",
            )
        }
        Action::Surrender => {
            return format!(
                "{} against a dealer {} loses far more often than it wins. Surrendering \
                 keeps half the bet.",
                player, dealer
            )
        }
        _ => {}
    }

    String::from("This is the play that loses the least over millions of simulated hands.")
}
