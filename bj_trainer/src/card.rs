use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::TrainerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum Suit {
    Spade,
    Club,
    Heart,
    Diamond,
}

impl Suit {
    pub fn symbol(self) -> char {
        match self {
            Suit::Spade => '♠',
            Suit::Club => '♣',
            Suit::Heart => '♥',
            Suit::Diamond => '♦',
        }
    }

    fn from_char(c: char) -> Option<Suit> {
        match c {
            '♠' | 'S' | 's' => Some(Suit::Spade),
            '♣' | 'C' | 'c' => Some(Suit::Club),
            '♥' | 'H' | 'h' => Some(Suit::Heart),
            '♦' | 'D' | 'd' => Some(Suit::Diamond),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Blackjack value with the Ace counted high.
    pub fn value(self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
        }
    }

    /// Hi-Lo tag.
    pub fn count_tag(self) -> i8 {
        match self.value() {
            2..=6 => 1,
            7..=9 => 0,
            _ => -1,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    /// Face cards collapse onto `Ten`, the way strategy charts label them.
    pub fn chart_rank(self) -> Rank {
        match self {
            Rank::Jack | Rank::Queen | Rank::King => Rank::Ten,
            other => other,
        }
    }

    fn from_symbol(s: &str) -> Option<Rank> {
        if s == "10" {
            return Some(Rank::Ten);
        }
        let mut chars = s.chars();
        let c = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() {
            return None;
        }
        Rank::iter().find(|rank| rank.symbol() == c)
    }
}

/// Represents a card in the real world with a rank and a suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }

    pub fn rank_value(&self) -> u8 {
        self.rank.value()
    }

    pub fn count_tag(&self) -> i8 {
        self.rank.count_tag()
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

/// Accepts `"A♠"`, `"AS"`, `"th"`, `"10♦"`.
impl FromStr for Card {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || TrainerError::InvalidCard(s.to_string());
        let suit_char = s.chars().last().ok_or_else(invalid)?;
        let suit = Suit::from_char(suit_char).ok_or_else(invalid)?;
        let rank_part = &s[..s.len() - suit_char.len_utf8()];
        let rank = Rank::from_symbol(rank_part).ok_or_else(invalid)?;
        Ok(Card { rank, suit })
    }
}

/// Parses a whitespace or comma separated list of cards.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, TrainerError> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}
