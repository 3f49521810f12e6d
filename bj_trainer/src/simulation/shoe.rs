use rand::seq::SliceRandom;
use rand::Rng;
use strum::IntoEnumIterator;

use crate::{Card, Rank, Suit, TrainerError};

/// No round starts once fewer cards than this remain.
pub const RESHUFFLE_THRESHOLD: usize = 16;

/// Represents a shoe in the real world. Cards are drawn from the end of
/// `cards`.
#[derive(Debug, Clone)]
pub struct Shoe {
    number_of_decks: u8,
    cards: Vec<Card>,
}

impl Shoe {
    /// Creates a new shoe with ordered cards.
    pub fn new(number_of_decks: u8) -> Shoe {
        Shoe {
            number_of_decks,
            cards: ordered_cards(number_of_decks),
        }
    }

    /// Gathers every card back and shuffles the full shoe.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards = ordered_cards(self.number_of_decks);
        self.cards.shuffle(rng);
    }

    /// Shuffles the full shoe so that the given ranks are drawn first, in
    /// order. Face cards must be asked for by their own rank; `Ten` means a
    /// ten-valued card. Fails if the shoe does not hold enough of a rank.
    pub fn shuffle_with_firsts<R: Rng + ?Sized>(
        &mut self,
        firsts: &[Rank],
        rng: &mut R,
    ) -> Result<(), TrainerError> {
        let mut rest = ordered_cards(self.number_of_decks);
        rest.shuffle(rng);

        let mut stacked = Vec::with_capacity(firsts.len());
        for &rank in firsts {
            let index = find_suitable_card(&rest, rank).ok_or_else(|| {
                TrainerError::InvalidStack(format!(
                    "a {}-deck shoe does not have enough {:?} cards",
                    self.number_of_decks, rank
                ))
            })?;
            stacked.push(rest.swap_remove(index));
        }

        stacked.reverse();
        rest.extend(stacked);
        self.cards = rest;
        Ok(())
    }

    /// Deals a card if the shoe is not empty. Returns None if empty.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_depleted(&self) -> bool {
        self.cards.len() < RESHUFFLE_THRESHOLD
    }

    pub fn number_of_decks(&self) -> u8 {
        self.number_of_decks
    }

    pub fn capacity(&self) -> usize {
        self.number_of_decks as usize * 52
    }

    /// Cards still to be dealt, next card last.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

fn ordered_cards(number_of_decks: u8) -> Vec<Card> {
    let mut cards = Vec::with_capacity(number_of_decks as usize * 52);
    for _ in 0..number_of_decks {
        for suit in Suit::iter() {
            for rank in Rank::iter() {
                cards.push(Card { rank, suit });
            }
        }
    }
    cards
}

fn find_suitable_card(cards: &[Card], rank: Rank) -> Option<usize> {
    cards.iter().position(|card| {
        if rank == Rank::Ten {
            card.rank_value() == 10
        } else {
            card.rank == rank
        }
    })
}
