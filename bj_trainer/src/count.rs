use serde::Serialize;

use crate::Card;

/// Smallest number of decks the true count divides by, so the count stays
/// bounded near the end of a shoe.
const MIN_DECKS_REMAINING: f64 = 0.25;

/// Hi-Lo running count for the current shoe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountState {
    running: i32,
}

impl CountState {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn observe(&mut self, card: Card) {
        self.running += card.count_tag() as i32;
    }

    pub fn reset(&mut self) {
        self.running = 0;
    }

    pub fn running(&self) -> i32 {
        self.running
    }

    /// Running count per remaining deck.
    pub fn true_count(&self, remaining_cards: usize) -> f64 {
        let decks = (remaining_cards as f64 / 52.0).max(MIN_DECKS_REMAINING);
        self.running as f64 / decks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rank, Suit};

    #[test]
    fn running_count_follows_hi_lo() {
        let mut count = CountState::new();
        for rank in [Rank::Two, Rank::Six, Rank::Eight, Rank::King, Rank::Five] {
            count.observe(Card::new(rank, Suit::Heart));
        }
        assert_eq!(count.running(), 2);
        count.reset();
        assert_eq!(count.running(), 0);
    }

    #[test]
    fn true_count_divides_by_remaining_decks() {
        let mut count = CountState::new();
        for _ in 0..8 {
            count.observe(Card::new(Rank::Three, Suit::Club));
        }
        assert_eq!(count.true_count(104), 4.0);
        // Floors at a quarter deck.
        assert_eq!(count.true_count(0), 32.0);
        assert_eq!(count.true_count(5), 32.0);
    }
}
