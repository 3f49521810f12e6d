use serde::Serialize;

use crate::{
    hand::{Hand, PlayerHand},
    Card, RuleConfig,
};

/// Payout for a player natural that the dealer does not match.
pub const BLACKJACK_PAYOUT: f64 = 1.5;
pub const SURRENDER_LOSS: f64 = -0.5;

/// The cards on the table for one round.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Round {
    pub dealer: Hand,
    /// Left to right. Splits replace a hand in place with its two children.
    pub player_hands: Vec<PlayerHand>,
    /// Index of the hand being played.
    pub active: usize,
}

impl Round {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn dealer_up(&self) -> Option<Card> {
        self.dealer.cards().first().copied()
    }

    pub fn hole_card(&self) -> Option<Card> {
        self.dealer.cards().get(1).copied()
    }

    pub fn active_hand(&self) -> Option<&PlayerHand> {
        self.player_hands.get(self.active)
    }

    pub fn active_hand_mut(&mut self) -> Option<&mut PlayerHand> {
        self.player_hands.get_mut(self.active)
    }

    pub fn player_turn_over(&self) -> bool {
        self.active >= self.player_hands.len()
    }

    /// The dealer has nothing to beat.
    pub fn all_hands_dead(&self) -> bool {
        self.player_hands
            .iter()
            .all(|hand| hand.surrendered || hand.is_bust())
    }

    pub fn win_amount(&self) -> f64 {
        self.player_hands.iter().map(|hand| hand.win_amount).sum()
    }
}

/// Whether the dealer takes another card.
pub fn dealer_must_hit(dealer: &Hand, rules: &RuleConfig) -> bool {
    let total = dealer.total();
    total.total < 17 || (total.total == 17 && total.soft && rules.dealer_hits_soft_17())
}

/// Result of a round where someone was dealt a natural, or `None` when
/// neither side was.
pub fn natural_result(player_natural: bool, dealer_natural: bool) -> Option<f64> {
    match (player_natural, dealer_natural) {
        (true, false) => Some(BLACKJACK_PAYOUT),
        (true, true) => Some(0.0),
        (false, true) => Some(-1.0),
        (false, false) => None,
    }
}

/// Net units won by a finished hand against the dealer's final hand.
pub fn settle_hand(hand: &PlayerHand, dealer: &Hand) -> f64 {
    if hand.surrendered {
        return SURRENDER_LOSS;
    }
    let stake = if hand.doubled { 2.0 } else { 1.0 };
    let player = hand.total();
    if player.bust() {
        return -stake;
    }
    let dealer = dealer.total();
    if dealer.bust() || player.total > dealer.total {
        stake
    } else if player.total < dealer.total {
        -stake
    } else {
        0.0
    }
}
