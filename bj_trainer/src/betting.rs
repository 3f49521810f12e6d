use serde::Serialize;

use crate::RuleConfig;

/// Sequence used by the built-in progression.
pub const ONE_THREE_TWO_SIX: [u32; 4] = [1, 3, 2, 6];

/// How a strategy sizes its next bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum BetSizing {
    Flat,
    /// Bet ramps with the true count.
    Adaptive,
    Progression { sequence: Vec<u32>, position: usize },
    Martingale,
    DAlembert,
}

/// A betting system simulated alongside play. Every strategy wagers on the
/// same hands; only the bet size differs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BettingStrategy {
    pub name: String,
    pub sizing: BetSizing,
    /// Net result in units since the shoe started.
    pub bankroll: f64,
    pub high: f64,
    pub low: f64,
    pub current_bet: u32,
}

fn cap(bet: u32, max_bet: Option<u32>) -> u32 {
    max_bet.map_or(bet, |max| bet.min(max))
}

/// Bet size for a true count: 1 unit below +2, then one unit per point up to 5.
pub fn adaptive_bet(true_count: f64) -> u32 {
    if true_count >= 5.0 {
        5
    } else if true_count >= 4.0 {
        4
    } else if true_count >= 3.0 {
        3
    } else if true_count >= 2.0 {
        2
    } else {
        1
    }
}

impl BettingStrategy {
    fn with_sizing(name: impl Into<String>, sizing: BetSizing) -> Self {
        BettingStrategy {
            name: name.into(),
            sizing,
            bankroll: 0.0,
            high: 0.0,
            low: 0.0,
            current_bet: 1,
        }
    }

    pub fn flat() -> Self {
        Self::with_sizing("Flat Bet (1 Unit)", BetSizing::Flat)
    }

    pub fn adaptive() -> Self {
        Self::with_sizing("Adaptive (True Count)", BetSizing::Adaptive)
    }

    pub fn one_three_two_six() -> Self {
        Self::with_sizing(
            "1-3-2-6 Progressive",
            BetSizing::Progression {
                sequence: ONE_THREE_TWO_SIX.to_vec(),
                position: 0,
            },
        )
    }

    pub fn martingale() -> Self {
        Self::with_sizing("Martingale (Double on Loss)", BetSizing::Martingale)
    }

    pub fn dalembert() -> Self {
        Self::with_sizing("D'Alembert", BetSizing::DAlembert)
    }

    /// Named after its steps, e.g. `"1-2-4 Progressive"`. Returns `None` for
    /// an empty sequence.
    pub fn custom_progression(sequence: &[u32]) -> Option<Self> {
        if sequence.is_empty() {
            return None;
        }
        let name = sequence
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("-");
        Some(Self::with_sizing(
            format!("{} Progressive", name),
            BetSizing::Progression {
                sequence: sequence.to_vec(),
                position: 0,
            },
        ))
    }

    /// Sets the bet for the coming round. Only the count-driven and
    /// progression strategies change here; the rest react to results.
    pub fn prepare_bet(&mut self, true_count: f64, max_bet: Option<u32>) {
        match &self.sizing {
            BetSizing::Flat => self.current_bet = 1,
            BetSizing::Adaptive => self.current_bet = cap(adaptive_bet(true_count), max_bet),
            BetSizing::Progression { sequence, position } => {
                self.current_bet = cap(sequence[*position], max_bet)
            }
            BetSizing::Martingale | BetSizing::DAlembert => {}
        }
    }

    /// Books a round's net result, `win_amount` units per unit bet.
    pub fn record_result(&mut self, win_amount: f64, max_bet: Option<u32>) {
        self.bankroll += win_amount * self.current_bet as f64;
        self.high = self.high.max(self.bankroll);
        self.low = self.low.min(self.bankroll);

        let won = win_amount > 0.0;
        let lost = win_amount < 0.0;
        match &mut self.sizing {
            BetSizing::Flat | BetSizing::Adaptive => {}
            BetSizing::Progression { sequence, position } => {
                if won {
                    *position = (*position + 1) % sequence.len();
                } else if lost {
                    *position = 0;
                }
            }
            BetSizing::Martingale => {
                if lost {
                    self.current_bet = cap(self.current_bet.saturating_mul(2), max_bet);
                } else if won {
                    self.current_bet = 1;
                }
            }
            BetSizing::DAlembert => {
                if lost {
                    self.current_bet = cap(self.current_bet.saturating_add(1), max_bet);
                } else if won {
                    self.current_bet = self.current_bet.saturating_sub(1).max(1);
                }
            }
        }
    }
}

/// Every strategy the rules enable, in display order.
pub fn strategies_for(rules: &RuleConfig) -> Vec<BettingStrategy> {
    let mut strategies = vec![
        BettingStrategy::flat(),
        BettingStrategy::adaptive(),
        BettingStrategy::one_three_two_six(),
        BettingStrategy::martingale(),
        BettingStrategy::dalembert(),
    ];
    strategies.extend(BettingStrategy::custom_progression(&rules.custom_progression));
    strategies
}

pub fn prepare_bets(strategies: &mut [BettingStrategy], true_count: f64, max_bet: Option<u32>) {
    for strategy in strategies {
        strategy.prepare_bet(true_count, max_bet);
    }
}

pub fn apply_round_result(strategies: &mut [BettingStrategy], win_amount: f64, max_bet: Option<u32>) {
    for strategy in strategies {
        strategy.record_result(win_amount, max_bet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn martingale_doubles_on_loss_and_resets_on_win() {
        let mut strategy = BettingStrategy::martingale();
        strategy.record_result(-1.0, None);
        assert_eq!(strategy.current_bet, 2);
        assert_eq!(strategy.bankroll, -1.0);
        strategy.record_result(0.0, None);
        assert_eq!(strategy.current_bet, 2);
        strategy.record_result(1.0, None);
        assert_eq!(strategy.current_bet, 1);
        assert_eq!(strategy.bankroll, 1.0);
        assert_eq!(strategy.high, 1.0);
        assert_eq!(strategy.low, -1.0);
    }

    #[test]
    fn martingale_respects_max_bet() {
        let mut strategy = BettingStrategy::martingale();
        for _ in 0..5 {
            strategy.record_result(-1.0, Some(10));
        }
        assert_eq!(strategy.current_bet, 10);
    }

    #[test]
    fn dalembert_steps_by_one_with_floor() {
        let mut strategy = BettingStrategy::dalembert();
        strategy.record_result(-1.0, None);
        strategy.record_result(-2.0, None);
        assert_eq!(strategy.current_bet, 3);
        assert_eq!(strategy.bankroll, -5.0);
        strategy.record_result(1.5, None);
        assert_eq!(strategy.current_bet, 2);
        strategy.record_result(1.0, None);
        strategy.record_result(1.0, None);
        assert_eq!(strategy.current_bet, 1);
    }

    #[test]
    fn progression_advances_on_win_and_resets_on_loss() {
        let mut strategy = BettingStrategy::one_three_two_six();
        let mut bets = Vec::new();
        for result in [1.0, 1.0, 0.0, 1.0, 1.0, -1.0] {
            strategy.prepare_bet(0.0, None);
            bets.push(strategy.current_bet);
            strategy.record_result(result, None);
        }
        strategy.prepare_bet(0.0, None);
        bets.push(strategy.current_bet);
        assert_eq!(bets, vec![1, 3, 2, 2, 6, 1, 1]);
        assert_eq!(strategy.bankroll, 1.0 + 3.0 + 0.0 + 2.0 + 6.0 - 1.0);
    }

    #[test]
    fn adaptive_follows_true_count() {
        assert_eq!(adaptive_bet(-3.0), 1);
        assert_eq!(adaptive_bet(1.99), 1);
        assert_eq!(adaptive_bet(2.0), 2);
        assert_eq!(adaptive_bet(4.5), 4);
        assert_eq!(adaptive_bet(9.0), 5);

        let mut strategy = BettingStrategy::adaptive();
        strategy.prepare_bet(6.0, Some(3));
        assert_eq!(strategy.current_bet, 3);
    }

    #[test]
    fn custom_progression_is_added_when_configured() {
        let rules = RuleConfig::default();
        assert_eq!(strategies_for(&rules).len(), 5);

        let rules = RuleConfig {
            custom_progression: vec![1, 2, 4],
            ..Default::default()
        };
        let strategies = strategies_for(&rules);
        assert_eq!(strategies.len(), 6);
        assert_eq!(strategies[5].name, "1-2-4 Progressive");
        assert!(BettingStrategy::custom_progression(&[]).is_none());
    }

    #[test]
    fn every_strategy_books_the_same_round() {
        let mut strategies = strategies_for(&RuleConfig::default());
        prepare_bets(&mut strategies, 0.0, None);
        apply_round_result(&mut strategies, -0.5, None);
        assert!(strategies.iter().all(|s| s.bankroll == -0.5));
    }
}
