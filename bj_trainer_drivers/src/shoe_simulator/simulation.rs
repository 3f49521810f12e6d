use bj_trainer::simulation::{
    DecisionFeedback, RoundEvent, RoundSummary, ShoeSummary, TableEvent, TrainerEventHandler,
};
use bj_trainer::Action;
use serde::Serialize;

use self::private::Statistics;

mod private {
    use serde::Serialize;

    /// Tallies across every shoe of a run.
    #[derive(Debug, Clone, Copy, Default, Serialize)]
    pub struct Statistics {
        rounds: u32,
        hands: u32,
        net_units: f64,
        best_round: f64,
        worst_round: f64,
        naturals: u32,
        doubles: u32,
        splits: u32,
        surrenders: u32,
        dealer_busts: u32,
    }

    impl Statistics {
        pub fn receive_round(&mut self, win_amount: f64, hands: usize, dealer_total: u8) {
            self.rounds += 1;
            self.hands += hands as u32;
            self.net_units += win_amount;
            self.best_round = self.best_round.max(win_amount);
            self.worst_round = self.worst_round.min(win_amount);
            if dealer_total > 21 {
                self.dealer_busts += 1;
            }
        }

        pub fn count_natural(&mut self) {
            self.naturals += 1;
        }

        pub fn count_double(&mut self) {
            self.doubles += 1;
        }

        pub fn count_split(&mut self) {
            self.splits += 1;
        }

        pub fn count_surrender(&mut self) {
            self.surrenders += 1;
        }

        pub fn get_rounds(&self) -> u32 {
            self.rounds
        }

        /// Net units per round at one unit a hand.
        pub fn get_rate(&self) -> f64 {
            if self.rounds == 0 {
                0.0
            } else {
                self.net_units / self.rounds as f64
            }
        }
    }
}

/// Prints rounds as they settle and keeps run-wide statistics.
pub struct ShoeReporter {
    verbose: bool,
    stat: Statistics,
    decisions: Vec<String>,
    shoes: Vec<ShoeSummary>,
}

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub rounds: u32,
    pub units_per_round: f64,
    pub statistics: &'a Statistics,
    pub shoes: &'a [ShoeSummary],
}

impl ShoeReporter {
    pub fn new(verbose: bool) -> Self {
        ShoeReporter {
            verbose,
            stat: Statistics::default(),
            decisions: Vec::new(),
            shoes: Vec::new(),
        }
    }

    /// Feeds a round that was dealt outside `run_shoe_with_handler`, such as
    /// the opening round of a shoe.
    pub fn replay(&mut self, event: &RoundEvent) {
        for table_event in &event.events {
            self.on_table_event(table_event);
        }
        if let Some(feedback) = &event.decision {
            self.on_make_decision(feedback);
        }
        if let Some(summary) = &event.round {
            self.on_round_settled(summary);
        }
    }

    pub fn report(&self) -> RunReport<'_> {
        RunReport {
            rounds: self.stat.get_rounds(),
            units_per_round: self.stat.get_rate(),
            statistics: &self.stat,
            shoes: &self.shoes,
        }
    }
}

impl TrainerEventHandler for ShoeReporter {
    fn on_table_event(&mut self, event: &TableEvent) {
        if let TableEvent::HandSplit { index } = event {
            self.decisions.push(format!("split hand {}", index));
        }
    }

    fn on_make_decision(&mut self, feedback: &DecisionFeedback) {
        match feedback.chosen {
            Action::Double => self.stat.count_double(),
            Action::Split => self.stat.count_split(),
            Action::Surrender => self.stat.count_surrender(),
            Action::Hit | Action::Stand => {}
        }
        self.decisions
            .push(format!("hand {}: {}", feedback.hand_index, feedback.chosen));
    }

    fn on_round_settled(&mut self, summary: &RoundSummary) {
        let natural = summary.hands.len() == 1
            && summary.hands[0].cards.len() == 2
            && summary.hands[0].total == 21
            && self.decisions.is_empty();
        if natural {
            self.stat.count_natural();
        }
        self.stat.receive_round(
            summary.win_amount,
            summary.hands.len(),
            summary.dealer_total,
        );

        if self.verbose {
            println!("Round #{}", summary.round_number);
            for decision in &self.decisions {
                println!("  {}", decision);
            }
            print!("  Dealer:");
            for card in &summary.dealer_cards {
                print!(" {}", card);
            }
            println!(" ({})", summary.dealer_total);
            for hand in &summary.hands {
                print!("  Hand {}:", hand.index);
                for card in &hand.cards {
                    print!(" {}", card);
                }
                println!(" ({}) {} {:+}", hand.total, hand.outcome, hand.win_amount);
            }
            println!();
        }
        self.decisions.clear();
    }

    fn on_shoe_depleted(&mut self, summary: &ShoeSummary) {
        log::info!(
            "shoe #{} done: {} rounds, running count {}",
            summary.shoe_number,
            summary.rounds_played,
            summary.running_count
        );
        self.shoes.push(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bj_trainer::{RuleConfig, Trainer};

    #[test]
    fn reporter_counts_every_round_of_a_shoe() {
        let mut trainer = Trainer::with_seed(3);
        trainer.configure(RuleConfig::default()).unwrap();
        let mut reporter = ShoeReporter::new(false);

        let handle = trainer.start_shoe().unwrap();
        reporter.replay(&handle.opening);
        let summary = trainer.run_shoe_with_handler(&mut reporter).unwrap();

        let report = reporter.report();
        assert_eq!(report.rounds, summary.rounds_played);
        assert_eq!(report.shoes.len(), 1);
        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("units_per_round"));
    }
}
