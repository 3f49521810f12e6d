use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use bj_trainer::simulation::{RoundEvent, RoundSummary, TrainerSnapshot};
use bj_trainer::review::MistakeRecord;
use bj_trainer::strategy::strategy_chart;
use bj_trainer::{Action, Card, GamePhase, Trainer, TrainerError};

const HELP: &str = "\
Actions: h = hit, s = stand, d = double, p = split, r = surrender
Other:   deal, hint, count, bets, chart, review [N], sim, shuffle, help, quit";

/// A terminal session around one `Trainer`.
pub struct Session<R, W> {
    trainer: Trainer,
    input: R,
    output: W,
    reveal_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play(Action),
    Deal,
    Hint,
    Count,
    Bets,
    Chart,
    /// One mistake by its 1-based number, or all of them.
    Review(Option<usize>),
    Simulate,
    Shuffle,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let word = line.trim().to_ascii_lowercase();
    if let Some(number) = word.strip_prefix("review ") {
        let number: usize = number.trim().parse().ok()?;
        return (number > 0).then_some(Command::Review(Some(number)));
    }
    let command = match word.as_str() {
        "" | "deal" | "n" | "next" => Command::Deal,
        "hint" | "?" => Command::Hint,
        "count" | "c" => Command::Count,
        "bets" | "b" => Command::Bets,
        "chart" => Command::Chart,
        "review" => Command::Review(None),
        "sim" => Command::Simulate,
        "shuffle" => Command::Shuffle,
        "help" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Play(other.parse().ok()?),
    };
    Some(command)
}

fn cards_text(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(trainer: Trainer, input: R, output: W, reveal_delay: Duration) -> Self {
        Session {
            trainer,
            input,
            output,
            reveal_delay,
        }
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    /// Starts the first shoe and reads commands until `quit` or end of input.
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let handle = self.trainer.start_shoe()?;
        writeln!(
            self.output,
            "Shoe #{}: {} cards. Type `help` for commands.",
            handle.shoe_number, handle.cards_in_shoe
        )?;
        self.show_round_event(&handle.opening)?;

        let mut line = String::new();
        loop {
            self.prompt()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let Some(command) = parse_command(&line) else {
                writeln!(self.output, "Unknown command. {}", HELP)?;
                continue;
            };
            if command == Command::Quit {
                break;
            }
            match self.execute(command) {
                Ok(()) => {}
                Err(TrainerError::IllegalAction { action, reason }) => {
                    writeln!(self.output, "You cannot {} now: {}.", action, reason)?;
                }
                Err(TrainerError::WrongPhase { .. }) => {
                    writeln!(self.output, "That is not possible right now.")?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn prompt(&mut self) -> io::Result<()> {
        let text = match self.trainer.phase() {
            GamePhase::PlayerTurn => {
                let legal: Vec<String> = self
                    .trainer
                    .legal_actions()
                    .iter()
                    .map(|action| action.to_string())
                    .collect();
                format!("[{}] > ", legal.join("/"))
            }
            GamePhase::ShoeDepleted => String::from("[shuffle/review/quit] > "),
            _ => String::from("[deal] > "),
        };
        write!(self.output, "{}", text)?;
        self.output.flush()
    }

    fn execute(&mut self, command: Command) -> Result<(), TrainerError> {
        let shown = match command {
            Command::Play(action) => {
                let event = self.trainer.decide(action)?;
                self.show_round_event(&event)
            }
            Command::Deal => match self.trainer.phase() {
                GamePhase::PlayerTurn => self.show_table(),
                _ => {
                    let event = self.trainer.deal_round()?;
                    self.show_round_event(&event)
                }
            },
            Command::Hint => match self.trainer.recommended_action() {
                Some(action) => writeln!(self.output, "Basic strategy says: {}", action),
                None => writeln!(self.output, "No hand is waiting for a decision."),
            },
            Command::Count => {
                let snapshot = self.trainer.snapshot();
                writeln!(
                    self.output,
                    "Running count {}, true count {:.1}, {} cards left",
                    snapshot.running_count, snapshot.true_count, snapshot.cards_remaining
                )
            }
            Command::Bets => self.show_bets(),
            Command::Chart => {
                let chart = strategy_chart(self.trainer.rules());
                write!(self.output, "{}", chart)
            }
            Command::Review(number) => self.show_review(number),
            Command::Simulate => {
                let summary = self.trainer.run_shoe_to_completion()?;
                writeln!(
                    self.output,
                    "Simulated to the end of the shoe: {} rounds played.",
                    summary.rounds_played
                )
                .and_then(|_| self.show_bets())
                .and_then(|_| self.show_shoe_end())
            }
            Command::Shuffle => {
                let handle = self.trainer.reshuffle()?;
                writeln!(self.output, "Shuffled shoe #{}.", handle.shoe_number)
                    .and_then(|_| self.show_round_event(&handle.opening))
            }
            Command::Help => writeln!(self.output, "{}", HELP),
            Command::Quit => Ok(()),
        };
        // Output errors are not trainer errors; a closed terminal ends the
        // session at the next read.
        if let Err(err) = shown {
            log::warn!("cannot write to terminal: {}", err);
        }
        Ok(())
    }

    fn show_round_event(&mut self, event: &RoundEvent) -> io::Result<()> {
        if let Some(feedback) = &event.decision {
            if feedback.is_correct {
                writeln!(self.output, "Correct: {}.", feedback.chosen)?;
            } else {
                writeln!(
                    self.output,
                    "Incorrect. The correct action was to {}.",
                    feedback.correct
                )?;
            }
        }
        match &event.round {
            Some(summary) => {
                if !self.reveal_delay.is_zero() {
                    self.output.flush()?;
                    thread::sleep(self.reveal_delay);
                }
                self.show_settlement(summary)?;
                if self.trainer.phase() == GamePhase::ShoeDepleted {
                    self.show_shoe_end()?;
                }
                Ok(())
            }
            None => self.show_table(),
        }
    }

    fn show_table(&mut self) -> io::Result<()> {
        let snapshot: TrainerSnapshot<'_> = self.trainer.snapshot();
        let mut text = String::new();
        let hidden = if snapshot.dealer.hole_card_hidden { " ??" } else { "" };
        text.push_str(&format!(
            "Dealer: {}{}\n",
            cards_text(&snapshot.dealer.cards),
            hidden
        ));
        for (index, hand) in snapshot.player_hands.iter().enumerate() {
            let marker = if snapshot.active_hand == Some(index) { ">" } else { " " };
            let total = hand.total();
            let soft = if total.soft { "soft " } else { "" };
            text.push_str(&format!(
                "{} Hand {}: {} ({}{})\n",
                marker,
                index + 1,
                cards_text(hand.cards()),
                soft,
                total.total
            ));
        }
        write!(self.output, "{}", text)
    }

    fn show_settlement(&mut self, summary: &RoundSummary) -> io::Result<()> {
        writeln!(
            self.output,
            "Dealer: {} ({})",
            cards_text(&summary.dealer_cards),
            summary.dealer_total
        )?;
        for hand in &summary.hands {
            let note = if hand.surrendered {
                " surrendered"
            } else if hand.doubled {
                " doubled"
            } else {
                ""
            };
            writeln!(
                self.output,
                "  Hand {}: {} ({}){} -> {} {:+}",
                hand.index + 1,
                cards_text(&hand.cards),
                hand.total,
                note,
                hand.outcome,
                hand.win_amount
            )?;
        }
        let stats = self.trainer.stats();
        let accuracy = stats
            .accuracy()
            .map_or_else(|| String::from("-"), |share| format!("{:.0}%", share * 100.0));
        writeln!(
            self.output,
            "Decisions {} right / {} wrong ({}). Hands {}W {}L {}P.",
            stats.correct, stats.incorrect, accuracy, stats.wins, stats.losses, stats.pushes
        )
    }

    fn show_bets(&mut self) -> io::Result<()> {
        writeln!(
            self.output,
            "{:<30} {:>9} {:>9} {:>9} {:>5}",
            "Strategy", "Net", "High", "Low", "Bet"
        )?;
        for strategy in self.trainer.betting() {
            writeln!(
                self.output,
                "{:<30} {:>9.2} {:>9.2} {:>9.2} {:>5}",
                strategy.name, strategy.bankroll, strategy.high, strategy.low, strategy.current_bet
            )?;
        }
        Ok(())
    }

    fn show_shoe_end(&mut self) -> io::Result<()> {
        let mistakes = self.trainer.mistakes().len();
        if mistakes == 0 {
            writeln!(
                self.output,
                "End of shoe. Perfect play: not a single mistake this shoe."
            )
        } else {
            writeln!(
                self.output,
                "End of shoe. You made {} mistake(s); type `review` to go through them.",
                mistakes
            )
        }
    }

    fn show_review(&mut self, number: Option<usize>) -> io::Result<()> {
        let mistakes = self.trainer.mistakes();
        if mistakes.is_empty() {
            return writeln!(self.output, "No mistakes to review.");
        }
        let total = mistakes.len();
        let text = match number {
            Some(number) => match mistakes.get(number - 1) {
                Some(mistake) => review_text(number, total, mistake),
                None => format!("There is no mistake #{}; this shoe has {}.\n", number, total),
            },
            None => mistakes
                .iter()
                .enumerate()
                .map(|(index, mistake)| review_text(index + 1, total, mistake))
                .collect(),
        };
        write!(self.output, "{}", text)
    }
}

fn review_text(number: usize, total: usize, mistake: &MistakeRecord) -> String {
    let results = if mistake.results.is_empty() {
        String::from("N/A")
    } else {
        mistake
            .results
            .iter()
            .map(|outcome| outcome.to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    };
    let mut text = format!(
        "{} of {}: {} against dealer {}\n  You chose {}, correct was {}.\n  {}\n  Result: {} ({})\n",
        number,
        total,
        cards_text(&mistake.player_cards),
        mistake.dealer_up,
        mistake.chosen,
        mistake.correct,
        mistake.explanation(),
        results,
        mistake.verdict()
    );
    if number < total {
        text.push_str(&format!("  Next: review {}\n", number + 1));
    }
    text
}
