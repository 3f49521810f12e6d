pub mod round;
pub mod shoe;

use bj_trainer_macros::allowed_phase;
use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::{
    betting::{apply_round_result, prepare_bets, strategies_for, BettingStrategy},
    count::CountState,
    hand::{ActionRecord, HandId, Outcome, PlayerHand},
    review::{MistakeLog, MistakeRecord},
    strategy::correct_action,
    Action, Card, Rank, RuleConfig, TrainerError,
};

use self::{
    round::{dealer_must_hit, natural_result, settle_hand, Round},
    shoe::Shoe,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    Unconfigured,
    Configured,
    Dealing,
    PlayerTurn,
    DealerTurn,
    Settling,
    RoundComplete,
    ShoeDepleted,
}

/// Where a card landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Seat {
    Dealer,
    /// Index into the round's player hands.
    Player(usize),
}

/// Something that happened on the table, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableEvent {
    CardDealt { seat: Seat, card: Card },
    /// The hole card is dealt face down. It is already in the count.
    HoleCardDealt,
    HoleCardRevealed(Card),
    HandSplit { index: usize },
    HandFinished { index: usize },
    HandSettled(HandSettlement),
    ShoeDepleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecisionFeedback {
    pub hand_index: usize,
    pub chosen: Action,
    pub correct: Action,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandSettlement {
    pub index: usize,
    pub hand_id: HandId,
    pub cards: Vec<Card>,
    pub total: u8,
    pub outcome: Outcome,
    pub win_amount: f64,
    pub doubled: bool,
    pub surrendered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round_number: u32,
    pub dealer_cards: Vec<Card>,
    pub dealer_total: u8,
    pub hands: Vec<HandSettlement>,
    /// Net units over every hand, as booked by the betting strategies.
    pub win_amount: f64,
}

/// What one call into the trainer did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundEvent {
    pub decision: Option<DecisionFeedback>,
    pub events: Vec<TableEvent>,
    /// The hand that was acted on is finished.
    pub hand_finished: bool,
    /// Set when the round settled during this call.
    pub round: Option<RoundSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoeHandle {
    pub shoe_number: u32,
    pub cards_in_shoe: usize,
    /// The first round, already dealt.
    pub opening: RoundEvent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub correct: u32,
    pub incorrect: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
}

impl SessionStats {
    pub fn decisions(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// Share of correct decisions, `None` before the first decision.
    pub fn accuracy(&self) -> Option<f64> {
        match self.decisions() {
            0 => None,
            n => Some(self.correct as f64 / n as f64),
        }
    }

    fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Push => self.pushes += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoeSummary {
    pub shoe_number: u32,
    pub rounds_played: u32,
    pub stats: SessionStats,
    pub betting: Vec<BettingStrategy>,
    pub mistakes: usize,
    pub running_count: i32,
    pub cards_remaining: usize,
}

/// The dealer as the player may see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealerView {
    pub cards: Vec<Card>,
    pub hole_card_hidden: bool,
    /// Total of the visible cards.
    pub total: Option<u8>,
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerSnapshot<'a> {
    pub phase: GamePhase,
    pub rules: &'a RuleConfig,
    pub shoe_number: u32,
    pub rounds_played: u32,
    pub dealer: DealerView,
    pub player_hands: &'a [PlayerHand],
    pub active_hand: Option<usize>,
    pub running_count: i32,
    pub true_count: f64,
    pub cards_remaining: usize,
    pub betting: &'a [BettingStrategy],
    pub mistakes: &'a MistakeLog,
    pub stats: SessionStats,
}

/// Receives everything that happens while a shoe is played out
/// automatically. Every method defaults to doing nothing.
pub trait TrainerEventHandler {
    fn on_table_event(&mut self, _event: &TableEvent) {}
    fn on_make_decision(&mut self, _feedback: &DecisionFeedback) {}
    fn on_round_settled(&mut self, _summary: &RoundSummary) {}
    fn on_shoe_depleted(&mut self, _summary: &ShoeSummary) {}
}

impl TrainerEventHandler for () {}

/// A training session: one shoe at a time, one player seat, every betting
/// strategy simulated on the same hands.
pub struct Trainer {
    rules: RuleConfig,
    phase: GamePhase,
    rng: StdRng,
    shoe: Shoe,
    count: CountState,
    round: Round,
    stats: SessionStats,
    betting: Vec<BettingStrategy>,
    mistakes: MistakeLog,
    next_hand_id: u32,
    rounds_played: u32,
    shoe_number: u32,
    events: Vec<TableEvent>,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Same seed, same shoes.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let rules = RuleConfig::default();
        Trainer {
            shoe: Shoe::new(rules.number_of_decks),
            betting: strategies_for(&rules),
            rules,
            phase: GamePhase::Unconfigured,
            rng,
            count: CountState::new(),
            round: Round::new(),
            stats: SessionStats::default(),
            mistakes: MistakeLog::new(),
            next_hand_id: 0,
            rounds_played: 0,
            shoe_number: 0,
            events: Vec::new(),
        }
    }

    /// Sets the rules for the next shoe. Rejected while a shoe is in play.
    #[allowed_phase(Unconfigured, Configured, ShoeDepleted)]
    pub fn configure(&mut self, rules: RuleConfig) -> Result<(), TrainerError> {
        rules.validate()?;
        debug!("configured {:?}", rules);
        self.rules = rules;
        self.phase = GamePhase::Configured;
        Ok(())
    }

    /// Starts a fresh session on a new shoe and deals the first round.
    /// Counters and bankrolls start from zero.
    #[allowed_phase(Configured, RoundComplete, ShoeDepleted)]
    pub fn start_shoe(&mut self) -> Result<ShoeHandle, TrainerError> {
        self.reset_session();
        self.shoe = Shoe::new(self.rules.number_of_decks);
        self.shoe.shuffle(&mut self.rng);
        self.begin_shoe()
    }

    /// Like `start_shoe`, but the first cards dealt are `firsts`, in order.
    /// Deal order is player, player, dealer up, dealer hole, then hits.
    #[allowed_phase(Configured, RoundComplete, ShoeDepleted)]
    pub fn start_shoe_stacked(&mut self, firsts: &[Rank]) -> Result<ShoeHandle, TrainerError> {
        let mut shoe = Shoe::new(self.rules.number_of_decks);
        shoe.shuffle_with_firsts(firsts, &mut self.rng)?;
        self.reset_session();
        self.shoe = shoe;
        self.begin_shoe()
    }

    /// Shuffles a new shoe but keeps the session: decision and outcome
    /// counters and bankrolls carry over. The count and the mistake log
    /// start again.
    #[allowed_phase(RoundComplete, ShoeDepleted)]
    pub fn reshuffle(&mut self) -> Result<ShoeHandle, TrainerError> {
        self.shoe = Shoe::new(self.rules.number_of_decks);
        self.shoe.shuffle(&mut self.rng);
        self.begin_shoe()
    }

    /// Deals the next round.
    #[allowed_phase(RoundComplete)]
    pub fn deal_round(&mut self) -> Result<RoundEvent, TrainerError> {
        self.deal()
    }

    /// Plays `action` on the active hand. A legal action that differs from
    /// the oracle still goes through; it is counted and logged as a mistake.
    #[allowed_phase(PlayerTurn)]
    pub fn decide(&mut self, action: Action) -> Result<RoundEvent, TrainerError> {
        self.check_legal(action)?;

        let index = self.round.active;
        let dealer_up = self.dealer_up()?;
        let (correct, mistake) = {
            let hand = self.active_hand()?;
            let correct = correct_action(hand.cards(), dealer_up, &self.rules, hand.is_from_split());
            let mistake = (action != correct).then(|| MistakeRecord {
                hand_id: hand.id,
                player_cards: hand.cards().to_vec(),
                dealer_up,
                chosen: action,
                correct,
                results: Vec::new(),
            });
            (correct, mistake)
        };

        match mistake {
            None => self.stats.correct += 1,
            Some(record) => {
                debug!("mistake on hand {}: {} instead of {}", record.hand_id, action, correct);
                self.stats.incorrect += 1;
                self.mistakes.record(record);
            }
        }
        self.active_hand_mut()?
            .first_decision
            .get_or_insert(ActionRecord { chosen: action, correct });

        let hand_finished = match action {
            Action::Hit => {
                let card = self.draw()?;
                let hand = self.active_hand_mut()?;
                hand.hand.receive_card(card);
                let done = hand.total().total >= 21;
                self.events.push(TableEvent::CardDealt {
                    seat: Seat::Player(index),
                    card,
                });
                done
            }
            Action::Stand => true,
            Action::Double => {
                let card = self.draw()?;
                let hand = self.active_hand_mut()?;
                hand.doubled = true;
                hand.hand.receive_card(card);
                self.events.push(TableEvent::CardDealt {
                    seat: Seat::Player(index),
                    card,
                });
                true
            }
            Action::Split => {
                self.split_active()?;
                let hand = self.active_hand()?;
                hand.split_ace || hand.total().total == 21
            }
            Action::Surrender => {
                self.active_hand_mut()?.surrendered = true;
                true
            }
        };

        if hand_finished {
            self.finish_active_hand()?;
        }
        let round = self.finish_round_if_done()?;

        Ok(RoundEvent {
            decision: Some(DecisionFeedback {
                hand_index: index,
                chosen: action,
                correct,
                is_correct: action == correct,
            }),
            events: std::mem::take(&mut self.events),
            hand_finished,
            round,
        })
    }

    /// Plays out the rest of the shoe with the oracle's answer at every
    /// decision.
    #[allowed_phase(PlayerTurn, RoundComplete)]
    pub fn run_shoe_to_completion(&mut self) -> Result<ShoeSummary, TrainerError> {
        self.run_shoe_with_handler(&mut ())
    }

    #[allowed_phase(PlayerTurn, RoundComplete)]
    pub fn run_shoe_with_handler<H: TrainerEventHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<ShoeSummary, TrainerError> {
        loop {
            let event = match self.phase {
                GamePhase::PlayerTurn => {
                    let action = self
                        .recommended_action()
                        .ok_or(TrainerError::ShoeExhausted)?;
                    self.decide(action)?
                }
                GamePhase::RoundComplete => self.deal_round()?,
                _ => break,
            };
            for table_event in &event.events {
                handler.on_table_event(table_event);
            }
            if let Some(feedback) = &event.decision {
                handler.on_make_decision(feedback);
            }
            if let Some(summary) = &event.round {
                handler.on_round_settled(summary);
            }
        }
        let summary = self.shoe_summary();
        handler.on_shoe_depleted(&summary);
        Ok(summary)
    }

    /// Actions the active hand may take. Empty outside the player's turn.
    pub fn legal_actions(&self) -> Vec<Action> {
        [
            Action::Hit,
            Action::Stand,
            Action::Double,
            Action::Split,
            Action::Surrender,
        ]
        .into_iter()
        .filter(|&action| self.illegal_reason(action).is_none())
        .collect()
    }

    /// The oracle's answer for the active hand.
    pub fn recommended_action(&self) -> Option<Action> {
        if self.phase != GamePhase::PlayerTurn {
            return None;
        }
        let hand = self.round.active_hand()?;
        let dealer_up = self.round.dealer_up()?;
        Some(correct_action(
            hand.cards(),
            dealer_up,
            &self.rules,
            hand.is_from_split(),
        ))
    }

    pub fn snapshot(&self) -> TrainerSnapshot<'_> {
        let hole_card_hidden = matches!(self.phase, GamePhase::Dealing | GamePhase::PlayerTurn);
        let cards: Vec<Card> = if hole_card_hidden {
            self.round.dealer_up().into_iter().collect()
        } else {
            self.round.dealer.cards().to_vec()
        };
        let total = (!cards.is_empty()).then(|| crate::hand::hand_total(&cards).total);
        TrainerSnapshot {
            phase: self.phase,
            rules: &self.rules,
            shoe_number: self.shoe_number,
            rounds_played: self.rounds_played,
            dealer: DealerView {
                cards,
                hole_card_hidden,
                total,
            },
            player_hands: &self.round.player_hands,
            active_hand: (self.phase == GamePhase::PlayerTurn).then_some(self.round.active),
            running_count: self.count.running(),
            true_count: self.true_count(),
            cards_remaining: self.shoe.remaining(),
            betting: &self.betting,
            mistakes: &self.mistakes,
            stats: self.stats,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn mistakes(&self) -> &MistakeLog {
        &self.mistakes
    }

    pub fn betting(&self) -> &[BettingStrategy] {
        &self.betting
    }

    pub fn count(&self) -> CountState {
        self.count
    }

    pub fn true_count(&self) -> f64 {
        self.count.true_count(self.shoe.remaining())
    }

    pub fn cards_remaining(&self) -> usize {
        self.shoe.remaining()
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn shoe_summary(&self) -> ShoeSummary {
        ShoeSummary {
            shoe_number: self.shoe_number,
            rounds_played: self.rounds_played,
            stats: self.stats,
            betting: self.betting.clone(),
            mistakes: self.mistakes.len(),
            running_count: self.count.running(),
            cards_remaining: self.shoe.remaining(),
        }
    }

    fn reset_session(&mut self) {
        self.stats = SessionStats::default();
        self.betting = strategies_for(&self.rules);
    }

    fn begin_shoe(&mut self) -> Result<ShoeHandle, TrainerError> {
        self.count.reset();
        self.mistakes.clear();
        self.round = Round::new();
        self.rounds_played = 0;
        self.shoe_number += 1;
        debug!(
            "shoe #{} shuffled: {} decks, {} cards",
            self.shoe_number,
            self.rules.number_of_decks,
            self.shoe.remaining()
        );
        let cards_in_shoe = self.shoe.remaining();
        let opening = self.deal()?;
        Ok(ShoeHandle {
            shoe_number: self.shoe_number,
            cards_in_shoe,
            opening,
        })
    }

    fn deal(&mut self) -> Result<RoundEvent, TrainerError> {
        self.phase = GamePhase::Dealing;
        self.events.clear();
        let true_count = self.true_count();
        prepare_bets(&mut self.betting, true_count, self.rules.max_bet);

        self.round = Round::new();
        let mut hand = PlayerHand::new(self.fresh_hand_id());
        for _ in 0..2 {
            let card = self.draw()?;
            hand.hand.receive_card(card);
            self.events.push(TableEvent::CardDealt {
                seat: Seat::Player(0),
                card,
            });
        }
        let up = self.draw()?;
        self.round.dealer.receive_card(up);
        self.events.push(TableEvent::CardDealt {
            seat: Seat::Dealer,
            card: up,
        });
        let hole = self.draw()?;
        self.round.dealer.receive_card(hole);
        self.events.push(TableEvent::HoleCardDealt);

        let player_natural = hand.is_blackjack();
        self.round.player_hands.push(hand);

        let round = match natural_result(player_natural, self.round.dealer.is_natural()) {
            Some(win_amount) => {
                self.events.push(TableEvent::HoleCardRevealed(hole));
                self.round.active = self.round.player_hands.len();
                Some(self.settle(|_, _| win_amount)?)
            }
            None => {
                self.phase = GamePhase::PlayerTurn;
                None
            }
        };

        Ok(RoundEvent {
            decision: None,
            events: std::mem::take(&mut self.events),
            hand_finished: round.is_some(),
            round,
        })
    }

    fn check_legal(&self, action: Action) -> Result<(), TrainerError> {
        match self.illegal_reason(action) {
            None => Ok(()),
            Some(reason) => {
                warn!("rejected {}: {}", action, reason);
                Err(TrainerError::IllegalAction { action, reason })
            }
        }
    }

    fn illegal_reason(&self, action: Action) -> Option<&'static str> {
        let hand = match self.round.active_hand() {
            Some(hand) if self.phase == GamePhase::PlayerTurn => hand,
            _ => return Some("no hand is waiting for a decision"),
        };
        let two_cards = hand.cards().len() == 2;
        match action {
            Action::Hit | Action::Stand => None,
            Action::Double if !two_cards => Some("double is only allowed on the first two cards"),
            Action::Double if hand.is_from_split() && !self.rules.das_allowed() => {
                Some("double after split is not allowed")
            }
            Action::Split if !hand.hand.is_pair() => Some("only a pair can be split"),
            Action::Surrender if !self.rules.surrender_allowed() => {
                Some("surrender is not offered at this table")
            }
            Action::Surrender if !two_cards || hand.is_from_split() => {
                Some("surrender is only allowed as the first decision of an unsplit hand")
            }
            Action::Double | Action::Split | Action::Surrender => None,
        }
    }

    /// Replaces the active hand with its two split children.
    fn split_active(&mut self) -> Result<(), TrainerError> {
        let index = self.round.active;
        let parent = self.active_hand()?.clone();
        let (first, second) = match parent.cards() {
            [first, second] => (*first, *second),
            _ => {
                return Err(TrainerError::IllegalAction {
                    action: Action::Split,
                    reason: "only a pair can be split",
                })
            }
        };
        let new_first = self.draw()?;
        let new_second = self.draw()?;

        let mut left = PlayerHand::from_split(self.fresh_hand_id(), &parent, first);
        left.hand.receive_card(new_first);
        let mut right = PlayerHand::from_split(self.fresh_hand_id(), &parent, second);
        right.hand.receive_card(new_second);
        debug!("hand {} split into {} and {}", parent.id, left.id, right.id);

        self.round.player_hands[index] = left;
        self.round.player_hands.insert(index + 1, right);
        self.events.push(TableEvent::HandSplit { index });
        self.events.push(TableEvent::CardDealt {
            seat: Seat::Player(index),
            card: new_first,
        });
        self.events.push(TableEvent::CardDealt {
            seat: Seat::Player(index + 1),
            card: new_second,
        });
        Ok(())
    }

    /// Moves past the active hand and any following hands that need no
    /// decision: split Aces and totals of 21.
    fn finish_active_hand(&mut self) -> Result<(), TrainerError> {
        self.events.push(TableEvent::HandFinished {
            index: self.round.active,
        });
        self.round.active += 1;
        while let Some(hand) = self.round.active_hand() {
            if !(hand.split_ace || hand.total().total >= 21) {
                break;
            }
            self.events.push(TableEvent::HandFinished {
                index: self.round.active,
            });
            self.round.active += 1;
        }
        Ok(())
    }

    fn finish_round_if_done(&mut self) -> Result<Option<RoundSummary>, TrainerError> {
        if !self.round.player_turn_over() {
            return Ok(None);
        }
        self.play_dealer()?;
        let summary = self.settle(settle_hand)?;
        Ok(Some(summary))
    }

    fn play_dealer(&mut self) -> Result<(), TrainerError> {
        self.phase = GamePhase::DealerTurn;
        let hole = self
            .round
            .hole_card()
            .ok_or(TrainerError::ShoeExhausted)?;
        self.events.push(TableEvent::HoleCardRevealed(hole));
        if self.round.all_hands_dead() {
            return Ok(());
        }
        while dealer_must_hit(&self.round.dealer, &self.rules) {
            let card = self.draw()?;
            self.round.dealer.receive_card(card);
            self.events.push(TableEvent::CardDealt {
                seat: Seat::Dealer,
                card,
            });
        }
        Ok(())
    }

    /// Settles every hand with `payout`, books the round and decides whether
    /// the shoe continues.
    fn settle<F>(&mut self, payout: F) -> Result<RoundSummary, TrainerError>
    where
        F: Fn(&PlayerHand, &crate::hand::Hand) -> f64,
    {
        self.phase = GamePhase::Settling;
        let mut settlements = Vec::with_capacity(self.round.player_hands.len());
        for (index, hand) in self.round.player_hands.iter_mut().enumerate() {
            let win_amount = payout(hand, &self.round.dealer);
            hand.settle(win_amount);
            let outcome = Outcome::from_win_amount(win_amount);
            self.stats.record_outcome(outcome);
            self.mistakes.annotate(hand.attribution(), outcome);
            settlements.push(HandSettlement {
                index,
                hand_id: hand.id,
                cards: hand.cards().to_vec(),
                total: hand.total().total,
                outcome,
                win_amount,
                doubled: hand.doubled,
                surrendered: hand.surrendered,
            });
        }

        let win_amount = self.round.win_amount();
        apply_round_result(&mut self.betting, win_amount, self.rules.max_bet);
        self.rounds_played += 1;
        self.events
            .extend(settlements.iter().cloned().map(TableEvent::HandSettled));
        debug!(
            "round {} settled: dealer {}, net {:+}",
            self.rounds_played,
            self.round.dealer.total().total,
            win_amount
        );

        if self.shoe.is_depleted() {
            self.phase = GamePhase::ShoeDepleted;
            self.events.push(TableEvent::ShoeDepleted);
            info!(
                "shoe #{} finished after {} rounds: {} correct, {} incorrect, {} mistakes logged",
                self.shoe_number,
                self.rounds_played,
                self.stats.correct,
                self.stats.incorrect,
                self.mistakes.len()
            );
        } else {
            self.phase = GamePhase::RoundComplete;
        }

        Ok(RoundSummary {
            round_number: self.rounds_played,
            dealer_cards: self.round.dealer.cards().to_vec(),
            dealer_total: self.round.dealer.total().total,
            hands: settlements,
            win_amount,
        })
    }

    /// Every card is counted the moment it leaves the shoe, the hole card
    /// included. An empty shoe abandons the round and leaves the session in
    /// `ShoeDepleted`, so only a reshuffle or a new shoe can follow.
    fn draw(&mut self) -> Result<Card, TrainerError> {
        let Some(card) = self.shoe.draw() else {
            warn!(
                "shoe #{} ran dry in round {}; the round is abandoned",
                self.shoe_number,
                self.rounds_played + 1
            );
            self.phase = GamePhase::ShoeDepleted;
            return Err(TrainerError::ShoeExhausted);
        };
        self.count.observe(card);
        Ok(card)
    }

    fn fresh_hand_id(&mut self) -> HandId {
        self.next_hand_id += 1;
        HandId(self.next_hand_id)
    }

    fn dealer_up(&self) -> Result<Card, TrainerError> {
        self.round.dealer_up().ok_or(TrainerError::ShoeExhausted)
    }

    fn active_hand(&self) -> Result<&PlayerHand, TrainerError> {
        self.round.active_hand().ok_or(TrainerError::WrongPhase {
            operation: "decide",
            allowed: "PlayerTurn",
        })
    }

    fn active_hand_mut(&mut self) -> Result<&mut PlayerHand, TrainerError> {
        self.round.active_hand_mut().ok_or(TrainerError::WrongPhase {
            operation: "decide",
            allowed: "PlayerTurn",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DealerSoft17, DoubleAfterSplit, SurrenderPolicy};
    use Rank::*;

    fn trainer_with(rules: RuleConfig) -> Trainer {
        let mut trainer = Trainer::with_seed(7);
        trainer.configure(rules).unwrap();
        trainer
    }

    fn stacked(rules: RuleConfig, firsts: &[Rank]) -> (Trainer, ShoeHandle) {
        let mut trainer = trainer_with(rules);
        let handle = trainer.start_shoe_stacked(firsts).unwrap();
        (trainer, handle)
    }

    fn surrender_rules() -> RuleConfig {
        RuleConfig {
            surrender: SurrenderPolicy::Late,
            ..Default::default()
        }
    }

    fn flat_bankroll(trainer: &Trainer) -> f64 {
        trainer.betting()[0].bankroll
    }

    #[test]
    fn test_allowed_phase() {
        let mut trainer = Trainer::with_seed(1);
        assert_eq!(trainer.phase(), GamePhase::Unconfigured);
        assert!(matches!(
            trainer.start_shoe(),
            Err(TrainerError::WrongPhase { .. })
        ));
        assert!(matches!(
            trainer.decide(Action::Hit),
            Err(TrainerError::WrongPhase { .. })
        ));
        trainer.configure(RuleConfig::default()).unwrap();
        assert_eq!(trainer.phase(), GamePhase::Configured);
        trainer.start_shoe().unwrap();
        assert!(matches!(
            trainer.configure(RuleConfig::default()),
            Err(TrainerError::WrongPhase { .. })
        ));
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let mut trainer = Trainer::with_seed(1);
        let rules = RuleConfig {
            number_of_decks: 9,
            ..Default::default()
        };
        assert!(matches!(
            trainer.configure(rules),
            Err(TrainerError::InvalidConfig(_))
        ));
        assert_eq!(trainer.phase(), GamePhase::Unconfigured);
    }

    #[test]
    fn surrender_settles_for_half_a_unit() {
        let (mut trainer, _) = stacked(surrender_rules(), &[Ten, Six, Ten, Seven]);
        assert_eq!(trainer.phase(), GamePhase::PlayerTurn);
        assert!(trainer.legal_actions().contains(&Action::Surrender));
        assert_eq!(trainer.recommended_action(), Some(Action::Surrender));

        let event = trainer.decide(Action::Surrender).unwrap();
        assert!(event.decision.unwrap().is_correct);
        assert!(event.hand_finished);
        let round = event.round.unwrap();
        assert_eq!(round.win_amount, -0.5);
        assert_eq!(round.hands[0].outcome, Outcome::Loss);
        // Nothing to play against, so the dealer stands on 17.
        assert_eq!(round.dealer_cards.len(), 2);
        assert_eq!(flat_bankroll(&trainer), -0.5);
        assert_eq!(trainer.stats().losses, 1);
        assert_eq!(trainer.phase(), GamePhase::RoundComplete);
    }

    #[test]
    fn split_aces_get_one_card_each() {
        let (mut trainer, _) = stacked(
            RuleConfig::default(),
            &[Ace, Ace, Nine, Seven, Five, Six, Ten],
        );
        assert_eq!(trainer.recommended_action(), Some(Action::Split));
        let event = trainer.decide(Action::Split).unwrap();
        assert!(event.hand_finished);
        assert!(event.events.contains(&TableEvent::HandSplit { index: 0 }));

        let round = event.round.unwrap();
        assert_eq!(round.hands.len(), 2);
        assert!(round.hands.iter().all(|hand| hand.cards.len() == 2));
        assert_eq!(round.hands[0].total, 16);
        assert_eq!(round.hands[1].total, 17);
        // Dealer 16 draws a ten and busts.
        assert_eq!(round.dealer_total, 26);
        assert_eq!(round.win_amount, 2.0);
        assert_eq!(trainer.stats().decisions(), 1);
        assert_eq!(trainer.stats().wins, 2);
    }

    #[test]
    fn doubled_hand_pays_two_units() {
        let (mut trainer, _) = stacked(RuleConfig::default(), &[Five, Six, Six, Ten, Nine, Ten]);
        assert_eq!(trainer.recommended_action(), Some(Action::Double));
        let event = trainer.decide(Action::Double).unwrap();
        let round = event.round.unwrap();
        assert_eq!(round.hands[0].total, 20);
        assert!(round.hands[0].doubled);
        assert_eq!(round.dealer_total, 26);
        assert_eq!(round.win_amount, 2.0);
    }

    #[test]
    fn naturals_settle_on_the_deal() {
        let (trainer, handle) = stacked(RuleConfig::default(), &[Ace, King, Nine, Seven]);
        assert_eq!(handle.opening.round.as_ref().unwrap().win_amount, 1.5);
        assert_eq!(trainer.phase(), GamePhase::RoundComplete);
        assert_eq!(trainer.stats().decisions(), 0);

        let (_, handle) = stacked(RuleConfig::default(), &[Ace, King, Ace, Queen]);
        assert_eq!(handle.opening.round.unwrap().win_amount, 0.0);

        let (trainer, handle) = stacked(RuleConfig::default(), &[Ten, Nine, Ace, King]);
        assert_eq!(handle.opening.round.unwrap().hands[0].outcome, Outcome::Loss);
        assert_eq!(flat_bankroll(&trainer), -1.0);
    }

    #[test]
    fn illegal_actions_change_nothing() {
        let (mut trainer, _) = stacked(RuleConfig::default(), &[Ten, Six, Ten, Seven]);
        let before = trainer.cards_remaining();
        assert!(matches!(
            trainer.decide(Action::Split),
            Err(TrainerError::IllegalAction { .. })
        ));
        assert!(matches!(
            trainer.decide(Action::Surrender),
            Err(TrainerError::IllegalAction { .. })
        ));
        assert_eq!(trainer.cards_remaining(), before);
        assert_eq!(trainer.stats().decisions(), 0);
        assert_eq!(trainer.phase(), GamePhase::PlayerTurn);
        assert_eq!(
            trainer.legal_actions(),
            vec![Action::Hit, Action::Stand, Action::Double]
        );
    }

    #[test]
    fn wrong_stand_is_logged_with_its_result() {
        let (mut trainer, _) = stacked(RuleConfig::default(), &[Ten, Six, Ten, Seven, Five]);
        let event = trainer.decide(Action::Stand).unwrap();
        let feedback = event.decision.unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.correct, Action::Hit);
        assert_eq!(trainer.stats().incorrect, 1);

        let mistake = trainer.mistakes().get(0).unwrap();
        assert_eq!(mistake.chosen, Action::Stand);
        assert_eq!(mistake.correct, Action::Hit);
        assert_eq!(mistake.results, vec![Outcome::Loss]);
        assert_eq!(mistake.verdict(), crate::review::Verdict::Costly);
    }

    #[test]
    fn split_mistake_collects_every_child_result() {
        let (mut trainer, _) = stacked(
            RuleConfig::default(),
            &[Ten, Ten, Six, Ten, Nine, Eight, Ten],
        );
        let event = trainer.decide(Action::Split).unwrap();
        assert!(!event.decision.unwrap().is_correct);
        assert!(!event.hand_finished);
        assert_eq!(trainer.round().player_hands.len(), 2);

        trainer.decide(Action::Stand).unwrap();
        let event = trainer.decide(Action::Stand).unwrap();
        let round = event.round.unwrap();
        assert_eq!(round.dealer_total, 26);
        assert_eq!(round.win_amount, 2.0);

        assert_eq!(trainer.mistakes().len(), 1);
        let mistake = trainer.mistakes().get(0).unwrap();
        assert_eq!(mistake.results, vec![Outcome::Win, Outcome::Win]);
        assert_eq!(mistake.verdict(), crate::review::Verdict::Lucky);
        assert_eq!(trainer.stats().correct, 2);
    }

    #[test]
    fn dealer_soft_17_rule_is_applied() {
        let firsts = [Ten, Eight, Ace, Six, Two];
        let (mut trainer, _) = stacked(RuleConfig::default(), &firsts);
        let round = trainer.decide(Action::Stand).unwrap().round.unwrap();
        assert_eq!(round.dealer_cards.len(), 3);
        assert_eq!(round.dealer_total, 19);
        assert_eq!(round.hands[0].outcome, Outcome::Loss);

        let s17 = RuleConfig {
            dealer_soft17: DealerSoft17::Stand,
            ..Default::default()
        };
        let (mut trainer, _) = stacked(s17, &firsts);
        let round = trainer.decide(Action::Stand).unwrap().round.unwrap();
        assert_eq!(round.dealer_total, 17);
        assert_eq!(round.hands[0].outcome, Outcome::Win);
    }

    #[test]
    fn double_after_split_follows_rules() {
        let ndas = RuleConfig {
            double_after_split: DoubleAfterSplit::NotAllowed,
            ..Default::default()
        };
        let (mut trainer, _) = stacked(ndas, &[Eight, Eight, Ten, Seven, Three, Two]);
        trainer.decide(Action::Split).unwrap();
        assert_eq!(trainer.round().player_hands[0].total().total, 11);
        assert!(!trainer.legal_actions().contains(&Action::Double));
        assert_eq!(trainer.recommended_action(), Some(Action::Hit));

        let (mut trainer, _) = stacked(
            RuleConfig::default(),
            &[Eight, Eight, Ten, Seven, Three, Two],
        );
        trainer.decide(Action::Split).unwrap();
        assert!(trainer.legal_actions().contains(&Action::Double));
        assert_eq!(trainer.recommended_action(), Some(Action::Double));
    }

    #[test]
    fn hole_card_stays_hidden_during_player_turn() {
        let (trainer, _) = stacked(RuleConfig::default(), &[Ten, Six, Ten, Seven]);
        let snapshot = trainer.snapshot();
        assert!(snapshot.dealer.hole_card_hidden);
        assert_eq!(snapshot.dealer.cards.len(), 1);
        assert_eq!(snapshot.dealer.total, Some(10));
        assert_eq!(snapshot.active_hand, Some(0));
        // The hole card is already counted: +1 -1 -1 and 7 is neutral.
        assert_eq!(snapshot.running_count, -1);
    }

    #[test]
    fn reshuffle_keeps_bankrolls_but_clears_mistakes() {
        let (mut trainer, _) = stacked(RuleConfig::default(), &[Ten, Six, Ten, Seven, Five]);
        trainer.decide(Action::Stand).unwrap();
        assert_eq!(trainer.mistakes().len(), 1);
        let bankroll = flat_bankroll(&trainer);

        let handle = trainer.reshuffle().unwrap();
        assert_eq!(handle.shoe_number, 2);
        assert!(trainer.mistakes().is_empty());
        assert!(trainer.stats().incorrect >= 1);
        let settled_in_opening = handle.opening.round.map_or(0.0, |round| round.win_amount);
        assert_eq!(flat_bankroll(&trainer), bankroll + settled_in_opening);
    }

    #[test]
    fn reshuffle_starts_the_count_from_zero() {
        let (mut trainer, _) = stacked(RuleConfig::default(), &[Ten, Six, Ten, Seven, Five]);
        trainer.decide(Action::Stand).unwrap();
        assert_eq!(trainer.count().running(), -1);

        trainer.reshuffle().unwrap();
        let round = trainer.round();
        let opening: i32 = round
            .dealer
            .cards()
            .iter()
            .chain(round.player_hands.iter().flat_map(|hand| hand.cards()))
            .map(|card| i32::from(card.count_tag()))
            .sum();
        assert_eq!(trainer.count().running(), opening);
    }

    #[test]
    fn running_dry_mid_round_allows_a_reshuffle() {
        let (mut trainer, _) = stacked(RuleConfig::default(), &[Ten, Six, Ten, Seven]);
        while trainer.shoe.draw().is_some() {}

        assert_eq!(trainer.decide(Action::Hit), Err(TrainerError::ShoeExhausted));
        assert_eq!(trainer.phase(), GamePhase::ShoeDepleted);
        assert!(matches!(
            trainer.deal_round(),
            Err(TrainerError::WrongPhase { .. })
        ));

        let handle = trainer.reshuffle().unwrap();
        assert_eq!(handle.shoe_number, 2);
        assert_ne!(trainer.phase(), GamePhase::ShoeDepleted);
    }

    #[test]
    fn simulated_shoe_plays_perfectly_to_depletion() {
        for decks in [1, 2, 6] {
            let rules = RuleConfig {
                number_of_decks: decks,
                surrender: SurrenderPolicy::Late,
                custom_progression: vec![1, 2, 3],
                ..Default::default()
            };
            let mut trainer = Trainer::with_seed(decks as u64);
            trainer.configure(rules).unwrap();
            trainer.start_shoe().unwrap();
            let summary = trainer.run_shoe_to_completion().unwrap();

            assert_eq!(trainer.phase(), GamePhase::ShoeDepleted);
            assert!(summary.cards_remaining < shoe::RESHUFFLE_THRESHOLD);
            assert_eq!(summary.stats.incorrect, 0);
            assert_eq!(summary.mistakes, 0);
            assert_eq!(summary.betting.len(), 6);
            let remaining_tags: i32 = trainer
                .shoe
                .cards()
                .iter()
                .map(|card| card.count_tag() as i32)
                .sum();
            assert_eq!(summary.running_count, -remaining_tags);
            assert!(matches!(trainer.deal_round(), Err(TrainerError::WrongPhase { .. })));
        }
    }

    #[derive(Default)]
    struct Recorder {
        decisions: usize,
        rounds: u32,
        depleted: bool,
    }

    impl TrainerEventHandler for Recorder {
        fn on_make_decision(&mut self, feedback: &DecisionFeedback) {
            assert!(feedback.is_correct);
            self.decisions += 1;
        }

        fn on_round_settled(&mut self, _summary: &RoundSummary) {
            self.rounds += 1;
        }

        fn on_shoe_depleted(&mut self, _summary: &ShoeSummary) {
            self.depleted = true;
        }
    }

    #[test]
    fn handler_sees_every_round() {
        let mut trainer = trainer_with(RuleConfig::default());
        let handle = trainer.start_shoe().unwrap();
        let opening_rounds = handle.opening.round.is_some() as u32;
        let mut recorder = Recorder::default();
        let summary = trainer.run_shoe_with_handler(&mut recorder).unwrap();
        assert!(recorder.depleted);
        assert_eq!(recorder.rounds + opening_rounds, summary.rounds_played);
        assert_eq!(recorder.decisions as u32, summary.stats.decisions());
    }
}
