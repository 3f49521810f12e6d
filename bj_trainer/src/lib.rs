pub mod betting;
pub mod card;
pub mod count;
mod error;
pub mod hand;
pub mod review;
pub mod simulation;
pub mod strategy;

use serde::{Deserialize, Serialize};
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use strum_macros::{Display, EnumString};

pub use card::{Card, Rank, Suit};
pub use error::TrainerError;
pub use simulation::{GamePhase, Trainer};

/// Largest shoe the trainer deals from.
pub const MAX_DECKS: u8 = 8;

/// Table rules for one shoe. Set with `Trainer::configure` before the shoe
/// starts; they cannot change while it is being dealt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub dealer_soft17: DealerSoft17,
    pub double_after_split: DoubleAfterSplit,
    pub surrender: SurrenderPolicy,
    pub number_of_decks: u8,
    /// Ceiling applied to every betting strategy. `None` means unbounded.
    pub max_bet: Option<u32>,
    /// Enables the custom progression strategy when non-empty.
    pub custom_progression: Vec<u32>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            dealer_soft17: DealerSoft17::Hit,
            double_after_split: DoubleAfterSplit::Allowed,
            surrender: SurrenderPolicy::NotAllowed,
            number_of_decks: 6,
            max_bet: None,
            custom_progression: Vec::new(),
        }
    }
}

impl RuleConfig {
    pub fn dealer_hits_soft_17(&self) -> bool {
        self.dealer_soft17 == DealerSoft17::Hit
    }

    pub fn das_allowed(&self) -> bool {
        self.double_after_split == DoubleAfterSplit::Allowed
    }

    pub fn surrender_allowed(&self) -> bool {
        self.surrender == SurrenderPolicy::Late
    }

    /// Rejects values the trainer cannot deal with.
    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.number_of_decks == 0 || self.number_of_decks > MAX_DECKS {
            return Err(TrainerError::InvalidConfig(format!(
                "number_of_decks must be in [1, {}], got {}",
                MAX_DECKS, self.number_of_decks
            )));
        }
        if self.max_bet == Some(0) {
            return Err(TrainerError::InvalidConfig(String::from(
                "max_bet must be at least 1 unit",
            )));
        }
        if self.custom_progression.iter().any(|&step| step == 0) {
            return Err(TrainerError::InvalidConfig(String::from(
                "custom_progression steps must be positive",
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum DealerSoft17 {
    #[serde(rename = "h17")]
    Hit,
    #[serde(rename = "s17")]
    Stand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum DoubleAfterSplit {
    #[serde(rename = "das")]
    Allowed,
    #[serde(rename = "ndas")]
    NotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum SurrenderPolicy {
    #[serde(rename = "surrender")]
    Late,
    #[serde(rename = "nosurrender")]
    NotAllowed,
}

/// A player decision.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Action {
    #[strum(to_string = "Hit", serialize = "h")]
    Hit,
    #[strum(to_string = "Stand", serialize = "s")]
    Stand,
    #[strum(to_string = "Double", serialize = "d")]
    Double,
    #[strum(to_string = "Split", serialize = "p")]
    Split,
    #[strum(to_string = "Surrender", serialize = "r")]
    Surrender,
}

impl Action {
    /// One-letter chart code.
    pub fn code(self) -> char {
        match self {
            Action::Hit => 'H',
            Action::Stand => 'S',
            Action::Double => 'D',
            Action::Split => 'P',
            Action::Surrender => 'R',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_modes_parse_from_config_strings() {
        assert_eq!("h17".parse::<DealerSoft17>().unwrap(), DealerSoft17::Hit);
        assert_eq!("s17".parse::<DealerSoft17>().unwrap(), DealerSoft17::Stand);
        assert_eq!(
            "ndas".parse::<DoubleAfterSplit>().unwrap(),
            DoubleAfterSplit::NotAllowed
        );
        assert_eq!(
            "surrender".parse::<SurrenderPolicy>().unwrap(),
            SurrenderPolicy::Late
        );
        assert!("early".parse::<SurrenderPolicy>().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_rules() {
        let mut rules = RuleConfig::default();
        assert!(rules.validate().is_ok());

        rules.number_of_decks = 0;
        assert!(matches!(
            rules.validate(),
            Err(TrainerError::InvalidConfig(_))
        ));

        rules.number_of_decks = 2;
        rules.max_bet = Some(0);
        assert!(rules.validate().is_err());

        rules.max_bet = Some(10);
        rules.custom_progression = vec![1, 0, 2];
        assert!(rules.validate().is_err());
    }

    #[test]
    fn actions_parse_from_letters_and_names() {
        assert_eq!("h".parse::<Action>().unwrap(), Action::Hit);
        assert_eq!("P".parse::<Action>().unwrap(), Action::Split);
        assert_eq!("surrender".parse::<Action>().unwrap(), Action::Surrender);
        assert_eq!(Action::Double.to_string(), "Double");
        assert_eq!(Action::Surrender.code(), 'R');
        assert!("x".parse::<Action>().is_err());
    }
}
