use thiserror::Error;

use crate::Action;

/// Errors returned by the trainer. A legal but suboptimal decision is not an
/// error; it comes back as `Ok` with the mistake flagged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainerError {
    #[error("{operation} is only allowed in {allowed} phase")]
    WrongPhase {
        operation: &'static str,
        allowed: &'static str,
    },

    #[error("{action} is not legal here: {reason}")]
    IllegalAction { action: Action, reason: &'static str },

    #[error("invalid rule configuration: {0}")]
    InvalidConfig(String),

    #[error("the shoe ran out of cards in the middle of a round")]
    ShoeExhausted,

    #[error("cannot parse card {0:?}")]
    InvalidCard(String),

    #[error("cannot stack the shoe: {0}")]
    InvalidStack(String),
}
