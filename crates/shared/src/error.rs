use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MoveIndex, PegIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidConfiguration,
    IllegalMoveState,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HanoiError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },
    #[error("illegal move state: move {move_index} takes from empty peg {from}")]
    IllegalMoveState { move_index: MoveIndex, from: PegIndex },
}

impl HanoiError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfiguration { .. } => ErrorCode::InvalidConfiguration,
            Self::IllegalMoveState { .. } => ErrorCode::IllegalMoveState,
        }
    }

    /// A halted run only recovers through a fresh reset.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IllegalMoveState { .. })
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
