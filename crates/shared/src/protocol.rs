use serde::{Deserialize, Serialize};

use crate::domain::{BoardSnapshot, DiskId, MoveIndex, PegIndex};

/// Events pushed to rendering collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PuzzleEvent {
    BoardInitialized(BoardSnapshot),
    MoveApplied {
        from: PegIndex,
        to: PegIndex,
        disk: DiskId,
        move_index: MoveIndex,
    },
    Completed,
}

impl PuzzleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BoardInitialized(_) => "board_initialized",
            Self::MoveApplied { .. } => "move_applied",
            Self::Completed => "completed",
        }
    }
}
