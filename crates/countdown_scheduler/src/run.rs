use chrono::{DateTime, Utc};
use hanoi_sequencer::{
    compute_initial_move_index, compute_next_delay, initial_board, next_move_direction,
    puzzle_config, NextDelay, TimeSpan,
};
use shared::{
    domain::{BoardSnapshot, DiskId, Move, MoveIndex, PuzzleConfig, PEG_COUNT},
    error::HanoiError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Moved {
        mv: Move,
        disk: DiskId,
        next_delay: NextDelay,
    },
    Completed,
}

/// Live state of one countdown between two resets.
#[derive(Debug, Clone)]
pub struct CountdownRun {
    span: TimeSpan,
    config: PuzzleConfig,
    move_index: MoveIndex,
    pegs: [Vec<DiskId>; PEG_COUNT],
    halted: Option<HanoiError>,
}

impl CountdownRun {
    pub fn start(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, HanoiError> {
        let span = TimeSpan::normalize(start, end, now)?;
        let config = puzzle_config(&span)?;
        let move_index = compute_initial_move_index(span.start, span.end, now, config.total_moves);
        let pegs = initial_board(&config, move_index, span.is_finished_at(now));
        Ok(Self {
            span,
            config,
            move_index,
            pegs,
            halted: None,
        })
    }

    pub fn span(&self) -> &TimeSpan {
        &self.span
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn move_index(&self) -> MoveIndex {
        self.move_index
    }

    pub fn is_solved(&self) -> bool {
        self.move_index >= self.config.solved_at()
    }

    pub fn halted(&self) -> Option<&HanoiError> {
        self.halted.as_ref()
    }

    pub fn next_delay(&self, now: DateTime<Utc>) -> NextDelay {
        compute_next_delay(self.span.end, now, self.config.total_moves, self.move_index)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            config: self.config,
            move_index: self.move_index,
            pegs: self.pegs.clone(),
        }
    }

    /// Applies the next move, or reports completion once the last move is made.
    /// A move from an empty peg halts the run for good.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, HanoiError> {
        if let Some(err) = &self.halted {
            return Err(err.clone());
        }
        if self.is_solved() {
            return Ok(TickOutcome::Completed);
        }

        let index = self.move_index.next();
        let Some(mv) = next_move_direction(index) else {
            return Ok(TickOutcome::Completed);
        };
        let Some(disk) = self.pegs[mv.from.0].pop() else {
            let err = HanoiError::IllegalMoveState {
                move_index: index,
                from: mv.from,
            };
            self.halted = Some(err.clone());
            return Err(err);
        };
        self.pegs[mv.to.0].push(disk);
        self.move_index = index;

        Ok(TickOutcome::Moved {
            mv,
            disk,
            next_delay: self.next_delay(now),
        })
    }
}

#[cfg(test)]
#[path = "tests/run_tests.rs"]
mod tests;
