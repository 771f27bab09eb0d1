//! Pure mapping from a countdown span to the iterative three-peg Hanoi sequence.
//!
//! Disk `1` is the smallest disk and disk `disk_count` the largest. Move `0` is
//! the untouched board with every disk on peg 0; move `2^disk_count - 1` is the
//! solved board with every disk on the terminal peg.

use std::time::Duration;

use chrono::{DateTime, Duration as SpanDuration, Utc};
use shared::{
    domain::{DiskId, Move, MoveIndex, PegIndex, PuzzleConfig, PEG_COUNT, TERMINAL_PEG},
    error::HanoiError,
};

/// Moves never come faster than this once the remaining time runs out.
pub const FLOOR_DELAY: Duration = Duration::from_millis(1000);

/// Largest disk count whose move total still fits in a `u64`.
pub const MAX_DISK_COUNT: u32 = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    /// A start in the future is pulled back to one millisecond before `now` so
    /// the countdown is already under way. `end` is never adjusted.
    pub fn normalize(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, HanoiError> {
        let start = if start > now {
            now - SpanDuration::milliseconds(1)
        } else {
            start
        };
        if end <= start {
            return Err(HanoiError::invalid(format!(
                "end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn total_duration(&self) -> SpanDuration {
        self.end - self.start
    }

    /// Whole seconds between start and end, truncated.
    pub fn duration_seconds(&self) -> i64 {
        self.total_duration().num_seconds()
    }

    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }
}

/// Smallest odd disk count whose move total covers the span at roughly one
/// move per second.
pub fn compute_disk_count(duration_seconds: i64) -> Result<u32, HanoiError> {
    if duration_seconds <= 0 {
        return Err(HanoiError::invalid(format!(
            "countdown must span at least one second, got {duration_seconds}s"
        )));
    }
    let disks = duration_seconds.ilog2() + 1;
    let disks = if disks % 2 == 0 { disks + 1 } else { disks };
    Ok(disks.min(MAX_DISK_COUNT))
}

pub fn puzzle_config(span: &TimeSpan) -> Result<PuzzleConfig, HanoiError> {
    compute_disk_count(span.duration_seconds()).map(PuzzleConfig::new)
}

/// Peg occupied by `disk` after `move_index` moves of the iterative solution.
///
/// Only valid for an odd `disk_count`; with an even count the parity term
/// swaps the roles of pegs 1 and 2. Panics if `disk` is not in
/// `1..=disk_count`.
pub fn peg_for_disk_at_move(disk_count: u32, move_index: MoveIndex, disk: DiskId) -> PegIndex {
    let d = disk.0;
    assert!(
        (1..=disk_count).contains(&d),
        "disk {d} outside 1..={disk_count}"
    );
    let direction = u64::from((disk_count + d + 1) % 2) + 1;
    let cycles = (move_index.0 + (1u64 << (d - 1))) / (1u64 << d);
    PegIndex(((direction * (cycles % 3)) % 3) as usize)
}

/// Source and destination of move `move_index`. Move `0` is the initial
/// position and has no direction.
pub fn next_move_direction(move_index: MoveIndex) -> Option<Move> {
    let x = move_index.0;
    if x == 0 {
        return None;
    }
    let from = (x & (x - 1)) % 3;
    let to = ((x | (x - 1)) + 1) % 3;
    Some(Move {
        from: PegIndex(from as usize),
        to: PegIndex(to as usize),
        index: move_index,
    })
}

/// Share of `total_moves` that should already have happened at `now`, rounded
/// to the nearest move and clamped to `[0, total_moves]`.
pub fn compute_initial_move_index(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    total_moves: u64,
) -> MoveIndex {
    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return MoveIndex(total_moves);
    }
    let elapsed = (now - start).num_milliseconds() as f64 / 1000.0;
    let fraction = elapsed / (total as f64 / 1000.0);
    let index = (total_moves as f64 * fraction).round();
    if index <= 0.0 {
        MoveIndex::INITIAL
    } else if index >= total_moves as f64 {
        MoveIndex(total_moves)
    } else {
        MoveIndex(index as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextDelay {
    pub millis: u64,
    /// Set when the remaining time no longer covers the remaining moves and the
    /// one-second floor applies instead.
    pub floored: bool,
}

impl NextDelay {
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

/// Spreads the time left until `end` evenly over the moves still to make.
pub fn compute_next_delay(
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    total_moves: u64,
    move_index: MoveIndex,
) -> NextDelay {
    let ms_remaining = (end - now).num_milliseconds();
    let moves_remaining = total_moves.saturating_sub(move_index.0);
    let delay = if moves_remaining == 0 {
        0
    } else {
        ms_remaining / i64::try_from(moves_remaining).unwrap_or(i64::MAX)
    };
    if delay <= 0 {
        NextDelay {
            millis: FLOOR_DELAY.as_millis() as u64,
            floored: true,
        }
    } else {
        NextDelay {
            millis: delay as u64,
            floored: false,
        }
    }
}

/// Board after `move_index` moves, built from the closed form rather than by
/// replay. A finished countdown puts every disk on the terminal peg.
pub fn initial_board(
    config: &PuzzleConfig,
    move_index: MoveIndex,
    finished: bool,
) -> [Vec<DiskId>; PEG_COUNT] {
    let mut pegs: [Vec<DiskId>; PEG_COUNT] = Default::default();
    for d in (1..=config.disk_count).rev() {
        let disk = DiskId(d);
        let peg = if finished {
            TERMINAL_PEG
        } else {
            peg_for_disk_at_move(config.disk_count, move_index, disk)
        };
        pegs[peg.0].push(disk);
    }
    pegs
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
