use serde::{Deserialize, Serialize};

/// Number of pegs on every board.
pub const PEG_COUNT: usize = 3;

/// Pegs are numbered left to right; the rightmost one receives the solved tower.
pub const TERMINAL_PEG: PegIndex = PegIndex(2);

macro_rules! index_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

index_newtype!(PegIndex, usize);
index_newtype!(DiskId, u32);
index_newtype!(MoveIndex, u64);

impl PegIndex {
    pub fn all() -> impl Iterator<Item = PegIndex> {
        (0..PEG_COUNT).map(PegIndex)
    }
}

/// Six disk colours cycle from the largest disk upwards.
pub const PALETTE_SIZE: u32 = 6;

impl DiskId {
    /// Disk width as a percentage of the widest disk.
    pub fn width_percent(self, disk_count: u32) -> u32 {
        if disk_count == 0 {
            return 0;
        }
        self.0 * 100 / disk_count
    }

    pub fn palette_slot(self, disk_count: u32) -> u32 {
        disk_count.saturating_sub(self.0) % PALETTE_SIZE
    }
}

impl MoveIndex {
    pub const INITIAL: MoveIndex = MoveIndex(0);

    pub fn next(self) -> MoveIndex {
        MoveIndex(self.0 + 1)
    }
}

/// Relocation of the top disk of `from` onto `to`, numbered by `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: PegIndex,
    pub to: PegIndex,
    pub index: MoveIndex,
}

/// Derived once per reset from the countdown span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleConfig {
    pub disk_count: u32,
    pub total_moves: u64,
}

impl PuzzleConfig {
    pub fn new(disk_count: u32) -> Self {
        Self {
            disk_count,
            total_moves: (1u64 << disk_count) - 1,
        }
    }

    pub fn solved_at(&self) -> MoveIndex {
        MoveIndex(self.total_moves)
    }
}

/// Full board as seen by a renderer. Each stack is listed bottom to top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub config: PuzzleConfig,
    pub move_index: MoveIndex,
    pub pegs: [Vec<DiskId>; PEG_COUNT],
}

impl BoardSnapshot {
    pub fn is_solved(&self) -> bool {
        self.pegs[TERMINAL_PEG.0].len() as u32 == self.config.disk_count
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
