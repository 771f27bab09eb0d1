//! Terminal rendering of puzzle events.
//!
//! The renderer keeps its own copy of the board, initialised from
//! `board_initialized` and updated by every `move_applied`, so it never reads
//! scheduler state directly.

use anyhow::{anyhow, Context};
use shared::{
    domain::{BoardSnapshot, DiskId, PegIndex, PALETTE_SIZE},
    protocol::PuzzleEvent,
};

use crate::config::OutputFormat;

pub struct Renderer {
    format: OutputFormat,
    board: Option<BoardSnapshot>,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            board: None,
        }
    }

    pub fn board(&self) -> Option<&BoardSnapshot> {
        self.board.as_ref()
    }

    /// Folds `event` into the local board and returns the lines to print, or
    /// `None` for a move the board already contains (replayed after a redraw).
    pub fn render(&mut self, event: &PuzzleEvent) -> anyhow::Result<Option<String>> {
        if !self.apply(event)? {
            return Ok(None);
        }
        let output = match self.format {
            OutputFormat::Json => serde_json::to_string(event).context("failed to encode event")?,
            OutputFormat::Text => self.describe(event),
        };
        Ok(Some(output))
    }

    fn apply(&mut self, event: &PuzzleEvent) -> anyhow::Result<bool> {
        match event {
            PuzzleEvent::BoardInitialized(snapshot) => {
                self.board = Some(snapshot.clone());
            }
            PuzzleEvent::MoveApplied {
                from,
                to,
                disk,
                move_index,
            } => {
                let board = self
                    .board
                    .as_mut()
                    .ok_or_else(|| anyhow!("move {move_index} arrived before the board"))?;
                if *move_index <= board.move_index {
                    return Ok(false);
                }
                match board.pegs[from.0].pop() {
                    Some(top) if top == *disk => board.pegs[to.0].push(top),
                    other => {
                        return Err(anyhow!(
                            "move {move_index} expected disk {disk} on peg {from}, found {other:?}"
                        ))
                    }
                }
                board.move_index = *move_index;
            }
            PuzzleEvent::Completed => {}
        }
        Ok(true)
    }

    fn describe(&self, event: &PuzzleEvent) -> String {
        if matches!(event, PuzzleEvent::Completed) {
            return "Done!".to_string();
        }
        let Some(board) = &self.board else {
            return String::new();
        };
        let total = board.config.total_moves;
        match event {
            PuzzleEvent::BoardInitialized(_) => format!(
                "{} disks, {} moves, starting at move {}\n{}",
                board.config.disk_count,
                total,
                board.move_index,
                draw_board(board)
            ),
            PuzzleEvent::MoveApplied {
                from,
                to,
                disk,
                move_index,
            } => format!(
                "move {move_index}/{total}: disk {disk} {from} -> {to}\n{}",
                draw_board(board)
            ),
            PuzzleEvent::Completed => String::new(),
        }
    }
}

const MAX_DISK_CELLS: u32 = 20;

/// One fill character per palette slot, largest disk first.
const PALETTE_FILL: [char; PALETTE_SIZE as usize] = ['=', '#', '*', '+', '~', '%'];

/// One row per peg, disks bottom to top, each as wide as its size allows.
pub fn draw_board(board: &BoardSnapshot) -> String {
    PegIndex::all()
        .map(|peg| {
            let disks = board.pegs[peg.0]
                .iter()
                .map(|&disk| draw_disk(disk, board.config.disk_count))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{peg} |{disks}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn draw_disk(disk: DiskId, disk_count: u32) -> String {
    let cells = (disk.width_percent(disk_count) * MAX_DISK_CELLS / 100).max(1);
    let fill = PALETTE_FILL[disk.palette_slot(disk_count) as usize];
    fill.to_string().repeat(cells as usize)
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
