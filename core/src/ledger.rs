//! Per-character correctness ledger.
//!
//! The ledger holds one `Cell` per character of the reference text plus a
//! cursor marking the next cell to be judged. Cells before the cursor are
//! always `Correct` or `Incorrect`; cells at or after it are always `Untyped`.
//! Line breaks are ordinary cells holding `'\n'`.

use serde::{Deserialize, Serialize};

/// Judgement recorded for a single reference character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellStatus {
    /// Not reached yet (or reached and then backspaced over)
    Untyped,
    /// Typed character matched the expected one
    Correct,
    /// Typed character differed from the expected one
    Incorrect,
}

impl Default for CellStatus {
    fn default() -> Self {
        Self::Untyped
    }
}

/// One reference character and its judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub expected: char,
    pub status: CellStatus,
}

impl Cell {
    pub fn new(expected: char) -> Self {
        Self {
            expected,
            status: CellStatus::Untyped,
        }
    }

    pub fn is_line_break(&self) -> bool {
        self.expected == '\n'
    }
}

/// Ordered cells plus the cursor. Cloning a ledger is a deep copy, which is
/// what history snapshots rely on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ledger {
    cells: Vec<Cell>,
    cursor: usize,
}

impl Ledger {
    /// Create an all-`Untyped` ledger for `text` with the cursor at 0.
    pub fn new(text: &str) -> Self {
        Self {
            cells: text.chars().map(Cell::new).collect(),
            cursor: 0,
        }
    }

    /// Create a ledger resumed at `cursor`.
    ///
    /// A checkpoint only stores a position, so every cell before it is marked
    /// `Correct` regardless of what was actually typed in the earlier session.
    /// Cursors past the end are clamped to the text length.
    pub fn resumed(text: &str, cursor: usize) -> Self {
        let mut ledger = Self::new(text);
        let cursor = cursor.min(ledger.cells.len());
        for cell in &mut ledger.cells[..cursor] {
            cell.status = CellStatus::Correct;
        }
        ledger.cursor = cursor;
        ledger
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Index of the next cell to be judged.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when the cursor has reached the end of a non-empty ledger.
    pub fn is_complete(&self) -> bool {
        !self.cells.is_empty() && self.cursor == self.cells.len()
    }

    /// The cell the cursor points at, `None` once complete.
    pub fn expected(&self) -> Option<char> {
        self.cells.get(self.cursor).map(|c| c.expected)
    }

    /// `cursor / len * 100`, or 0 for an empty ledger.
    pub fn progress_percent(&self) -> f64 {
        if self.cells.is_empty() {
            0.0
        } else {
            self.cursor as f64 / self.cells.len() as f64 * 100.0
        }
    }

    pub fn count(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|c| c.status == status).count()
    }

    /// Judge `typed` against the cell under the cursor and advance.
    /// Returns `false` without touching anything when already complete.
    pub(crate) fn judge(&mut self, typed: char) -> bool {
        let Some(cell) = self.cells.get_mut(self.cursor) else {
            return false;
        };
        cell.status = if cell.expected == typed {
            CellStatus::Correct
        } else {
            CellStatus::Incorrect
        };
        self.cursor += 1;
        true
    }

    /// Step the cursor back one cell and mark that cell `Untyped`.
    /// Returns `false` at cursor 0.
    pub(crate) fn retract(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.cells[self.cursor].status = CellStatus::Untyped;
        true
    }

    /// The reference text this ledger was built from.
    pub fn reference(&self) -> String {
        self.cells.iter().map(|c| c.expected).collect()
    }
}
