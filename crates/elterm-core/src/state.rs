// src/state.rs
use elterm_ansi::Cell;

use crate::grid::{CellGrid, CircularIndex};

/// Cursor position in visible coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

/// One screen buffer: cells, cursor and the circular row offset.
///
/// The grid holds `rows + scrollback` physical rows. Visible row `v` lives at
/// physical row `(v + row_offset) % height`, so scrolling the whole screen is
/// a single offset bump plus clearing the newly exposed row.
#[derive(Clone, Debug)]
pub struct ScreenState {
    grid: CellGrid,
    rows: usize,
    cursor: Cursor,
    row_offset: CircularIndex,
}

impl ScreenState {
    /// Every dimension is raised to at least one.
    pub fn new(columns: usize, rows: usize, scrollback_rows: usize) -> Self {
        let (columns, rows) = (columns.max(1), rows.max(1));
        let height = rows + scrollback_rows.max(1);
        Self {
            grid: CellGrid::new(columns, height),
            rows,
            cursor: Cursor::default(),
            row_offset: CircularIndex::new(height),
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Visible rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset.value()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Move the cursor, clamped to the viewport.
    pub fn set_cursor(&mut self, x: usize, y: usize) {
        self.cursor.x = x.min(self.width().saturating_sub(1));
        self.cursor.y = y.min(self.rows.saturating_sub(1));
    }

    pub fn physical_row(&self, visible: usize) -> usize {
        self.row_offset.offset(visible)
    }

    pub fn cell(&self, visible: usize, col: usize) -> Option<&Cell> {
        self.grid.get(self.physical_row(visible), col)
    }

    pub fn put(&mut self, visible: usize, col: usize, cell: Cell) {
        let row = self.physical_row(visible);
        self.grid.set(row, col, cell);
    }

    pub fn row(&self, visible: usize) -> &[Cell] {
        self.grid.row(self.physical_row(visible))
    }

    pub fn row_mut(&mut self, visible: usize) -> &mut [Cell] {
        let row = self.physical_row(visible);
        self.grid.row_mut(row)
    }

    pub fn row_text(&self, visible: usize) -> String {
        self.grid.row_text(self.physical_row(visible))
    }

    /// Blank columns `from..to` of a visible row.
    pub fn fill_span(&mut self, visible: usize, from: usize, to: usize, blank: Cell) {
        let row = self.row_mut(visible);
        let to = to.min(row.len());
        if from < to {
            row[from..to].fill(blank);
        }
    }

    /// Scroll the viewport up by one row in O(width): the old top row falls
    /// into scrollback and the new bottom row is blanked.
    pub fn scroll_one(&mut self, blank: Cell) {
        self.row_offset.advance(1);
        let bottom = self.physical_row(self.rows - 1);
        self.grid.fill_row(bottom, blank);
    }

    /// Shift visible rows `at..` down by `n`, blanking the opened rows.
    /// Rows pushed past the bottom of the viewport are lost.
    pub fn insert_lines(&mut self, at: usize, n: usize, blank: Cell) {
        if at >= self.rows {
            return;
        }
        let n = n.min(self.rows - at);
        for v in (at + n..self.rows).rev() {
            let (src, dst) = (self.physical_row(v - n), self.physical_row(v));
            self.grid.copy_row(src, dst);
        }
        for v in at..at + n {
            let row = self.physical_row(v);
            self.grid.fill_row(row, blank);
        }
    }

    /// Remove `n` visible rows starting at `at`, pulling the rest up and
    /// blanking the rows exposed at the bottom of the viewport.
    pub fn delete_lines(&mut self, at: usize, n: usize, blank: Cell) {
        if at >= self.rows {
            return;
        }
        let n = n.min(self.rows - at);
        for v in at..self.rows - n {
            let (src, dst) = (self.physical_row(v + n), self.physical_row(v));
            self.grid.copy_row(src, dst);
        }
        for v in self.rows - n..self.rows {
            let row = self.physical_row(v);
            self.grid.fill_row(row, blank);
        }
    }

    /// Blank the whole buffer, scrollback included, and home everything.
    pub fn clear(&mut self, blank: Cell) {
        self.grid.fill(blank);
        self.cursor = Cursor::default();
        self.row_offset.reset();
    }
}
