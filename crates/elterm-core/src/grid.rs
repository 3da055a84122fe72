// src/grid.rs
use elterm_ansi::Cell;

/// Index into a ring of `modulus` slots. All row wraparound arithmetic goes
/// through here so the value can never escape `0..modulus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircularIndex {
    value: usize,
    modulus: usize,
}

impl CircularIndex {
    /// `modulus` must be non-zero.
    pub fn new(modulus: usize) -> Self {
        debug_assert!(modulus > 0);
        Self { value: 0, modulus: modulus.max(1) }
    }

    pub fn value(self) -> usize {
        self.value
    }

    pub fn modulus(self) -> usize {
        self.modulus
    }

    /// Move forward by `n` slots, wrapping.
    pub fn advance(&mut self, n: usize) {
        self.value = self.offset(n);
    }

    /// The slot `n` positions after this one.
    pub fn offset(self, n: usize) -> usize {
        (self.value + n % self.modulus) % self.modulus
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

/// Flat row-major cell storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>, // Flat storage for better cache locality
}

impl CellGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        if col >= self.width {
            return None;
        }
        self.cells.get(row * self.width + col)
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if col < self.width {
            if let Some(slot) = self.cells.get_mut(row * self.width + col) {
                *slot = cell;
            }
        }
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        let start = (row * self.width).min(self.cells.len());
        let end = (start + self.width).min(self.cells.len());
        &self.cells[start..end]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [Cell] {
        let start = (row * self.width).min(self.cells.len());
        let end = (start + self.width).min(self.cells.len());
        &mut self.cells[start..end]
    }

    pub fn fill_row(&mut self, row: usize, cell: Cell) {
        self.row_mut(row).fill(cell);
    }

    /// Overwrite row `dst` with the contents of row `src`.
    pub fn copy_row(&mut self, src: usize, dst: usize) {
        if src == dst || src >= self.height || dst >= self.height {
            return;
        }
        let w = self.width;
        self.cells.copy_within(src * w..(src + 1) * w, dst * w);
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Row text with trailing spaces trimmed, for tests and debugging.
    pub fn row_text(&self, row: usize) -> String {
        let text: String = self.row(row).iter().map(|c| c.ch as char).collect();
        text.trim_end_matches(' ').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elterm_ansi::{Attrs, ColorPair};

    #[test]
    fn circular_index_wraps() {
        let mut idx = CircularIndex::new(32);
        idx.advance(31);
        assert_eq!(idx.value(), 31);
        idx.advance(1);
        assert_eq!(idx.value(), 0);
        idx.advance(65);
        assert_eq!(idx.value(), 1);
        assert_eq!(idx.offset(31), 0);
        assert_eq!(idx.offset(usize::MAX), (1 + usize::MAX % 32) % 32);
    }

    #[test]
    fn new_grid_is_blank() {
        let grid = CellGrid::new(80, 32);
        assert_eq!(grid.cells().len(), 80 * 32);
        assert!(grid.cells().iter().all(|c| *c == Cell::BLANK));
        assert_eq!(grid.row_text(5), "");
    }

    #[test]
    fn out_of_bounds_access_is_ignored() {
        let mut grid = CellGrid::new(4, 2);
        grid.set(5, 0, Cell::new(b'x', ColorPair::DEFAULT, Attrs::empty()));
        grid.set(0, 4, Cell::new(b'x', ColorPair::DEFAULT, Attrs::empty()));
        assert!(grid.get(0, 4).is_none());
        assert!(grid.get(2, 0).is_none());
        assert!(grid.row(9).is_empty());
        assert!(grid.cells().iter().all(|c| c.ch == b' '));
    }

    #[test]
    fn copy_and_fill_rows() {
        let mut grid = CellGrid::new(3, 3);
        grid.set(0, 1, Cell::new(b'a', ColorPair::new(1, 2), Attrs::BOLD));
        grid.copy_row(0, 2);
        assert_eq!(grid.get(2, 1).map(|c| c.ch), Some(b'a'));
        assert_eq!(grid.get(2, 1).map(|c| c.attrs), Some(Attrs::BOLD));

        grid.fill_row(0, Cell::blank(ColorPair::new(3, 4), Attrs::empty()));
        assert_eq!(grid.row_text(0), "");
        assert_eq!(grid.get(0, 0).map(|c| c.color.bg()), Some(4));
        assert_eq!(grid.row_text(2), " a");
    }
}
