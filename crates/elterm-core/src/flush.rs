//! Front mirror and incremental redraw.
//!
//! The mirror remembers what the display currently shows. A flush walks the
//! active buffer, draws only the cells that differ and then brings the cursor
//! highlight up to date.

use elterm_ansi::Cell;
use tracing::trace;

use crate::state::Cursor;
use crate::terminal::{ActiveBuffer, Terminal, TerminalModes};
use crate::traits::Renderer;

#[derive(Debug)]
pub struct ScreenMirror {
    width: usize,
    height: usize,
    // None = unknown, always redrawn
    cells: Vec<Option<Cell>>,
    buffer: Option<ActiveBuffer>,
    cursor: Cursor,
    row_offset: usize,
    cursor_color: u8,
    blink_on: bool,
    cursor_shown: bool,
    scroll_change: Option<usize>,
}

impl ScreenMirror {
    pub fn new(cursor_color: u8) -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
            buffer: None,
            cursor: Cursor::default(),
            row_offset: 0,
            cursor_color,
            blink_on: false,
            cursor_shown: false,
            scroll_change: None,
        }
    }

    /// Forget everything shown, so the next flush repaints every cell.
    pub fn invalidate(&mut self) {
        self.cells.fill(None);
        self.buffer = None;
        self.cursor_shown = false;
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Row offset recorded by the last flush, if it moved since the previous
    /// call. Hardware-scrolling displays read this.
    pub fn take_scroll_change(&mut self) -> Option<usize> {
        self.scroll_change.take()
    }

    fn physical_row(&self, cursor: Cursor, row_offset: usize) -> usize {
        (cursor.y + row_offset) % self.height.max(1)
    }

    fn cursor_visible(&self, modes: &TerminalModes) -> bool {
        modes.show_cursor && (self.blink_on || !modes.cursor_blink)
    }

    fn draw_cell(renderer: &mut dyn Renderer, col: usize, row: usize, cell: Cell) {
        renderer.draw_glyph(col, row, cell.ch, cell.color.fg(), cell.color.bg(), cell.attrs);
    }

    fn show_cursor(&mut self, renderer: &mut dyn Renderer) {
        let row = self.physical_row(self.cursor, self.row_offset);
        let col = self.cursor.x;
        renderer.fill_rect(col, row, col + 1, row + 1, self.cursor_color);
        self.cursor_shown = true;
    }

    fn hide_cursor(&mut self, renderer: &mut dyn Renderer) {
        let row = self.physical_row(self.cursor, self.row_offset);
        let col = self.cursor.x;
        let cell = self
            .cells
            .get(row * self.width + col)
            .copied()
            .flatten()
            .unwrap_or(Cell::BLANK);
        Self::draw_cell(renderer, col, row, cell);
        self.cursor_shown = false;
    }

    fn sync_geometry(&mut self, terminal: &Terminal) {
        let grid = terminal.screen().grid();
        if grid.width() != self.width || grid.height() != self.height {
            self.width = grid.width();
            self.height = grid.height();
            self.cells = vec![None; self.width * self.height];
            self.buffer = None;
            self.cursor_shown = false;
        }
        if self.buffer != Some(terminal.active_buffer()) {
            trace!("Mirror invalidated for {:?} buffer", terminal.active_buffer());
            self.cells.fill(None);
            self.buffer = Some(terminal.active_buffer());
            self.cursor_shown = false;
        }
    }

    /// Draw up to `budget` changed cells, then update the cursor highlight.
    ///
    /// Returns the number of cells drawn. When the budget runs out the
    /// terminal stays dirty and the next call carries on.
    pub fn flush(&mut self, terminal: &mut Terminal, renderer: &mut dyn Renderer, budget: usize) -> usize {
        self.sync_geometry(terminal);

        let cursor_index = self.physical_row(self.cursor, self.row_offset) * self.width + self.cursor.x;
        let mut cursor_overwritten = false;
        let mut drawn = 0;

        let mut exhausted = false;
        let cells = terminal.screen().grid().cells();
        for (index, (shown, cell)) in self.cells.iter_mut().zip(cells).enumerate() {
            if *shown == Some(*cell) {
                continue;
            }
            if drawn == budget {
                exhausted = true;
                break;
            }
            *shown = Some(*cell);
            Self::draw_cell(renderer, index % self.width, index / self.width, *cell);
            cursor_overwritten |= index == cursor_index;
            drawn += 1;
        }

        if exhausted {
            if cursor_overwritten && self.cursor_shown {
                self.show_cursor(renderer);
            }
            trace!("Flush budget exhausted after {} cells", drawn);
            return drawn;
        }

        let cursor = terminal.cursor();
        let row_offset = terminal.screen().row_offset();
        let visible = self.cursor_visible(terminal.modes());
        let moved = cursor != self.cursor || row_offset != self.row_offset;

        if moved || visible != self.cursor_shown || cursor_overwritten {
            if self.cursor_shown && !cursor_overwritten {
                self.hide_cursor(renderer);
            }
            if row_offset != self.row_offset {
                self.scroll_change = Some(row_offset);
            }
            self.cursor = cursor;
            self.row_offset = row_offset;
            if visible {
                self.show_cursor(renderer);
            } else {
                self.cursor_shown = false;
            }
        }

        terminal.mark_clean();
        if drawn > 0 {
            trace!("Flushed {} cells", drawn);
        }
        drawn
    }

    /// Set the blink phase and redraw the highlight to match.
    pub fn set_cursor_phase(&mut self, on: bool, terminal: &Terminal, renderer: &mut dyn Renderer) {
        self.blink_on = on;
        self.refresh_cursor(terminal, renderer);
    }

    pub fn cursor_phase(&self) -> bool {
        self.blink_on
    }

    /// Draw or erase the highlight at the mirrored cursor position according
    /// to the show-cursor and blink modes.
    pub fn refresh_cursor(&mut self, terminal: &Terminal, renderer: &mut dyn Renderer) {
        if self.buffer.is_none() {
            return;
        }
        if self.cursor_visible(terminal.modes()) {
            self.show_cursor(renderer);
        } else if self.cursor_shown {
            self.hide_cursor(renderer);
        }
    }
}

/// Per-frame pixel scroll that chases the row offset.
///
/// More than one row behind, it jumps to one row short of the target, then
/// creeps a pixel per frame. Scrolling only ever moves forward through the
/// circular frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmoothScroll {
    position: usize,
    span: usize,
    row_height: usize,
}

impl SmoothScroll {
    pub fn new(buffer_rows: usize, row_height: usize) -> Self {
        Self {
            position: 0,
            span: (buffer_rows * row_height).max(1),
            row_height,
        }
    }

    /// Current scroll position in pixel lines.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Advance one frame toward `row_offset` and return the new position.
    pub fn step(&mut self, row_offset: usize) -> usize {
        let target = (row_offset * self.row_height) % self.span;
        if self.position != target {
            let ahead = (target + self.span - self.position) % self.span;
            let next = if ahead > self.row_height {
                target + self.span - self.row_height
            } else {
                self.position + 1
            };
            self.position = next % self.span;
        }
        self.position
    }
}
