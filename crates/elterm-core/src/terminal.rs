//! Terminal state: two screen buffers, cursor, style and modes.
//!
//! [`Terminal`] is the [`AnsiGrid`] the parser drives. Everything the parser
//! asks for lands on the active buffer; the flush component reads the result
//! back through [`Terminal::screen`] and clears the dirty flag.

use elterm_ansi::{AnsiGrid, Attrs, Cell, ColorPair, Erase, Mode};
use tracing::{debug, info};

use crate::config::TerminalConfig;
use crate::constants::TAB_WIDTH;
use crate::state::{Cursor, ScreenState};

/// Which screen buffer receives output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveBuffer {
    Main,
    Alternate,
}

/// Rendition applied to newly written and erased cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    pub color: ColorPair,
    pub attrs: Attrs,
}

impl Style {
    pub const DEFAULT: Style = Style { color: ColorPair::DEFAULT, attrs: Attrs::empty() };

    pub fn cell(self, ch: u8) -> Cell {
        Cell::new(ch, self.color, self.attrs)
    }

    pub fn blank(self) -> Cell {
        Cell::blank(self.color, self.attrs)
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Mode switches, power-on values in `Default`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalModes {
    pub auto_wrap: bool,
    pub app_keypad: bool,
    pub app_cursor: bool,
    pub insert: bool,
    pub show_cursor: bool,
    pub cursor_blink: bool,
    pub auto_newline: bool,
    /// Recorded only; pasted text is not wrapped.
    pub bracketed_paste: bool,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            auto_wrap: true,
            app_keypad: false,
            app_cursor: false,
            insert: false,
            show_cursor: true,
            cursor_blink: true,
            auto_newline: false,
            bracketed_paste: false,
        }
    }
}

/// DECSC slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SavedCursor {
    cursor: Cursor,
    style: Style,
}

#[derive(Debug)]
pub struct Terminal {
    main: ScreenState,
    alternate: ScreenState,
    active: ActiveBuffer,
    style: Style,
    saved: SavedCursor,
    // 1048 / 1049 slot
    alt_saved: Cursor,
    modes: TerminalModes,
    pending_wrap: bool,
    dirty: bool,
    responses: Vec<u8>,
}

impl Terminal {
    pub fn new(columns: usize, rows: usize, scrollback_rows: usize) -> Self {
        Self {
            main: ScreenState::new(columns, rows, scrollback_rows),
            alternate: ScreenState::new(columns, rows, scrollback_rows),
            active: ActiveBuffer::Main,
            style: Style::DEFAULT,
            saved: SavedCursor::default(),
            alt_saved: Cursor::default(),
            modes: TerminalModes::default(),
            pending_wrap: false,
            dirty: true,
            responses: Vec::new(),
        }
    }

    pub fn from_config(config: &TerminalConfig) -> Self {
        Self::new(config.columns, config.rows, config.scrollback_rows)
    }

    // ===== accessors =====

    /// The active buffer.
    pub fn screen(&self) -> &ScreenState {
        match self.active {
            ActiveBuffer::Main => &self.main,
            ActiveBuffer::Alternate => &self.alternate,
        }
    }

    fn screen_mut(&mut self) -> &mut ScreenState {
        match self.active {
            ActiveBuffer::Main => &mut self.main,
            ActiveBuffer::Alternate => &mut self.alternate,
        }
    }

    pub fn buffer(&self, which: ActiveBuffer) -> &ScreenState {
        match which {
            ActiveBuffer::Main => &self.main,
            ActiveBuffer::Alternate => &self.alternate,
        }
    }

    pub fn active_buffer(&self) -> ActiveBuffer {
        self.active
    }

    pub fn cursor(&self) -> Cursor {
        self.screen().cursor()
    }

    pub fn modes(&self) -> &TerminalModes {
        &self.modes
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn pending_wrap(&self) -> bool {
        self.pending_wrap
    }

    pub fn width(&self) -> usize {
        self.screen().width()
    }

    pub fn rows(&self) -> usize {
        self.screen().rows()
    }

    /// Visible row text, trailing blanks trimmed.
    pub fn row_text(&self, row: usize) -> String {
        self.screen().row_text(row)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn has_responses(&self) -> bool {
        !self.responses.is_empty()
    }

    /// Drain the bytes queued for the host (status and attribute reports).
    pub fn take_responses(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.responses)
    }

    // ===== cursor helpers =====

    /// Explicit positioning: clamps and cancels a deferred wrap.
    fn set_cursor(&mut self, x: usize, y: usize) {
        self.pending_wrap = false;
        self.screen_mut().set_cursor(x, y);
        self.dirty = true;
    }

    /// Move down one row, scrolling the buffer at the bottom.
    fn line_down(&mut self) {
        let blank = self.style.blank();
        let screen = self.screen_mut();
        let Cursor { x, y } = screen.cursor();
        if y + 1 >= screen.rows() {
            screen.scroll_one(blank);
        } else {
            screen.set_cursor(x, y + 1);
        }
        self.pending_wrap = false;
        self.dirty = true;
    }

    /// Step right after a write. Past the last column the cursor stays put
    /// and the wrap is deferred to the next printable byte.
    fn advance(&mut self) {
        let width = self.width();
        let Cursor { x, y } = self.cursor();
        if x + 1 >= width {
            if self.modes.auto_wrap {
                self.pending_wrap = true;
            }
        } else {
            self.screen_mut().set_cursor(x + 1, y);
        }
        self.dirty = true;
    }

    fn wrap_if_pending(&mut self) {
        if self.pending_wrap {
            self.pending_wrap = false;
            if self.modes.auto_wrap {
                let y = self.cursor().y;
                self.screen_mut().set_cursor(0, y);
                self.line_down();
            }
        }
    }

    fn put(&mut self, x: usize, y: usize, cell: Cell) {
        self.screen_mut().put(y, x, cell);
        self.dirty = true;
    }

    fn fill(&mut self, row: usize, from: usize, to: usize) {
        let blank = self.style.blank();
        self.screen_mut().fill_span(row, from, to, blank);
        self.dirty = true;
    }

    fn switch_buffer(&mut self, target: ActiveBuffer) {
        if self.active != target {
            debug!("Switching to {:?} screen buffer", target);
            self.active = target;
            self.pending_wrap = false;
            self.dirty = true;
        }
    }

    /// Power-on state for both buffers, modes and style.
    pub fn full_reset(&mut self) {
        info!("Terminal reset to initial state");
        self.main.clear(Cell::BLANK);
        self.alternate.clear(Cell::BLANK);
        self.active = ActiveBuffer::Main;
        self.style = Style::DEFAULT;
        self.saved = SavedCursor::default();
        self.alt_saved = Cursor::default();
        self.modes = TerminalModes::default();
        self.pending_wrap = false;
        self.dirty = true;
    }
}

impl AnsiGrid for Terminal {
    fn print(&mut self, byte: u8) {
        self.wrap_if_pending();
        if self.modes.insert {
            self.insert_chars(1);
        }
        let Cursor { x, y } = self.cursor();
        self.put(x, y, self.style.cell(byte));
        self.advance();
    }

    fn backspace(&mut self) {
        let Cursor { x, y } = self.cursor();
        if x > 0 {
            self.set_cursor(x - 1, y);
        } else if y > 0 {
            let last = self.width() - 1;
            self.set_cursor(last, y - 1);
        } else {
            self.pending_wrap = false;
        }
    }

    fn carriage_return(&mut self) {
        let y = self.cursor().y;
        self.set_cursor(0, y);
        if self.modes.auto_newline {
            self.line_down();
        }
    }

    fn linefeed(&mut self) {
        self.line_down();
        let y = self.cursor().y;
        self.set_cursor(0, y);
    }

    fn tab(&mut self) {
        self.wrap_if_pending();
        let width = self.width();
        let Cursor { x, y } = self.cursor();
        let stop = (x / TAB_WIDTH + 1) * TAB_WIDTH;
        if stop >= width {
            self.fill(y, x, width);
            self.set_cursor(width - 1, y);
            self.pending_wrap = self.modes.auto_wrap;
        } else {
            self.fill(y, x, stop);
            self.set_cursor(stop, y);
        }
    }

    fn back_tab(&mut self) {
        let Cursor { x, y } = self.cursor();
        let stop = x.saturating_sub(1) / TAB_WIDTH * TAB_WIDTH;
        self.set_cursor(stop, y);
    }

    fn index(&mut self) {
        self.line_down();
    }

    fn next_line(&mut self) {
        self.wrap_if_pending();
        self.linefeed();
    }

    fn reverse_index(&mut self) {
        self.up(1);
    }

    fn save_cursor(&mut self) {
        self.saved = SavedCursor { cursor: self.cursor(), style: self.style };
    }

    fn restore_cursor(&mut self) {
        let SavedCursor { cursor, style } = self.saved;
        self.set_cursor(cursor.x, cursor.y);
        self.style = style;
    }

    fn reset(&mut self) {
        self.full_reset();
    }

    fn set_keypad_mode(&mut self, application: bool) {
        debug!("Application keypad: {}", application);
        self.modes.app_keypad = application;
    }

    fn up(&mut self, n: usize) {
        let Cursor { x, y } = self.cursor();
        self.set_cursor(x, y.saturating_sub(n));
    }

    fn down(&mut self, n: usize) {
        let Cursor { x, y } = self.cursor();
        self.set_cursor(x, y.saturating_add(n));
    }

    fn right(&mut self, n: usize) {
        let Cursor { x, y } = self.cursor();
        self.set_cursor(x.saturating_add(n), y);
    }

    fn left(&mut self, n: usize) {
        let Cursor { x, y } = self.cursor();
        self.set_cursor(x.saturating_sub(n), y);
    }

    fn move_to_column(&mut self, col: usize) {
        let y = self.cursor().y;
        self.set_cursor(col, y);
    }

    fn move_to_row(&mut self, row: usize) {
        let x = self.cursor().x;
        self.set_cursor(x, row);
    }

    fn move_abs(&mut self, row: usize, col: usize) {
        self.set_cursor(col, row);
    }

    fn cursor_position(&self) -> (usize, usize) {
        let Cursor { x, y } = self.cursor();
        (y, x)
    }

    fn erase_in_line(&mut self, extent: Erase) {
        let width = self.width();
        let Cursor { x, y } = self.cursor();
        match extent {
            Erase::ToEnd => self.fill(y, x, width),
            Erase::ToStart => self.fill(y, 0, x + 1),
            Erase::All => self.fill(y, 0, width),
        }
    }

    fn erase_in_display(&mut self, extent: Erase) {
        let (width, rows) = (self.width(), self.rows());
        let Cursor { x, y } = self.cursor();
        match extent {
            Erase::ToEnd => {
                self.fill(y, x, width);
                for row in y + 1..rows {
                    self.fill(row, 0, width);
                }
            }
            Erase::ToStart => {
                for row in 0..y {
                    self.fill(row, 0, width);
                }
                self.fill(y, 0, x + 1);
            }
            Erase::All => {
                for row in 0..rows {
                    self.fill(row, 0, width);
                }
            }
        }
    }

    fn insert_lines(&mut self, n: usize) {
        let blank = self.style.blank();
        let y = self.cursor().y;
        self.screen_mut().insert_lines(y, n, blank);
        self.dirty = true;
    }

    fn delete_lines(&mut self, n: usize) {
        let blank = self.style.blank();
        let y = self.cursor().y;
        self.screen_mut().delete_lines(y, n, blank);
        self.dirty = true;
    }

    fn insert_chars(&mut self, n: usize) {
        let blank = self.style.blank();
        let Cursor { x, y } = self.cursor();
        let row = self.screen_mut().row_mut(y);
        let width = row.len();
        let n = n.min(width - x);
        row.copy_within(x..width - n, x + n);
        row[x..x + n].fill(blank);
        self.dirty = true;
    }

    fn delete_chars(&mut self, n: usize) {
        let blank = self.style.blank();
        let Cursor { x, y } = self.cursor();
        let row = self.screen_mut().row_mut(y);
        let width = row.len();
        let n = n.min(width - x);
        row.copy_within(x + n..width, x);
        row[width - n..].fill(blank);
        self.dirty = true;
    }

    fn erase_chars(&mut self, n: usize) {
        let Cursor { x, y } = self.cursor();
        self.fill(y, x, x.saturating_add(n));
    }

    fn scroll_up(&mut self, n: usize) {
        let blank = self.style.blank();
        self.screen_mut().delete_lines(0, n, blank);
        self.dirty = true;
    }

    fn scroll_down(&mut self, n: usize) {
        let blank = self.style.blank();
        self.screen_mut().insert_lines(0, n, blank);
        self.dirty = true;
    }

    fn reset_attrs(&mut self) {
        self.style = Style::DEFAULT;
    }

    fn set_attr(&mut self, attr: Attrs, enable: bool) {
        self.style.attrs.set(attr, enable);
    }

    fn set_fg(&mut self, index: u8) {
        self.style.color = self.style.color.with_fg(index);
    }

    fn set_bg(&mut self, index: u8) {
        self.style.color = self.style.color.with_bg(index);
    }

    fn set_mode(&mut self, mode: Mode, enable: bool) {
        debug!("Mode {:?} -> {}", mode, enable);
        match mode {
            Mode::Insert => self.modes.insert = enable,
            Mode::AutoNewline => self.modes.auto_newline = enable,
            Mode::AppCursorKeys => self.modes.app_cursor = enable,
            Mode::AutoWrap => self.modes.auto_wrap = enable,
            Mode::CursorBlink => {
                self.modes.cursor_blink = enable;
                self.dirty = true;
            }
            Mode::ShowCursor => {
                self.modes.show_cursor = enable;
                self.dirty = true;
            }
            Mode::AltScreen => {
                let target = if enable { ActiveBuffer::Alternate } else { ActiveBuffer::Main };
                self.switch_buffer(target);
            }
            Mode::SaveCursor => {
                if enable {
                    self.alt_saved = self.cursor();
                } else {
                    let Cursor { x, y } = self.alt_saved;
                    self.set_cursor(x, y);
                }
            }
            Mode::AltScreenSaveCursor => {
                if enable {
                    self.alt_saved = self.main.cursor();
                    self.switch_buffer(ActiveBuffer::Alternate);
                    let blank = self.style.blank();
                    self.alternate.clear(blank);
                    self.dirty = true;
                } else {
                    self.switch_buffer(ActiveBuffer::Main);
                    let Cursor { x, y } = self.alt_saved;
                    self.set_cursor(x, y);
                }
            }
            Mode::BracketedPaste => self.modes.bracketed_paste = enable,
        }
    }

    fn respond(&mut self, bytes: &[u8]) {
        self.responses.extend_from_slice(bytes);
    }
}
