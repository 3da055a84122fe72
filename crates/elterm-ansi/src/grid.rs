use bitflags::bitflags;

use crate::color::ColorPair;

bitflags! {
    /// Rendition flags carried by every cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Attrs: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const SLOW_BLINK = 1 << 4;
        const FAST_BLINK = 1 << 5;
        const INVERT = 1 << 6;
    }
}

/// Grid cell with styling information
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: u8,
    pub color: ColorPair,
    pub attrs: Attrs,
}

impl Cell {
    /// Space in the default colors, no attributes.
    pub const BLANK: Cell = Cell::new(b' ', ColorPair::DEFAULT, Attrs::empty());

    pub const fn new(ch: u8, color: ColorPair, attrs: Attrs) -> Self {
        Self { ch, color, attrs }
    }

    /// A space carrying the given style, used by every erase/fill operation.
    pub const fn blank(color: ColorPair, attrs: Attrs) -> Self {
        Self::new(b' ', color, attrs)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Extent of an erase-in-line (`K`) or erase-in-display (`J`) request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Erase {
    /// Cursor to the end, cursor included.
    ToEnd,
    /// Start to the cursor, cursor included.
    ToStart,
    All,
}

impl Erase {
    pub fn from_param(param: u32) -> Self {
        match param {
            0 => Erase::ToEnd,
            1 => Erase::ToStart,
            _ => Erase::All,
        }
    }
}

/// Terminal modes reachable through `CSI h` / `CSI l` (ANSI) and
/// `CSI ? h` / `CSI ? l` (DEC private).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// ANSI 4 (IRM)
    Insert,
    /// ANSI 20 (LNM)
    AutoNewline,
    /// DEC 1 (DECCKM)
    AppCursorKeys,
    /// DEC 7 (DECAWM)
    AutoWrap,
    /// DEC 12
    CursorBlink,
    /// DEC 25 (DECTCEM)
    ShowCursor,
    /// DEC 47 and 1047: switch buffers, nothing else
    AltScreen,
    /// DEC 1048: save or restore the cursor only
    SaveCursor,
    /// DEC 1049: cursor save/restore plus a cleared alternate buffer
    AltScreenSaveCursor,
    /// DEC 2004
    BracketedPaste,
}

impl Mode {
    pub fn ansi(number: u32) -> Option<Self> {
        match number {
            4 => Some(Mode::Insert),
            20 => Some(Mode::AutoNewline),
            _ => None,
        }
    }

    pub fn dec(number: u32) -> Option<Self> {
        match number {
            1 => Some(Mode::AppCursorKeys),
            7 => Some(Mode::AutoWrap),
            12 => Some(Mode::CursorBlink),
            25 => Some(Mode::ShowCursor),
            47 | 1047 => Some(Mode::AltScreen),
            1048 => Some(Mode::SaveCursor),
            1049 => Some(Mode::AltScreenSaveCursor),
            2004 => Some(Mode::BracketedPaste),
            _ => None,
        }
    }
}

/// Operations the parser performs on terminal state.
///
/// Counts and coordinates arrive already defaulted and zero-based; clamping
/// to the screen is the implementor's job.
pub trait AnsiGrid {
    /// Write a printable byte at the cursor and advance.
    fn print(&mut self, byte: u8);
    fn backspace(&mut self);
    fn carriage_return(&mut self);
    fn linefeed(&mut self);
    fn tab(&mut self);
    fn back_tab(&mut self);
    fn bell(&mut self) {}

    /// `ESC D`
    fn index(&mut self);
    /// `ESC E`
    fn next_line(&mut self);
    /// `ESC M`
    fn reverse_index(&mut self);
    fn save_cursor(&mut self);
    fn restore_cursor(&mut self);
    /// `ESC c`: back to power-on state.
    fn reset(&mut self);
    fn set_keypad_mode(&mut self, _application: bool) {}

    fn up(&mut self, n: usize);
    fn down(&mut self, n: usize);
    fn right(&mut self, n: usize);
    fn left(&mut self, n: usize);
    fn move_to_column(&mut self, col: usize);
    fn move_to_row(&mut self, row: usize);
    fn move_abs(&mut self, row: usize, col: usize);
    /// Cursor as `(row, col)`, zero-based.
    fn cursor_position(&self) -> (usize, usize);

    fn erase_in_line(&mut self, extent: Erase);
    fn erase_in_display(&mut self, extent: Erase);
    fn insert_lines(&mut self, n: usize);
    fn delete_lines(&mut self, n: usize);
    fn insert_chars(&mut self, n: usize);
    fn delete_chars(&mut self, n: usize);
    fn erase_chars(&mut self, n: usize);
    fn scroll_up(&mut self, n: usize);
    fn scroll_down(&mut self, n: usize);

    fn reset_attrs(&mut self);
    fn set_attr(&mut self, attr: Attrs, enable: bool);
    fn set_fg(&mut self, index: u8);
    fn set_bg(&mut self, index: u8);

    fn set_mode(&mut self, mode: Mode, enable: bool);
    /// DECSTBM. Scroll regions are not supported by the terminal core.
    fn set_scroll_region(&mut self, _top: usize, _bottom: usize) {}

    /// Bytes to send back to the host (status and attribute reports).
    fn respond(&mut self, bytes: &[u8]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dec_alternate_screen_aliases() {
        assert_eq!(Mode::dec(47), Some(Mode::AltScreen));
        assert_eq!(Mode::dec(1047), Some(Mode::AltScreen));
        assert_eq!(Mode::dec(1049), Some(Mode::AltScreenSaveCursor));
        assert_eq!(Mode::dec(4), None);
    }

    #[test]
    fn ansi_table_is_separate_from_dec() {
        assert_eq!(Mode::ansi(4), Some(Mode::Insert));
        assert_eq!(Mode::ansi(25), None);
        assert_eq!(Mode::ansi(20), Some(Mode::AutoNewline));
    }

    #[test]
    fn erase_extent_fallback_is_all() {
        assert_eq!(Erase::from_param(0), Erase::ToEnd);
        assert_eq!(Erase::from_param(1), Erase::ToStart);
        assert_eq!(Erase::from_param(3), Erase::All);
    }

    #[test]
    fn blank_cell_is_space() {
        assert_eq!(Cell::default().ch, b' ');
        assert_eq!(Cell::default().color, ColorPair::DEFAULT);
        assert!(Cell::default().attrs.is_empty());
    }
}
