use std::fmt;

use crate::color::{DEFAULT_BG, DEFAULT_FG};
use crate::grid::{AnsiGrid, Attrs, Erase, Mode};

/// Errors that can occur during ANSI parsing
///
/// None of them is fatal: the offending sequence is dropped and the parser
/// carries on from `Normal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnsiError {
    /// A numeric argument had more than MAX_ARG_DIGITS digits
    ArgumentTooLong { digits: usize },
    /// More than MAX_ARGS arguments in one CSI sequence
    TooManyArguments { count: usize },
    /// Unknown byte after ESC
    UnknownEscape { byte: u8 },
    /// Unknown CSI final byte
    UnknownCsi { byte: u8 },
    UnsupportedSgr { code: u32 },
    UnsupportedMode { mode: u32, private: bool },
    UnsupportedStatusReport { code: u32 },
    /// Non-digit, non-`;` byte in an OSC header
    UnexpectedOscByte { byte: u8 },
    UnsupportedOsc { kind: u32 },
    /// OSC payload exceeded MAX_OSC_LEN
    OscTooLong { length: usize },
}

impl fmt::Display for AnsiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnsiError::ArgumentTooLong { digits } => {
                write!(f, "CSI argument too long: {} digits (max {})", digits, MAX_ARG_DIGITS)
            }
            AnsiError::TooManyArguments { count } => {
                write!(f, "Too many arguments ({}) in one CSI sequence (max {})", count, MAX_ARGS)
            }
            AnsiError::UnknownEscape { byte } => {
                write!(f, "Unsupported escape sequence: {:?} ({})", *byte as char, byte)
            }
            AnsiError::UnknownCsi { byte } => {
                write!(f, "Unsupported CSI sequence: {:?} ({})", *byte as char, byte)
            }
            AnsiError::UnsupportedSgr { code } => write!(f, "Unsupported SGR code: {}", code),
            AnsiError::UnsupportedMode { mode, private } => {
                let class = if *private { "DEC" } else { "ANSI" };
                write!(f, "Unsupported {} mode: {}", class, mode)
            }
            AnsiError::UnsupportedStatusReport { code } => {
                write!(f, "Unsupported device status report: {}", code)
            }
            AnsiError::UnexpectedOscByte { byte } => {
                write!(f, "Unexpected byte in OSC header: {}", byte)
            }
            AnsiError::UnsupportedOsc { kind } => write!(f, "Unsupported OSC sequence: {}", kind),
            AnsiError::OscTooLong { length } => {
                write!(f, "OSC sequence too long: {} bytes (max {})", length, MAX_OSC_LEN)
            }
        }
    }
}

impl std::error::Error for AnsiError {}

/// Optional callback for reporting non-fatal parsing errors
pub type ErrorCallback = Box<dyn FnMut(AnsiError) + Send>;

// ---------- safety constants ----------
pub const MAX_ARGS: usize = 5;
pub const MAX_ARG_DIGITS: usize = 5;
pub const MAX_OSC_LEN: usize = 2048;

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

/// Reply to DA (`CSI c`) and DECID (`ESC Z`).
pub const DEVICE_ATTRIBUTES: &[u8] = b"\x1b[?60;1;2;6;8;9;15;c";
/// Reply to DSR 5.
pub const STATUS_OK: &[u8] = b"\x1b[0n";

/// Parser state
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum AnsiState {
    Normal,
    Escape,
    Csi,
    LineSize,
    G0Select,
    G1Select,
    OscHeader,
    OscParam,
}

/// Argument list collected for one CSI sequence.
///
/// `None` marks an argument that was present as a slot (`CSI ;5 H`) but had
/// no digits; it takes the command's default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CsiArgs {
    values: [Option<u32>; MAX_ARGS],
    len: usize,
}

impl CsiArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when all slots are taken.
    pub fn push(&mut self, value: Option<u32>) -> bool {
        match self.values.get_mut(self.len) {
            Some(slot) => {
                *slot = value;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Argument `idx`, or `default` when absent or empty.
    pub fn get(&self, idx: usize, default: u32) -> u32 {
        self.values[..self.len]
            .get(idx)
            .copied()
            .flatten()
            .unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<u32>> + '_ {
        self.values[..self.len].iter().copied()
    }
}

/// A fully collected CSI sequence, ready for dispatch.
///
/// Counts are already defaulted; absolute positions are zero-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsiCommand {
    Sgr(CsiArgs),
    CursorUp(usize),
    CursorDown(usize),
    CursorForward(usize),
    CursorBackward(usize),
    NextLine(usize),
    PrecedingLine(usize),
    ColumnAbsolute(usize),
    RowAbsolute(usize),
    Position { row: usize, col: usize },
    ForwardTab(usize),
    BackTab(usize),
    EraseInLine(Erase),
    EraseInDisplay(Erase),
    InsertLines(usize),
    DeleteLines(usize),
    InsertChars(usize),
    DeleteChars(usize),
    EraseChars(usize),
    ScrollUp(usize),
    ScrollDown(usize),
    Repeat(usize),
    DeviceStatus { code: u32, private: bool },
    DeviceAttributes,
    SetModes { modes: CsiArgs, private: bool, enable: bool },
    SetScrollRegion { top: usize, bottom: usize },
}

impl CsiCommand {
    /// Build the command for `final_byte`, or `None` if the byte is not a
    /// supported CSI final.
    pub fn parse(final_byte: u8, args: &CsiArgs, private: bool) -> Option<Self> {
        let count = |default: u32| args.get(0, default) as usize;
        let position = |idx: usize| (args.get(idx, 1) as usize).saturating_sub(1);

        let command = match final_byte {
            b'm' => CsiCommand::Sgr(*args),
            b'A' => CsiCommand::CursorUp(count(1)),
            b'B' => CsiCommand::CursorDown(count(1)),
            b'C' => CsiCommand::CursorForward(count(1)),
            b'D' => CsiCommand::CursorBackward(count(1)),
            b'E' => CsiCommand::NextLine(count(1)),
            b'F' => CsiCommand::PrecedingLine(count(1)),
            b'G' | b'`' => CsiCommand::ColumnAbsolute(position(0)),
            b'd' => CsiCommand::RowAbsolute(position(0)),
            b'H' | b'f' => CsiCommand::Position { row: position(0), col: position(1) },
            b'I' => CsiCommand::ForwardTab(count(1)),
            b'Z' => CsiCommand::BackTab(count(1)),
            b'K' => CsiCommand::EraseInLine(Erase::from_param(args.get(0, 0))),
            b'J' => CsiCommand::EraseInDisplay(Erase::from_param(args.get(0, 0))),
            b'L' => CsiCommand::InsertLines(count(1)),
            b'M' => CsiCommand::DeleteLines(count(1)),
            b'@' => CsiCommand::InsertChars(count(1)),
            b'P' => CsiCommand::DeleteChars(count(1)),
            b'X' => CsiCommand::EraseChars(count(1)),
            b'S' => CsiCommand::ScrollUp(count(1)),
            b'T' => CsiCommand::ScrollDown(count(1)),
            b'b' => CsiCommand::Repeat(count(1)),
            b'n' => CsiCommand::DeviceStatus { code: args.get(0, 0), private },
            b'c' => CsiCommand::DeviceAttributes,
            b'h' => CsiCommand::SetModes { modes: *args, private, enable: true },
            b'l' => CsiCommand::SetModes { modes: *args, private, enable: false },
            b'r' => CsiCommand::SetScrollRegion {
                top: args.get(0, 1) as usize,
                bottom: args.get(1, 0) as usize,
            },
            _ => return None,
        };
        Some(command)
    }
}

/// Statistics about parser behavior (useful for debugging and monitoring)
#[derive(Debug, Default, Clone)]
pub struct ParserStats {
    pub sequences_processed: u64,
    pub errors_encountered: u64,
    pub max_args_seen: usize,
}

impl ParserStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub struct AnsiParser {
    state: AnsiState,
    args: CsiArgs,
    current_arg: u32,
    digits: usize,
    private: bool, // for '?'
    osc_type: u32,
    osc_len: usize,
    last_graphic: Option<u8>,
    error_callback: Option<ErrorCallback>,
    stats: ParserStats,
}

impl Default for AnsiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnsiParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnsiParser")
            .field("state", &self.state)
            .field("args", &self.args)
            .field("private", &self.private)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl AnsiParser {
    pub fn new() -> Self {
        Self {
            state: AnsiState::Normal,
            args: CsiArgs::new(),
            current_arg: 0,
            digits: 0,
            private: false,
            osc_type: 0,
            osc_len: 0,
            last_graphic: None,
            error_callback: None,
            stats: ParserStats::default(),
        }
    }

    /// Create a parser with an error callback for diagnostics
    pub fn with_error_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(AnsiError) + Send + 'static,
    {
        self.error_callback = Some(Box::new(callback));
        self
    }

    /// Get current parser statistics
    pub fn stats(&self) -> &ParserStats {
        &self.stats
    }

    /// Reset statistics counters
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// True when no sequence is in flight.
    pub fn is_idle(&self) -> bool {
        self.state == AnsiState::Normal
    }

    /// Drop any partial sequence and forget the last graphic byte.
    pub fn reset(&mut self) {
        self.state = AnsiState::Normal;
        self.begin_csi();
        self.osc_type = 0;
        self.osc_len = 0;
        self.last_graphic = None;
    }

    /// Report an error through the callback if set
    fn report_error(&mut self, error: AnsiError) {
        self.stats.errors_encountered += 1;
        if let Some(ref mut callback) = self.error_callback {
            callback(error);
        }
    }

    /// Report and fall back to `Normal`, dropping the partial sequence.
    fn abort(&mut self, error: AnsiError) {
        self.report_error(error);
        self.state = AnsiState::Normal;
    }

    // ===== Public API =====
    pub fn feed_str(&mut self, s: &str, grid: &mut dyn AnsiGrid) {
        self.feed_bytes(s.as_bytes(), grid)
    }

    pub fn feed_bytes(&mut self, bytes: &[u8], grid: &mut dyn AnsiGrid) {
        let mut i = 0;
        while i < bytes.len() {
            if self.state == AnsiState::OscParam {
                // fast skip over the discarded payload, up to BEL or the length cap
                let rest = &bytes[i..];
                let room = MAX_OSC_LEN - self.osc_len;
                let skip = memchr::memchr(BEL, rest).unwrap_or(rest.len()).min(room);
                self.osc_len += skip;
                i += skip;
                if i >= bytes.len() {
                    break;
                }
            }
            self.process_byte(bytes[i], grid);
            i += 1;
        }
    }

    // ===== Core parsing logic =====
    pub fn process_byte(&mut self, byte: u8, grid: &mut dyn AnsiGrid) {
        match self.state {
            AnsiState::Normal => self.normal_byte(byte, grid),
            AnsiState::Escape => self.escape_byte(byte, grid),
            AnsiState::Csi => self.csi_byte(byte, grid),
            // line size and character set selections are not supported
            AnsiState::LineSize | AnsiState::G0Select | AnsiState::G1Select => {
                self.state = AnsiState::Normal;
            }
            AnsiState::OscHeader => self.osc_header_byte(byte),
            AnsiState::OscParam => self.osc_param_byte(byte),
        }
    }

    fn normal_byte(&mut self, byte: u8, grid: &mut dyn AnsiGrid) {
        match byte {
            0x08 | 0x7f => grid.backspace(),
            b'\r' => grid.carriage_return(),
            0x0a..=0x0c => grid.linefeed(),
            b'\t' => grid.tab(),
            BEL => grid.bell(),
            ESC => self.state = AnsiState::Escape,
            _ => self.print(byte, grid),
        }
    }

    fn print(&mut self, byte: u8, grid: &mut dyn AnsiGrid) {
        self.last_graphic = Some(byte);
        grid.print(byte);
    }

    fn escape_byte(&mut self, byte: u8, grid: &mut dyn AnsiGrid) {
        self.state = AnsiState::Normal;
        match byte {
            // multi-byte sequences are counted when they complete
            b'[' => {
                self.begin_csi();
                self.state = AnsiState::Csi;
                return;
            }
            b'#' | b'(' | b')' => {
                self.state = match byte {
                    b'#' => AnsiState::LineSize,
                    b'(' => AnsiState::G0Select,
                    _ => AnsiState::G1Select,
                };
                return;
            }
            b']' => {
                self.osc_type = 0;
                self.osc_len = 0;
                self.digits = 0;
                self.state = AnsiState::OscHeader;
                return;
            }
            b'7' => grid.save_cursor(),
            b'8' => grid.restore_cursor(),
            b'D' => grid.index(),
            b'E' => grid.next_line(),
            b'M' => grid.reverse_index(),
            b'Z' => grid.respond(DEVICE_ATTRIBUTES),
            b'c' => {
                self.reset();
                grid.reset();
            }
            b'=' => grid.set_keypad_mode(true),
            b'>' => grid.set_keypad_mode(false),
            _ => {
                self.report_error(AnsiError::UnknownEscape { byte });
                return;
            }
        }
        self.stats.sequences_processed += 1;
    }

    fn begin_csi(&mut self) {
        self.args.clear();
        self.current_arg = 0;
        self.digits = 0;
        self.private = false;
    }

    /// Push the argument being typed. Returns false if the sequence was aborted.
    fn close_argument(&mut self) -> bool {
        let value = (self.digits > 0).then_some(self.current_arg);
        self.current_arg = 0;
        self.digits = 0;
        if self.args.push(value) {
            true
        } else {
            let count = self.args.len() + 1;
            self.abort(AnsiError::TooManyArguments { count });
            false
        }
    }

    fn csi_byte(&mut self, byte: u8, grid: &mut dyn AnsiGrid) {
        match byte {
            b'0'..=b'9' => {
                if self.digits == MAX_ARG_DIGITS {
                    self.abort(AnsiError::ArgumentTooLong { digits: self.digits + 1 });
                    return;
                }
                self.current_arg = self.current_arg * 10 + u32::from(byte - b'0');
                self.digits += 1;
            }
            b';' => {
                self.close_argument();
            }
            b'?' => self.private = true,
            _ => {
                // a trailing `;` still opens an (empty) argument slot
                if (self.digits > 0 || !self.args.is_empty()) && !self.close_argument() {
                    return;
                }
                self.state = AnsiState::Normal;
                self.stats.max_args_seen = self.stats.max_args_seen.max(self.args.len());

                match CsiCommand::parse(byte, &self.args, self.private) {
                    Some(command) => {
                        self.stats.sequences_processed += 1;
                        self.execute_csi(command, grid);
                    }
                    None => self.report_error(AnsiError::UnknownCsi { byte }),
                }
            }
        }
    }

    /// Single dispatch point for every CSI command.
    pub fn execute_csi(&mut self, command: CsiCommand, grid: &mut dyn AnsiGrid) {
        match command {
            CsiCommand::Sgr(args) => self.execute_sgr(&args, grid),
            CsiCommand::CursorUp(n) => grid.up(n),
            CsiCommand::CursorDown(n) => grid.down(n),
            CsiCommand::CursorForward(n) => grid.right(n),
            CsiCommand::CursorBackward(n) => grid.left(n),
            CsiCommand::NextLine(n) => {
                grid.down(n);
                grid.move_to_column(0);
            }
            CsiCommand::PrecedingLine(n) => {
                grid.up(n);
                grid.move_to_column(0);
            }
            CsiCommand::ColumnAbsolute(col) => grid.move_to_column(col),
            CsiCommand::RowAbsolute(row) => grid.move_to_row(row),
            CsiCommand::Position { row, col } => grid.move_abs(row, col),
            CsiCommand::ForwardTab(n) => {
                for _ in 0..n {
                    grid.tab();
                }
            }
            CsiCommand::BackTab(n) => {
                for _ in 0..n {
                    grid.back_tab();
                }
            }
            CsiCommand::EraseInLine(extent) => grid.erase_in_line(extent),
            CsiCommand::EraseInDisplay(extent) => grid.erase_in_display(extent),
            CsiCommand::InsertLines(n) => grid.insert_lines(n),
            CsiCommand::DeleteLines(n) => grid.delete_lines(n),
            CsiCommand::InsertChars(n) => grid.insert_chars(n),
            CsiCommand::DeleteChars(n) => grid.delete_chars(n),
            CsiCommand::EraseChars(n) => grid.erase_chars(n),
            CsiCommand::ScrollUp(n) => grid.scroll_up(n),
            CsiCommand::ScrollDown(n) => grid.scroll_down(n),
            CsiCommand::Repeat(n) => {
                if let Some(byte) = self.last_graphic {
                    for _ in 0..n {
                        self.print(byte, grid);
                    }
                }
            }
            CsiCommand::DeviceStatus { code: 5, .. } => grid.respond(STATUS_OK),
            CsiCommand::DeviceStatus { code: 6, private } => {
                let (row, col) = grid.cursor_position();
                let report = if private {
                    format!("\x1b?[{};{}R", row + 1, col + 1)
                } else {
                    format!("\x1b[{};{}R", row + 1, col + 1)
                };
                grid.respond(report.as_bytes());
            }
            CsiCommand::DeviceStatus { code, .. } => {
                self.report_error(AnsiError::UnsupportedStatusReport { code })
            }
            CsiCommand::DeviceAttributes => grid.respond(DEVICE_ATTRIBUTES),
            CsiCommand::SetModes { modes, private, enable } => {
                for number in modes.iter() {
                    let number = number.unwrap_or(0);
                    let mode = if private { Mode::dec(number) } else { Mode::ansi(number) };
                    match mode {
                        Some(mode) => grid.set_mode(mode, enable),
                        None => self.report_error(AnsiError::UnsupportedMode {
                            mode: number,
                            private,
                        }),
                    }
                }
            }
            CsiCommand::SetScrollRegion { top, bottom } => grid.set_scroll_region(top, bottom),
        }
    }

    fn execute_sgr(&mut self, args: &CsiArgs, grid: &mut dyn AnsiGrid) {
        if args.is_empty() {
            grid.reset_attrs();
            return;
        }
        let mut i = 0;
        while i < args.len() {
            let code = args.get(i, 0);
            match code {
                0 => grid.reset_attrs(),
                1 => grid.set_attr(Attrs::BOLD, true),
                3 => grid.set_attr(Attrs::ITALIC, true),
                4 => grid.set_attr(Attrs::UNDERLINE, true),
                5 => grid.set_attr(Attrs::SLOW_BLINK, true),
                6 => grid.set_attr(Attrs::FAST_BLINK, true),
                7 => grid.set_attr(Attrs::INVERT, true),
                9 => grid.set_attr(Attrs::STRIKETHROUGH, true),
                10 => {} // default font
                22 => grid.set_attr(Attrs::BOLD, false),
                23 => grid.set_attr(Attrs::ITALIC, false),
                24 => grid.set_attr(Attrs::UNDERLINE, false),
                25 => grid.set_attr(Attrs::SLOW_BLINK | Attrs::FAST_BLINK, false),
                26 | 29 => grid.set_attr(Attrs::STRIKETHROUGH, false),
                27 => grid.set_attr(Attrs::INVERT, false),
                30..=37 => grid.set_fg((code - 30) as u8),
                39 => grid.set_fg(DEFAULT_FG),
                40..=47 => grid.set_bg((code - 40) as u8),
                49 => grid.set_bg(DEFAULT_BG),
                90..=97 => grid.set_fg((code - 90) as u8 + 8),
                100..=107 => grid.set_bg((code - 100) as u8 + 8),
                38 | 48 => {
                    // only the 16-color subset of `38;5;n` fits a 4-bit cell
                    let consumed = match args.get(i + 1, 0) {
                        5 => {
                            let index = args.get(i + 2, 0);
                            if index < 16 && i + 2 < args.len() {
                                if code == 38 {
                                    grid.set_fg(index as u8);
                                } else {
                                    grid.set_bg(index as u8);
                                }
                            } else {
                                self.report_error(AnsiError::UnsupportedSgr { code });
                            }
                            2
                        }
                        2 => {
                            self.report_error(AnsiError::UnsupportedSgr { code });
                            4
                        }
                        _ => {
                            self.report_error(AnsiError::UnsupportedSgr { code });
                            0
                        }
                    };
                    i += consumed;
                }
                _ => self.report_error(AnsiError::UnsupportedSgr { code }),
            }
            i += 1;
        }
    }

    fn osc_header_byte(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => {
                if self.digits == MAX_ARG_DIGITS {
                    self.abort(AnsiError::ArgumentTooLong { digits: self.digits + 1 });
                    return;
                }
                self.osc_type = self.osc_type * 10 + u32::from(byte - b'0');
                self.digits += 1;
            }
            b';' => {
                self.digits = 0;
                self.osc_len = 0;
                self.state = AnsiState::OscParam;
            }
            _ => self.abort(AnsiError::UnexpectedOscByte { byte }),
        }
    }

    fn osc_param_byte(&mut self, byte: u8) {
        if byte == BEL {
            self.state = AnsiState::Normal;
            match self.osc_type {
                // icon name / window title: nothing to show them on
                0..=2 => self.stats.sequences_processed += 1,
                kind => self.report_error(AnsiError::UnsupportedOsc { kind }),
            }
        } else if self.osc_len >= MAX_OSC_LEN {
            self.abort(AnsiError::OscTooLong { length: self.osc_len + 1 });
        } else {
            self.osc_len += 1;
        }
    }
}

// ---------- tests ----------
#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::{Arc, Mutex};

    const COLS: usize = 80;
    const ROWS: usize = 24;

    /// Records every call as a short tag and tracks a clamped cursor.
    #[derive(Default)]
    struct MockGrid {
        output: Vec<u8>,
        ops: Vec<String>,
        responses: Vec<u8>,
        row: usize,
        col: usize,
        fg: u8,
        bg: u8,
        attrs: Attrs,
        modes: Vec<(Mode, bool)>,
    }

    impl MockGrid {
        fn new() -> Self {
            Self { fg: DEFAULT_FG, bg: DEFAULT_BG, ..Self::default() }
        }

        fn text(&self) -> String {
            String::from_utf8_lossy(&self.output).into_owned()
        }

        fn has_op(&self, op: &str) -> bool {
            self.ops.iter().any(|o| o == op)
        }
    }

    impl AnsiGrid for MockGrid {
        fn print(&mut self, byte: u8) {
            self.output.push(byte);
            self.col = (self.col + 1).min(COLS - 1);
        }
        fn backspace(&mut self) {
            self.ops.push("BS".into());
            self.col = self.col.saturating_sub(1);
        }
        fn carriage_return(&mut self) {
            self.ops.push("CR".into());
            self.col = 0;
        }
        fn linefeed(&mut self) {
            self.ops.push("LF".into());
            self.row = (self.row + 1).min(ROWS - 1);
            self.col = 0;
        }
        fn tab(&mut self) { self.ops.push("TAB".into()); }
        fn back_tab(&mut self) { self.ops.push("BACKTAB".into()); }
        fn bell(&mut self) { self.ops.push("BEL".into()); }
        fn index(&mut self) { self.ops.push("IND".into()); }
        fn next_line(&mut self) { self.ops.push("NEL".into()); }
        fn reverse_index(&mut self) { self.ops.push("RI".into()); }
        fn save_cursor(&mut self) { self.ops.push("DECSC".into()); }
        fn restore_cursor(&mut self) { self.ops.push("DECRC".into()); }
        fn reset(&mut self) {
            self.ops.push("RIS".into());
            self.row = 0;
            self.col = 0;
        }
        fn set_keypad_mode(&mut self, application: bool) {
            self.ops.push(format!("KEYPAD {}", application));
        }
        fn up(&mut self, n: usize) {
            self.ops.push(format!("UP {}", n));
            self.row = self.row.saturating_sub(n);
        }
        fn down(&mut self, n: usize) {
            self.ops.push(format!("DOWN {}", n));
            self.row = (self.row + n).min(ROWS - 1);
        }
        fn right(&mut self, n: usize) {
            self.ops.push(format!("RIGHT {}", n));
            self.col = (self.col + n).min(COLS - 1);
        }
        fn left(&mut self, n: usize) {
            self.ops.push(format!("LEFT {}", n));
            self.col = self.col.saturating_sub(n);
        }
        fn move_to_column(&mut self, col: usize) {
            self.ops.push(format!("COL {}", col));
            self.col = col.min(COLS - 1);
        }
        fn move_to_row(&mut self, row: usize) {
            self.ops.push(format!("ROW {}", row));
            self.row = row.min(ROWS - 1);
        }
        fn move_abs(&mut self, row: usize, col: usize) {
            self.ops.push(format!("POS {} {}", row, col));
            self.row = row.min(ROWS - 1);
            self.col = col.min(COLS - 1);
        }
        fn cursor_position(&self) -> (usize, usize) {
            (self.row, self.col)
        }
        fn erase_in_line(&mut self, extent: Erase) { self.ops.push(format!("EL {:?}", extent)); }
        fn erase_in_display(&mut self, extent: Erase) { self.ops.push(format!("ED {:?}", extent)); }
        fn insert_lines(&mut self, n: usize) { self.ops.push(format!("IL {}", n)); }
        fn delete_lines(&mut self, n: usize) { self.ops.push(format!("DL {}", n)); }
        fn insert_chars(&mut self, n: usize) { self.ops.push(format!("ICH {}", n)); }
        fn delete_chars(&mut self, n: usize) { self.ops.push(format!("DCH {}", n)); }
        fn erase_chars(&mut self, n: usize) { self.ops.push(format!("ECH {}", n)); }
        fn scroll_up(&mut self, n: usize) { self.ops.push(format!("SU {}", n)); }
        fn scroll_down(&mut self, n: usize) { self.ops.push(format!("SD {}", n)); }
        fn reset_attrs(&mut self) {
            self.fg = DEFAULT_FG;
            self.bg = DEFAULT_BG;
            self.attrs = Attrs::empty();
        }
        fn set_attr(&mut self, attr: Attrs, enable: bool) { self.attrs.set(attr, enable); }
        fn set_fg(&mut self, index: u8) { self.fg = index; }
        fn set_bg(&mut self, index: u8) { self.bg = index; }
        fn set_mode(&mut self, mode: Mode, enable: bool) { self.modes.push((mode, enable)); }
        fn set_scroll_region(&mut self, top: usize, bottom: usize) {
            self.ops.push(format!("DECSTBM {} {}", top, bottom));
        }
        fn respond(&mut self, bytes: &[u8]) { self.responses.extend_from_slice(bytes); }
    }

    fn collecting_parser() -> (AnsiParser, Arc<Mutex<Vec<AnsiError>>>) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let parser = AnsiParser::new().with_error_callback(move |e| {
            sink.lock().unwrap().push(e);
        });
        (parser, errors)
    }

    #[test]
    fn plain_text_is_printed() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("Hello, world!", &mut g);
        assert_eq!(g.text(), "Hello, world!");
        assert!(g.ops.is_empty());
    }

    #[test]
    fn c0_controls_dispatch() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_bytes(b"\x08\x7f\r\n\x0b\x0c\t\x07", &mut g);
        assert_eq!(g.ops, ["BS", "BS", "CR", "LF", "LF", "LF", "TAB", "BEL"]);
        assert!(g.output.is_empty());
    }

    #[test]
    fn other_control_and_high_bytes_are_printable() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_bytes(&[0x01, 0x80, 0xff], &mut g);
        assert_eq!(g.output, [0x01, 0x80, 0xff]);
    }

    #[test]
    fn movement_defaults_to_one() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[A\x1b[B\x1b[C\x1b[D", &mut g);
        assert_eq!(g.ops, ["UP 1", "DOWN 1", "RIGHT 1", "LEFT 1"]);
    }

    #[test]
    fn explicit_counts_are_kept() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[12B\x1b[0A", &mut g);
        assert_eq!(g.ops, ["DOWN 12", "UP 0"]);
    }

    #[test]
    fn next_and_preceding_line_reset_column() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[2E\x1b[F", &mut g);
        assert_eq!(g.ops, ["DOWN 2", "COL 0", "UP 1", "COL 0"]);
    }

    #[test]
    fn absolute_positions_are_one_based() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[5;10H\x1b[f\x1b[7G\x1b[3`\x1b[4d\x1b[0G", &mut g);
        assert_eq!(g.ops, ["POS 4 9", "POS 0 0", "COL 6", "COL 2", "ROW 3", "COL 0"]);
    }

    #[test]
    fn empty_argument_slot_takes_default() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[;5H\x1b[3;H", &mut g);
        assert_eq!(g.ops, ["POS 0 4", "POS 2 0"]);
    }

    #[test]
    fn erase_defaults_to_zero() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[K\x1b[1K\x1b[2K\x1b[J\x1b[1J\x1b[2J", &mut g);
        assert_eq!(
            g.ops,
            ["EL ToEnd", "EL ToStart", "EL All", "ED ToEnd", "ED ToStart", "ED All"]
        );
    }

    #[test]
    fn line_and_character_operations() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[3L\x1b[M\x1b[2@\x1b[P\x1b[4X\x1b[S\x1b[2T", &mut g);
        assert_eq!(g.ops, ["IL 3", "DL 1", "ICH 2", "DCH 1", "ECH 4", "SU 1", "SD 2"]);
    }

    #[test]
    fn tabs_repeat() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[3I\x1b[2Z", &mut g);
        assert_eq!(g.ops, ["TAB", "TAB", "TAB", "BACKTAB", "BACKTAB"]);
    }

    #[test]
    fn sgr_sets_attributes_and_colors() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[1;4;31;42m", &mut g);
        assert_eq!(g.attrs, Attrs::BOLD | Attrs::UNDERLINE);
        assert_eq!(g.fg, 1);
        assert_eq!(g.bg, 2);

        p.feed_str("\x1b[93;104m", &mut g);
        assert_eq!(g.fg, 11);
        assert_eq!(g.bg, 12);
    }

    #[test]
    fn sgr_off_variants() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[1;3;4;5;7m\x1b[9m", &mut g);
        p.feed_str("\x1b[22;23;24m", &mut g);
        assert_eq!(g.attrs, Attrs::SLOW_BLINK | Attrs::INVERT | Attrs::STRIKETHROUGH);
        p.feed_str("\x1b[25;27;29m", &mut g);
        assert!(g.attrs.is_empty());
    }

    #[test]
    fn sgr_reset_restores_defaults_after_any_combination() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[1;3;4;5;6m\x1b[7;9;97;101m\x1b[0m", &mut g);
        assert_eq!(g.fg, DEFAULT_FG);
        assert_eq!(g.bg, DEFAULT_BG);
        assert!(g.attrs.is_empty());

        p.feed_str("\x1b[35;46;1m\x1b[m", &mut g);
        assert_eq!((g.fg, g.bg, g.attrs), (DEFAULT_FG, DEFAULT_BG, Attrs::empty()));
    }

    #[test]
    fn sgr_default_colors() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[31;44m\x1b[39;49m", &mut g);
        assert_eq!((g.fg, g.bg), (DEFAULT_FG, DEFAULT_BG));
    }

    #[test]
    fn sgr_unknown_code_reports_and_continues() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[2;1m", &mut g);
        assert_eq!(g.attrs, Attrs::BOLD);
        assert_eq!(*errors.lock().unwrap(), [AnsiError::UnsupportedSgr { code: 2 }]);
    }

    #[test]
    fn sgr_indexed_color_within_sixteen() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[38;5;12m\x1b[48;5;3m", &mut g);
        assert_eq!((g.fg, g.bg), (12, 3));
        p.feed_str("\x1b[38;5;200;1m", &mut g);
        assert_eq!(g.fg, 12);
        assert_eq!(g.attrs, Attrs::BOLD);
        assert_eq!(errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn five_arguments_are_accepted() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[1;3;4;31;42m", &mut g);
        assert!(errors.lock().unwrap().is_empty());
        assert_eq!(g.bg, 2);
        assert_eq!(p.stats().max_args_seen, 5);
    }

    #[test]
    fn sixth_argument_aborts_without_executing() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[1;3;4;31;42;5m", &mut g);
        assert!(g.attrs.is_empty());
        assert_eq!(g.fg, DEFAULT_FG);
        assert!(matches!(errors.lock().unwrap()[0], AnsiError::TooManyArguments { count: 6 }));
        assert!(g.output.is_empty());
        assert!(p.is_idle());
    }

    #[test]
    fn bytes_after_an_aborted_sequence_are_text() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[1;2;3;4;5;6;7m", &mut g);
        assert_eq!(errors.lock().unwrap().len(), 1);
        assert_eq!(g.text(), "7m");
    }

    #[test]
    fn long_argument_aborts() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[12345A", &mut g);
        assert_eq!(g.ops, ["UP 12345"]);

        p.feed_str("\x1b[123456A", &mut g);
        assert_eq!(g.ops.len(), 1);
        assert!(matches!(errors.lock().unwrap()[0], AnsiError::ArgumentTooLong { .. }));
        assert_eq!(g.text(), "A");
    }

    #[test]
    fn unknown_csi_final_reports_without_mutation() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[5yX", &mut g);
        assert!(g.ops.is_empty());
        assert_eq!(g.text(), "X");
        assert_eq!(*errors.lock().unwrap(), [AnsiError::UnknownCsi { byte: b'y' }]);
    }

    #[test]
    fn unknown_escape_returns_to_normal() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1bQab", &mut g);
        assert_eq!(g.text(), "ab");
        assert_eq!(*errors.lock().unwrap(), [AnsiError::UnknownEscape { byte: b'Q' }]);
    }

    #[test]
    fn single_byte_escapes() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b7\x1b8\x1bD\x1bE\x1bM\x1b=\x1b>", &mut g);
        assert_eq!(
            g.ops,
            ["DECSC", "DECRC", "IND", "NEL", "RI", "KEYPAD true", "KEYPAD false"]
        );
    }

    #[test]
    fn charset_and_line_size_swallow_one_byte() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b(Bx\x1b)0y\x1b#8z", &mut g);
        assert_eq!(g.text(), "xyz");
    }

    #[test]
    fn dec_private_modes() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[?1;25h\x1b[?7l\x1b[?1049h\x1b[?47l\x1b[?2004h", &mut g);
        assert_eq!(
            g.modes,
            [
                (Mode::AppCursorKeys, true),
                (Mode::ShowCursor, true),
                (Mode::AutoWrap, false),
                (Mode::AltScreenSaveCursor, true),
                (Mode::AltScreen, false),
                (Mode::BracketedPaste, true),
            ]
        );
    }

    #[test]
    fn ansi_modes_use_their_own_table() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[4h\x1b[20l\x1b[25h", &mut g);
        assert_eq!(g.modes, [(Mode::Insert, true), (Mode::AutoNewline, false)]);
        assert_eq!(
            *errors.lock().unwrap(),
            [AnsiError::UnsupportedMode { mode: 25, private: false }]
        );
    }

    #[test]
    fn unknown_dec_mode_reports() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[?1000h", &mut g);
        assert!(g.modes.is_empty());
        assert_eq!(
            *errors.lock().unwrap(),
            [AnsiError::UnsupportedMode { mode: 1000, private: true }]
        );
    }

    #[test]
    fn private_flag_does_not_leak_into_next_sequence() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[?25l\x1b[4h", &mut g);
        assert_eq!(g.modes, [(Mode::ShowCursor, false), (Mode::Insert, true)]);
        assert!(errors.lock().unwrap().is_empty());
    }

    #[test]
    fn status_reports() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[5n", &mut g);
        assert_eq!(g.responses, b"\x1b[0n");

        g.responses.clear();
        p.feed_str("\x1b[3;7H\x1b[6n", &mut g);
        assert_eq!(g.responses, b"\x1b[3;7R");

        g.responses.clear();
        p.feed_str("\x1b[?6n", &mut g);
        assert_eq!(g.responses, b"\x1b?[3;7R");
    }

    #[test]
    fn device_attributes_and_identify() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[c\x1bZ", &mut g);
        assert_eq!(g.responses, [DEVICE_ATTRIBUTES, DEVICE_ATTRIBUTES].concat());
    }

    #[test]
    fn repeat_last_graphic() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("a\x1b[3b\x1b[b", &mut g);
        assert_eq!(g.text(), "aaaaa");
    }

    #[test]
    fn repeat_without_graphic_is_noop() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[4b", &mut g);
        assert!(g.output.is_empty());
    }

    #[test]
    fn scroll_region_is_forwarded() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[2;20r\x1b[r", &mut g);
        assert_eq!(g.ops, ["DECSTBM 2 20", "DECSTBM 1 0"]);
    }

    #[test]
    fn full_reset_clears_parser_state() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("x\x1bc\x1b[2b", &mut g);
        assert!(g.has_op("RIS"));
        // the last graphic byte is forgotten
        assert_eq!(g.text(), "x");
    }

    #[test]
    fn osc_title_is_discarded() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b]0;my title\x07after", &mut g);
        p.feed_str("\x1b]2;\x1b[31mstill title\x07", &mut g);
        assert_eq!(g.text(), "after");
        assert_eq!(g.fg, DEFAULT_FG);
        assert!(errors.lock().unwrap().is_empty());
    }

    #[test]
    fn osc_unknown_type_reports() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b]52;c;aGk=\x07ok", &mut g);
        assert_eq!(g.text(), "ok");
        assert_eq!(*errors.lock().unwrap(), [AnsiError::UnsupportedOsc { kind: 52 }]);
    }

    #[test]
    fn osc_header_rejects_non_digits() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b]Lx", &mut g);
        assert_eq!(g.text(), "x");
        assert_eq!(*errors.lock().unwrap(), [AnsiError::UnexpectedOscByte { byte: b'L' }]);
    }

    #[test]
    fn osc_payload_overflow_aborts() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        let big = format!("\x1b]0;{}", "x".repeat(MAX_OSC_LEN + 3));
        p.feed_str(&big, &mut g);
        assert!(matches!(errors.lock().unwrap()[0], AnsiError::OscTooLong { .. }));
        // the overflowing byte is dropped, the rest is text again
        assert_eq!(g.output.len(), 2);
        assert!(p.is_idle());
    }

    #[test]
    fn osc_overflow_only_drops_the_osc() {
        let (mut p, errors) = collecting_parser();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[31m", &mut g);
        let big = format!("\x1b]2;{}", "t".repeat(MAX_OSC_LEN + 1));
        p.feed_str(&big, &mut g);
        p.feed_str("\x1b[2;4H\x1b[44mok\x1b[?6n", &mut g);

        assert_eq!(errors.lock().unwrap().len(), 1);
        assert_eq!(g.text(), "ok");
        assert_eq!((g.fg, g.bg), (1, 4));
        assert_eq!(g.responses, b"\x1b?[2;6R");
        assert!(p.is_idle());
    }

    #[test]
    fn osc_fast_path_matches_byte_path() {
        let input = format!("a\x1b]0;{}\x07b\x1b]1;{}c", "t".repeat(3000), "u".repeat(10));
        let mut whole = MockGrid::new();
        let mut p = AnsiParser::new();
        p.feed_bytes(input.as_bytes(), &mut whole);

        let mut bytewise = MockGrid::new();
        let mut q = AnsiParser::new();
        for &b in input.as_bytes() {
            q.process_byte(b, &mut bytewise);
        }
        assert_eq!(whole.output, bytewise.output);
        assert_eq!(p.stats().errors_encountered, q.stats().errors_encountered);
    }

    #[test]
    fn sequences_split_across_feeds() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b", &mut g);
        p.feed_str("[1", &mut g);
        p.feed_str("0;2", &mut g);
        p.feed_str("0H", &mut g);
        assert_eq!(g.ops, ["POS 9 19"]);
    }

    #[test]
    fn parser_stats_tracking() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str("\x1b[1;4m\x1b[H\x1b7\x1b[y", &mut g);
        assert_eq!(p.stats().sequences_processed, 3);
        assert_eq!(p.stats().errors_encountered, 1);
        assert_eq!(p.stats().max_args_seen, 2);
        p.reset_stats();
        assert_eq!(p.stats().sequences_processed, 0);
    }

    #[test]
    fn error_display_formatting() {
        let e = AnsiError::TooManyArguments { count: 6 };
        assert!(e.to_string().contains("6"));
        let e = AnsiError::UnsupportedMode { mode: 1000, private: true };
        assert!(e.to_string().contains("DEC"));
        let e = AnsiError::OscTooLong { length: 4000 };
        assert!(e.to_string().contains("2048"));
    }

    #[test]
    fn csi_command_table() {
        let mut args = CsiArgs::new();
        assert!(args.push(Some(3)));
        assert_eq!(CsiCommand::parse(b'A', &args, false), Some(CsiCommand::CursorUp(3)));
        assert_eq!(CsiCommand::parse(b'X', &args, false), Some(CsiCommand::EraseChars(3)));
        assert_eq!(
            CsiCommand::parse(b'K', &args, false),
            Some(CsiCommand::EraseInLine(Erase::All))
        );
        assert_eq!(CsiCommand::parse(b'q', &args, false), None);
    }

    #[test]
    fn csi_args_capacity() {
        let mut args = CsiArgs::new();
        for i in 0..MAX_ARGS {
            assert!(args.push(Some(i as u32)));
        }
        assert!(!args.push(Some(9)));
        assert_eq!(args.len(), MAX_ARGS);
        assert_eq!(args.get(4, 0), 4);
        assert_eq!(args.get(5, 7), 7);
    }

    #[test]
    fn fuzz_like_random_input() {
        let mut rng = rand::rng();
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        for _ in 0..200 {
            let len = rng.random_range(0..512);
            let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            p.feed_bytes(&bytes, &mut g);
            assert!(g.row < ROWS && g.col < COLS);
        }
    }

    #[test]
    fn no_panic_on_extreme_input() {
        let mut p = AnsiParser::new();
        let mut g = MockGrid::new();
        p.feed_str(&"\x1b[".repeat(1000), &mut g);
        p.feed_str(&";".repeat(1000), &mut g);
        p.feed_str(&"9".repeat(1000), &mut g);
        p.feed_str("\x1b[99999b", &mut g);
        p.feed_str(&"\x1b]".repeat(500), &mut g);
    }
}
