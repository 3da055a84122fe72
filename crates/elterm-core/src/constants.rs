// src/constants.rs

// Screen geometry
pub const DEFAULT_COLUMNS: usize = 80;
pub const DEFAULT_ROWS: usize = 30;
/// Extra rows kept below the viewport so a scroll is an offset bump.
pub const DEFAULT_SCROLLBACK_ROWS: usize = 2;
pub const TAB_WIDTH: usize = 8;

// Flush
pub const FLUSH_BUDGET: usize = 80 * 10;
/// Palette index of the cursor block.
pub const CURSOR_COLOR: u8 = elterm_ansi::color::WHITE;
/// Pixel height of one text row, for smooth hardware scrolling.
pub const CELL_HEIGHT_PX: usize = 16;

// Timing constants
pub const TICK_INTERVAL_MS: u64 = 100;
/// Blink phase flips every this many ticks.
pub const BLINK_TICKS: u32 = 5;
pub const KEY_REPEAT_DELAY_MS: u64 = 1000;

// Input
pub const MAX_PRESSED_KEYS: usize = 6;
pub const SERIAL_RING_CAPACITY: usize = 1024;

pub const BANNER: &str = "ELTerm 0.01\r\n";
