use std::collections::VecDeque;
use std::io;

use elterm_ansi::Attrs;

use crate::ring::RingConsumer;

/// Incoming host bytes (serial port, pty, test fixture).
pub trait ByteSource {
    /// Next byte if one is ready. Never blocks.
    fn try_read_byte(&mut self) -> Option<u8>;
}

impl ByteSource for RingConsumer {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.pop()
    }
}

impl ByteSource for VecDeque<u8> {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

/// Outgoing bytes: key sequences and status replies.
pub trait TransportOut {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<W: io::Write> TransportOut for W {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }
}

/// Display back end, addressed in character cells.
///
/// Rows are physical buffer rows: a display that scrolls in hardware maps
/// them through the current row offset itself.
pub trait Renderer {
    fn draw_glyph(&mut self, col: usize, row: usize, ch: u8, fg: u8, bg: u8, attrs: Attrs);

    /// Solid fill of cells `x1..x2` by `y1..y2` (end exclusive).
    fn fill_rect(&mut self, x1: usize, y1: usize, x2: usize, y2: usize, color: u8);
}
