//! elterm - a character-cell terminal for small displays
//!
//! This crate ties together the workspace members:
//! - [`elterm_ansi`]: byte-level ANSI/VT100 escape sequence parser
//! - [`elterm_core`]: screen buffers, redraw, keyboard encoding and the host loop

pub use elterm_ansi;
pub use elterm_core;

// Re-export main types for convenience
pub use elterm_ansi::{AnsiError, AnsiGrid, AnsiParser, Attrs, Cell, ColorPair};
pub use elterm_core::{
    ActiveBuffer, ByteRing, ByteSource, Key, KeyModifiers, Renderer, TerminalConfig, TerminalCore,
    Terminal, TerminalError, TerminalModes, TerminalResult, TickHandle, TransportOut,
};
