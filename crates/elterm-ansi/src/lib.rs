//! # elterm ANSI parser
//!
//! Byte-at-a-time ANSI/VT100/DEC escape sequence state machine for a
//! character-cell terminal. The parser owns no screen state: every effect is
//! delivered through the [`AnsiGrid`] trait, which the terminal core
//! implements.

pub mod color;
pub mod grid;
pub mod parser;

pub use color::{ColorPair, DEFAULT_BG, DEFAULT_FG};
pub use grid::{AnsiGrid, Attrs, Cell, Erase, Mode};
pub use parser::{AnsiError, AnsiParser, CsiArgs, CsiCommand, ErrorCallback, ParserStats};
