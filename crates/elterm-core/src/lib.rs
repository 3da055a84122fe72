//! elterm core - host-agnostic character-cell terminal
//!
//! Screen buffers, terminal modes, incremental redraw and keyboard encoding
//! for a small serial terminal. Display, transport and timer are supplied by
//! the platform through the traits in [`traits`].

pub mod config;
pub mod constants;
pub mod dummy_backend;
pub mod error;
pub mod flush;
pub mod grid;
pub mod host;
pub mod keyboard;
pub mod ring;
pub mod state;
pub mod terminal;
pub mod traits;

// Re-export main types
pub use config::TerminalConfig;
pub use error::{TerminalError, TerminalResult};
pub use flush::{ScreenMirror, SmoothScroll};
pub use grid::{CellGrid, CircularIndex};
pub use host::{TerminalCore, TickHandle};
pub use keyboard::{encode_key, Key, KeyModifiers, Keyboard};
pub use ring::{ByteRing, RingConsumer, RingProducer};
pub use state::{Cursor, ScreenState};
pub use terminal::{ActiveBuffer, Style, Terminal, TerminalModes};

// Re-export traits and types
pub use traits::*;

// Parser types used at the API surface
pub use elterm_ansi::{AnsiParser, Attrs, Cell, ColorPair};
