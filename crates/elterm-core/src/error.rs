// src/error.rs
use thiserror::Error;

/// Errors surfaced by the terminal core
///
/// Malformed input never ends up here: parser diagnostics are logged and
/// dropped. These cover setup mistakes and transport failures.
#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfiguration { field: String, value: String },

    #[error("Ring buffer capacity must be at least 2, got {capacity}")]
    RingCapacity { capacity: usize },

    #[error("Transport write failed: {0}")]
    Transport(#[from] std::io::Error),
}

pub type TerminalResult<T> = Result<T, TerminalError>;
