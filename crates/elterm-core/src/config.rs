// src/config.rs
use std::time::Duration;

use crate::constants::{
    BANNER, BLINK_TICKS, CURSOR_COLOR, DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_SCROLLBACK_ROWS,
    FLUSH_BUDGET, KEY_REPEAT_DELAY_MS, SERIAL_RING_CAPACITY, TICK_INTERVAL_MS,
};
use crate::error::{TerminalError, TerminalResult};

#[derive(Clone, Debug)]
pub struct TerminalConfig {
    pub columns: usize,
    pub rows: usize,
    /// Rows held below the viewport in each buffer.
    pub scrollback_rows: usize,
    /// Maximum cells drawn by one flush.
    pub flush_budget: usize,
    pub tick_interval: Duration,
    pub blink_ticks: u32,
    pub key_repeat_delay: Duration,
    pub ring_capacity: usize,
    pub cursor_color: u8,
    /// Fed through the parser when the core starts.
    pub banner: Option<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            scrollback_rows: DEFAULT_SCROLLBACK_ROWS,
            flush_budget: FLUSH_BUDGET,
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            blink_ticks: BLINK_TICKS,
            key_repeat_delay: Duration::from_millis(KEY_REPEAT_DELAY_MS),
            ring_capacity: SERIAL_RING_CAPACITY,
            cursor_color: CURSOR_COLOR,
            banner: Some(BANNER.to_string()),
        }
    }
}

impl TerminalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, columns: usize, rows: usize) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    pub fn with_scrollback_rows(mut self, rows: usize) -> Self {
        self.scrollback_rows = rows;
        self
    }

    pub fn with_flush_budget(mut self, budget: usize) -> Self {
        self.flush_budget = budget;
        self
    }

    pub fn with_blink_ticks(mut self, ticks: u32) -> Self {
        self.blink_ticks = ticks;
        self
    }

    pub fn with_key_repeat_delay(mut self, delay: Duration) -> Self {
        self.key_repeat_delay = delay;
        self
    }

    pub fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    pub fn with_cursor_color(mut self, color: u8) -> Self {
        self.cursor_color = color & 0x0f;
        self
    }

    pub fn with_banner(mut self, banner: &str) -> Self {
        self.banner = Some(banner.to_string());
        self
    }

    pub fn without_banner(mut self) -> Self {
        self.banner = None;
        self
    }

    /// Total rows per buffer, viewport plus scrollback.
    pub fn buffer_rows(&self) -> usize {
        self.rows + self.scrollback_rows
    }

    pub fn validate(&self) -> TerminalResult<()> {
        let invalid = |field: &str, value: String| {
            Err(TerminalError::InvalidConfiguration { field: field.to_string(), value })
        };
        if self.columns == 0 {
            return invalid("columns", self.columns.to_string());
        }
        if self.rows == 0 {
            return invalid("rows", self.rows.to_string());
        }
        // the newly exposed row is cleared while the old top row is still on screen
        if self.scrollback_rows == 0 {
            return invalid("scrollback_rows", self.scrollback_rows.to_string());
        }
        if self.flush_budget == 0 {
            return invalid("flush_budget", self.flush_budget.to_string());
        }
        if self.blink_ticks == 0 {
            return invalid("blink_ticks", self.blink_ticks.to_string());
        }
        if self.ring_capacity < 2 {
            return invalid("ring_capacity", self.ring_capacity.to_string());
        }
        Ok(())
    }
}
