//! Host-agnostic terminal loop - ties parser, screen, redraw and keyboard
//!
//! The platform owns the byte source, the transport back to the host, the
//! display and the periodic timer. It calls [`TerminalCore::poll`] from its
//! main loop and forwards key events; everything else happens here.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use elterm_ansi::AnsiParser;
use tracing::{debug, info, trace, warn};

use crate::config::TerminalConfig;
use crate::constants::CELL_HEIGHT_PX;
use crate::error::TerminalResult;
use crate::flush::{ScreenMirror, SmoothScroll};
use crate::keyboard::{Key, KeyModifiers, Keyboard};
use crate::terminal::Terminal;
use crate::traits::{ByteSource, Renderer, TransportOut};

/// Flag set by the platform timer, consumed by the poll loop.
#[derive(Clone, Debug, Default)]
pub struct TickHandle(Arc<AtomicBool>);

impl TickHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal one timer period. Ticks that arrive before the loop runs
    /// collapse into one.
    pub fn tick(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Everything the terminal needs between loop iterations.
pub struct TerminalCore {
    config: TerminalConfig,
    parser: AnsiParser,
    terminal: Terminal,
    mirror: ScreenMirror,
    keyboard: Keyboard,
    scroll: SmoothScroll,
    ticks: TickHandle,
    tick_count: u32,
    output: Vec<u8>,
}

impl fmt::Debug for TerminalCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalCore")
            .field("config", &self.config)
            .field("terminal", &self.terminal)
            .field("tick_count", &self.tick_count)
            .field("pending_output", &self.output.len())
            .finish_non_exhaustive()
    }
}

impl TerminalCore {
    /// Create the core and print the configured banner.
    pub fn new(config: TerminalConfig) -> TerminalResult<Self> {
        config.validate()?;
        debug!(
            "Creating TerminalCore: {}x{} (+{} scrollback rows)",
            config.columns, config.rows, config.scrollback_rows
        );

        let parser = AnsiParser::new().with_error_callback(|err| {
            warn!("ANSI parser error: {}", err);
        });

        let mut core = Self {
            parser,
            terminal: Terminal::from_config(&config),
            mirror: ScreenMirror::new(config.cursor_color),
            keyboard: Keyboard::new(config.key_repeat_delay),
            scroll: SmoothScroll::new(config.buffer_rows(), CELL_HEIGHT_PX),
            ticks: TickHandle::new(),
            tick_count: 0,
            output: Vec::new(),
            config,
        };

        if let Some(banner) = core.config.banner.clone() {
            core.process_str(&banner);
        }

        info!("Terminal core initialized");
        Ok(core)
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn mirror(&self) -> &ScreenMirror {
        &self.mirror
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Handle for the platform timer.
    pub fn tick_handle(&self) -> TickHandle {
        self.ticks.clone()
    }

    // ===== input from the host =====

    pub fn process_byte(&mut self, byte: u8) {
        self.parser.process_byte(byte, &mut self.terminal);
        self.collect_responses();
    }

    pub fn process_bytes(&mut self, bytes: &[u8]) {
        self.parser.feed_bytes(bytes, &mut self.terminal);
        self.collect_responses();
    }

    pub fn process_str(&mut self, s: &str) {
        self.process_bytes(s.as_bytes());
    }

    fn collect_responses(&mut self) {
        if self.terminal.has_responses() {
            let responses = self.terminal.take_responses();
            self.output.extend_from_slice(&responses);
        }
    }

    // ===== keyboard =====

    /// Encode a key press into the output queue. Returns false when the key
    /// sends nothing.
    pub fn key_pressed(&mut self, key: Key, mods: KeyModifiers, now: Instant) -> bool {
        trace!("Key pressed: {:?} {:?}", key, mods);
        self.keyboard
            .key_pressed(key, mods, now, self.terminal.modes(), &mut self.output)
    }

    pub fn key_released(&mut self, key: Key) {
        self.keyboard.key_released(key);
    }

    /// Bytes waiting for the host: key sequences and status replies.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }

    // ===== timer =====

    /// One timer period: blink the cursor every `blink_ticks` ticks and
    /// repeat held keys.
    pub fn on_tick(&mut self, now: Instant, renderer: &mut dyn Renderer) {
        self.tick_count = self.tick_count.wrapping_add(1);
        if self.tick_count % self.config.blink_ticks == 0 {
            let phase = !self.mirror.cursor_phase();
            self.mirror.set_cursor_phase(phase, &self.terminal, renderer);
        }
        let repeated = self
            .keyboard
            .repeat(now, self.terminal.modes(), &mut self.output);
        if repeated > 0 {
            trace!("Repeated {} held keys", repeated);
        }
    }

    // ===== display =====

    /// Draw up to the configured budget of changed cells.
    pub fn flush(&mut self, renderer: &mut dyn Renderer) -> usize {
        self.mirror
            .flush(&mut self.terminal, renderer, self.config.flush_budget)
    }

    /// Row offset change since the last call, for hardware scrolling.
    pub fn take_scroll_change(&mut self) -> Option<usize> {
        self.mirror.take_scroll_change()
    }

    /// Advance the smooth scroll by one display frame and return the pixel
    /// line the display should start scanning from.
    pub fn scroll_frame(&mut self) -> usize {
        self.scroll.step(self.mirror.row_offset())
    }

    /// One main-loop iteration.
    ///
    /// Consumes a pending tick, drains `source` through the parser, sends
    /// queued output to `out` and flushes the screen if anything changed.
    /// Returns the number of cells drawn.
    pub fn poll(
        &mut self,
        source: &mut dyn ByteSource,
        out: &mut dyn TransportOut,
        renderer: &mut dyn Renderer,
        now: Instant,
    ) -> TerminalResult<usize> {
        if self.ticks.take() {
            self.on_tick(now, renderer);
        }

        let mut received = 0usize;
        while let Some(byte) = source.try_read_byte() {
            self.parser.process_byte(byte, &mut self.terminal);
            received += 1;
        }
        if received > 0 {
            trace!("Processed {} bytes", received);
            self.collect_responses();
        }

        if !self.output.is_empty() {
            out.write_bytes(&self.output)?;
            self.output.clear();
        }

        if self.terminal.is_dirty() {
            Ok(self.flush(renderer))
        } else {
            Ok(0)
        }
    }

    /// Power-on state: parser, both buffers, modes, held keys and mirror.
    pub fn full_reset(&mut self) {
        info!("Terminal core reset");
        self.parser.reset();
        self.terminal.full_reset();
        self.mirror.invalidate();
        self.keyboard.release_all();
        self.scroll.reset();
        self.tick_count = 0;
        self.output.clear();
    }
}

/// Text typed locally, e.g. status messages, goes through the parser like
/// host output.
impl fmt::Write for TerminalCore {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.process_str(s);
        Ok(())
    }
}
