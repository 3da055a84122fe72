//! Keyboard input: HID usage ids to host byte sequences, plus the held-key
//! set that drives auto-repeat.

use std::time::{Duration, Instant};

use bitflags::bitflags;
use tracing::trace;

use crate::constants::MAX_PRESSED_KEYS;
use crate::terminal::TerminalModes;

macro_rules! hid_keys {
    ($($name:ident = $usage:literal,)*) => {
        /// USB HID keyboard usage id.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Key {
            $($name = $usage,)*
        }

        impl Key {
            pub fn from_usage(usage: u8) -> Option<Key> {
                match usage {
                    $($usage => Some(Key::$name),)*
                    _ => None,
                }
            }
        }
    };
}

hid_keys! {
    A = 0x04, B = 0x05, C = 0x06, D = 0x07, E = 0x08, F = 0x09, G = 0x0a,
    H = 0x0b, I = 0x0c, J = 0x0d, K = 0x0e, L = 0x0f, M = 0x10, N = 0x11,
    O = 0x12, P = 0x13, Q = 0x14, R = 0x15, S = 0x16, T = 0x17, U = 0x18,
    V = 0x19, W = 0x1a, X = 0x1b, Y = 0x1c, Z = 0x1d,
    Digit1 = 0x1e, Digit2 = 0x1f, Digit3 = 0x20, Digit4 = 0x21, Digit5 = 0x22,
    Digit6 = 0x23, Digit7 = 0x24, Digit8 = 0x25, Digit9 = 0x26, Digit0 = 0x27,
    Enter = 0x28, Escape = 0x29, Backspace = 0x2a, Tab = 0x2b, Space = 0x2c,
    Minus = 0x2d, Equal = 0x2e, BracketLeft = 0x2f, BracketRight = 0x30,
    Backslash = 0x31, EuropeHash = 0x32, Semicolon = 0x33, Apostrophe = 0x34,
    Grave = 0x35, Comma = 0x36, Period = 0x37, Slash = 0x38, CapsLock = 0x39,
    F1 = 0x3a, F2 = 0x3b, F3 = 0x3c, F4 = 0x3d, F5 = 0x3e, F6 = 0x3f,
    F7 = 0x40, F8 = 0x41, F9 = 0x42, F10 = 0x43, F11 = 0x44, F12 = 0x45,
    PrintScreen = 0x46, ScrollLock = 0x47, Pause = 0x48, Insert = 0x49,
    Home = 0x4a, PageUp = 0x4b, Delete = 0x4c, End = 0x4d, PageDown = 0x4e,
    ArrowRight = 0x4f, ArrowLeft = 0x50, ArrowDown = 0x51, ArrowUp = 0x52,
    NumLock = 0x53, KeypadDivide = 0x54, KeypadMultiply = 0x55,
    KeypadSubtract = 0x56, KeypadAdd = 0x57, KeypadEnter = 0x58,
    Keypad1 = 0x59, Keypad2 = 0x5a, Keypad3 = 0x5b, Keypad4 = 0x5c,
    Keypad5 = 0x5d, Keypad6 = 0x5e, Keypad7 = 0x5f, Keypad8 = 0x60,
    Keypad9 = 0x61, Keypad0 = 0x62, KeypadDecimal = 0x63, KeypadEqual = 0x67,
}

impl Key {
    pub fn usage(self) -> u8 {
        self as u8
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0b01;
        const CTRL  = 0b10;
    }
}

/// `[plain, shifted]` ASCII per usage id, zero where a key types nothing.
static ASCII_TABLE: [[u8; 2]; 128] = build_ascii_table();

const fn build_ascii_table() -> [[u8; 2]; 128] {
    let mut table = [[0u8; 2]; 128];

    let mut i = 0;
    while i < 26 {
        table[0x04 + i] = [b'a' + i as u8, b'A' + i as u8];
        i += 1;
    }

    let digits = b"1234567890";
    let shifted = b"!@#$%^&*()";
    let mut i = 0;
    while i < 10 {
        table[0x1e + i] = [digits[i], shifted[i]];
        i += 1;
    }

    let rest: [(usize, u8, u8); 21] = [
        (0x28, b'\r', b'\r'),
        (0x29, 0x1b, 0x1b),
        (0x2a, 0x08, 0x08),
        (0x2b, b'\t', b'\t'),
        (0x2c, b' ', b' '),
        (0x2d, b'-', b'_'),
        (0x2e, b'=', b'+'),
        (0x2f, b'[', b'{'),
        (0x30, b']', b'}'),
        (0x31, b'\\', b'|'),
        (0x32, b'#', b'~'),
        (0x33, b';', b':'),
        (0x34, b'\'', b'"'),
        (0x35, b'`', b'~'),
        (0x36, b',', b'<'),
        (0x37, b'.', b'>'),
        (0x38, b'/', b'?'),
        (0x54, b'/', b'/'),
        (0x55, b'*', b'*'),
        (0x56, b'-', b'-'),
        (0x57, b'+', b'+'),
    ];
    let mut i = 0;
    while i < rest.len() {
        let (usage, plain, shift) = rest[i];
        table[usage] = [plain, shift];
        i += 1;
    }

    table[0x58] = [b'\r', b'\r'];
    let mut i = 0;
    while i < 9 {
        table[0x59 + i] = [b'1' + i as u8, 0];
        i += 1;
    }
    table[0x62] = [b'0', 0];
    table[0x63] = [b'.', 0];
    table[0x67] = [b'=', b'='];
    table
}

fn app_keypad_sequence(key: Key) -> Option<&'static [u8]> {
    Some(match key {
        Key::Keypad0 => b"\x1bOp",
        Key::Keypad1 => b"\x1bOq",
        Key::Keypad2 => b"\x1bOr",
        Key::Keypad3 => b"\x1bOs",
        Key::Keypad4 => b"\x1bOt",
        Key::Keypad5 => b"\x1bOu",
        Key::Keypad6 => b"\x1bOv",
        Key::Keypad7 => b"\x1bOw",
        Key::Keypad8 => b"\x1bOx",
        Key::Keypad9 => b"\x1bOy",
        Key::KeypadDecimal => b"\x1bOn",
        Key::KeypadDivide => b"\x1bOo",
        Key::KeypadMultiply => b"\x1bOj",
        Key::KeypadSubtract => b"\x1bOm",
        Key::KeypadAdd => b"\x1bOk",
        Key::KeypadEnter => b"\x1bOM",
        Key::KeypadEqual => b"\x1bOX",
        _ => return None,
    })
}

fn app_cursor_sequence(key: Key) -> Option<&'static [u8]> {
    Some(match key {
        Key::ArrowUp => b"\x1bOA",
        Key::ArrowDown => b"\x1bOB",
        Key::ArrowRight => b"\x1bOC",
        Key::ArrowLeft => b"\x1bOD",
        Key::Home => b"\x1bOH",
        Key::End => b"\x1bOF",
        _ => return None,
    })
}

fn named_sequence(key: Key, mods: KeyModifiers) -> Option<&'static [u8]> {
    let ctrl = mods.contains(KeyModifiers::CTRL);
    let sequence: &'static [u8] = match key {
        Key::ArrowUp if ctrl => b"\x1b[1;5A",
        Key::ArrowDown if ctrl => b"\x1b[1;5B",
        Key::ArrowRight if ctrl => b"\x1b[1;5C",
        Key::ArrowLeft if ctrl => b"\x1b[1;5D",
        Key::ArrowUp => b"\x1b[A",
        Key::ArrowDown => b"\x1b[B",
        Key::ArrowRight => b"\x1b[C",
        Key::ArrowLeft => b"\x1b[D",
        Key::Home => b"\x1b[H",
        Key::End => b"\x1b[F",
        Key::F1 => b"\x1bOP",
        Key::F2 => b"\x1bOQ",
        Key::F3 => b"\x1bOR",
        Key::F4 => b"\x1bOS",
        Key::F5 => b"\x1b[15~",
        Key::F6 => b"\x1b[17~",
        Key::F7 => b"\x1b[18~",
        Key::F8 => b"\x1b[19~",
        Key::F9 => b"\x1b[20~",
        Key::F10 => b"\x1b[21~",
        Key::F11 => b"\x1b[23~",
        Key::F12 => b"\x1b[24~",
        Key::Insert => b"\x1b[2~",
        Key::Delete => b"\x1b[3~",
        Key::PageUp => b"\x1b[5~",
        Key::PageDown => b"\x1b[6~",
        _ => return None,
    };
    Some(sequence)
}

fn ascii_byte(key: Key, mods: KeyModifiers) -> Option<u8> {
    let [plain, shifted] = ASCII_TABLE[usize::from(key.usage())];
    let byte = if mods.contains(KeyModifiers::CTRL) {
        match key {
            Key::Space => return Some(0x00),
            // ctrl-@ is NUL, still a byte to send
            _ if (0x40..=0x7f).contains(&shifted) => return Some(shifted & 0x1f),
            _ => plain,
        }
    } else if mods.contains(KeyModifiers::SHIFT) && shifted != 0 {
        shifted
    } else {
        plain
    };
    (byte != 0).then_some(byte)
}

/// Append the bytes `key` sends under `mods` and the current modes.
/// Returns false when the key sends nothing.
pub fn encode_key(key: Key, mods: KeyModifiers, modes: &TerminalModes, out: &mut Vec<u8>) -> bool {
    let sequence = modes
        .app_keypad
        .then(|| app_keypad_sequence(key))
        .flatten()
        .or_else(|| modes.app_cursor.then(|| app_cursor_sequence(key)).flatten())
        .or_else(|| named_sequence(key, mods));

    if let Some(sequence) = sequence {
        out.extend_from_slice(sequence);
        return true;
    }
    match ascii_byte(key, mods) {
        Some(byte) => {
            out.push(byte);
            true
        }
        None => false,
    }
}

#[derive(Clone, Copy, Debug)]
struct HeldKey {
    key: Key,
    mods: KeyModifiers,
    since: Instant,
}

/// Held-key set with timed auto-repeat.
#[derive(Debug)]
pub struct Keyboard {
    held: [Option<HeldKey>; MAX_PRESSED_KEYS],
    repeat_delay: Duration,
}

impl Keyboard {
    pub fn new(repeat_delay: Duration) -> Self {
        Self {
            held: [None; MAX_PRESSED_KEYS],
            repeat_delay,
        }
    }

    pub fn repeat_delay(&self) -> Duration {
        self.repeat_delay
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.iter().flatten().any(|h| h.key == key)
    }

    pub fn held_count(&self) -> usize {
        self.held.iter().flatten().count()
    }

    /// Transmit a newly pressed key and start tracking it for repeat.
    ///
    /// The key is always encoded; it only misses out on auto-repeat when all
    /// slots are taken.
    pub fn key_pressed(
        &mut self,
        key: Key,
        mods: KeyModifiers,
        now: Instant,
        modes: &TerminalModes,
        out: &mut Vec<u8>,
    ) -> bool {
        let sent = encode_key(key, mods, modes, out);
        let entry = HeldKey { key, mods, since: now };

        let slot = self
            .held
            .iter()
            .position(|h| h.is_some_and(|h| h.key == key))
            .or_else(|| self.held.iter().position(Option::is_none));
        match slot {
            Some(index) => self.held[index] = Some(entry),
            None => trace!("No free key slot for {:?}", key),
        }
        sent
    }

    pub fn key_released(&mut self, key: Key) {
        for slot in &mut self.held {
            if slot.is_some_and(|h| h.key == key) {
                *slot = None;
            }
        }
    }

    pub fn release_all(&mut self) {
        self.held = [None; MAX_PRESSED_KEYS];
    }

    /// Re-send every key held longer than the repeat delay. Returns how many
    /// keys were repeated.
    pub fn repeat(&mut self, now: Instant, modes: &TerminalModes, out: &mut Vec<u8>) -> usize {
        let mut repeated = 0;
        for held in self.held.iter().flatten() {
            if now.saturating_duration_since(held.since) > self.repeat_delay
                && encode_key(held.key, held.mods, modes, out)
            {
                repeated += 1;
            }
        }
        repeated
    }
}
