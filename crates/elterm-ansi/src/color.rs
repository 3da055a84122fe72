/// Foreground/background pair of 4-bit palette indices, packed as `(fg << 4) | bg`.
///
/// Indices are opaque here. Turning an index into a real hue or grey level is
/// up to the renderer of the target display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorPair(u8);

/// Foreground index used after reset and by SGR 39.
pub const DEFAULT_FG: u8 = WHITE;
/// Background index used after reset and by SGR 49.
pub const DEFAULT_BG: u8 = BLACK;

// 16-color ANSI index names
pub const BLACK: u8 = 0;
pub const RED: u8 = 1;
pub const GREEN: u8 = 2;
pub const YELLOW: u8 = 3;
pub const BLUE: u8 = 4;
pub const MAGENTA: u8 = 5;
pub const CYAN: u8 = 6;
pub const WHITE: u8 = 7;
pub const BRIGHT_BLACK: u8 = 8;
pub const BRIGHT_WHITE: u8 = 15;

impl ColorPair {
    pub const DEFAULT: ColorPair = ColorPair::new(DEFAULT_FG, DEFAULT_BG);

    pub const fn new(fg: u8, bg: u8) -> Self {
        Self(((fg & 0x0f) << 4) | (bg & 0x0f))
    }

    pub const fn from_packed(packed: u8) -> Self {
        Self(packed)
    }

    pub const fn packed(self) -> u8 {
        self.0
    }

    pub const fn fg(self) -> u8 {
        self.0 >> 4
    }

    pub const fn bg(self) -> u8 {
        self.0 & 0x0f
    }

    pub const fn with_fg(self, fg: u8) -> Self {
        Self::new(fg, self.bg())
    }

    pub const fn with_bg(self, bg: u8) -> Self {
        Self::new(self.fg(), bg)
    }
}

impl Default for ColorPair {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for ColorPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fg={} bg={}", self.fg(), self.bg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_foreground_high_nibble() {
        let c = ColorPair::new(RED, BLUE);
        assert_eq!(c.packed(), 0x14);
        assert_eq!(c.fg(), RED);
        assert_eq!(c.bg(), BLUE);
    }

    #[test]
    fn with_fg_keeps_background() {
        let c = ColorPair::DEFAULT.with_fg(BRIGHT_WHITE);
        assert_eq!(c.fg(), BRIGHT_WHITE);
        assert_eq!(c.bg(), DEFAULT_BG);
        assert_eq!(c.with_bg(CYAN).fg(), BRIGHT_WHITE);
    }

    #[test]
    fn indices_are_masked_to_four_bits() {
        let c = ColorPair::new(0x1f, 0x2a);
        assert_eq!(c.fg(), 0x0f);
        assert_eq!(c.bg(), 0x0a);
    }
}
