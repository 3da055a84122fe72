//! Recording renderer for tests and headless runs

use elterm_ansi::Attrs;

use crate::traits::Renderer;

/// One renderer call, as recorded by [`DummyRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOp {
    Glyph {
        col: usize,
        row: usize,
        ch: u8,
        fg: u8,
        bg: u8,
        attrs: Attrs,
    },
    Fill {
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
        color: u8,
    },
}

/// Renderer that records operations instead of drawing.
#[derive(Debug, Default)]
pub struct DummyRenderer {
    ops: Vec<DrawOp>,
}

impl DummyRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get recorded operations for testing
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn glyph_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Glyph { .. })).count()
    }

    /// Clear recorded operations
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Renderer for DummyRenderer {
    fn draw_glyph(&mut self, col: usize, row: usize, ch: u8, fg: u8, bg: u8, attrs: Attrs) {
        self.ops.push(DrawOp::Glyph { col, row, ch, fg, bg, attrs });
    }

    fn fill_rect(&mut self, x1: usize, y1: usize, x2: usize, y2: usize, color: u8) {
        self.ops.push(DrawOp::Fill { x1, y1, x2, y2, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_renderer_records_in_order() {
        let mut renderer = DummyRenderer::new();
        renderer.draw_glyph(1, 2, b'A', 7, 0, Attrs::BOLD);
        renderer.fill_rect(0, 0, 1, 1, 7);

        assert_eq!(renderer.ops().len(), 2);
        assert_eq!(renderer.glyph_count(), 1);
        assert_eq!(
            renderer.ops()[0],
            DrawOp::Glyph { col: 1, row: 2, ch: b'A', fg: 7, bg: 0, attrs: Attrs::BOLD }
        );

        renderer.clear();
        assert!(renderer.ops().is_empty());
    }
}
