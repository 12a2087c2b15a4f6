//! Character width measurement for the wrap algorithm.
//!
//! Layout never measures text itself; it asks a [`GlyphWidthProvider`] for the
//! advance of each character. Rendering backends supply their own provider
//! built from real font metrics. [`MonospaceGlyphs`] is the cell-grid provider
//! used by the headless binary and the tests: every character advances by a
//! whole number of cells as reported by `unicode_width`.
//!
//! Width rules for [`char_cells`]:
//! - Control characters (line breaks, the sentinel) occupy no cells.
//! - Tab occupies `tab_width` cells (no tab stops).
//! - East Asian wide / fullwidth characters occupy two cells.
//! - Combining marks and other zero-width characters occupy none.

use std::fmt;
use unicode_width::UnicodeWidthChar;

/// Font-metric capability injected into layout.
pub trait GlyphWidthProvider: Send + Sync + fmt::Debug {
    /// Horizontal advance of `c` in pixels.
    fn char_width(&self, c: char) -> f32;
    /// Height of one visual line in pixels.
    fn line_height(&self) -> f32;
}

/// Cell count for a single character.
pub fn char_cells(c: char, tab_width: u16) -> u16 {
    if c == '\t' {
        return tab_width;
    }
    if c.is_control() {
        return 0;
    }
    UnicodeWidthChar::width(c).unwrap_or(0) as u16
}

/// Fixed-pitch provider: `cells * cell_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceGlyphs {
    pub cell_width: f32,
    pub line_height: f32,
    pub tab_width: u16,
}

impl MonospaceGlyphs {
    pub const fn new(cell_width: f32, line_height: f32, tab_width: u16) -> Self {
        Self {
            cell_width,
            line_height,
            tab_width,
        }
    }

    /// One pixel per cell, one pixel per line. Widths equal cell counts.
    pub const fn unit() -> Self {
        Self::new(1.0, 1.0, 4)
    }
}

impl Default for MonospaceGlyphs {
    fn default() -> Self {
        Self::new(8.0, 16.0, 4)
    }
}

impl GlyphWidthProvider for MonospaceGlyphs {
    fn char_width(&self, c: char) -> f32 {
        char_cells(c, self.tab_width) as f32 * self.cell_width
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_one_cell() {
        assert_eq!(char_cells('a', 4), 1);
        assert_eq!(char_cells('~', 4), 1);
    }

    #[test]
    fn wide_cjk_is_two_cells() {
        assert_eq!(char_cells('界', 4), 2);
        assert_eq!(char_cells('Ｗ', 4), 2);
    }

    #[test]
    fn breaks_and_sentinel_have_no_width() {
        for c in ['\n', '\r', '\u{000B}', '\0'] {
            assert_eq!(char_cells(c, 4), 0, "{c:?}");
        }
    }

    #[test]
    fn combining_mark_has_no_width() {
        assert_eq!(char_cells('\u{0301}', 4), 0);
    }

    #[test]
    fn tab_uses_configured_width() {
        assert_eq!(char_cells('\t', 8), 8);
        let glyphs = MonospaceGlyphs::new(7.0, 14.0, 2);
        assert_eq!(glyphs.char_width('\t'), 14.0);
        assert_eq!(glyphs.char_width('x'), 7.0);
        assert_eq!(glyphs.line_height(), 14.0);
    }
}
