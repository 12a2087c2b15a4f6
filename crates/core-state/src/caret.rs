//! Insertion point.

use core_text::{ContentChange, Document, DocumentObserver, Ordinal, OrdinalShift};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caret {
    ordinal: Ordinal,
    /// Horizontal position kept across up/down movement.
    preferred_x: Option<f32>,
}

impl Default for Caret {
    fn default() -> Self {
        Self {
            ordinal: Ordinal::ZERO,
            preferred_x: None,
        }
    }
}

impl Caret {
    pub fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    pub fn preferred_x(&self) -> Option<f32> {
        self.preferred_x
    }

    /// Place the caret and forget the vertical-movement column.
    pub fn move_to(&mut self, ordinal: Ordinal) {
        self.ordinal = ordinal;
        self.preferred_x = None;
    }

    /// Place the caret during vertical movement, remembering `x`.
    pub fn move_vertically(&mut self, ordinal: Ordinal, x: f32) {
        self.ordinal = ordinal;
        self.preferred_x = Some(x);
    }

    /// Caret stop one step right of `ordinal`; `\r\n` is crossed in one step
    /// and the sentinel is the last stop.
    pub fn step_right(document: &Document, ordinal: Ordinal) -> Ordinal {
        let chars = document.read();
        let last = chars.len() - 1;
        let Some(index) = ordinal.index() else {
            return Ordinal::new(last);
        };
        if index >= last {
            return Ordinal::new(last);
        }
        let step = if chars[index] == '\r' && chars[index + 1] == '\n' {
            2
        } else {
            1
        };
        Ordinal::new((index + step).min(last))
    }

    /// Caret stop one step left of `ordinal`.
    pub fn step_left(document: &Document, ordinal: Ordinal) -> Ordinal {
        let chars = document.read();
        let index = ordinal.index().unwrap_or(chars.len() - 1).min(chars.len() - 1);
        if index == 0 {
            return Ordinal::ZERO;
        }
        let step = if index >= 2 && chars[index - 1] == '\n' && chars[index - 2] == '\r' {
            2
        } else {
            1
        };
        Ordinal::new(index - step)
    }
}

impl DocumentObserver for Caret {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift) {
        shift.adjust(&mut self.ordinal);
    }

    fn on_content_change(&mut self, _document: &Document, change: &ContentChange) {
        if change.is_reset() {
            self.move_to(Ordinal::ZERO);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::NullObserver;

    fn o(i: usize) -> Ordinal {
        Ordinal::new(i)
    }

    #[test]
    fn caret_after_insert_point_moves() {
        let mut doc = Document::from_text("ab\ncd");
        let mut caret = Caret::default();
        caret.move_to(o(4));
        doc.insert(o(2), "X", &mut caret);
        assert_eq!(doc.text(), "abX\ncd");
        assert_eq!(caret.ordinal(), o(5));
    }

    #[test]
    fn caret_inside_deleted_range_collapses() {
        let mut doc = Document::from_text("abcdef");
        let mut caret = Caret::default();
        caret.move_to(o(3));
        doc.delete_at(o(1), 4, &mut caret);
        assert_eq!(caret.ordinal(), o(1));
    }

    #[test]
    fn steps_cross_crlf_as_one_unit() {
        let doc = Document::from_text("a\r\nb");
        assert_eq!(Caret::step_right(&doc, o(1)), o(3));
        assert_eq!(Caret::step_left(&doc, o(3)), o(1));
        assert_eq!(Caret::step_right(&doc, o(4)), o(4));
        assert_eq!(Caret::step_left(&doc, o(0)), o(0));
    }

    #[test]
    fn reset_returns_caret_home() {
        let mut doc = Document::from_text("abc");
        let mut caret = Caret::default();
        caret.move_vertically(o(2), 12.0);
        doc.reset_text("x", &mut caret);
        assert_eq!(caret.ordinal(), o(0));
        assert_eq!(caret.preferred_x(), None);
        doc.insert(o(0), "y", &mut NullObserver);
    }
}
