//! Optional per-line annotation (syntax highlighting).
//!
//! An annotator runs on every freshly built [`VisualLine`] and attaches
//! styled spans. Reflow consults [`LineAnnotator::can_reuse_line`] before it
//! resyncs on a cached line, so annotators with cross-line state (an open
//! block comment, a multi-line string) can force a downstream line to be
//! rebuilt.
//!
//! Span invariants:
//! * Offsets are char offsets into `VisualLine::text`, half-open
//!   `[start, end)`.
//! * Spans never extend past the line's text.

use crate::layout::VisualLine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanAttr {
    Syntax(u16),
    Selection,
    FindHighlight,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationSpan {
    pub start: usize, // inclusive
    pub end: usize,   // exclusive
    pub attr: SpanAttr,
}

impl AnnotationSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait LineAnnotator: Send {
    fn annotate(&mut self, line: &VisualLine) -> Vec<AnnotationSpan>;
    fn can_reuse_line(&self, line: &VisualLine) -> bool;
}

/// Layout's single view of the optional highlighter.
#[derive(Default)]
pub enum Annotator {
    #[default]
    None,
    Highlighter(Box<dyn LineAnnotator>),
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Annotator::None => f.write_str("Annotator::None"),
            Annotator::Highlighter(_) => f.write_str("Annotator::Highlighter(..)"),
        }
    }
}

impl Annotator {
    /// Replace `line.spans` with the highlighter's spans, clamped to the text.
    pub fn annotate(&mut self, line: &mut VisualLine) {
        let Annotator::Highlighter(h) = self else {
            return;
        };
        let len = line.char_count();
        let mut spans = h.annotate(line);
        spans.retain_mut(|s| {
            s.end = s.end.min(len);
            s.start < s.end
        });
        line.spans = spans;
    }

    pub fn can_reuse_line(&self, line: &VisualLine) -> bool {
        match self {
            Annotator::None => true,
            Annotator::Highlighter(h) => h.can_reuse_line(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Ordinal;

    struct Digits;

    impl LineAnnotator for Digits {
        fn annotate(&mut self, line: &VisualLine) -> Vec<AnnotationSpan> {
            line.text
                .chars()
                .enumerate()
                .filter(|(_, c)| c.is_ascii_digit())
                .map(|(i, _)| AnnotationSpan {
                    start: i,
                    end: i + 5,
                    attr: SpanAttr::Syntax(1),
                })
                .collect()
        }

        fn can_reuse_line(&self, line: &VisualLine) -> bool {
            !line.text.contains('#')
        }
    }

    fn line(text: &str) -> VisualLine {
        VisualLine {
            begin: Ordinal::ZERO,
            next: Ordinal::new(text.chars().count()),
            text: text.to_string(),
            width: 0.0,
            height: 1.0,
            has_hard_break: true,
            y: 0.0,
            spans: Vec::new(),
            stale: false,
        }
    }

    #[test]
    fn spans_are_clamped_to_line() {
        let mut a = Annotator::Highlighter(Box::new(Digits));
        let mut l = line("ab12");
        a.annotate(&mut l);
        assert_eq!(l.spans.len(), 2);
        assert_eq!(l.spans[0].start, 2);
        assert_eq!(l.spans[0].end, 4);
        assert_eq!(l.spans[1].len(), 1);
    }

    #[test]
    fn no_highlighter_reuses_everything() {
        let mut a = Annotator::None;
        let mut l = line("#1");
        a.annotate(&mut l);
        assert!(l.spans.is_empty());
        assert!(a.can_reuse_line(&l));
        assert!(!Annotator::Highlighter(Box::new(Digits)).can_reuse_line(&l));
    }
}
