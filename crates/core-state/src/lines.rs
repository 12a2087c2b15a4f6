//! Ordinal <-> content line number mapping.
//!
//! A content line is a hard-break delimited paragraph; wrapping does not
//! create new content lines. The manager keeps one cached
//! `(ordinal, line number)` pair and answers queries by scanning from the
//! cache or from the document start, whichever is nearer.

use core_text::breaks::{breaks_between, count_hard_breaks, is_hard_break_at, paragraph_start};
use core_text::{ContentChange, Document, DocumentObserver, Ordinal, OrdinalShift};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct ContentLineManager {
    cached_ordinal: Ordinal,
    cached_line: usize,
    max_content_lines: usize,
}

impl ContentLineManager {
    pub fn new(document: &Document) -> Self {
        let mut lines = Self {
            cached_ordinal: Ordinal::UNDEFINED,
            cached_line: 0,
            max_content_lines: 1,
        };
        lines.recount(document);
        lines
    }

    /// Number of content lines (hard breaks + 1).
    pub fn max_content_lines(&self) -> usize {
        self.max_content_lines
    }

    /// Overwrite the line count with an externally computed value.
    pub fn set_max_content_lines(&mut self, lines: usize) {
        self.max_content_lines = lines.max(1);
    }

    /// Digits needed to print the largest line number, never below `min_digits`.
    pub fn gutter_digits(&self, min_digits: usize) -> usize {
        let mut digits = 1;
        let mut n = self.max_content_lines;
        while n >= 10 {
            n /= 10;
            digits += 1;
        }
        digits.max(min_digits)
    }

    /// Zero-based content line containing `ordinal`. Sentinels and
    /// out-of-range ordinals map to the last line.
    pub fn get_line_number(&mut self, document: &Document, ordinal: Ordinal) -> usize {
        if ordinal == self.cached_ordinal && self.cached_ordinal.is_valid() {
            return self.cached_line;
        }
        let chars = document.read();
        let last = chars.len() - 1;
        let index = ordinal.index().unwrap_or(last).min(last);

        let (from, line) = match self.cached_ordinal.index() {
            Some(cached) if cached <= last && cached.abs_diff(index) < index => {
                (cached, self.cached_line)
            }
            _ => (0, 0),
        };
        let line = if from <= index {
            line + count_hard_breaks(&chars, from, index)
        } else {
            line - count_hard_breaks(&chars, index, from)
        };
        self.cached_ordinal = Ordinal::new(index);
        self.cached_line = line;
        line
    }

    /// First ordinal of content line `line`, or `UNDEFINED` past the last line.
    pub fn get_begin_ordinal(&mut self, document: &Document, line: usize) -> Ordinal {
        if line >= self.max_content_lines {
            return Ordinal::UNDEFINED;
        }
        let chars = document.read();
        let last = chars.len() - 1;

        // Start from the beginning of the cached line when it is nearer.
        let (mut begin, mut current) = match self.cached_ordinal.index() {
            Some(cached) if cached <= last && self.cached_line.abs_diff(line) < line => (
                paragraph_start(&chars, self.cached_ordinal).index().unwrap_or(0),
                self.cached_line,
            ),
            _ => (0, 0),
        };
        while current > line {
            // Step back over the previous line's break, then roll forward
            // from the break before that to the actual line begin.
            begin = paragraph_start(&chars, Ordinal::new(begin.saturating_sub(1)))
                .index()
                .unwrap_or(0);
            current -= 1;
        }
        let mut index = begin;
        while current < line {
            if index >= last {
                return Ordinal::UNDEFINED;
            }
            if is_hard_break_at(&chars, index) {
                current += 1;
                begin = index + 1;
            }
            index += 1;
        }
        let found = Ordinal::new(begin);
        self.cached_ordinal = found;
        self.cached_line = line;
        found
    }

    fn recount(&mut self, document: &Document) {
        let chars = document.read();
        self.max_content_lines = count_hard_breaks(&chars, 0, chars.len()) + 1;
        self.cached_ordinal = Ordinal::UNDEFINED;
        self.cached_line = 0;
    }

    fn invalidate(&mut self) {
        self.cached_ordinal = Ordinal::UNDEFINED;
        self.cached_line = 0;
    }
}

impl DocumentObserver for ContentLineManager {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift) {
        shift.adjust(&mut self.cached_ordinal);
    }

    fn on_content_change(&mut self, document: &Document, change: &ContentChange) {
        let (begin, end, text) = match change {
            ContentChange::Reset => {
                self.recount(document);
                trace!(target: "state.lines", lines = self.max_content_lines, "line_count_reset");
                return;
            }
            ContentChange::Inserted { begin, end, text } => (*begin, *end, text.as_str()),
            ContentChange::Deleted { at, text } => (*at, *at, text.as_str()),
        };
        let (left, right) = {
            let chars = document.read();
            let b = begin.index().unwrap_or(0);
            let e = end.index().unwrap_or(0).min(chars.len() - 1);
            (b.checked_sub(1).map(|i| chars[i]), chars[e])
        };
        let with_text = breaks_between(left, text, right) as isize;
        let without_text = breaks_between(left, "", right) as isize;
        let delta = if change.end() > change.begin() {
            with_text - without_text
        } else {
            without_text - with_text
        };
        self.max_content_lines = (self.max_content_lines as isize + delta).max(1) as usize;

        if self.cached_ordinal.is_valid() {
            if self.cached_ordinal > end {
                self.cached_line = (self.cached_line as isize + delta).max(0) as usize;
            } else if self.cached_ordinal >= begin {
                self.invalidate();
            }
        }
        trace!(target: "state.lines", delta, lines = self.max_content_lines, "line_count_adjusted");
    }
}
