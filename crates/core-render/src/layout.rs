//! Visual line construction.
//!
//! `LineLayoutBuilder::next_line` scans forward from a line begin and stops at
//! the first of:
//! * a hard break (`\n`, `\v`, lone `\r`, or the two-character `\r\n`), which
//!   is kept in the line's text;
//! * the document sentinel, which ends the last line (`next == UNDEFINED`,
//!   hard break set, sentinel not part of the text);
//! * a soft wrap point once accumulated glyph width exceeds the layout width.
//!
//! A line always consumes at least one ordinal: a single glyph wider than the
//! layout width still gets its own line.

use std::fmt;
use std::sync::Arc;

use core_config::WrapMode;
use core_text::breaks::{is_break_char, paragraph_start};
use core_text::{GlyphWidthProvider, Ordinal};
use tracing::trace;

use crate::annotate::AnnotationSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct VisualLine {
    pub begin: Ordinal,
    /// Begin of the following line; `UNDEFINED` for the document's last line.
    pub next: Ordinal,
    /// Characters of `[begin, next)` without the sentinel.
    pub text: String,
    pub width: f32,
    pub height: f32,
    pub has_hard_break: bool,
    /// Top of the line relative to the first cached line.
    pub y: f32,
    pub spans: Vec<AnnotationSpan>,
    /// Set when an ordinal shift clamped this line's bounds; stale lines are
    /// never reused by reflow.
    pub stale: bool,
}

impl VisualLine {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// `true` when `ordinal` is a caret position on this line.
    pub fn contains(&self, ordinal: Ordinal) -> bool {
        ordinal >= self.begin && (ordinal < self.next || self.next == Ordinal::UNDEFINED)
    }

    /// Left edge of the character at `ordinal`, clamped to the line.
    pub fn char_x(&self, glyphs: &dyn GlyphWidthProvider, ordinal: Ordinal) -> f32 {
        if ordinal <= self.begin {
            return 0.0;
        }
        if self.next != Ordinal::UNDEFINED && ordinal >= self.next {
            return self.width;
        }
        let local = ordinal.distance_from(self.begin).max(0) as usize;
        self.text.chars().take(local).map(|c| glyphs.char_width(c)).sum()
    }

    /// Caret ordinal nearest to horizontal position `x`. Never lands after the
    /// line's hard break.
    pub fn hit_test(&self, glyphs: &dyn GlyphWidthProvider, x: f32) -> Ordinal {
        let chars: Vec<char> = self.text.chars().collect();
        let mut offset = chars.len();
        let mut left = 0.0;
        for (i, &c) in chars.iter().enumerate() {
            let w = glyphs.char_width(c);
            if left + w / 2.0 > x {
                offset = i;
                break;
            }
            left += w;
        }
        if self.has_hard_break {
            if offset > 0 && chars[offset - 1] == '\n' {
                offset -= 1;
            }
            if offset > 0 && is_break_char(chars[offset - 1]) {
                offset -= 1;
            }
        }
        self.begin.offset(offset as isize)
    }
}

#[derive(Clone)]
pub struct LineLayoutBuilder {
    glyphs: Arc<dyn GlyphWidthProvider>,
    wrap: WrapMode,
}

impl fmt::Debug for LineLayoutBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineLayoutBuilder")
            .field("glyphs", &self.glyphs)
            .field("wrap", &self.wrap)
            .finish()
    }
}

/// Word wrap may break before or after these.
pub(crate) fn is_break_opportunity(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_ascii_punctuation()
}

impl LineLayoutBuilder {
    pub fn new(glyphs: Arc<dyn GlyphWidthProvider>, wrap: WrapMode) -> Self {
        Self { glyphs, wrap }
    }

    pub fn glyphs(&self) -> &dyn GlyphWidthProvider {
        self.glyphs.as_ref()
    }

    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    pub fn average_line_height(&self) -> f32 {
        self.glyphs.line_height()
    }

    pub fn average_digit_width(&self) -> f32 {
        ('0'..='9').map(|c| self.glyphs.char_width(c)).sum::<f32>() / 10.0
    }

    /// Begin of the hard-break delimited paragraph containing `ordinal`.
    pub fn paragraph_start(&self, chars: &[char], ordinal: Ordinal) -> Ordinal {
        paragraph_start(chars, ordinal)
    }

    /// Lay out one line of `chars` (sentinel included) starting at `begin`.
    pub fn next_line(&self, chars: &[char], begin: Ordinal, width: f32) -> VisualLine {
        let last = chars.len() - 1;
        let start = match begin.index() {
            Some(i) if i <= last => i,
            _ => panic!("line begin {begin} outside document of length {}", chars.len()),
        };
        let mut i = start;
        let mut text = String::new();
        let mut line_width = 0.0_f32;
        let mut hard = false;
        let mut reached_end = false;

        loop {
            if i >= last {
                reached_end = true;
                hard = true;
                break;
            }
            let c = chars[i];
            if c == '\r' && chars[i + 1] == '\n' {
                text.push_str("\r\n");
                i += 2;
                hard = true;
                break;
            }
            if is_break_char(c) {
                text.push(c);
                i += 1;
                hard = true;
                break;
            }
            match self.wrap {
                WrapMode::None => {
                    text.push(c);
                    line_width += self.glyphs.char_width(c);
                    i += 1;
                }
                WrapMode::Character => {
                    let w = self.glyphs.char_width(c);
                    if line_width + w > width && i != start {
                        break;
                    }
                    text.push(c);
                    line_width += w;
                    i += 1;
                }
                WrapMode::Word => {
                    if is_break_opportunity(c) {
                        let w = self.glyphs.char_width(c);
                        let must_break = line_width + w > width;
                        if !must_break || i == start {
                            text.push(c);
                            line_width += w;
                            i += 1;
                        }
                        if must_break {
                            break;
                        }
                        continue;
                    }
                    let first_word = i == start;
                    let mut word_width = self.glyphs.char_width(c);
                    if line_width + word_width > width && !first_word {
                        break;
                    }
                    let mut j = i + 1;
                    let mut fits = true;
                    while j < last && !is_break_opportunity(chars[j]) {
                        let w = self.glyphs.char_width(chars[j]);
                        if line_width + word_width + w > width {
                            // A word longer than the line is split.
                            fits = first_word;
                            break;
                        }
                        word_width += w;
                        j += 1;
                    }
                    if !fits {
                        break;
                    }
                    text.extend(&chars[i..j]);
                    line_width += word_width;
                    i = j;
                }
            }
        }

        let next = if reached_end {
            Ordinal::UNDEFINED
        } else {
            Ordinal::new(i)
        };
        trace!(target: "render.reflow", %begin, %next, hard, "line_built");
        VisualLine {
            begin,
            next,
            text,
            width: line_width,
            height: self.glyphs.line_height(),
            has_hard_break: hard,
            y: 0.0,
            spans: Vec::new(),
            stale: false,
        }
    }

    /// Lines of the paragraph that ends right before `next`, from the
    /// paragraph start up to `next`. Empty when `next` is the first ordinal.
    pub fn previous_lines(&self, chars: &[char], next: Ordinal, width: f32) -> Vec<VisualLine> {
        let last = chars.len() - 1;
        let end = match next.index() {
            Some(i) => i.min(last + 1),
            None if next == Ordinal::UNDEFINED => last + 1,
            None => return Vec::new(),
        };
        if end == 0 {
            return Vec::new();
        }
        let mut begin = paragraph_start(chars, Ordinal::new(end - 1));
        let mut lines = Vec::new();
        while begin.index().is_some_and(|b| b < end) {
            let line = self.next_line(chars, begin, width);
            begin = line.next;
            lines.push(line);
        }
        lines
    }
}
