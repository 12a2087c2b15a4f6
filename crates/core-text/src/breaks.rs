//! Hard line-break classification shared by line numbering and layout.
//!
//! A hard break is `\n`, `\v`, or a `\r` that is not immediately followed by
//! `\n`. The pair `\r\n` is therefore one break whose breaking character is the
//! `\n`.

use crate::Ordinal;

/// Characters that may terminate a line.
#[inline]
pub fn is_break_char(c: char) -> bool {
    matches!(c, '\n' | '\u{000B}' | '\r')
}

/// `true` when `c` (followed by `next`) ends a line.
#[inline]
pub fn is_hard_break(c: char, next: char) -> bool {
    match c {
        '\n' | '\u{000B}' => true,
        '\r' => next != '\n',
        _ => false,
    }
}

/// `true` when the character at `index` ends a line. Out-of-range indices are
/// never breaks; the character after the final one reads as the sentinel.
#[inline]
pub fn is_hard_break_at(chars: &[char], index: usize) -> bool {
    match chars.get(index) {
        Some(&c) => is_hard_break(c, chars.get(index + 1).copied().unwrap_or('\0')),
        None => false,
    }
}

/// Word separators: whitespace and control characters.
#[inline]
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

/// Count hard breaks located in `[begin, end)`.
pub fn count_hard_breaks(chars: &[char], begin: usize, end: usize) -> usize {
    let end = end.min(chars.len());
    (begin..end).filter(|&i| is_hard_break_at(chars, i)).count()
}

/// Number of hard breaks contributed by `text` when it sits between `left`
/// (the character before it, if any) and `right` (the character after it).
///
/// Counts the break status of `left` and of every character of `text`, so the
/// difference of two calls gives an exact delta even when an edit splits or
/// joins a `\r\n` pair.
pub fn breaks_between(left: Option<char>, text: &str, right: char) -> usize {
    let mut count = 0;
    let mut prev = left;
    for c in text.chars() {
        if let Some(p) = prev
            && is_hard_break(p, c)
        {
            count += 1;
        }
        prev = Some(c);
    }
    if let Some(p) = prev
        && is_hard_break(p, right)
    {
        count += 1;
    }
    count
}

/// First ordinal of the paragraph (hard-break delimited line) containing
/// `ordinal`.
pub fn paragraph_start(chars: &[char], ordinal: Ordinal) -> Ordinal {
    let Some(mut index) = ordinal.index() else {
        return Ordinal::ZERO;
    };
    index = index.min(chars.len().saturating_sub(1));
    while index > 0 && !is_hard_break_at(chars, index - 1) {
        index -= 1;
    }
    Ordinal::new(index)
}
