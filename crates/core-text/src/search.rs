//! Literal and regex search over a document region.
//!
//! Matching runs on a UTF-8 copy of the region; byte offsets are mapped back
//! to ordinals through a char-boundary table. Literal patterns are escaped and
//! compiled through the same engine so case folding behaves identically in
//! both modes.

use regex::{Regex, RegexBuilder};

use crate::Ordinal;

/// Options shared by `find_all` and `replace_all_text`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub match_case: bool,
    pub use_regex: bool,
    /// First ordinal of the searched region (document start when `None`).
    pub range_begin: Option<Ordinal>,
    /// Exclusive end of the searched region (sentinel when `None`).
    pub range_end: Option<Ordinal>,
}

impl SearchOptions {
    pub fn literal() -> Self {
        Self::default()
    }

    pub fn regex() -> Self {
        Self {
            use_regex: true,
            ..Self::default()
        }
    }

    pub fn match_case(mut self, yes: bool) -> Self {
        self.match_case = yes;
        self
    }

    pub fn within(mut self, begin: Ordinal, end: Ordinal) -> Self {
        self.range_begin = Some(begin);
        self.range_end = Some(end);
        self
    }
}

/// Half-open match range `[begin, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMatch {
    pub begin: Ordinal,
    pub end: Ordinal,
}

/// A match plus the text that should replace it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Replacement {
    pub range: TextMatch,
    pub text: String,
}

pub(crate) fn compile(pattern: &str, options: &SearchOptions) -> Result<Regex, regex::Error> {
    let source = if options.use_regex {
        pattern.to_string()
    } else {
        regex::escape(pattern)
    };
    RegexBuilder::new(&source)
        .case_insensitive(!options.match_case)
        .multi_line(true)
        .build()
}

/// Region `[begin, end)` in char indices, clamped to the text before the
/// sentinel.
fn region(chars: &[char], options: &SearchOptions) -> (usize, usize) {
    let last = chars.len().saturating_sub(1);
    let begin = options
        .range_begin
        .and_then(Ordinal::index)
        .unwrap_or(0)
        .min(last);
    let end = options
        .range_end
        .and_then(Ordinal::index)
        .unwrap_or(last)
        .min(last)
        .max(begin);
    (begin, end)
}

struct RegionText {
    base: usize,
    text: String,
    /// Byte offset of each char, plus the total length.
    offsets: Vec<usize>,
}

impl RegionText {
    fn new(chars: &[char], begin: usize, end: usize) -> Self {
        let mut text = String::with_capacity(end - begin);
        let mut offsets = Vec::with_capacity(end - begin + 1);
        for &c in &chars[begin..end] {
            offsets.push(text.len());
            text.push(c);
        }
        offsets.push(text.len());
        Self {
            base: begin,
            text,
            offsets,
        }
    }

    fn ordinal_at_byte(&self, byte: usize) -> Ordinal {
        let index = self.offsets.partition_point(|&o| o < byte);
        Ordinal::new(self.base + index)
    }
}

pub(crate) fn find(chars: &[char], re: &Regex, options: &SearchOptions) -> Vec<TextMatch> {
    let (begin, end) = region(chars, options);
    let region = RegionText::new(chars, begin, end);
    re.find_iter(&region.text)
        .map(|m| TextMatch {
            begin: region.ordinal_at_byte(m.start()),
            end: region.ordinal_at_byte(m.end()),
        })
        .collect()
}

pub(crate) fn replacements(
    chars: &[char],
    re: &Regex,
    replace: &str,
    options: &SearchOptions,
) -> Vec<Replacement> {
    let (begin, end) = region(chars, options);
    let region = RegionText::new(chars, begin, end);
    re.captures_iter(&region.text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let text = if options.use_regex {
                let mut dst = String::new();
                caps.expand(replace, &mut dst);
                dst
            } else {
                replace.to_string()
            };
            Some(Replacement {
                range: TextMatch {
                    begin: region.ordinal_at_byte(m.start()),
                    end: region.ordinal_at_byte(m.end()),
                },
                text,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().chain(std::iter::once('\0')).collect()
    }

    #[test]
    fn literal_escapes_metacharacters() {
        let c = chars("a.b axb a.b");
        let opts = SearchOptions::literal();
        let re = compile("a.b", &opts).unwrap();
        let hits = find(&c, &re, &opts);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].begin, Ordinal::new(8));
        assert_eq!(hits[1].end, Ordinal::new(11));
    }

    #[test]
    fn case_folding_follows_match_case() {
        let c = chars("Word word WORD");
        let folded = SearchOptions::literal();
        let re = compile("word", &folded).unwrap();
        assert_eq!(find(&c, &re, &folded).len(), 3);
        let exact = SearchOptions::literal().match_case(true);
        let re = compile("word", &exact).unwrap();
        assert_eq!(find(&c, &re, &exact).len(), 1);
    }

    #[test]
    fn multibyte_offsets_map_to_ordinals() {
        let c = chars("ünï ünï");
        let opts = SearchOptions::literal();
        let re = compile("nï", &opts).unwrap();
        let hits = find(&c, &re, &opts);
        assert_eq!(
            hits,
            vec![
                TextMatch {
                    begin: Ordinal::new(1),
                    end: Ordinal::new(3)
                },
                TextMatch {
                    begin: Ordinal::new(5),
                    end: Ordinal::new(7)
                },
            ]
        );
    }

    #[test]
    fn range_restricts_search() {
        let c = chars("cat cat cat");
        let opts = SearchOptions::literal().within(Ordinal::new(2), Ordinal::new(8));
        let re = compile("cat", &opts).unwrap();
        let hits = find(&c, &re, &opts);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].begin, Ordinal::new(4));
    }

    #[test]
    fn regex_replacement_expands_groups() {
        let c = chars("x=1, y=2");
        let opts = SearchOptions::regex();
        let re = compile(r"(\w)=(\d)", &opts).unwrap();
        let reps = replacements(&c, &re, "$2=$1", &opts);
        assert_eq!(reps.len(), 2);
        assert_eq!(reps[0].text, "1=x");
        assert_eq!(reps[1].text, "2=y");
    }

    #[test]
    fn invalid_regex_fails_to_compile() {
        assert!(compile("(unclosed", &SearchOptions::regex()).is_err());
    }
}
