//! Ordinal-addressed text document.
//!
//! The buffer is a flat character sequence that always ends with the
//! [`SENTINEL`] character. Every valid ordinal indexes one character, the
//! sentinel included, so `last_ordinal()` is the append position.
//!
//! All mutation goes through [`Document`]. A mutating call takes the observer
//! that should hear about it and delivers, in order, one [`OrdinalShift`] and
//! one [`ContentChange`]. The buffer lives behind a coarse `RwLock` so a
//! [`DocumentReader`] can snapshot or persist it from another thread while the
//! edit thread keeps ownership of the `Document`.

use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, trace, warn};

pub mod breaks;
mod change;
mod error;
mod ordinal;
pub mod persist;
pub mod search;
pub mod width;

pub use change::{ContentChange, DocumentEvent, DocumentObserver, NullObserver, RecordingObserver};
pub use error::DocumentError;
pub use ordinal::{Ordinal, OrdinalShift, adjust_ordinal_for_shift};
pub use persist::{FsPersistence, Persistence};
pub use search::{SearchOptions, TextMatch};
pub use width::{GlyphWidthProvider, MonospaceGlyphs};

/// Terminator stored after the last character of every document.
pub const SENTINEL: char = '\0';

#[derive(Debug)]
struct TextBuffer {
    chars: Vec<char>,
    revision: u64,
    unsaved: bool,
}

impl TextBuffer {
    fn with_text(text: &str) -> Self {
        let mut chars: Vec<char> = text.chars().collect();
        chars.push(SENTINEL);
        Self {
            chars,
            revision: 0,
            unsaved: false,
        }
    }
}

type Shared = Arc<RwLock<TextBuffer>>;

fn read_lock(shared: &Shared) -> RwLockReadGuard<'_, TextBuffer> {
    shared.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock(shared: &Shared) -> RwLockWriteGuard<'_, TextBuffer> {
    shared.write().unwrap_or_else(PoisonError::into_inner)
}

/// Borrowed view of the buffer (sentinel included) held under the read lock.
pub struct TextRead<'a> {
    guard: RwLockReadGuard<'a, TextBuffer>,
}

impl TextRead<'_> {
    pub fn revision(&self) -> u64 {
        self.guard.revision
    }
}

impl Deref for TextRead<'_> {
    type Target = [char];

    fn deref(&self) -> &[char] {
        &self.guard.chars
    }
}

/// Immutable copy of the buffer taken at one revision.
#[derive(Debug, Clone)]
pub struct TextSnapshot {
    pub revision: u64,
    pub chars: Arc<[char]>,
}

/// Thread-safe handle for work that must not run on the edit thread.
#[derive(Debug, Clone)]
pub struct DocumentReader {
    shared: Shared,
}

impl DocumentReader {
    pub fn revision(&self) -> u64 {
        read_lock(&self.shared).revision
    }

    /// Copy the buffer under the read lock.
    pub fn snapshot(&self) -> TextSnapshot {
        let guard = read_lock(&self.shared);
        TextSnapshot {
            revision: guard.revision,
            chars: Arc::from(guard.chars.as_slice()),
        }
    }

    /// Persist the buffer. Clears the unsaved flag unless an edit landed while
    /// the write was in flight.
    pub fn save_to(&self, path: &Path, persistence: &dyn Persistence) -> Result<(), DocumentError> {
        let (text, revision) = {
            let guard = read_lock(&self.shared);
            let body = &guard.chars[..guard.chars.len() - 1];
            (body.iter().collect::<String>(), guard.revision)
        };
        persistence
            .write_all_text(path, &text)
            .map_err(|source| DocumentError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        let mut guard = write_lock(&self.shared);
        if guard.revision == revision {
            guard.unsaved = false;
        }
        info!(target: "text.document", path = %path.display(), chars = text.chars().count(), "file_saved");
        Ok(())
    }
}

#[derive(Debug)]
pub struct Document {
    shared: Shared,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document (sentinel only).
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            shared: Arc::new(RwLock::new(TextBuffer::with_text(text))),
        }
    }

    pub fn read(&self) -> TextRead<'_> {
        TextRead {
            guard: read_lock(&self.shared),
        }
    }

    pub fn reader(&self) -> DocumentReader {
        DocumentReader {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn revision(&self) -> u64 {
        read_lock(&self.shared).revision
    }

    /// Character count including the sentinel.
    pub fn len(&self) -> usize {
        read_lock(&self.shared).chars.len()
    }

    /// `true` when only the sentinel is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    pub fn first_ordinal(&self) -> Ordinal {
        Ordinal::ZERO
    }

    /// Ordinal of the sentinel.
    pub fn last_ordinal(&self) -> Ordinal {
        Ordinal::new(self.len() - 1)
    }

    pub fn has_unsaved_content(&self) -> bool {
        read_lock(&self.shared).unsaved
    }

    /// Character at a valid ordinal. Panics on an ordinal outside the buffer.
    pub fn char_at(&self, ordinal: Ordinal) -> char {
        let guard = read_lock(&self.shared);
        let index = checked_index(ordinal, guard.chars.len());
        guard.chars[index]
    }

    /// `ordinal + offset`, or `UNDEFINED` once past the sentinel.
    pub fn next_ordinal(&self, ordinal: Ordinal, offset: usize) -> Ordinal {
        step_forward(ordinal, offset, self.len())
    }

    /// `ordinal - offset`, or `BEFORE_BEGIN` once before the first character.
    pub fn previous_ordinal(&self, ordinal: Ordinal, offset: usize) -> Ordinal {
        step_backward(ordinal, offset)
    }

    /// Buffer contents without the sentinel.
    pub fn text(&self) -> String {
        let guard = read_lock(&self.shared);
        guard.chars[..guard.chars.len() - 1].iter().collect()
    }

    /// Characters in `[begin, end)`, clamped to the text before the sentinel.
    pub fn slice(&self, begin: Ordinal, end: Ordinal) -> String {
        let guard = read_lock(&self.shared);
        let last = guard.chars.len() - 1;
        let b = begin.index().unwrap_or(0).min(last);
        let e = end.index().unwrap_or(last).min(last).max(b);
        guard.chars[b..e].iter().collect()
    }

    /// Insert `text` before the character at `ordinal`.
    ///
    /// `ordinal` must lie in `[first_ordinal, last_ordinal]`. Empty text is a
    /// no-op and emits nothing.
    pub fn insert(&mut self, ordinal: Ordinal, text: &str, observer: &mut dyn DocumentObserver) {
        if text.is_empty() {
            return;
        }
        let len = text.chars().count();
        {
            let mut guard = write_lock(&self.shared);
            let index = checked_index(ordinal, guard.chars.len());
            guard.chars.splice(index..index, text.chars());
            guard.revision += 1;
            guard.unsaved = true;
        }
        trace!(target: "text.document", %ordinal, len, "insert");
        observer.on_ordinal_shift(OrdinalShift::new(ordinal, len as isize));
        let change = ContentChange::Inserted {
            begin: ordinal,
            end: ordinal.offset(len as isize),
            text: text.to_string(),
        };
        observer.on_content_change(self, &change);
    }

    /// Remove `length` characters starting at `ordinal` and return them.
    ///
    /// Panics when `length` is zero or the range reaches the sentinel.
    pub fn delete_at(
        &mut self,
        ordinal: Ordinal,
        length: usize,
        observer: &mut dyn DocumentObserver,
    ) -> String {
        assert!(length > 0, "delete_at requires a positive length");
        let removed: String = {
            let mut guard = write_lock(&self.shared);
            let index = checked_index(ordinal, guard.chars.len());
            assert!(
                index + length < guard.chars.len(),
                "delete range {ordinal}+{length} reaches the sentinel"
            );
            let removed = guard.chars.drain(index..index + length).collect();
            guard.revision += 1;
            guard.unsaved = true;
            removed
        };
        trace!(target: "text.document", %ordinal, length, "delete");
        observer.on_ordinal_shift(OrdinalShift::new(
            ordinal.offset(length as isize - 1),
            -(length as isize),
        ));
        let change = ContentChange::Deleted {
            at: ordinal,
            text: removed.clone(),
        };
        observer.on_content_change(self, &change);
        removed
    }

    /// Replace every match of `find` and return the match count.
    ///
    /// Matches are collected before the first edit and applied back to front,
    /// each as a delete followed by an insert through `observer`. A pattern
    /// that fails to compile counts as zero matches and leaves the buffer
    /// untouched.
    pub fn replace_all_text(
        &mut self,
        find: &str,
        replace: &str,
        options: SearchOptions,
        observer: &mut dyn DocumentObserver,
    ) -> usize {
        if find.is_empty() {
            return 0;
        }
        let re = match search::compile(find, &options) {
            Ok(re) => re,
            Err(err) => {
                warn!(target: "text.search", pattern = find, error = %err, "replace_pattern_rejected");
                return 0;
            }
        };
        let replacements = search::replacements(&self.read(), &re, replace, &options);
        for rep in replacements.iter().rev() {
            let span = rep.range.end.distance_from(rep.range.begin);
            if span > 0 {
                self.delete_at(rep.range.begin, span as usize, observer);
            }
            self.insert(rep.range.begin, &rep.text, observer);
        }
        debug!(target: "text.search", pattern = find, count = replacements.len(), regex = options.use_regex, "replace_all");
        replacements.len()
    }

    /// Every match of `find` in document order. Invalid patterns yield none.
    pub fn find_all(&self, find: &str, options: SearchOptions) -> Vec<TextMatch> {
        if find.is_empty() {
            return Vec::new();
        }
        match search::compile(find, &options) {
            Ok(re) => search::find(&self.read(), &re, &options),
            Err(err) => {
                warn!(target: "text.search", pattern = find, error = %err, "find_pattern_rejected");
                Vec::new()
            }
        }
    }

    /// Word around `ordinal` as `[begin, end)`, delimited by whitespace and
    /// control characters. A separator under `ordinal` yields an empty range.
    pub fn word_boundary(&self, ordinal: Ordinal) -> (Ordinal, Ordinal) {
        let chars = self.read();
        let last = chars.len() - 1;
        let index = checked_index(ordinal, chars.len());
        if index == last || breaks::is_separator(chars[index]) {
            return (ordinal, ordinal);
        }
        let mut begin = index;
        while begin > 0 && !breaks::is_separator(chars[begin - 1]) {
            begin -= 1;
        }
        let mut end = index;
        while end < last && !breaks::is_separator(chars[end]) {
            end += 1;
        }
        (Ordinal::new(begin), Ordinal::new(end))
    }

    /// Replace the whole buffer, announcing a full reset.
    pub fn reset_text(&mut self, text: &str, observer: &mut dyn DocumentObserver) {
        {
            let mut guard = write_lock(&self.shared);
            let revision = guard.revision + 1;
            *guard = TextBuffer::with_text(text);
            guard.revision = revision;
        }
        observer.on_content_change(self, &ContentChange::Reset);
    }

    /// Load `path` through `persistence`, replacing the buffer.
    pub fn load_file(
        &mut self,
        path: &Path,
        persistence: &dyn Persistence,
        observer: &mut dyn DocumentObserver,
    ) -> Result<(), DocumentError> {
        let text = persistence
            .read_all_text(path)
            .map_err(|source| DocumentError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        info!(target: "text.document", path = %path.display(), chars = text.chars().count(), "file_loaded");
        self.reset_text(&text, observer);
        Ok(())
    }

    /// Persist the buffer (sentinel stripped) and clear the unsaved flag.
    pub fn save_file(&self, path: &Path, persistence: &dyn Persistence) -> Result<(), DocumentError> {
        self.reader().save_to(path, persistence)
    }
}

fn checked_index(ordinal: Ordinal, len: usize) -> usize {
    match ordinal.index() {
        Some(index) if index < len => index,
        _ => panic!("ordinal {ordinal} outside document of length {len}"),
    }
}

/// Saturating forward step over a buffer of `len` characters.
pub fn step_forward(ordinal: Ordinal, offset: usize, len: usize) -> Ordinal {
    if ordinal == Ordinal::UNDEFINED {
        return Ordinal::UNDEFINED;
    }
    let raw = ordinal.get() + offset as i64;
    if raw >= len as i64 {
        Ordinal::UNDEFINED
    } else if raw < 0 {
        Ordinal::BEFORE_BEGIN
    } else {
        Ordinal::new(raw as usize)
    }
}

/// Saturating backward step.
pub fn step_backward(ordinal: Ordinal, offset: usize) -> Ordinal {
    if ordinal == Ordinal::UNDEFINED {
        return Ordinal::UNDEFINED;
    }
    let raw = ordinal.get() - offset as i64;
    if raw < 0 {
        Ordinal::BEFORE_BEGIN
    } else {
        Ordinal::new(raw as usize)
    }
}
