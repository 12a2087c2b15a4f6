//! Bounded most-recent-first ring of cut/copied text.

use std::collections::VecDeque;

use tracing::trace;

/// System clipboard capability: plain get/set of text.
pub trait ClipboardProvider {
    fn get_text(&mut self) -> Option<String>;
    fn set_text(&mut self, text: &str);
}

/// In-process clipboard used by tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct ClipboardRing {
    entries: VecDeque<String>, // newest at index 0, length <= capacity
    capacity: usize,
    cursor: usize,
    evictions: u64,
}

impl ClipboardRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cursor: 0,
            evictions: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Shrink or grow the ring, evicting the oldest entries first.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
            self.evictions += 1;
        }
        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }
    }

    /// Prepend `text` unless it is empty or already the head.
    pub fn add(&mut self, text: &str) {
        if text.is_empty() || self.entries.front().is_some_and(|head| head == text) {
            return;
        }
        self.entries.push_front(text.to_string());
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
            self.evictions += 1;
        }
        self.cursor = 0;
        trace!(target: "state.clipboard", len = self.entries.len(), "ring_add");
    }

    /// Entry at the cursor; advances the cursor modulo the ring length.
    pub fn paste_next(&mut self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let text = self.entries.get(self.cursor).cloned();
        self.cursor = (self.cursor + 1) % self.entries.len();
        text
    }

    /// Entry `index` (wrapped modulo the ring length); the cursor moves there.
    pub fn paste_entry(&mut self, index: usize) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = index % self.entries.len();
        self.entries.get(self.cursor).cloned()
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Make sure the system clipboard's current text heads the ring.
    pub fn sync_from(&mut self, provider: &mut dyn ClipboardProvider) {
        if let Some(text) = provider.get_text() {
            self.add(&text);
        }
    }
}
