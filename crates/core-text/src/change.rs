//! Mutation notifications and the observer seam.
//!
//! Each edit delivers exactly one [`OrdinalShift`] followed by exactly one
//! [`ContentChange`] to the observer passed into the mutating call. Delivery
//! is synchronous; by the time `on_content_change` runs every observer has
//! already renormalized its stored ordinals.

use crate::{Document, Ordinal, OrdinalShift};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentChange {
    /// `text` now occupies `[begin, end)`.
    Inserted {
        begin: Ordinal,
        end: Ordinal,
        text: String,
    },
    /// `text` was removed at `at` (begin == end).
    Deleted { at: Ordinal, text: String },
    /// The whole buffer was replaced (begin == end == `UNDEFINED`, no text).
    Reset,
}

impl ContentChange {
    pub fn begin(&self) -> Ordinal {
        match self {
            ContentChange::Inserted { begin, .. } => *begin,
            ContentChange::Deleted { at, .. } => *at,
            ContentChange::Reset => Ordinal::UNDEFINED,
        }
    }

    pub fn end(&self) -> Ordinal {
        match self {
            ContentChange::Inserted { end, .. } => *end,
            ContentChange::Deleted { at, .. } => *at,
            ContentChange::Reset => Ordinal::UNDEFINED,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ContentChange::Inserted { text, .. } | ContentChange::Deleted { text, .. } => {
                Some(text)
            }
            ContentChange::Reset => None,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, ContentChange::Reset)
    }
}

/// Receives the notifications of a single mutating call.
pub trait DocumentObserver {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift);
    fn on_content_change(&mut self, document: &Document, change: &ContentChange);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DocumentObserver for NullObserver {
    fn on_ordinal_shift(&mut self, _shift: OrdinalShift) {}
    fn on_content_change(&mut self, _document: &Document, _change: &ContentChange) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Shift(OrdinalShift),
    Change(ContentChange),
}

/// Observer that keeps every notification in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<DocumentEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }
}

impl DocumentObserver for RecordingObserver {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift) {
        self.events.push(DocumentEvent::Shift(shift));
    }

    fn on_content_change(&mut self, _document: &Document, change: &ContentChange) {
        self.events.push(DocumentEvent::Change(change.clone()));
    }
}
