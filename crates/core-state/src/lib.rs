//! Editing state that tracks the document through ordinal shifts.
//!
//! - `undo`: replayable action log with transactions and insert coalescing.
//! - `lines`: ordinal <-> content line number with a single-entry cache.
//! - `selection` / `caret`: ordinal-tracked selection, highlight and caret.
//! - `clipboard`: most-recent-first ring of cut/copied text.
//!
//! Everything here implements [`core_text::DocumentObserver`] and must be
//! included in the observer passed to each document edit, otherwise its
//! stored ordinals go stale.

pub mod caret;
pub mod clipboard;
pub mod lines;
pub mod selection;
pub mod undo;

pub use caret::Caret;
pub use clipboard::{ClipboardProvider, ClipboardRing, MemoryClipboard};
pub use lines::ContentLineManager;
pub use selection::{SelectionDirection, SelectionManager, SelectionMode};
pub use undo::{UndoAction, UndoRedoManager};
