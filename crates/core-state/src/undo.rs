//! Replayable undo/redo log.
//!
//! The manager observes user edits (it is part of the observer fan-out passed
//! to `Document::insert` / `delete_at`) and appends one [`UndoAction`] per
//! content change to an append-only arena. `cursor` splits the arena into
//! applied history `log[..cursor]` and redo history `log[cursor..]`.
//!
//! Replays run through `undo` / `redo`, which call the document with the
//! caller's observer only, so replayed edits are never recorded again.
//!
//! Shift records: when an edit lands before the position of some applied
//! action, the edit's [`OrdinalShift`] is recorded just ahead of its action.
//! An action's effective ordinal is its recorded ordinal corrected by every
//! shift record between it and the cursor. A shift record always sits directly
//! below the action that produced it, so undoing that action also moves the
//! cursor below its shift record.
//!
//! Replay is strictly linear: when an action is undone or redone every action
//! above it is unapplied, its correction range is empty and the recorded
//! ordinal is used as is. The correction moves ordinals only while later
//! actions are applied, which is how insert coalescing finds where an earlier
//! insert sits in the current text.
//!
//! Insert coalescing: an insert that continues the newest applied insert
//! (reachable across shift records and save markers only) merges into it when
//! neither boundary character is whitespace or control.

use std::sync::atomic::{AtomicU64, Ordering};

use core_text::breaks::is_separator;
use core_text::{ContentChange, Document, DocumentObserver, Ordinal, OrdinalShift};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    Insert {
        ordinal: Ordinal,
        text: String,
        in_transaction: bool,
    },
    Delete {
        ordinal: Ordinal,
        text: String,
        in_transaction: bool,
    },
    TransactionBegin,
    TransactionEnd,
    OrdinalShift(OrdinalShift),
    SaveMarker,
}

impl UndoAction {
    fn is_edit(&self) -> bool {
        matches!(self, UndoAction::Insert { .. } | UndoAction::Delete { .. })
    }
}

/// Stand-in for "some applied action may sit after any shift point".
const ALWAYS_INTERESTING: Ordinal = Ordinal::new(usize::MAX >> 2);

#[derive(Debug)]
pub struct UndoRedoManager {
    log: Vec<UndoAction>,
    cursor: usize,
    transaction_depth: usize,
    /// Upper bound on the current ordinal of any applied action.
    max_interesting: Ordinal,
    /// Shift record produced by the edit whose content change is pending.
    pending_shift: Option<usize>,
    merged_inserts: AtomicU64,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoRedoManager {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            cursor: 0,
            transaction_depth: 0,
            max_interesting: Ordinal::BEFORE_BEGIN,
            pending_shift: None,
            merged_inserts: AtomicU64::new(0),
        }
    }

    pub fn actions(&self) -> &[UndoAction] {
        &self.log
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.log[..self.cursor].iter().any(UndoAction::is_edit)
    }

    pub fn can_redo(&self) -> bool {
        self.log[self.cursor..].iter().any(UndoAction::is_edit)
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }

    pub fn merged_inserts(&self) -> u64 {
        self.merged_inserts.load(Ordering::Relaxed)
    }

    /// Open a transaction. Nested calls join the outermost transaction.
    pub fn begin_transaction(&mut self) {
        if self.transaction_depth == 0 {
            self.push(UndoAction::TransactionBegin);
        }
        self.transaction_depth += 1;
    }

    /// Close a transaction. A transaction that recorded nothing leaves no
    /// barriers behind.
    pub fn end_transaction(&mut self) {
        assert!(
            self.transaction_depth > 0,
            "end_transaction without begin_transaction"
        );
        self.transaction_depth -= 1;
        if self.transaction_depth > 0 {
            return;
        }
        if self.cursor == self.log.len() && self.log.last() == Some(&UndoAction::TransactionBegin) {
            self.log.pop();
            self.cursor = self.log.len();
            trace!(target: "state.undo", "empty_transaction_dropped");
        } else {
            self.push(UndoAction::TransactionEnd);
        }
    }

    /// Record that the document was saved at this point of the history.
    pub fn mark_saved(&mut self) {
        self.push(UndoAction::SaveMarker);
    }

    /// Drop all history (full buffer replacement).
    pub fn clear(&mut self) {
        self.log.clear();
        self.cursor = 0;
        self.pending_shift = None;
        self.max_interesting = Ordinal::BEFORE_BEGIN;
        debug!(target: "state.undo", "history_cleared");
    }

    /// Undo the newest applied unit. Returns where the caret should go.
    pub fn undo(
        &mut self,
        document: &mut Document,
        observer: &mut dyn DocumentObserver,
    ) -> Option<Ordinal> {
        let mut caret = None;
        while self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.cursor;
            let unit_done = match &self.log[idx] {
                UndoAction::Insert {
                    text,
                    in_transaction,
                    ..
                } => {
                    let at = self.corrected_ordinal(idx);
                    document.delete_at(at, text.chars().count(), observer);
                    caret = Some(at);
                    !in_transaction
                }
                UndoAction::Delete {
                    text,
                    in_transaction,
                    ..
                } => {
                    let at = self.corrected_ordinal(idx);
                    document.insert(at, text, observer);
                    caret = Some(at.offset(text.chars().count() as isize));
                    !in_transaction
                }
                UndoAction::TransactionBegin => true,
                UndoAction::TransactionEnd | UndoAction::OrdinalShift(_) | UndoAction::SaveMarker => {
                    false
                }
            };
            if unit_done {
                if self.cursor > 0 && matches!(self.log[self.cursor - 1], UndoAction::OrdinalShift(_)) {
                    self.cursor -= 1;
                }
                break;
            }
        }
        self.max_interesting = ALWAYS_INTERESTING;
        trace!(target: "state.undo", cursor = self.cursor, len = self.log.len(), ?caret, "undo");
        caret
    }

    /// Redo the next unit of redo history. Returns where the caret should go.
    pub fn redo(
        &mut self,
        document: &mut Document,
        observer: &mut dyn DocumentObserver,
    ) -> Option<Ordinal> {
        let mut caret = None;
        while self.cursor < self.log.len() {
            let idx = self.cursor;
            self.cursor += 1;
            let unit_done = match &self.log[idx] {
                UndoAction::Insert {
                    text,
                    in_transaction,
                    ..
                } => {
                    let at = self.corrected_ordinal(idx);
                    document.insert(at, text, observer);
                    caret = Some(at.offset(text.chars().count() as isize));
                    !in_transaction
                }
                UndoAction::Delete {
                    text,
                    in_transaction,
                    ..
                } => {
                    let at = self.corrected_ordinal(idx);
                    document.delete_at(at, text.chars().count(), observer);
                    caret = Some(at);
                    !in_transaction
                }
                UndoAction::TransactionEnd => true,
                UndoAction::TransactionBegin | UndoAction::OrdinalShift(_) | UndoAction::SaveMarker => {
                    false
                }
            };
            if unit_done {
                break;
            }
        }
        self.max_interesting = ALWAYS_INTERESTING;
        trace!(target: "state.undo", cursor = self.cursor, len = self.log.len(), ?caret, "redo");
        caret
    }

    /// Ordinal of the action at `idx` corrected by the shift records applied
    /// after it.
    fn corrected_ordinal(&self, idx: usize) -> Ordinal {
        let mut ordinal = match &self.log[idx] {
            UndoAction::Insert { ordinal, .. } | UndoAction::Delete { ordinal, .. } => *ordinal,
            _ => return Ordinal::UNDEFINED,
        };
        for action in &self.log[idx + 1..self.cursor.max(idx + 1)] {
            if let UndoAction::OrdinalShift(shift) = action {
                shift.adjust(&mut ordinal);
            }
        }
        ordinal
    }

    /// Discard redo history.
    fn truncate_forward(&mut self) {
        if self.cursor < self.log.len() {
            let dropped = self.log.len() - self.cursor;
            self.log.truncate(self.cursor);
            trace!(target: "state.undo", dropped, "redo_history_truncated");
        }
    }

    fn push(&mut self, action: UndoAction) {
        self.truncate_forward();
        self.log.push(action);
        self.cursor = self.log.len();
    }

    fn record_insert(&mut self, ordinal: Ordinal, text: &str) {
        let in_transaction = self.in_transaction();
        if self.try_merge(ordinal, text, in_transaction) {
            if let Some(idx) = self.pending_shift.take() {
                self.log.remove(idx);
                self.cursor = self.log.len();
            }
            self.merged_inserts.fetch_add(1, Ordering::Relaxed);
            trace!(target: "state.undo", %ordinal, len = text.chars().count(), "insert_merged");
            return;
        }
        self.push(UndoAction::Insert {
            ordinal,
            text: text.to_string(),
            in_transaction,
        });
        self.note_interesting(ordinal);
        trace!(target: "state.undo", %ordinal, len = self.log.len(), "insert_recorded");
    }

    fn try_merge(&mut self, ordinal: Ordinal, text: &str, in_transaction: bool) -> bool {
        let Some(first_new) = text.chars().next() else {
            return false;
        };
        let mut idx = self.cursor;
        let target = loop {
            if idx == 0 {
                return false;
            }
            idx -= 1;
            match &self.log[idx] {
                UndoAction::OrdinalShift(_) | UndoAction::SaveMarker => continue,
                UndoAction::Insert { .. } => break idx,
                _ => return false,
            }
        };
        let corrected = self.corrected_ordinal(target);
        let UndoAction::Insert {
            text: old,
            in_transaction: old_in_transaction,
            ..
        } = &mut self.log[target]
        else {
            return false;
        };
        let Some(last_old) = old.chars().last() else {
            return false;
        };
        let contiguous = corrected.offset(old.chars().count() as isize) == ordinal;
        if !contiguous
            || *old_in_transaction != in_transaction
            || is_separator(last_old)
            || is_separator(first_new)
        {
            return false;
        }
        old.push_str(text);
        true
    }

    fn note_interesting(&mut self, ordinal: Ordinal) {
        if ordinal > self.max_interesting {
            self.max_interesting = ordinal;
        }
    }
}

impl DocumentObserver for UndoRedoManager {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift) {
        self.truncate_forward();
        self.pending_shift = None;
        if self.max_interesting.is_valid() && self.max_interesting > shift.begin {
            self.log.push(UndoAction::OrdinalShift(shift));
            self.cursor = self.log.len();
            self.pending_shift = Some(self.log.len() - 1);
            trace!(target: "state.undo", begin = %shift.begin, delta = shift.delta, "shift_recorded");
        }
        if self.max_interesting != ALWAYS_INTERESTING {
            shift.adjust(&mut self.max_interesting);
        }
    }

    fn on_content_change(&mut self, _document: &Document, change: &ContentChange) {
        match change {
            ContentChange::Reset => self.clear(),
            ContentChange::Inserted { begin, text, .. } => self.record_insert(*begin, text),
            ContentChange::Deleted { at, text } => {
                let in_transaction = self.in_transaction();
                self.push(UndoAction::Delete {
                    ordinal: *at,
                    text: text.clone(),
                    in_transaction,
                });
                self.note_interesting(*at);
                trace!(target: "state.undo", ordinal = %at, len = self.log.len(), "delete_recorded");
            }
        }
        self.pending_shift = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::NullObserver;

    fn o(i: usize) -> Ordinal {
        Ordinal::new(i)
    }

    fn type_chars(doc: &mut Document, undo: &mut UndoRedoManager, at: usize, s: &str) {
        for (i, c) in s.chars().enumerate() {
            doc.insert(o(at + i), &c.to_string(), undo);
        }
    }

    #[test]
    fn typed_word_merges_into_one_action() {
        let mut doc = Document::new();
        let mut undo = UndoRedoManager::new();
        type_chars(&mut doc, &mut undo, 0, "hello");
        assert_eq!(undo.actions().len(), 1);
        assert_eq!(undo.merged_inserts(), 4);
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn whitespace_splits_insert_runs() {
        let mut doc = Document::new();
        let mut undo = UndoRedoManager::new();
        type_chars(&mut doc, &mut undo, 0, "ab cd");
        // "ab", " ", "cd"
        assert_eq!(undo.actions().len(), 3);
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "ab ");
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "ab");
        undo.redo(&mut doc, &mut NullObserver);
        undo.redo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "ab cd");
    }

    #[test]
    fn non_contiguous_inserts_do_not_merge() {
        let mut doc = Document::from_text("xyz");
        let mut undo = UndoRedoManager::new();
        doc.insert(o(0), "a", &mut undo);
        doc.insert(o(3), "b", &mut undo);
        let edits = undo.actions().iter().filter(|a| a.is_edit()).count();
        assert_eq!(edits, 2);
    }

    #[test]
    fn transaction_undoes_atomically() {
        let mut doc = Document::from_text("one two");
        let mut undo = UndoRedoManager::new();
        undo.begin_transaction();
        doc.delete_at(o(0), 3, &mut undo);
        doc.insert(o(0), "1", &mut undo);
        doc.insert(o(1), " and", &mut undo);
        undo.end_transaction();
        assert_eq!(doc.text(), "1 and two");
        let caret = undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "one two");
        assert_eq!(caret, Some(o(3)));
        assert!(!undo.can_undo());
        undo.redo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "1 and two");
        assert!(!undo.can_redo());
    }

    #[test]
    fn nested_transactions_join_outermost() {
        let mut doc = Document::new();
        let mut undo = UndoRedoManager::new();
        undo.begin_transaction();
        doc.insert(o(0), "a ", &mut undo);
        undo.begin_transaction();
        doc.insert(o(2), "b", &mut undo);
        undo.end_transaction();
        undo.end_transaction();
        let barriers = undo
            .actions()
            .iter()
            .filter(|a| matches!(a, UndoAction::TransactionBegin | UndoAction::TransactionEnd))
            .count();
        assert_eq!(barriers, 2);
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn empty_transaction_leaves_no_barriers() {
        let mut undo = UndoRedoManager::new();
        undo.begin_transaction();
        undo.end_transaction();
        assert!(undo.actions().is_empty());
    }

    #[test]
    #[should_panic(expected = "without begin_transaction")]
    fn unbalanced_end_panics() {
        UndoRedoManager::new().end_transaction();
    }

    #[test]
    fn new_edit_after_undo_truncates_redo_history() {
        let mut doc = Document::new();
        let mut undo = UndoRedoManager::new();
        doc.insert(o(0), "first ", &mut undo);
        doc.insert(o(6), "second", &mut undo);
        undo.undo(&mut doc, &mut NullObserver);
        assert!(undo.can_redo());
        doc.insert(o(6), "third", &mut undo);
        assert!(!undo.can_redo());
        undo.undo(&mut doc, &mut NullObserver);
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn edit_before_recorded_action_records_shift() {
        let mut doc = Document::from_text("0123456789");
        let mut undo = UndoRedoManager::new();
        doc.insert(o(8), "X", &mut undo);
        doc.insert(o(2), "Y", &mut undo);
        assert!(matches!(undo.actions()[1], UndoAction::OrdinalShift(s) if s.begin == o(2) && s.delta == 1));
        assert_eq!(doc.text(), "01Y234567X89");
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(undo.cursor(), 1);
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "0123456789");
        undo.redo(&mut doc, &mut NullObserver);
        undo.redo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "01Y234567X89");
    }

    #[test]
    fn shift_records_locate_applied_actions_in_current_text() {
        let mut doc = Document::from_text("0123456789");
        let mut undo = UndoRedoManager::new();
        doc.insert(o(8), "X", &mut undo);
        doc.insert(o(2), "YY", &mut undo);
        assert_eq!(undo.cursor(), 3);
        assert_eq!(undo.corrected_ordinal(0), o(10));
        assert_eq!(doc.char_at(o(10)), 'X');

        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(undo.cursor(), 1);
        assert_eq!(undo.corrected_ordinal(0), o(8));
        assert_eq!(doc.char_at(o(8)), 'X');

        undo.redo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "01YY234567X89");
        assert_eq!(undo.corrected_ordinal(0), o(10));
    }

    #[test]
    fn save_marker_is_skipped_by_undo() {
        let mut doc = Document::new();
        let mut undo = UndoRedoManager::new();
        doc.insert(o(0), "a", &mut undo);
        undo.mark_saved();
        doc.insert(o(1), " b", &mut undo);
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "a");
        undo.undo(&mut doc, &mut NullObserver);
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn reset_clears_history() {
        let mut doc = Document::new();
        let mut undo = UndoRedoManager::new();
        doc.insert(o(0), "abc", &mut undo);
        doc.reset_text("fresh", &mut undo);
        assert!(undo.actions().is_empty());
        assert_eq!(undo.undo(&mut doc, &mut NullObserver), None);
        assert_eq!(doc.text(), "fresh");
    }

    #[test]
    fn replayed_edits_are_not_recorded() {
        let mut doc = Document::new();
        let mut undo = UndoRedoManager::new();
        doc.insert(o(0), "abc", &mut undo);
        let before = undo.actions().to_vec();
        undo.undo(&mut doc, &mut NullObserver);
        undo.redo(&mut doc, &mut NullObserver);
        assert_eq!(undo.actions(), before.as_slice());
    }
}
