//! Anchor-preserving selection over ordinals.
//!
//! The same structure backs the interactive text selection and the
//! find-on-page highlight; `SelectionMode` tells the painter which one it is.

use core_text::{ContentChange, Document, DocumentObserver, Ordinal, OrdinalShift};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionDirection {
    /// Anchor at `begin`, moving end at `end`.
    #[default]
    LeftToRight,
    /// Anchor at `end`, moving end at `begin`.
    RightToLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Selection,
    FindHighlight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionManager {
    begin: Ordinal,
    end: Ordinal,
    direction: SelectionDirection,
    mode: SelectionMode,
    forced_repaint: bool,
}

impl SelectionManager {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            begin: Ordinal::UNDEFINED,
            end: Ordinal::UNDEFINED,
            direction: SelectionDirection::LeftToRight,
            mode,
            forced_repaint: false,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn direction(&self) -> SelectionDirection {
        self.direction
    }

    /// `[begin, end)`; both `UNDEFINED` before the first reset.
    pub fn selected_range(&self) -> (Ordinal, Ordinal) {
        (self.begin, self.end)
    }

    pub fn is_empty(&self) -> bool {
        !self.begin.is_valid() || self.begin == self.end
    }

    /// The fixed end of the selection.
    pub fn anchor(&self) -> Ordinal {
        match self.direction {
            SelectionDirection::LeftToRight => self.begin,
            SelectionDirection::RightToLeft => self.end,
        }
    }

    /// The end that follows the caret.
    pub fn active_end(&self) -> Ordinal {
        match self.direction {
            SelectionDirection::LeftToRight => self.end,
            SelectionDirection::RightToLeft => self.begin,
        }
    }

    /// Collapse to `ordinal`. Returns whether the range changed.
    pub fn reset_selection(&mut self, ordinal: Ordinal) -> bool {
        let old = self.selected_range();
        self.begin = ordinal;
        self.end = ordinal;
        self.direction = SelectionDirection::LeftToRight;
        old != self.selected_range()
    }

    /// Move the active end to `ordinal`, flipping direction when it crosses
    /// the anchor. Returns whether the range changed.
    pub fn expand_selection(&mut self, ordinal: Ordinal) -> bool {
        if !self.begin.is_valid() {
            return self.reset_selection(ordinal);
        }
        let old = self.selected_range();
        match self.direction {
            SelectionDirection::LeftToRight => {
                if ordinal < self.begin {
                    self.end = self.begin;
                    self.begin = ordinal;
                    self.direction = SelectionDirection::RightToLeft;
                } else {
                    self.end = ordinal;
                }
            }
            SelectionDirection::RightToLeft => {
                if ordinal > self.end {
                    self.begin = self.end;
                    self.end = ordinal;
                    self.direction = SelectionDirection::LeftToRight;
                } else {
                    self.begin = ordinal;
                }
            }
        }
        old != self.selected_range()
    }

    /// Select `[begin, end)` left to right.
    pub fn select_range(&mut self, begin: Ordinal, end: Ordinal) -> bool {
        let (begin, end) = if end < begin { (end, begin) } else { (begin, end) };
        let old = self.selected_range();
        self.begin = begin;
        self.end = end;
        self.direction = SelectionDirection::LeftToRight;
        old != self.selected_range()
    }

    /// Forget the selection entirely.
    pub fn clear(&mut self) -> bool {
        let had = self.begin.is_valid();
        self.begin = Ordinal::UNDEFINED;
        self.end = Ordinal::UNDEFINED;
        self.direction = SelectionDirection::LeftToRight;
        had
    }

    /// `true` once after a shift collapsed a non-empty selection.
    pub fn take_forced_repaint(&mut self) -> bool {
        std::mem::take(&mut self.forced_repaint)
    }
}

impl DocumentObserver for SelectionManager {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift) {
        let was_empty = self.is_empty();
        shift.adjust(&mut self.begin);
        shift.adjust(&mut self.end);
        if !was_empty && self.is_empty() {
            self.forced_repaint = true;
        }
    }

    fn on_content_change(&mut self, _document: &Document, change: &ContentChange) {
        if change.is_reset() {
            self.clear();
        }
    }
}
