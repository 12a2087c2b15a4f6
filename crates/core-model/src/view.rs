//! Ordinal-tracked view state: caret, selections, line numbers and the cached
//! window of visual lines around the viewport.
//!
//! `ViewState` is the display half of the observer fan-out. On a shift it
//! renormalizes every stored ordinal (including the cached run and the scroll
//! anchor); on a content change it reflows the run and decides whether the
//! scroll estimate can be corrected in O(1) or must be recomputed.
//!
//! Window invariants (after `settle`):
//! * `anchor == run[top].begin`, the first visible line.
//! * At most `overscan` lines are cached above `top` and the run covers the
//!   viewport plus `overscan` lines below it (or reaches the document end).
//! * `run_base` is the visual line index of `run[0]` in the whole document;
//!   provisional until a scroll estimate anchored at `anchor` completes.

use core_events::{EditorEvent, EventSink};
use core_render::{
    Annotator, LayoutPass, LineLayoutBuilder, LineRun, RepaintDelta, RepaintScheduler,
    ScrollBoundsManager, ScrollEstimate, VisualLine,
};
use core_state::{Caret, ContentLineManager, SelectionManager, SelectionMode};
use core_text::breaks::paragraph_start;
use core_text::{ContentChange, Document, DocumentObserver, Ordinal, OrdinalShift};
use tracing::{debug, trace};

use crate::compute_scroll_intent;

/// Lines rebuilt by the last reflow, resolved to run indices after `settle`.
#[derive(Debug, Clone, Copy)]
struct PendingRegion {
    begin: Ordinal,
    count: usize,
    to_end: bool,
}

pub(crate) struct ViewState {
    pub(crate) lines: ContentLineManager,
    pub(crate) selection: SelectionManager,
    pub(crate) highlight: SelectionManager,
    pub(crate) caret: Caret,
    pub(crate) run: LineRun,
    pub(crate) builder: LineLayoutBuilder,
    pub(crate) annotator: Annotator,
    pub(crate) scroll_bounds: ScrollBoundsManager,
    pub(crate) scheduler: RepaintScheduler,
    pub(crate) sink: Box<dyn EventSink>,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) overscan: usize,
    anchor: Ordinal,
    top: usize,
    run_base: usize,
    run_base_y: f32,
    pending_region: Option<PendingRegion>,
    needs_estimate: bool,
}

impl std::fmt::Debug for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewState")
            .field("caret", &self.caret)
            .field("selection", &self.selection)
            .field("anchor", &self.anchor)
            .field("top", &self.top)
            .field("run_base", &self.run_base)
            .field("cached_lines", &self.run.len())
            .finish_non_exhaustive()
    }
}

impl ViewState {
    pub(crate) fn new(
        document: &Document,
        builder: LineLayoutBuilder,
        scroll_bounds: ScrollBoundsManager,
        sink: Box<dyn EventSink>,
        overscan: usize,
    ) -> Self {
        let mut selection = SelectionManager::new(SelectionMode::Selection);
        selection.reset_selection(Ordinal::ZERO);
        Self {
            lines: ContentLineManager::new(document),
            selection,
            highlight: SelectionManager::new(SelectionMode::FindHighlight),
            caret: Caret::default(),
            run: LineRun::new(),
            builder,
            annotator: Annotator::None,
            scroll_bounds,
            scheduler: RepaintScheduler::new(),
            sink,
            width: 0.0,
            height: 0.0,
            overscan,
            anchor: Ordinal::ZERO,
            top: 0,
            run_base: 0,
            run_base_y: 0.0,
            pending_region: None,
            needs_estimate: true,
        }
    }

    pub(crate) fn anchor(&self) -> Ordinal {
        self.anchor
    }

    /// Visual line index of the first visible line.
    pub(crate) fn first_line_index(&self) -> usize {
        self.run_base + self.top
    }

    /// Document y of the first visible line.
    pub(crate) fn page_top(&self) -> f32 {
        self.run_base_y + self.run.get(self.top).map_or(0.0, |l| l.y)
    }

    /// Lines intersecting the viewport.
    pub(crate) fn visible_lines(&self) -> &[VisualLine] {
        let lines = self.run.lines();
        if lines.is_empty() {
            return lines;
        }
        &lines[self.top..self.top + self.visible_rows()]
    }

    fn visible_rows(&self) -> usize {
        let lines = self.run.lines();
        let Some(first) = lines.get(self.top) else {
            return 0;
        };
        let bottom = first.y + self.height;
        let rows = lines[self.top..].iter().take_while(|l| l.y < bottom).count();
        rows.max(1)
    }

    /// Drop the cached run; the next `settle` lays out again around the anchor.
    pub(crate) fn invalidate_layout(&mut self) {
        self.run.clear();
        self.needs_estimate = true;
        self.scheduler.mark(RepaintDelta::Full);
    }

    /// Bring the window back to its invariants and flush deferred work
    /// (region repaint, estimate restart).
    pub(crate) fn settle(&mut self, document: &Document) {
        {
            let chars = document.read();
            let last = Ordinal::new(chars.len() - 1);
            if !self.anchor.is_valid() || self.anchor > last {
                self.anchor = last;
            }
            let top = match self.run.index_containing(self.anchor) {
                Some(i) => i,
                None => {
                    let begin = paragraph_start(&chars, self.anchor);
                    let mut pass = LayoutPass {
                        chars: &chars,
                        builder: &self.builder,
                        annotator: &mut self.annotator,
                        width: self.width,
                    };
                    self.run.rebuild(&mut pass, begin, 0.0);
                    if begin == Ordinal::ZERO {
                        self.run_base = 0;
                        self.run_base_y = 0.0;
                    } else {
                        self.needs_estimate = true;
                    }
                    self.scheduler.mark(RepaintDelta::Full);
                    self.run.index_containing(self.anchor).unwrap_or(0)
                }
            };
            self.top = top;

            if self.top < self.overscan {
                self.grow_above(&chars, self.overscan - self.top);
            } else if self.top > self.overscan {
                let drop = self.top - self.overscan;
                let dy = self.run.lines()[drop].y;
                let removed = self.run.trim_above(drop);
                self.top -= removed;
                self.run_base += removed;
                self.run_base_y += dy;
            }

            let line_height = self.builder.average_line_height();
            let bottom = self.run.lines()[self.top].y + self.height + self.overscan as f32 * line_height;
            let mut pass = LayoutPass {
                chars: &chars,
                builder: &self.builder,
                annotator: &mut self.annotator,
                width: self.width,
            };
            self.run.fill_below(&mut pass, bottom);
            let keep = self.run.index_at_y(bottom).map_or(self.run.len(), |i| i + 1);
            self.run.trim_below(keep.max(self.top + 1));
            self.anchor = self.run.lines()[self.top].begin;
        }

        if let Some(region) = self.pending_region.take() {
            let start = self
                .run
                .index_containing(region.begin)
                .unwrap_or(0)
                .min(self.run.len());
            let end = if region.to_end {
                self.run.len()
            } else {
                (start + region.count).min(self.run.len())
            };
            self.scheduler.mark(RepaintDelta::Region(start..end));
        }
        if self.needs_estimate {
            self.needs_estimate = false;
            self.scroll_bounds.restart(self.width, self.anchor);
        }
        trace!(
            target: "model.display",
            anchor = %self.anchor,
            top = self.top,
            cached = self.run.len(),
            first_line = self.first_line_index(),
            "view_settled"
        );
    }

    /// Prepend up to `count` lines, keeping `top` and the document offsets
    /// of the run consistent. Returns the number added.
    fn grow_above(&mut self, chars: &[char], count: usize) -> usize {
        let mut pass = LayoutPass {
            chars,
            builder: &self.builder,
            annotator: &mut self.annotator,
            width: self.width,
        };
        let added = self.run.fill_above(&mut pass, count);
        if added > 0 {
            self.top += added;
            self.run_base = self.run_base.saturating_sub(added);
            self.run_base_y -= self.run.lines()[added].y;
        }
        if self.run.first().is_some_and(|l| l.begin == Ordinal::ZERO) {
            self.run_base = 0;
            self.run_base_y = 0.0;
        }
        added
    }

    /// Append at least one line unless the run already reaches the end.
    fn grow_below(&mut self, chars: &[char]) -> bool {
        let Some(last) = self.run.last() else {
            return false;
        };
        if last.next == Ordinal::UNDEFINED {
            return false;
        }
        let target = self.run.total_height() + self.builder.average_line_height();
        let mut pass = LayoutPass {
            chars,
            builder: &self.builder,
            annotator: &mut self.annotator,
            width: self.width,
        };
        self.run.fill_below(&mut pass, target) > 0
    }

    /// Move the first visible line by `delta` visual lines. Returns how far
    /// the view actually moved.
    pub(crate) fn scroll_by(&mut self, document: &Document, delta: isize) -> isize {
        if self.run.is_empty() {
            self.settle(document);
        }
        let old_first = self.first_line_index();
        let new_top = {
            let chars = document.read();
            if delta < 0 {
                let want = delta.unsigned_abs();
                if self.top < want {
                    self.grow_above(&chars, want - self.top);
                }
                self.top.saturating_sub(want)
            } else {
                let want = delta as usize;
                while self.run.len() <= self.top + want && self.grow_below(&chars) {}
                (self.top + want).min(self.run.len() - 1)
            }
        };
        let moved = new_top as isize - self.top as isize;
        self.top = new_top;
        self.anchor = self.run.lines()[new_top].begin;
        if moved != 0 {
            self.scheduler.mark(RepaintDelta::Scroll {
                old_top: old_first,
                new_top: self.first_line_index(),
            });
        }
        self.settle(document);
        debug!(target: "model.display", requested = delta, moved, first_line = self.first_line_index(), "scrolled");
        moved
    }

    /// Scroll just enough to show `ordinal`, or re-anchor the view on it when
    /// it lies outside the cached run. The re-anchored position is provisional
    /// until the next scroll estimate completes.
    pub(crate) fn ensure_visible(&mut self, document: &Document, ordinal: Ordinal) {
        if self.run.is_empty() {
            self.settle(document);
        }
        match self.run.index_containing(ordinal) {
            Some(i) => {
                let rows = self.visible_rows();
                if let Some(new_top) = compute_scroll_intent(self.top, i, rows, 0) {
                    self.scroll_by(document, new_top as isize - self.top as isize);
                }
            }
            None => self.jump_to(document, ordinal),
        }
    }

    fn jump_to(&mut self, document: &Document, ordinal: Ordinal) {
        let begin = paragraph_start(&document.read(), ordinal);
        let provisional = self.lines.get_line_number(document, begin);
        {
            let chars = document.read();
            let mut pass = LayoutPass {
                chars: &chars,
                builder: &self.builder,
                annotator: &mut self.annotator,
                width: self.width,
            };
            self.run.rebuild(&mut pass, begin, 0.0);
        }
        let old_first = self.first_line_index();
        let idx = self.run.index_containing(ordinal).unwrap_or(0);
        self.run_base = provisional;
        self.run_base_y = provisional as f32 * self.builder.average_line_height();
        self.top = idx;
        self.anchor = self.run.lines()[idx].begin;
        self.needs_estimate = true;
        self.scheduler.mark(RepaintDelta::Scroll {
            old_top: old_first,
            new_top: self.first_line_index(),
        });
        debug!(target: "model.display", %ordinal, provisional, "view_reanchored");
        self.settle(document);
    }

    /// Visual line index (within the run) and line of the caret, growing
    /// the run by one line when the caret sits on its edge.
    pub(crate) fn caret_neighbour(&mut self, document: &Document, down: bool) -> Option<usize> {
        let caret = self.caret.ordinal();
        self.ensure_visible(document, caret);
        let idx = self.run.index_containing(caret)?;
        let chars = document.read();
        if down {
            if idx + 1 >= self.run.len() && !self.grow_below(&chars) {
                return None;
            }
            Some(idx + 1)
        } else if idx == 0 {
            let added = self.grow_above(&chars, 1);
            (added > 0).then(|| added - 1)
        } else {
            Some(idx - 1)
        }
    }

    /// Apply a completed estimate. Returns whether the total changed.
    pub(crate) fn apply_estimate(&mut self, estimate: &ScrollEstimate, revision: u64) -> bool {
        if estimate.revision != revision {
            trace!(target: "model.display", estimate = estimate.revision, revision, "estimate_outdated");
            self.needs_estimate = true;
            return false;
        }
        self.lines.set_max_content_lines(estimate.content_lines);
        if estimate.page_begin_ordinal == self.anchor {
            let y = self.run.get(self.top).map_or(0.0, |l| l.y);
            self.run_base = estimate.first_line_index.saturating_sub(self.top);
            self.run_base_y = estimate.page_top - y;
        }
        true
    }

    pub(crate) fn estimate_pending(&self) -> bool {
        self.needs_estimate
    }

    fn reflow_edit(&mut self, document: &Document, begin: Ordinal, end: Ordinal) {
        let Some(run_first) = self.run.first().map(|l| l.begin) else {
            self.needs_estimate = true;
            return;
        };
        let chars = document.read();
        let mut pass = LayoutPass {
            chars: &chars,
            builder: &self.builder,
            annotator: &mut self.annotator,
            width: self.width,
        };
        let outcome = self.run.reflow(&mut pass, begin, end);
        if outcome.touched()
            && let Some(first) = self.run.get(outcome.first_index)
        {
            self.pending_region = Some(PendingRegion {
                begin: first.begin,
                count: outcome.inserted,
                to_end: !outcome.resynced,
            });
        }
        match outcome.line_delta() {
            Some(delta) if begin >= run_first => {
                self.scroll_bounds.apply_delta(delta);
            }
            _ => self.needs_estimate = true,
        }
    }

    fn reset_layout(&mut self) {
        self.run.clear();
        self.anchor = Ordinal::ZERO;
        self.top = 0;
        self.run_base = 0;
        self.run_base_y = 0.0;
        self.pending_region = None;
        self.needs_estimate = true;
        self.selection.reset_selection(Ordinal::ZERO);
        self.scheduler.mark(RepaintDelta::Full);
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.sink.emit(event);
    }
}

impl DocumentObserver for ViewState {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift) {
        self.lines.on_ordinal_shift(shift);
        self.selection.on_ordinal_shift(shift);
        self.highlight.on_ordinal_shift(shift);
        self.caret.on_ordinal_shift(shift);
        self.run.apply_shift(shift);
        shift.adjust(&mut self.anchor);
        self.sink.emit(EditorEvent::OrdinalShift(shift));
    }

    fn on_content_change(&mut self, document: &Document, change: &ContentChange) {
        self.lines.on_content_change(document, change);
        self.selection.on_content_change(document, change);
        self.highlight.on_content_change(document, change);
        self.caret.on_content_change(document, change);
        match change {
            ContentChange::Reset => self.reset_layout(),
            _ => self.reflow_edit(document, change.begin(), change.end()),
        }
        self.sink.emit(EditorEvent::ContentChange(change.clone()));
    }
}
