//! Repaint scheduler.
//!
//! The display marks fine-grained repaint intents ([`RepaintDelta`]) as edits,
//! scrolls and caret moves happen. The renderer calls [`RepaintScheduler::consume`]
//! once per frame and receives one merged [`Decision`].
//!
//! Merge semantics:
//! - Any `Full` in the queue makes the decision `Full`.
//! - `Region` deltas merge into one half-open range `[min(start), max(end))`
//!   over indices into the cached line run.
//! - `Scroll` deltas coalesce, keeping the first `old_top` and the last
//!   `new_top`.
//! - Precedence: `Full` > `Scroll` > `Region` > `Selection` > `Caret`.
//!
//! `effective` may escalate: a scroll moving more than
//! [`RepaintScheduler::SCROLL_SHIFT_MAX`] lines is repainted as `Full`.
//!
//! Examples:
//! - `Region(5..6) + Caret` => `Region(5..6)`.
//! - `Selection + Caret` => `Selection`.
//! - `Scroll{3->7} + Region(10..11)` => `Scroll{3->7}`.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepaintDelta {
    /// Entire view must be repainted.
    Full,
    /// The view scrolled. Values are visual line indices of the first
    /// visible line before and after.
    Scroll { old_top: usize, new_top: usize },
    /// Cached lines `[start, end)` were rebuilt.
    Region(Range<usize>),
    /// Selection or find highlight changed.
    Selection,
    /// Only the caret moved.
    Caret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Merged minimal damage for the frame.
    pub semantic: RepaintDelta,
    /// What the renderer should do now.
    pub effective: RepaintDelta,
}

#[derive(Debug, Default)]
pub struct RepaintMetrics {
    full: AtomicU64,
    scroll: AtomicU64,
    region: AtomicU64,
    selection: AtomicU64,
    caret: AtomicU64,
    collapsed_scroll: AtomicU64,
    /// Regions suppressed by scroll precedence.
    suppressed_region: AtomicU64,
    /// Selection repaints forced without an observable selection change.
    forced_selection: AtomicU64,
    frames: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepaintMetricsSnapshot {
    pub full: u64,
    pub scroll: u64,
    pub region: u64,
    pub selection: u64,
    pub caret: u64,
    pub collapsed_scroll: u64,
    pub suppressed_region: u64,
    pub forced_selection: u64,
    pub frames: u64,
}

impl RepaintMetrics {
    pub fn snapshot(&self) -> RepaintMetricsSnapshot {
        RepaintMetricsSnapshot {
            full: self.full.load(Relaxed),
            scroll: self.scroll.load(Relaxed),
            region: self.region.load(Relaxed),
            selection: self.selection.load(Relaxed),
            caret: self.caret.load(Relaxed),
            collapsed_scroll: self.collapsed_scroll.load(Relaxed),
            suppressed_region: self.suppressed_region.load(Relaxed),
            forced_selection: self.forced_selection.load(Relaxed),
            frames: self.frames.load(Relaxed),
        }
    }

    fn incr_semantic(&self, delta: &RepaintDelta) {
        let counter = match delta {
            RepaintDelta::Full => &self.full,
            RepaintDelta::Scroll { .. } => &self.scroll,
            RepaintDelta::Region(_) => &self.region,
            RepaintDelta::Selection => &self.selection,
            RepaintDelta::Caret => &self.caret,
        };
        counter.fetch_add(1, Relaxed);
        self.frames.fetch_add(1, Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct RepaintScheduler {
    pending: Vec<RepaintDelta>,
    metrics: RepaintMetrics,
}

impl RepaintScheduler {
    /// Largest scroll (in visual lines) still repainted as a shift.
    pub const SCROLL_SHIFT_MAX: usize = 12;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics_snapshot(&self) -> RepaintMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn mark(&mut self, delta: RepaintDelta) {
        tracing::trace!(target: "render.scheduler", ?delta, "repaint_mark");
        self.pending.push(delta);
    }

    /// Selection repaint requested although the selection compares equal
    /// (a shift collapsed it).
    pub fn mark_forced_selection(&mut self) {
        self.metrics.forced_selection.fetch_add(1, Relaxed);
        self.mark(RepaintDelta::Selection);
    }

    pub fn consume(&mut self) -> Option<Decision> {
        if self.pending.is_empty() {
            return None;
        }
        let merged = self.collapse();
        self.pending.clear();
        self.metrics.incr_semantic(&merged);
        let effective = match &merged {
            RepaintDelta::Scroll { old_top, new_top }
                if new_top.abs_diff(*old_top) > Self::SCROLL_SHIFT_MAX =>
            {
                RepaintDelta::Full
            }
            other => other.clone(),
        };
        tracing::trace!(target: "render.scheduler", ?merged, ?effective, "repaint_collapse");
        Some(Decision {
            semantic: merged,
            effective,
        })
    }

    fn collapse(&self) -> RepaintDelta {
        let mut have_selection = false;
        let mut have_caret = false;
        let mut region: Option<Range<usize>> = None;
        let mut scroll: Option<(usize, usize)> = None;
        let mut scroll_events = 0u64;
        for d in &self.pending {
            match d {
                RepaintDelta::Full => return RepaintDelta::Full,
                RepaintDelta::Selection => have_selection = true,
                RepaintDelta::Caret => have_caret = true,
                RepaintDelta::Region(r) => {
                    region = Some(match region.take() {
                        None => r.clone(),
                        Some(existing) => existing.start.min(r.start)..existing.end.max(r.end),
                    });
                }
                RepaintDelta::Scroll { old_top, new_top } => {
                    scroll_events += 1;
                    scroll = Some(match scroll {
                        None => (*old_top, *new_top),
                        Some((first, _)) => (first, *new_top),
                    });
                }
            }
        }
        if let Some((old_top, new_top)) = scroll {
            if scroll_events > 1 {
                self.metrics
                    .collapsed_scroll
                    .fetch_add(scroll_events - 1, Relaxed);
            }
            if region.is_some() {
                self.metrics.suppressed_region.fetch_add(1, Relaxed);
            }
            return RepaintDelta::Scroll { old_top, new_top };
        }
        if let Some(r) = region {
            return RepaintDelta::Region(r);
        }
        if have_selection {
            return RepaintDelta::Selection;
        }
        if have_caret {
            return RepaintDelta::Caret;
        }
        RepaintDelta::Full
    }
}
