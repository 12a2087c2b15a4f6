//! Background estimate of the document's total visual line count.
//!
//! The estimator lays out the whole document from a consistent snapshot on a
//! worker thread. Each run carries a generation number and a cancellation
//! flag; a restart cancels the in-flight run (which notices at its next
//! progress checkpoint and exits) and starts a new generation. Messages from
//! superseded generations are ignored, so a stale estimate never overwrites a
//! newer one.
//!
//! Edits that leave the tail of the cached run intact, or whose reflow runs
//! through the document end, adjust the count in O(1) through
//! [`ScrollBoundsManager::apply_delta`] instead of walking the document again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use core_text::{DocumentReader, Ordinal};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, trace, warn};

use crate::layout::LineLayoutBuilder;

/// Result of one complete walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEstimate {
    pub generation: u64,
    /// Document revision the walk was computed from.
    pub revision: u64,
    pub total_lines: usize,
    /// Begin of the visual line holding the requested first-visible ordinal.
    pub page_begin_ordinal: Ordinal,
    /// Height of all visual lines above `page_begin_ordinal`.
    pub page_top: f32,
    /// Visual line index of `page_begin_ordinal`.
    pub first_line_index: usize,
    /// Hard-break terminated lines (content lines).
    pub content_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EstimateMessage {
    Progress { generation: u64, total_lines: usize },
    Completed(ScrollEstimate),
}

/// Cancellation flag shared with one worker run.
#[derive(Debug, Clone, Default)]
struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy)]
struct EstimateRequest {
    width: f32,
    first_visible: Ordinal,
}

#[derive(Debug)]
pub struct ScrollBoundsManager {
    reader: DocumentReader,
    builder: LineLayoutBuilder,
    update_interval: usize,
    total_lines: usize,
    generation: u64,
    busy: bool,
    request: EstimateRequest,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
    tx: Sender<EstimateMessage>,
    rx: Receiver<EstimateMessage>,
}

impl ScrollBoundsManager {
    pub fn new(reader: DocumentReader, builder: LineLayoutBuilder, update_interval: usize) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            reader,
            builder,
            update_interval: update_interval.max(1),
            total_lines: 0,
            generation: 0,
            busy: false,
            request: EstimateRequest {
                width: 0.0,
                first_visible: Ordinal::ZERO,
            },
            cancel: CancelToken::default(),
            worker: None,
            tx,
            rx,
        }
    }

    /// Best known total line count (possibly provisional).
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// New layout parameters; takes effect on the next restart.
    pub fn set_layout(&mut self, builder: LineLayoutBuilder, update_interval: usize) {
        self.builder = builder;
        self.update_interval = update_interval.max(1);
    }

    /// Cancel any in-flight walk and start a new one.
    pub fn restart(&mut self, width: f32, first_visible: Ordinal) {
        self.cancel.cancel();
        self.generation += 1;
        self.request = EstimateRequest {
            width,
            first_visible,
        };
        let cancel = CancelToken::default();
        self.cancel = cancel.clone();

        let job = EstimateJob {
            generation: self.generation,
            reader: self.reader.clone(),
            builder: self.builder.clone(),
            update_interval: self.update_interval,
            request: self.request,
            cancel,
            tx: self.tx.clone(),
        };
        let spawned = std::thread::Builder::new()
            .name("scroll-bounds".into())
            .spawn(move || job.run());
        match spawned {
            Ok(handle) => {
                // The previous worker has been cancelled and exits on its own.
                self.worker = Some(handle);
                self.busy = true;
                debug!(target: "render.scroll_bounds", generation = self.generation, width, "estimate_started");
            }
            Err(err) => {
                self.busy = false;
                warn!(target: "render.scroll_bounds", error = %err, "estimate_spawn_failed");
            }
        }
    }

    /// O(1) correction after an edit that did not change the shape of the
    /// run's tail. A busy walk is restarted so it sees the new content.
    pub fn apply_delta(&mut self, delta: isize) -> usize {
        self.total_lines = (self.total_lines as isize + delta).max(1) as usize;
        trace!(target: "render.scroll_bounds", delta, total = self.total_lines, "estimate_delta");
        if self.busy {
            let EstimateRequest {
                width,
                first_visible,
            } = self.request;
            self.restart(width, first_visible);
        }
        self.total_lines
    }

    /// Drain worker messages. Progress only ever raises the count; the
    /// completed estimate of the current generation replaces it.
    pub fn poll(&mut self) -> Option<ScrollEstimate> {
        let mut completed = None;
        while let Ok(message) = self.rx.try_recv() {
            if let Some(estimate) = self.accept(message) {
                completed = Some(estimate);
            }
        }
        completed
    }

    /// Block until the current generation completes or `timeout` passes.
    pub fn wait_for_estimate(&mut self, timeout: Duration) -> Option<ScrollEstimate> {
        let deadline = Instant::now() + timeout;
        while self.busy {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(message) => {
                    if let Some(estimate) = self.accept(message) {
                        return Some(estimate);
                    }
                }
                Err(_) => break,
            }
        }
        None
    }

    fn accept(&mut self, message: EstimateMessage) -> Option<ScrollEstimate> {
        match message {
            EstimateMessage::Progress {
                generation,
                total_lines,
            } if generation == self.generation => {
                if total_lines > self.total_lines {
                    self.total_lines = total_lines;
                }
                None
            }
            EstimateMessage::Completed(estimate) if estimate.generation == self.generation => {
                self.busy = false;
                self.total_lines = estimate.total_lines;
                info!(
                    target: "render.scroll_bounds",
                    generation = estimate.generation,
                    total_lines = estimate.total_lines,
                    content_lines = estimate.content_lines,
                    "estimate_completed"
                );
                Some(estimate)
            }
            _ => None,
        }
    }
}

impl Drop for ScrollBoundsManager {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

struct EstimateJob {
    generation: u64,
    reader: DocumentReader,
    builder: LineLayoutBuilder,
    update_interval: usize,
    request: EstimateRequest,
    cancel: CancelToken,
    tx: Sender<EstimateMessage>,
}

impl EstimateJob {
    fn run(self) {
        let snapshot = self.reader.snapshot();
        let chars = &snapshot.chars[..];
        let mut at = Ordinal::ZERO;
        let mut total_lines = 0usize;
        let mut content_lines = 0usize;
        let mut first_line_index = None;
        let mut page_begin_ordinal = Ordinal::ZERO;
        let mut page_top = 0.0_f32;

        while at != Ordinal::UNDEFINED {
            let line = self.builder.next_line(chars, at, self.request.width);
            if line.has_hard_break {
                content_lines += 1;
            }
            if first_line_index.is_none() {
                if line.next == Ordinal::UNDEFINED || line.next > self.request.first_visible {
                    page_begin_ordinal = line.begin;
                    first_line_index = Some(total_lines);
                } else {
                    page_top += line.height;
                }
            }
            total_lines += 1;
            at = line.next;

            if total_lines % self.update_interval == 0 {
                if self.cancel.is_cancelled() {
                    trace!(target: "render.scroll_bounds", generation = self.generation, total_lines, "estimate_cancelled");
                    return;
                }
                let _ = self.tx.send(EstimateMessage::Progress {
                    generation: self.generation,
                    total_lines,
                });
            }
        }
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.tx.send(EstimateMessage::Completed(ScrollEstimate {
            generation: self.generation,
            revision: snapshot.revision,
            total_lines,
            page_begin_ordinal,
            page_top,
            first_line_index: first_line_index.unwrap_or(0),
            content_lines,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::WrapMode;
    use core_text::{Document, MonospaceGlyphs, NullObserver};

    fn manager(doc: &Document, interval: usize) -> ScrollBoundsManager {
        let builder = LineLayoutBuilder::new(Arc::new(MonospaceGlyphs::unit()), WrapMode::Character);
        ScrollBoundsManager::new(doc.reader(), builder, interval)
    }

    #[test]
    fn estimate_counts_visual_and_content_lines() {
        let doc = Document::from_text("abcdef\nxy\nz");
        let mut sb = manager(&doc, 1);
        sb.restart(3.0, Ordinal::new(7));
        let est = sb.wait_for_estimate(Duration::from_secs(10)).expect("estimate");
        // "abc" "def\n" "xy\n" "z"
        assert_eq!(est.total_lines, 4);
        assert_eq!(est.content_lines, 3);
        assert_eq!(est.page_begin_ordinal, Ordinal::new(7));
        assert_eq!(est.first_line_index, 2);
        assert_eq!(est.page_top, 2.0);
        assert_eq!(sb.total_lines(), 4);
        assert!(!sb.is_busy());
    }

    #[test]
    fn restart_supersedes_previous_generation() {
        let mut doc = Document::from_text(&"line\n".repeat(5000));
        let mut sb = manager(&doc, 10);
        sb.restart(80.0, Ordinal::ZERO);
        let first = sb.generation();
        doc.reset_text("one\ntwo", &mut NullObserver);
        sb.restart(80.0, Ordinal::ZERO);
        let est = sb.wait_for_estimate(Duration::from_secs(10)).expect("estimate");
        assert!(est.generation > first);
        assert_eq!(est.total_lines, 2);
        assert_eq!(est.revision, doc.revision());
    }

    #[test]
    fn delta_adjusts_idle_count_without_restart() {
        let doc = Document::from_text("a\nb");
        let mut sb = manager(&doc, 100);
        sb.restart(10.0, Ordinal::ZERO);
        sb.wait_for_estimate(Duration::from_secs(10));
        let generation = sb.generation();
        assert_eq!(sb.apply_delta(3), 5);
        assert_eq!(sb.generation(), generation);
        assert_eq!(sb.apply_delta(-10), 1);
        assert!(sb.poll().is_none());
    }

    #[test]
    fn wait_without_request_returns_none() {
        let doc = Document::new();
        let mut sb = manager(&doc, 100);
        assert!(sb.wait_for_estimate(Duration::from_millis(10)).is_none());
    }
}
