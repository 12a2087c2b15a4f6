//! Layout metrics.
//!
//! Distinct from `RepaintMetrics` (scheduler), which counts what the editor
//! asked to repaint. These counters record what reflow actually did so the
//! cost of an edit can be compared against a full relayout.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ReflowMetrics {
    /// Incremental reflow passes run after content changes.
    pub reflows: AtomicU64,
    /// Passes that stopped early on an untouched cached line.
    pub resyncs: AtomicU64,
    /// Visual lines built by reflow passes.
    pub lines_rebuilt: AtomicU64,
    /// Cached lines discarded by reflow passes.
    pub lines_discarded: AtomicU64,
    /// Lines built while filling the run at either edge.
    pub lines_filled: AtomicU64,
    /// Lines dropped by edge trimming.
    pub lines_trimmed: AtomicU64,
    /// Whole-run rebuilds (resize, reset, settings change).
    pub full_relayouts: AtomicU64,
    /// Duration (ns) of the most recent reflow pass.
    pub last_reflow_ns: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReflowMetricsSnapshot {
    pub reflows: u64,
    pub resyncs: u64,
    pub lines_rebuilt: u64,
    pub lines_discarded: u64,
    pub lines_filled: u64,
    pub lines_trimmed: u64,
    pub full_relayouts: u64,
    pub last_reflow_ns: u64,
}

impl ReflowMetrics {
    pub fn snapshot(&self) -> ReflowMetricsSnapshot {
        ReflowMetricsSnapshot {
            reflows: self.reflows.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            lines_rebuilt: self.lines_rebuilt.load(Ordering::Relaxed),
            lines_discarded: self.lines_discarded.load(Ordering::Relaxed),
            lines_filled: self.lines_filled.load(Ordering::Relaxed),
            lines_trimmed: self.lines_trimmed.load(Ordering::Relaxed),
            full_relayouts: self.full_relayouts.load(Ordering::Relaxed),
            last_reflow_ns: self.last_reflow_ns.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let m = ReflowMetrics::default();
        ReflowMetrics::add(&m.reflows, 2);
        ReflowMetrics::add(&m.lines_rebuilt, 7);
        m.last_reflow_ns.store(1234, Ordering::Relaxed);
        let s = m.snapshot();
        assert_eq!(s.reflows, 2);
        assert_eq!(s.lines_rebuilt, 7);
        assert_eq!(s.last_reflow_ns, 1234);
        assert_eq!(s.resyncs, 0);
    }
}
