//! Cached contiguous run of visual lines and incremental reflow.
//!
//! Invariants (checked by [`LineRun::check_invariants`] after every layout
//! pass):
//! * `lines[i].next == lines[i + 1].begin`.
//! * The first line begins at a boundary a full layout from the document
//!   start would also produce.
//! * The last line has a hard break (or the run is empty), so edits below the
//!   run never change the shape of cached lines.
//!
//! Reflow after an edit `[begin, end]` restarts one line before the first
//! line the edit can affect and stops as soon as a freshly built line ends
//! where an untouched cached line at or past `end` begins.

use std::time::Instant;

use core_config::WrapMode;
use core_text::breaks::{is_hard_break_at, paragraph_start};
use core_text::{Ordinal, OrdinalShift};
use tracing::{debug, trace};

use crate::annotate::Annotator;
use crate::layout::{LineLayoutBuilder, VisualLine, is_break_opportunity};
use crate::metrics::{ReflowMetrics, ReflowMetricsSnapshot};

/// Everything a layout pass reads: the document characters (sentinel
/// included), the builder, the optional annotator and the layout width.
pub struct LayoutPass<'a> {
    pub chars: &'a [char],
    pub builder: &'a LineLayoutBuilder,
    pub annotator: &'a mut Annotator,
    pub width: f32,
}

impl LayoutPass<'_> {
    fn build(&mut self, begin: Ordinal) -> VisualLine {
        let mut line = self.builder.next_line(self.chars, begin, self.width);
        self.annotator.annotate(&mut line);
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReflowOutcome {
    /// Index of the first rebuilt line.
    pub first_index: usize,
    /// Cached lines discarded.
    pub removed: usize,
    /// Lines built and inserted at `first_index`.
    pub inserted: usize,
    /// Stopped on a reusable cached line instead of running to a hard break
    /// or the document end.
    pub resynced: bool,
    /// The discarded lines and the rebuilt ones both ran to the document end.
    pub rebuilt_to_end: bool,
}

impl ReflowOutcome {
    pub fn touched(&self) -> bool {
        self.removed > 0 || self.inserted > 0
    }

    /// Change in the document's visual line count, when the reflow alone
    /// determines it (everything past the rebuilt lines is unchanged).
    pub fn line_delta(&self) -> Option<isize> {
        (self.resynced || self.rebuilt_to_end).then(|| self.inserted as isize - self.removed as isize)
    }
}

#[derive(Debug, Default)]
pub struct LineRun {
    lines: Vec<VisualLine>,
    metrics: ReflowMetrics,
}

fn clamped_by(shift: &OrdinalShift, ordinal: Ordinal) -> bool {
    shift.delta < 0
        && ordinal.is_valid()
        && ordinal <= shift.begin
        && ordinal.get() > shift.begin.get() + shift.delta as i64
}

/// `true` when a line beginning at `begin` stays a layout boundary after an
/// edit at `edit_begin`: the line before it made its break decision looking
/// only at characters left of the edit.
fn begin_is_stable(chars: &[char], wrap: WrapMode, begin: Ordinal, edit_begin: Ordinal) -> bool {
    let Some(i) = begin.index() else {
        return false;
    };
    if i == 0 || is_hard_break_at(chars, i - 1) {
        return true;
    }
    let limit = edit_begin.index().unwrap_or(chars.len()).min(chars.len());
    if i >= limit {
        return false;
    }
    match wrap {
        WrapMode::None | WrapMode::Character => true,
        WrapMode::Word => chars[i..limit].iter().any(|&c| is_break_opportunity(c)),
    }
}

impl LineRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[VisualLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VisualLine> {
        self.lines.get(index)
    }

    pub fn first(&self) -> Option<&VisualLine> {
        self.lines.first()
    }

    pub fn last(&self) -> Option<&VisualLine> {
        self.lines.last()
    }

    pub fn metrics(&self) -> ReflowMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn total_height(&self) -> f32 {
        self.lines.last().map_or(0.0, |l| l.y + l.height)
    }

    /// Index of the line beginning exactly at `ordinal`.
    pub fn index_of_begin(&self, ordinal: Ordinal) -> Option<usize> {
        self.lines.binary_search_by(|l| l.begin.cmp(&ordinal)).ok()
    }

    /// Index of the line holding caret position `ordinal`.
    pub fn index_containing(&self, ordinal: Ordinal) -> Option<usize> {
        let idx = self.lines.partition_point(|l| l.begin <= ordinal);
        let idx = idx.checked_sub(1)?;
        self.lines[idx].contains(ordinal).then_some(idx)
    }

    /// Index of the line whose vertical extent holds `y`.
    pub fn index_at_y(&self, y: f32) -> Option<usize> {
        if self.lines.is_empty() {
            return None;
        }
        let idx = self.lines.partition_point(|l| l.y <= y);
        Some(idx.saturating_sub(1))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop the run and lay it out again from `begin` (a paragraph start)
    /// until it is at least `min_height` tall.
    pub fn rebuild(&mut self, pass: &mut LayoutPass<'_>, begin: Ordinal, min_height: f32) {
        self.lines.clear();
        let first = pass.build(begin);
        self.lines.push(first);
        ReflowMetrics::add(&self.metrics.full_relayouts, 1);
        self.fill_below(pass, min_height);
        debug!(target: "render.reflow", %begin, lines = self.lines.len(), "run_rebuilt");
    }

    /// Append lines until the run is `min_height` tall and ends on a hard
    /// break, or the document ends.
    pub fn fill_below(&mut self, pass: &mut LayoutPass<'_>, min_height: f32) -> usize {
        if self.lines.is_empty() {
            let first = pass.build(Ordinal::ZERO);
            self.lines.push(first);
        }
        let mut added = 0;
        loop {
            let Some(last) = self.lines.last() else {
                break;
            };
            let enough = last.y + last.height >= min_height && last.has_hard_break;
            if enough || last.next == Ordinal::UNDEFINED {
                break;
            }
            let y = last.y + last.height;
            let mut line = pass.build(last.next);
            line.y = y;
            self.lines.push(line);
            added += 1;
        }
        ReflowMetrics::add(&self.metrics.lines_filled, added);
        self.check_invariants();
        added
    }

    /// Prepend up to `count` lines above the first cached line.
    pub fn fill_above(&mut self, pass: &mut LayoutPass<'_>, count: usize) -> usize {
        let mut added = 0;
        while added < count {
            let Some(first) = self.lines.first() else {
                break;
            };
            if first.begin == Ordinal::ZERO {
                break;
            }
            let mut previous = pass.builder.previous_lines(pass.chars, first.begin, pass.width);
            if previous.is_empty() {
                break;
            }
            let take = (count - added).min(previous.len());
            let mut tail = previous.split_off(previous.len() - take);
            for line in &mut tail {
                pass.annotator.annotate(line);
            }
            self.lines.splice(0..0, tail);
            added += take;
        }
        if added > 0 {
            self.relayout_y();
            ReflowMetrics::add(&self.metrics.lines_filled, added);
            self.check_invariants();
        }
        added
    }

    /// Drop the first `count` lines, always keeping at least one.
    pub fn trim_above(&mut self, count: usize) -> usize {
        let count = count.min(self.lines.len().saturating_sub(1));
        if count == 0 {
            return 0;
        }
        self.lines.drain(..count);
        self.relayout_y();
        ReflowMetrics::add(&self.metrics.lines_trimmed, count);
        count
    }

    /// Keep at least `keep` lines, cutting after the first hard break at or
    /// past that point so the run still ends on one.
    pub fn trim_below(&mut self, keep: usize) -> usize {
        let keep = keep.max(1);
        if self.lines.len() <= keep {
            return 0;
        }
        let Some(cut) = (keep - 1..self.lines.len()).find(|&i| self.lines[i].has_hard_break) else {
            return 0;
        };
        let removed = self.lines.len() - (cut + 1);
        self.lines.truncate(cut + 1);
        ReflowMetrics::add(&self.metrics.lines_trimmed, removed);
        self.check_invariants();
        removed
    }

    /// Renormalize cached ordinals. Lines whose bounds were clamped into a
    /// deleted range are marked stale.
    pub fn apply_shift(&mut self, shift: OrdinalShift) {
        for line in &mut self.lines {
            if clamped_by(&shift, line.begin) || clamped_by(&shift, line.next) {
                line.stale = true;
            }
            shift.adjust(&mut line.begin);
            shift.adjust(&mut line.next);
        }
    }

    /// Rebuild the lines invalidated by an edit that now occupies
    /// `[begin, end]` (`begin == end` for deletions).
    pub fn reflow(&mut self, pass: &mut LayoutPass<'_>, begin: Ordinal, end: Ordinal) -> ReflowOutcome {
        let started = Instant::now();
        let end = end.max(begin);
        let Some(first) = self.lines.iter().position(|l| {
            l.stale
                || l.next == Ordinal::UNDEFINED
                || l.next > begin
                || (l.next == begin && l.text.ends_with('\r'))
        }) else {
            trace!(target: "render.reflow", %begin, "edit_below_run");
            return ReflowOutcome::default();
        };

        let wrap = pass.builder.wrap();
        let mut r = first.saturating_sub(1);
        while r > 0 && !begin_is_stable(pass.chars, wrap, self.lines[r].begin, begin) {
            r -= 1;
        }
        let (start_index, restart, skip_until) =
            if begin_is_stable(pass.chars, wrap, self.lines[r].begin, begin) {
                (r, self.lines[r].begin, None)
            } else {
                // The first cached line may no longer be a boundary: lay out
                // its paragraph again but keep only lines reaching past it.
                let anchor = self.lines[0].begin;
                (0, paragraph_start(pass.chars, anchor), Some(anchor))
            };

        let old: Vec<VisualLine> = self.lines.drain(start_index..).collect();
        let old_reached_end = old.last().is_some_and(|l| l.next == Ordinal::UNDEFINED);
        let mut k = 0;
        let mut fresh: Vec<VisualLine> = Vec::new();
        let mut resynced = false;
        let mut rebuilt_to_end = false;
        let mut at = restart;
        loop {
            let line = pass.build(at);
            let next = line.next;
            if let Some(anchor) = skip_until
                && next != Ordinal::UNDEFINED
                && next <= anchor
            {
                at = next;
                continue;
            }
            let has_hard_break = line.has_hard_break;
            fresh.push(line);
            if next == Ordinal::UNDEFINED {
                k = old.len();
                rebuilt_to_end = old_reached_end;
                break;
            }
            while k < old.len() && old[k].begin < next {
                k += 1;
            }
            if next >= end {
                match old.get(k) {
                    Some(cached)
                        if cached.begin == next
                            && !cached.stale
                            && (cached.next == Ordinal::UNDEFINED || cached.next > cached.begin)
                            && pass.annotator.can_reuse_line(cached) =>
                    {
                        resynced = true;
                        break;
                    }
                    None if has_hard_break && !old_reached_end => break,
                    _ => {}
                }
            }
            at = next;
        }

        let outcome = ReflowOutcome {
            first_index: start_index,
            removed: k,
            inserted: fresh.len(),
            resynced,
            rebuilt_to_end,
        };
        self.lines.extend(fresh);
        if resynced {
            self.lines.extend(old.into_iter().skip(k));
        }
        self.relayout_y();
        self.check_invariants();

        let m = &self.metrics;
        ReflowMetrics::add(&m.reflows, 1);
        ReflowMetrics::add(&m.lines_rebuilt, outcome.inserted);
        ReflowMetrics::add(&m.lines_discarded, outcome.removed);
        if resynced {
            ReflowMetrics::add(&m.resyncs, 1);
        }
        let ns = started.elapsed().as_nanos() as u64;
        m.last_reflow_ns
            .store(ns, std::sync::atomic::Ordering::Relaxed);
        trace!(
            target: "render.reflow",
            %begin, %end,
            first_index = outcome.first_index,
            removed = outcome.removed,
            inserted = outcome.inserted,
            resynced,
            rebuilt_to_end,
            "reflow"
        );
        outcome
    }

    /// Panics when the run has a gap or does not end on a hard break.
    pub fn check_invariants(&self) {
        for pair in self.lines.windows(2) {
            assert!(
                pair[0].next == pair[1].begin,
                "gap in cached run: line ending at {} followed by line at {}",
                pair[0].next,
                pair[1].begin
            );
        }
        if let Some(last) = self.lines.last() {
            assert!(
                last.has_hard_break,
                "cached run ends without a hard break at {}",
                last.begin
            );
        }
    }

    fn relayout_y(&mut self) {
        let mut y = 0.0;
        for line in &mut self.lines {
            line.y = y;
            y += line.height;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::annotate::{AnnotationSpan, LineAnnotator, SpanAttr};
    use core_text::MonospaceGlyphs;
    use pretty_assertions::assert_eq;

    /// Marks `#` comments and will not let reflow stop on a line holding one.
    struct CommentMarker {
        annotated: Arc<AtomicUsize>,
    }

    impl LineAnnotator for CommentMarker {
        fn annotate(&mut self, line: &VisualLine) -> Vec<AnnotationSpan> {
            self.annotated.fetch_add(1, Ordering::Relaxed);
            line.text
                .chars()
                .position(|c| c == '#')
                .map(|start| AnnotationSpan {
                    start,
                    end: line.char_count(),
                    attr: SpanAttr::Syntax(7),
                })
                .into_iter()
                .collect()
        }

        fn can_reuse_line(&self, line: &VisualLine) -> bool {
            !line.text.contains('#')
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().chain(std::iter::once('\0')).collect()
    }

    fn builder(wrap: WrapMode) -> LineLayoutBuilder {
        LineLayoutBuilder::new(Arc::new(MonospaceGlyphs::unit()), wrap)
    }

    fn full_layout(b: &LineLayoutBuilder, c: &[char], width: f32) -> Vec<(Ordinal, Ordinal, String)> {
        let mut out = Vec::new();
        let mut at = Ordinal::ZERO;
        loop {
            let l = b.next_line(c, at, width);
            out.push((l.begin, l.next, l.text.clone()));
            if l.next == Ordinal::UNDEFINED {
                break;
            }
            at = l.next;
        }
        out
    }

    fn shape(run: &LineRun) -> Vec<(Ordinal, Ordinal, String)> {
        run.lines()
            .iter()
            .map(|l| (l.begin, l.next, l.text.clone()))
            .collect()
    }

    #[test]
    fn rebuild_covers_height_and_ends_on_hard_break() {
        let b = builder(WrapMode::Character);
        let c = chars("aaaaaa\nbb\ncc\ndd");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        let mut pass = LayoutPass { chars: &c, builder: &b, annotator: &mut ann, width: 3.0 };
        run.rebuild(&mut pass, Ordinal::ZERO, 1.0);
        // "aaa" alone has no hard break, so filling continues to "aaa\n".
        assert_eq!(run.len(), 2);
        assert!(run.last().is_some_and(|l| l.has_hard_break));
        assert_eq!(run.total_height(), 2.0);
    }

    #[test]
    fn insert_reflows_and_resyncs() {
        let b = builder(WrapMode::Word);
        let before = chars("one two\nthree four\nfive six\nseven");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        {
            let mut pass = LayoutPass { chars: &before, builder: &b, annotator: &mut ann, width: 6.0 };
            run.rebuild(&mut pass, Ordinal::ZERO, 100.0);
        }
        // Insert "X" at 9 ("tXhree").
        let after = chars("one two\ntXhree four\nfive six\nseven");
        run.apply_shift(OrdinalShift::new(Ordinal::new(9), 1));
        let outcome = {
            let mut pass = LayoutPass { chars: &after, builder: &b, annotator: &mut ann, width: 6.0 };
            run.reflow(&mut pass, Ordinal::new(9), Ordinal::new(10))
        };
        assert!(outcome.resynced);
        assert_eq!(shape(&run), full_layout(&b, &after, 6.0));
    }

    #[test]
    fn delete_across_lines_matches_full_layout() {
        let b = builder(WrapMode::Character);
        let before = chars("abcdef\nghijkl\nmnop");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        {
            let mut pass = LayoutPass { chars: &before, builder: &b, annotator: &mut ann, width: 4.0 };
            run.rebuild(&mut pass, Ordinal::ZERO, 100.0);
        }
        // Delete "ef\ngh" = [4, 9).
        let after = chars("abcdijkl\nmnop");
        run.apply_shift(OrdinalShift::new(Ordinal::new(8), -5));
        {
            let mut pass = LayoutPass { chars: &after, builder: &b, annotator: &mut ann, width: 4.0 };
            run.reflow(&mut pass, Ordinal::new(4), Ordinal::new(4));
        }
        assert_eq!(shape(&run), full_layout(&b, &after, 4.0));
    }

    #[test]
    fn joining_cr_with_inserted_lf() {
        let b = builder(WrapMode::None);
        let before = chars("ab\rcd");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        {
            let mut pass = LayoutPass { chars: &before, builder: &b, annotator: &mut ann, width: 10.0 };
            run.rebuild(&mut pass, Ordinal::ZERO, 100.0);
        }
        let after = chars("ab\r\ncd");
        run.apply_shift(OrdinalShift::new(Ordinal::new(3), 1));
        {
            let mut pass = LayoutPass { chars: &after, builder: &b, annotator: &mut ann, width: 10.0 };
            let outcome = run.reflow(&mut pass, Ordinal::new(3), Ordinal::new(4));
            assert!(!outcome.resynced);
            // The old run reached the document end, so the walk does too.
            assert!(outcome.rebuilt_to_end);
            assert_eq!(outcome.line_delta(), Some(0));
            run.fill_below(&mut pass, 100.0);
        }
        assert_eq!(shape(&run), full_layout(&b, &after, 10.0));
        assert_eq!(run.len(), 2);
    }

    #[test]
    fn edit_below_run_is_ignored() {
        let b = builder(WrapMode::None);
        let c = chars("a\nb\nc\nd");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        let mut pass = LayoutPass { chars: &c, builder: &b, annotator: &mut ann, width: 10.0 };
        run.rebuild(&mut pass, Ordinal::ZERO, 2.0);
        assert_eq!(run.len(), 2);
        let outcome = run.reflow(&mut pass, Ordinal::new(6), Ordinal::new(7));
        assert!(!outcome.touched());
    }

    #[test]
    fn trimming_keeps_hard_break_at_end() {
        let b = builder(WrapMode::Character);
        let c = chars("aaaaaaaa\nb\nc");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        let mut pass = LayoutPass { chars: &c, builder: &b, annotator: &mut ann, width: 3.0 };
        run.rebuild(&mut pass, Ordinal::ZERO, 100.0);
        assert_eq!(run.len(), 5);
        // Keeping one line must still run through "aa\n".
        run.trim_below(1);
        assert_eq!(run.len(), 3);
        run.check_invariants();
        assert_eq!(run.trim_above(2), 2);
        assert_eq!(run.first().map(|l| l.begin), Some(Ordinal::new(6)));
        assert_eq!(run.first().map(|l| l.y), Some(0.0));
    }

    #[test]
    fn fill_above_prepends_previous_lines() {
        let b = builder(WrapMode::Character);
        let c = chars("abcdefg\nxyz");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        let mut pass = LayoutPass { chars: &c, builder: &b, annotator: &mut ann, width: 3.0 };
        run.rebuild(&mut pass, Ordinal::new(8), 1.0);
        assert_eq!(run.fill_above(&mut pass, 2), 2);
        let texts: Vec<_> = run.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["def", "g\n", "xyz"]);
        assert_eq!(run.fill_above(&mut pass, 5), 1);
        assert_eq!(run.fill_above(&mut pass, 1), 0);
        assert_eq!(run.index_containing(Ordinal::new(4)), Some(1));
        assert_eq!(run.index_of_begin(Ordinal::new(8)), Some(3));
    }

    #[test]
    fn refused_line_is_rebuilt_before_resync() {
        let b = builder(WrapMode::None);
        let before = chars("aa\nbb\n#c\ndd\nee");
        // Insert "x" at 4 ("bxb").
        let after = chars("aa\nbxb\n#c\ndd\nee");
        let edit = |ann: &mut Annotator| {
            let mut run = LineRun::new();
            {
                let mut pass = LayoutPass { chars: &before, builder: &b, annotator: &mut *ann, width: 10.0 };
                run.rebuild(&mut pass, Ordinal::ZERO, 100.0);
            }
            run.apply_shift(OrdinalShift::new(Ordinal::new(4), 1));
            let mut pass = LayoutPass { chars: &after, builder: &b, annotator: &mut *ann, width: 10.0 };
            let outcome = run.reflow(&mut pass, Ordinal::new(4), Ordinal::new(5));
            (run, outcome)
        };

        let (plain_run, plain) = edit(&mut Annotator::None);
        assert!(plain.resynced);
        assert_eq!(plain.inserted, 2);
        assert_eq!(shape(&plain_run), full_layout(&b, &after, 10.0));

        let annotated = Arc::new(AtomicUsize::new(0));
        let mut ann = Annotator::Highlighter(Box::new(CommentMarker {
            annotated: Arc::clone(&annotated),
        }));
        let (run, outcome) = edit(&mut ann);
        assert_eq!(
            outcome,
            ReflowOutcome { first_index: 0, removed: 3, inserted: 3, resynced: true, rebuilt_to_end: false }
        );
        // Five lines from the initial layout, three from the reflow.
        assert_eq!(annotated.load(Ordering::Relaxed), 8);
        assert_eq!(shape(&run), full_layout(&b, &after, 10.0));
        let comment = &run.lines()[2];
        assert_eq!(comment.text, "#c\n");
        assert_eq!(comment.spans.len(), 1);
        assert_eq!((comment.spans[0].start, comment.spans[0].end), (0, 3));
    }

    #[test]
    fn edit_on_last_line_rebuilds_to_end_with_exact_delta() {
        let b = builder(WrapMode::Character);
        let before = chars("abc\ndef");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        {
            let mut pass = LayoutPass { chars: &before, builder: &b, annotator: &mut ann, width: 4.0 };
            run.rebuild(&mut pass, Ordinal::ZERO, 100.0);
        }
        // Append "gh\ni" at 7: "defg", "h\n", "i".
        let after = chars("abc\ndefgh\ni");
        run.apply_shift(OrdinalShift::new(Ordinal::new(7), 4));
        let outcome = {
            let mut pass = LayoutPass { chars: &after, builder: &b, annotator: &mut ann, width: 4.0 };
            run.reflow(&mut pass, Ordinal::new(7), Ordinal::new(11))
        };
        assert!(!outcome.resynced);
        assert!(outcome.rebuilt_to_end);
        assert_eq!(outcome.line_delta(), Some(2));
        assert_eq!(shape(&run), full_layout(&b, &after, 4.0));
    }

    #[test]
    fn edit_ending_on_hard_break_inside_run_has_no_exact_delta() {
        let b = builder(WrapMode::None);
        let before = chars("ab\ncd\nef");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        let mut pass = LayoutPass { chars: &before, builder: &b, annotator: &mut ann, width: 10.0 };
        run.rebuild(&mut pass, Ordinal::ZERO, 1.0);
        assert_eq!(run.len(), 1);
        let outcome = run.reflow(&mut pass, Ordinal::new(1), Ordinal::new(1));
        assert!(!outcome.rebuilt_to_end);
        assert_eq!(outcome.line_delta(), None);
    }

    #[test]
    #[should_panic(expected = "gap in cached run")]
    fn gap_is_fatal() {
        let b = builder(WrapMode::None);
        let c = chars("a\nb\nc");
        let mut ann = Annotator::None;
        let mut run = LineRun::new();
        let mut pass = LayoutPass { chars: &c, builder: &b, annotator: &mut ann, width: 10.0 };
        run.rebuild(&mut pass, Ordinal::ZERO, 100.0);
        run.lines.remove(1);
        run.check_invariants();
    }
}
