//! The display orchestrator.
//!
//! `DisplayManager` owns the document and every component that tracks it,
//! and maps edit, clipboard and navigation requests onto them. Each public
//! operation runs to completion on the caller's thread:
//!
//! 1. The document is mutated with a fan-out observer (undo log first, then
//!    the view state) so every stored ordinal is renormalized before the
//!    view reflows.
//! 2. The view settles: the cached run is trimmed and refilled around the
//!    scroll anchor, repaint intents are queued and the scroll estimate is
//!    corrected or restarted.
//! 3. Selection, caret and scroll-extent changes are published to the event
//!    sink, followed by `RepaintRequested` when repaint work is pending.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use core_config::EditorSettings;
use core_events::{EditorEvent, EventSink};
use core_render::{
    Annotator, Decision, LineLayoutBuilder, ReflowMetricsSnapshot, RepaintDelta,
    RepaintMetricsSnapshot, ScrollBoundsManager, VisualLine,
};
use core_state::{Caret, ClipboardProvider, ClipboardRing, SelectionManager, UndoRedoManager};
use core_text::{
    ContentChange, Document, DocumentError, DocumentObserver, GlyphWidthProvider, MonospaceGlyphs,
    Ordinal, OrdinalShift, Persistence, SearchOptions, TextMatch,
};
use tracing::{debug, info};

use crate::view::ViewState;

/// Caret movement requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMove {
    Left,
    Right,
    Up,
    Down,
    /// Start of the caret's visual line.
    LineStart,
    /// End of the caret's visual line, before its hard break.
    LineEnd,
    DocumentStart,
    DocumentEnd,
}

/// Where glyph metrics come from.
#[derive(Debug, Clone)]
enum GlyphSource {
    /// Monospace cells sized by the settings; rebuilt by `apply_settings`.
    Settings,
    Injected(Arc<dyn GlyphWidthProvider>),
}

/// Delivers each notification to the undo log, then to the view.
struct Fanout<'a> {
    undo: &'a mut UndoRedoManager,
    view: &'a mut ViewState,
}

impl DocumentObserver for Fanout<'_> {
    fn on_ordinal_shift(&mut self, shift: OrdinalShift) {
        self.undo.on_ordinal_shift(shift);
        self.view.on_ordinal_shift(shift);
    }

    fn on_content_change(&mut self, document: &Document, change: &ContentChange) {
        self.undo.on_content_change(document, change);
        self.view.on_content_change(document, change);
    }
}

/// State compared before and after an operation to decide which events fire.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Marks {
    caret: Ordinal,
    selection: (Ordinal, Ordinal),
    highlight: (Ordinal, Ordinal),
    total_lines: usize,
}

#[derive(Debug)]
pub struct DisplayManager {
    document: Document,
    undo: UndoRedoManager,
    view: ViewState,
    clipboard: ClipboardRing,
    settings: EditorSettings,
    glyphs: GlyphSource,
    /// Range inserted by the last paste, while paste-next may replace it.
    last_paste: Option<(Ordinal, Ordinal)>,
}

fn settings_glyphs(settings: &EditorSettings) -> Arc<dyn GlyphWidthProvider> {
    Arc::new(MonospaceGlyphs::new(
        settings.cell_width,
        settings.line_height,
        settings.tab_width,
    ))
}

impl DisplayManager {
    /// Display over `document` with monospace metrics taken from `settings`.
    pub fn new(
        document: Document,
        settings: EditorSettings,
        width: f32,
        height: f32,
        sink: Box<dyn EventSink>,
    ) -> Self {
        Self::build(document, settings, GlyphSource::Settings, width, height, sink)
    }

    /// Display using an injected glyph-width provider.
    pub fn with_glyphs(
        document: Document,
        settings: EditorSettings,
        glyphs: Arc<dyn GlyphWidthProvider>,
        width: f32,
        height: f32,
        sink: Box<dyn EventSink>,
    ) -> Self {
        Self::build(document, settings, GlyphSource::Injected(glyphs), width, height, sink)
    }

    fn build(
        document: Document,
        settings: EditorSettings,
        glyphs: GlyphSource,
        width: f32,
        height: f32,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let provider = match &glyphs {
            GlyphSource::Settings => settings_glyphs(&settings),
            GlyphSource::Injected(p) => Arc::clone(p),
        };
        let builder = LineLayoutBuilder::new(provider, settings.wrap);
        let scroll_bounds = ScrollBoundsManager::new(
            document.reader(),
            builder.clone(),
            settings.estimate_update_interval,
        );
        let mut view = ViewState::new(&document, builder, scroll_bounds, sink, settings.overscan_lines);
        view.width = width;
        view.height = height;
        view.settle(&document);
        info!(target: "model.display", width, height, wrap = ?settings.wrap, chars = document.len() - 1, "display_created");
        Self {
            clipboard: ClipboardRing::new(settings.clipboard_capacity),
            document,
            undo: UndoRedoManager::new(),
            view,
            settings,
            glyphs,
            last_paste: None,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn undo_manager(&self) -> &UndoRedoManager {
        &self.undo
    }

    pub fn clipboard(&self) -> &ClipboardRing {
        &self.clipboard
    }

    pub fn caret(&self) -> &Caret {
        &self.view.caret
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.view.selection
    }

    pub fn highlight(&self) -> &SelectionManager {
        &self.view.highlight
    }

    /// Every cached visual line (viewport plus overscan).
    pub fn cached_lines(&self) -> &[VisualLine] {
        self.view.run.lines()
    }

    pub fn visible_lines(&self) -> &[VisualLine] {
        self.view.visible_lines()
    }

    /// Begin of the first visible visual line.
    pub fn page_begin(&self) -> Ordinal {
        self.view.anchor()
    }

    /// Visual line index of the first visible line (provisional until the
    /// scroll estimate completes).
    pub fn first_line_index(&self) -> usize {
        self.view.first_line_index()
    }

    pub fn page_top(&self) -> f32 {
        self.view.page_top()
    }

    /// Best known number of visual lines in the document.
    pub fn total_lines(&self) -> usize {
        self.view.scroll_bounds.total_lines()
    }

    pub fn is_estimating(&self) -> bool {
        self.view.scroll_bounds.is_busy()
    }

    pub fn content_lines(&self) -> usize {
        self.view.lines.max_content_lines()
    }

    /// Digits needed by a line-number gutter; zero when line numbers are off.
    pub fn gutter_digits(&self) -> usize {
        if !self.settings.show_line_numbers {
            return 0;
        }
        self.view
            .lines
            .gutter_digits(self.settings.min_line_number_digits as usize)
    }

    pub fn reflow_metrics(&self) -> ReflowMetricsSnapshot {
        self.view.run.metrics()
    }

    pub fn repaint_metrics(&self) -> RepaintMetricsSnapshot {
        self.view.scheduler.metrics_snapshot()
    }

    /// Zero-based content line holding `ordinal`.
    pub fn content_line_at(&mut self, ordinal: Ordinal) -> usize {
        self.view.lines.get_line_number(&self.document, ordinal)
    }

    /// Zero-based content line and column of the caret.
    pub fn caret_line_column(&mut self) -> (usize, usize) {
        let caret = self.view.caret.ordinal();
        let line = self.view.lines.get_line_number(&self.document, caret);
        let begin = self.view.lines.get_begin_ordinal(&self.document, line);
        let column = caret.distance_from(begin).max(0) as usize;
        (line, column)
    }

    // ---------------------------------------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------------------------------------

    /// Insert `text` at the caret, replacing the selection.
    pub fn insert_text(&mut self, text: &str) {
        let before = self.marks();
        self.last_paste = None;
        self.replace_selection(text);
        self.finish(before, true);
    }

    /// Insert `text` at `ordinal`. The caret and selection only move as the
    /// shift carries them.
    pub fn insert_at(&mut self, ordinal: Ordinal, text: &str) {
        let before = self.marks();
        self.last_paste = None;
        {
            let mut fan = Fanout {
                undo: &mut self.undo,
                view: &mut self.view,
            };
            self.document.insert(ordinal, text, &mut fan);
        }
        self.finish(before, false);
    }

    pub fn type_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_text(c.encode_utf8(&mut buf));
    }

    /// Delete the selection, or the caret stop left of the caret.
    pub fn delete_backward(&mut self) -> bool {
        let before = self.marks();
        self.last_paste = None;
        let deleted = if self.view.selection.is_empty() {
            let caret = self.view.caret.ordinal();
            let from = Caret::step_left(&self.document, caret);
            self.delete_range(from, caret)
        } else {
            self.delete_selection()
        };
        self.finish(before, true);
        deleted
    }

    /// Delete the selection, or the caret stop right of the caret.
    pub fn delete_forward(&mut self) -> bool {
        let before = self.marks();
        self.last_paste = None;
        let deleted = if self.view.selection.is_empty() {
            let caret = self.view.caret.ordinal();
            let to = Caret::step_right(&self.document, caret);
            self.delete_range(caret, to)
        } else {
            self.delete_selection()
        };
        self.finish(before, true);
        deleted
    }

    /// Replace every match as one undo unit. Returns the match count.
    pub fn replace_all_text(&mut self, find: &str, replace: &str, options: SearchOptions) -> usize {
        let before = self.marks();
        self.last_paste = None;
        self.undo.begin_transaction();
        let count = {
            let mut fan = Fanout {
                undo: &mut self.undo,
                view: &mut self.view,
            };
            self.document.replace_all_text(find, replace, options, &mut fan)
        };
        self.undo.end_transaction();
        info!(target: "model.display", pattern = find, count, "replace_all");
        self.finish(before, false);
        count
    }

    /// Find every match and highlight the first one at or after the caret
    /// (wrapping to the first match). Returns all matches.
    pub fn find_all(&mut self, find: &str, options: SearchOptions) -> Vec<TextMatch> {
        let before = self.marks();
        let matches = self.document.find_all(find, options);
        let caret = self.view.caret.ordinal();
        match matches
            .iter()
            .find(|m| m.begin >= caret)
            .or_else(|| matches.first())
        {
            Some(m) => {
                self.view.highlight.select_range(m.begin, m.end);
                self.view.ensure_visible(&self.document, m.begin);
            }
            None => {
                self.view.highlight.clear();
            }
        }
        debug!(target: "model.display", pattern = find, count = matches.len(), "find_all");
        self.finish(before, false);
        matches
    }

    pub fn clear_highlight(&mut self) {
        let before = self.marks();
        self.view.highlight.clear();
        self.finish(before, false);
    }

    pub fn undo(&mut self) -> bool {
        let before = self.marks();
        self.last_paste = None;
        let target = self.undo.undo(&mut self.document, &mut self.view);
        if let Some(o) = target {
            self.place_caret(o, false);
        }
        self.finish(before, true);
        target.is_some()
    }

    pub fn redo(&mut self) -> bool {
        let before = self.marks();
        self.last_paste = None;
        let target = self.undo.redo(&mut self.document, &mut self.view);
        if let Some(o) = target {
            self.place_caret(o, false);
        }
        self.finish(before, true);
        target.is_some()
    }

    // ---------------------------------------------------------------------------------------------
    // Files
    // ---------------------------------------------------------------------------------------------

    /// Replace the buffer with the contents of `path`. Clears undo history.
    pub fn load_file(&mut self, path: &Path, persistence: &dyn Persistence) -> Result<(), DocumentError> {
        let before = self.marks();
        self.last_paste = None;
        {
            let mut fan = Fanout {
                undo: &mut self.undo,
                view: &mut self.view,
            };
            self.document.load_file(path, persistence, &mut fan)?;
        }
        self.finish(before, false);
        Ok(())
    }

    pub fn save_file(&mut self, path: &Path, persistence: &dyn Persistence) -> Result<(), DocumentError> {
        self.document.save_file(path, persistence)?;
        self.undo.mark_saved();
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Clipboard
    // ---------------------------------------------------------------------------------------------

    /// Copy the selection into the ring and the system clipboard. Text that
    /// reached the system clipboard from elsewhere joins the ring first.
    pub fn copy(&mut self, provider: &mut dyn ClipboardProvider) -> bool {
        if self.view.selection.is_empty() {
            return false;
        }
        let (b, e) = self.view.selection.selected_range();
        let text = self.document.slice(b, e);
        self.clipboard.sync_from(provider);
        self.clipboard.add(&text);
        provider.set_text(&text);
        debug!(target: "model.display", chars = text.chars().count(), "copied");
        true
    }

    pub fn cut(&mut self, provider: &mut dyn ClipboardProvider) -> bool {
        if !self.copy(provider) {
            return false;
        }
        let before = self.marks();
        self.last_paste = None;
        self.delete_selection();
        self.finish(before, true);
        true
    }

    /// Paste the newest entry (after picking up the system clipboard).
    pub fn paste(&mut self, provider: &mut dyn ClipboardProvider) -> bool {
        self.clipboard.sync_from(provider);
        self.clipboard.reset_cursor();
        let Some(text) = self.clipboard.paste_next() else {
            return false;
        };
        let before = self.marks();
        self.paste_text(&text);
        self.finish(before, true);
        true
    }

    /// Replace the text inserted by the previous paste with the next ring
    /// entry. Without a preceding paste this pastes the current ring entry.
    pub fn paste_next(&mut self) -> bool {
        let Some(text) = self.clipboard.paste_next() else {
            return false;
        };
        let before = self.marks();
        if let Some((b, e)) = self.last_paste {
            self.view.selection.select_range(b, e);
        }
        self.paste_text(&text);
        self.finish(before, true);
        true
    }

    fn paste_text(&mut self, text: &str) {
        let begin = if self.view.selection.is_empty() {
            self.view.caret.ordinal()
        } else {
            self.view.selection.selected_range().0
        };
        self.replace_selection(text);
        self.last_paste = Some((begin, begin.offset(text.chars().count() as isize)));
    }

    // ---------------------------------------------------------------------------------------------
    // Caret & selection
    // ---------------------------------------------------------------------------------------------

    /// Move the caret; `extend` grows the selection instead of collapsing it.
    pub fn move_caret(&mut self, movement: CaretMove, extend: bool) {
        let before = self.marks();
        self.last_paste = None;
        let caret = self.view.caret.ordinal();
        let collapsing = !extend && !self.view.selection.is_empty();
        match movement {
            CaretMove::Left if collapsing => {
                let b = self.view.selection.selected_range().0;
                self.place_caret(b, false);
            }
            CaretMove::Right if collapsing => {
                let e = self.view.selection.selected_range().1;
                self.place_caret(e, false);
            }
            CaretMove::Left => {
                let o = Caret::step_left(&self.document, caret);
                self.place_caret(o, extend);
            }
            CaretMove::Right => {
                let o = Caret::step_right(&self.document, caret);
                self.place_caret(o, extend);
            }
            CaretMove::Up | CaretMove::Down => self.move_vertically(movement == CaretMove::Down, extend),
            CaretMove::LineStart | CaretMove::LineEnd => {
                self.view.ensure_visible(&self.document, caret);
                if let Some(line) = self
                    .view
                    .run
                    .index_containing(caret)
                    .and_then(|i| self.view.run.get(i))
                {
                    let target = if movement == CaretMove::LineStart {
                        line.begin
                    } else if line.has_hard_break {
                        line.hit_test(self.view.builder.glyphs(), f32::MAX)
                    } else {
                        line.next.offset(-1).max(line.begin)
                    };
                    self.place_caret(target, extend);
                }
            }
            CaretMove::DocumentStart => self.place_caret(Ordinal::ZERO, extend),
            CaretMove::DocumentEnd => {
                let last = self.document.last_ordinal();
                self.place_caret(last, extend);
            }
        }
        self.finish(before, true);
    }

    fn move_vertically(&mut self, down: bool, extend: bool) {
        let caret = self.view.caret.ordinal();
        let Some(target) = self.view.caret_neighbour(&self.document, down) else {
            let edge = if down {
                self.document.last_ordinal()
            } else {
                Ordinal::ZERO
            };
            self.place_caret(edge, extend);
            return;
        };
        let glyphs = self.view.builder.glyphs();
        let x = match self.view.caret.preferred_x() {
            Some(x) => x,
            None => self
                .view
                .run
                .index_containing(caret)
                .and_then(|i| self.view.run.get(i))
                .map_or(0.0, |l| l.char_x(glyphs, caret)),
        };
        let ordinal = self
            .view
            .run
            .get(target)
            .map_or(caret, |l| l.hit_test(glyphs, x));
        self.view.caret.move_vertically(ordinal, x);
        self.update_selection(ordinal, extend);
    }

    /// Select the word around `ordinal`; the caret goes to its end.
    pub fn select_word_at(&mut self, ordinal: Ordinal) {
        let before = self.marks();
        self.last_paste = None;
        let (b, e) = self.document.word_boundary(ordinal);
        self.view.selection.select_range(b, e);
        self.view.caret.move_to(e);
        self.finish(before, true);
    }

    pub fn select_range(&mut self, begin: Ordinal, end: Ordinal) {
        let before = self.marks();
        self.last_paste = None;
        self.view.selection.select_range(begin, end);
        self.view.caret.move_to(end.max(begin));
        self.finish(before, true);
    }

    // ---------------------------------------------------------------------------------------------
    // View
    // ---------------------------------------------------------------------------------------------

    /// Scroll by `lines` visual lines. Returns how far the view moved.
    pub fn scroll_by(&mut self, lines: isize) -> isize {
        let before = self.marks();
        let moved = self.view.scroll_by(&self.document, lines);
        self.finish(before, false);
        moved
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let before = self.marks();
        let width_changed = width != self.view.width;
        self.view.width = width;
        self.view.height = height;
        if width_changed {
            self.view.invalidate_layout();
        } else {
            self.view.scheduler.mark(RepaintDelta::Full);
        }
        debug!(target: "model.display", width, height, width_changed, "resized");
        self.finish(before, false);
    }

    /// Switch to new settings; the whole layout is rebuilt.
    pub fn apply_settings(&mut self, settings: EditorSettings) {
        let before = self.marks();
        let provider = match &self.glyphs {
            GlyphSource::Settings => settings_glyphs(&settings),
            GlyphSource::Injected(p) => Arc::clone(p),
        };
        let builder = LineLayoutBuilder::new(provider, settings.wrap);
        self.view
            .scroll_bounds
            .set_layout(builder.clone(), settings.estimate_update_interval);
        self.view.builder = builder;
        self.view.overscan = settings.overscan_lines;
        self.clipboard.set_capacity(settings.clipboard_capacity);
        self.view.invalidate_layout();
        info!(target: "model.display", wrap = ?settings.wrap, tab_width = settings.tab_width, overscan = settings.overscan_lines, "settings_applied");
        self.settings = settings;
        self.finish(before, false);
    }

    /// Attach or remove a line annotator; cached lines are rebuilt.
    pub fn set_annotator(&mut self, annotator: Annotator) {
        let before = self.marks();
        self.view.annotator = annotator;
        self.view.invalidate_layout();
        self.finish(before, false);
    }

    /// Apply finished background work. Returns `true` when the scroll extent
    /// or the view's position estimate changed.
    pub fn poll_background(&mut self) -> bool {
        let before = self.marks();
        let revision = self.document.revision();
        let applied = match self.view.scroll_bounds.poll() {
            Some(estimate) => self.view.apply_estimate(&estimate, revision),
            None => false,
        };
        if self.view.estimate_pending() {
            self.view.settle(&self.document);
        }
        let changed = applied || self.total_lines() != before.total_lines;
        self.finish(before, false);
        changed
    }

    /// Block until the running scroll estimate completes (or `timeout`
    /// passes) and apply it.
    pub fn wait_for_estimate(&mut self, timeout: Duration) -> bool {
        let before = self.marks();
        let revision = self.document.revision();
        let applied = match self.view.scroll_bounds.wait_for_estimate(timeout) {
            Some(estimate) => self.view.apply_estimate(&estimate, revision),
            None => false,
        };
        self.finish(before, false);
        applied
    }

    /// Merged repaint work since the last call.
    pub fn take_repaint(&mut self) -> Option<Decision> {
        self.view.scheduler.consume()
    }

    // ---------------------------------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------------------------------

    fn marks(&self) -> Marks {
        Marks {
            caret: self.view.caret.ordinal(),
            selection: self.view.selection.selected_range(),
            highlight: self.view.highlight.selected_range(),
            total_lines: self.total_lines(),
        }
    }

    /// Settle the view and publish what changed since `before`.
    fn finish(&mut self, before: Marks, reveal_caret: bool) {
        self.view.settle(&self.document);
        if reveal_caret {
            let caret = self.view.caret.ordinal();
            self.view.ensure_visible(&self.document, caret);
        }
        let after = self.marks();
        let forced = self.view.selection.take_forced_repaint() | self.view.highlight.take_forced_repaint();
        if after.selection != before.selection || after.highlight != before.highlight {
            self.view.scheduler.mark(RepaintDelta::Selection);
            self.view.emit(EditorEvent::SelectionChange);
        } else if forced {
            self.view.scheduler.mark_forced_selection();
        }
        if after.caret != before.caret {
            self.view.scheduler.mark(RepaintDelta::Caret);
            let (line, column) = self.caret_line_column();
            self.view.emit(EditorEvent::CaretPositionChanged { line, column });
        }
        if after.total_lines != before.total_lines {
            self.view.emit(EditorEvent::ScrollBoundsChanged {
                total_lines: after.total_lines,
            });
        }
        if self.view.scheduler.has_pending() {
            self.view.emit(EditorEvent::RepaintRequested);
        }
    }

    fn place_caret(&mut self, ordinal: Ordinal, extend: bool) {
        self.view.caret.move_to(ordinal);
        self.update_selection(ordinal, extend);
    }

    fn update_selection(&mut self, ordinal: Ordinal, extend: bool) {
        if extend {
            self.view.selection.expand_selection(ordinal);
        } else {
            self.view.selection.reset_selection(ordinal);
        }
    }

    /// Replace the selection (if any) with `text` as one undo unit and leave
    /// the caret after the inserted text.
    fn replace_selection(&mut self, text: &str) {
        let has_selection = !self.view.selection.is_empty();
        if has_selection {
            self.undo.begin_transaction();
            self.delete_selection();
        }
        let at = self.view.caret.ordinal();
        {
            let mut fan = Fanout {
                undo: &mut self.undo,
                view: &mut self.view,
            };
            self.document.insert(at, text, &mut fan);
        }
        if has_selection {
            self.undo.end_transaction();
        }
        self.place_caret(at.offset(text.chars().count() as isize), false);
    }

    fn delete_selection(&mut self) -> bool {
        let (b, e) = self.view.selection.selected_range();
        self.delete_range(b, e)
    }

    /// Delete `[begin, end)`; the caret ends at `begin`.
    fn delete_range(&mut self, begin: Ordinal, end: Ordinal) -> bool {
        let len = end.distance_from(begin);
        if !begin.is_valid() || len <= 0 {
            return false;
        }
        {
            let mut fan = Fanout {
                undo: &mut self.undo,
                view: &mut self.view,
            };
            self.document.delete_at(begin, len as usize, &mut fan);
        }
        self.place_caret(begin, false);
        true
    }
}
