//! Visual layout of a document: line building, the cached line run with
//! incremental reflow, the background scroll-extent estimator and repaint
//! scheduling.
//!
//! Exposed components:
//! - `layout`: [`LineLayoutBuilder`] turns characters into [`VisualLine`]s
//!   (hard breaks, character or word wrap).
//! - `annotate`: optional per-line highlighter consulted before a cached line
//!   is reused.
//! - `run`: [`LineRun`], the contiguous cached window of visual lines, and
//!   its bounded reflow after an edit.
//! - `scroll_bounds`: [`ScrollBoundsManager`] walks the whole document on a
//!   worker thread to estimate the total visual line count.
//! - `scheduler`: merges repaint intents into one decision per frame.
//! - `metrics`: counters describing what reflow actually did.
//!
//! Nothing in this crate draws; a renderer reads the run and the scheduler's
//! decisions.

pub mod annotate;
pub mod layout;
pub mod metrics;
pub mod run;
pub mod scheduler;
pub mod scroll_bounds;

pub use annotate::{AnnotationSpan, Annotator, LineAnnotator, SpanAttr};
pub use layout::{LineLayoutBuilder, VisualLine};
pub use metrics::{ReflowMetrics, ReflowMetricsSnapshot};
pub use run::{LayoutPass, LineRun, ReflowOutcome};
pub use scheduler::{Decision, RepaintDelta, RepaintMetrics, RepaintMetricsSnapshot, RepaintScheduler};
pub use scroll_bounds::{ScrollBoundsManager, ScrollEstimate};
