//! Events the editing core publishes to the rendering / UI layer.
//!
//! The core never calls into a renderer directly. It pushes [`EditorEvent`]s
//! into an injected [`EventSink`]; the UI layer drains them on its own
//! schedule.

use std::sync::atomic::{AtomicU64, Ordering};

use core_text::{ContentChange, OrdinalShift};
use crossbeam_channel::{Receiver, Sender, TrySendError};

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Events travel over a bounded channel. Edits must never block on a slow consumer, so the sink uses
// `try_send` and drops on a full channel; drops are counted and logged. A consumer that falls this
// far behind repaints from `RepaintRequested` anyway, which only needs one surviving event.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 8192;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
pub static EVENTS_EMITTED: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0); // full or disconnected
pub static CONTENT_CHANGES: AtomicU64 = AtomicU64::new(0);
pub static SHIFTS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Broadcast before the `ContentChange` of the same edit.
    OrdinalShift(OrdinalShift),
    /// `ContentChange::Reset` signals "whole buffer replaced".
    ContentChange(ContentChange),
    SelectionChange,
    /// Zero-based line and column of the caret.
    CaretPositionChanged { line: usize, column: usize },
    /// Total visual line count changed (scroll extent).
    ScrollBoundsChanged { total_lines: usize },
    /// The display has pending repaint work; call `take_repaint`.
    RepaintRequested,
}

pub trait EventSink: Send {
    fn emit(&mut self, event: EditorEvent);
}

fn record(event: &EditorEvent) {
    EVENTS_EMITTED.fetch_add(1, Ordering::Relaxed);
    match event {
        EditorEvent::ContentChange(_) => {
            CONTENT_CHANGES.fetch_add(1, Ordering::Relaxed);
        }
        EditorEvent::OrdinalShift(_) => {
            SHIFTS.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&mut self, event: EditorEvent) {
        record(&event);
    }
}

/// Forwards into a bounded crossbeam channel without blocking.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: Sender<EditorEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: Sender<EditorEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&mut self, event: EditorEvent) {
        record(&event);
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "events", ?event, "event_dropped_channel_full");
            }
            Err(TrySendError::Disconnected(_)) => {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(target: "events", "event_dropped_disconnected");
            }
        }
    }
}

/// Sink plus receiver over a channel of `EVENT_CHANNEL_CAP` slots.
pub fn event_channel() -> (ChannelEventSink, Receiver<EditorEvent>) {
    event_channel_with_capacity(EVENT_CHANNEL_CAP)
}

pub fn event_channel_with_capacity(cap: usize) -> (ChannelEventSink, Receiver<EditorEvent>) {
    let (tx, rx) = crossbeam_channel::bounded(cap);
    (ChannelEventSink::new(tx), rx)
}
