//! Display orchestration over a single document.
//!
//! [`DisplayManager`] composes the document, the undo log, the ordinal-tracked
//! caret and selections, the content line index, the cached visual-line run
//! and the background scroll estimator, and exposes the editing, clipboard and
//! navigation operations a UI layer drives. Nothing here draws: the UI drains
//! [`core_events::EditorEvent`]s from the injected sink and asks
//! [`DisplayManager::take_repaint`] what to repaint.
//!
//! Invariants (hold after every public call):
//! * The caret coincides with one end of the selection.
//! * The cached run is contiguous, ends on a hard break and contains the
//!   first visible line.
//! * Every ordinal held by the display has been renormalized for every edit,
//!   and the undo log heard the edit before the view did.

mod display;
mod view;

pub use display::{CaretMove, DisplayManager};

/// New first visible line that keeps `caret_line` inside the viewport.
///
/// - `first`: current first visible line.
/// - `caret_line`: line to reveal.
/// - `rows`: visible rows.
/// - `margin`: rows kept between the caret and the viewport edges (clamped
///   to `rows / 2`).
///
/// `None` when the line is already inside the permitted band.
pub fn compute_scroll_intent(
    first: usize,
    caret_line: usize,
    rows: usize,
    margin: usize,
) -> Option<usize> {
    if rows == 0 {
        return None;
    }
    let m = margin.min(rows / 2);
    let top = first;
    let bottom = first + rows;
    if caret_line < top + m {
        let new_first = caret_line.saturating_sub(m);
        if new_first != first {
            return Some(new_first);
        }
    } else if caret_line + m >= bottom {
        let new_first = caret_line + m + 1 - rows;
        if new_first != first {
            return Some(new_first);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_inside_viewport_needs_no_scroll() {
        assert_eq!(compute_scroll_intent(0, 5, 10, 2), None);
        assert_eq!(compute_scroll_intent(3, 3, 4, 0), None);
        assert_eq!(compute_scroll_intent(3, 6, 4, 0), None);
    }

    #[test]
    fn line_above_viewport_scrolls_up() {
        assert_eq!(compute_scroll_intent(10, 9, 6, 0), Some(9));
        // Margin 2 keeps two rows above the caret.
        assert_eq!(compute_scroll_intent(10, 11, 6, 2), Some(9));
    }

    #[test]
    fn line_below_viewport_scrolls_down_just_enough() {
        assert_eq!(compute_scroll_intent(0, 5, 5, 0), Some(1));
        assert_eq!(compute_scroll_intent(0, 4, 5, 1), Some(1));
        assert_eq!(compute_scroll_intent(0, 20, 5, 0), Some(16));
    }

    #[test]
    fn margin_is_clamped_and_zero_rows_never_scroll() {
        // Margin 10 clamps to 2 for four rows: 2 + 2 + 1 - 4 = 1.
        assert_eq!(compute_scroll_intent(0, 2, 4, 10), Some(1));
        assert_eq!(compute_scroll_intent(0, 50, 0, 0), None);
    }
}
