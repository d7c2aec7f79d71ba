//! Scan & classify pass.
//!
//! Starting from the resolved left boundary, scan forward while items start
//! inside the slacked band. Every scanned item must be rendered; those that
//! also overlap the unslacked window are on screen. Items before the left
//! boundary or after the scan end must be cloaked.
//!
//! The item at the scan end that stopped the scan (first item past the slacked
//! band) is neither rendered nor cloaked by the pass; it is where the loading
//! indicator goes.

use std::ops::Range;

use crate::host::GeometryProvider;
use crate::model::ItemKey;

use super::resolver::find_left_boundary;

/// Horizontal span of an item in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSpan {
    /// Left edge, scroll correction included.
    pub left: f64,
    /// Right edge (`left + width`).
    pub right: f64,
}

impl ItemSpan {
    /// Create a span from a left edge and a width.
    pub fn new(left: f64, width: f64) -> Self {
        Self {
            left,
            right: left + width,
        }
    }

    /// Measure an item slot through the geometry provider.
    pub fn measure<G: GeometryProvider + ?Sized>(geometry: &G, key: ItemKey) -> Self {
        let left = geometry.left_offset(key) + geometry.scroll_correction();
        Self::new(left, geometry.width(key))
    }
}

/// Viewport bands for one pass.
///
/// # Invariants
/// - `viewport_left >= 0`
/// - `window_right <= body_width` and `viewport_right <= body_width`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge of the visible window, shifted past any fixed element.
    pub window_left: f64,
    /// Right edge of the visible window.
    pub window_right: f64,
    /// Left edge of the slacked band.
    pub viewport_left: f64,
    /// Right edge of the slacked band.
    pub viewport_right: f64,
    /// Slack added on each side.
    pub slack: f64,
}

impl Viewport {
    /// Compute the bands from raw window geometry.
    ///
    /// `slack` is `round(window_width * slack_ratio)`. A fixed element width
    /// shifts `window_left` only; the slacked band is computed before the shift.
    pub fn from_window(
        window_left: f64,
        window_width: f64,
        body_width: f64,
        slack_ratio: f64,
        fixed_element_width: Option<f64>,
    ) -> Self {
        let slack = (window_width * slack_ratio).round();
        let unclamped_right = window_left + window_width;

        let viewport_left = (window_left - slack).max(0.0);
        let window_right = unclamped_right.min(body_width);
        let viewport_right = (unclamped_right + slack).min(body_width);

        Self {
            window_left: window_left + fixed_element_width.unwrap_or(0.0),
            window_right,
            viewport_left,
            viewport_right,
            slack,
        }
    }

    /// Read the window geometry from a provider.
    pub fn measure<G: GeometryProvider + ?Sized>(
        geometry: &G,
        slack_ratio: f64,
        fixed_element: Option<&str>,
    ) -> Self {
        let fixed = fixed_element.and_then(|selector| geometry.fixed_element_width(selector));
        Self::from_window(
            geometry.scroll_offset(),
            geometry.viewport_width(),
            geometry.body_width(),
            slack_ratio,
            fixed,
        )
    }

    /// Whether a span starts inside the slacked band.
    pub fn within_slack(&self, span: ItemSpan) -> bool {
        span.left < self.viewport_right
    }

    /// Whether a span overlaps the unslacked window.
    pub fn is_onscreen(&self, span: ItemSpan) -> bool {
        span.right > self.window_left && span.left < self.window_right
    }
}

/// Result of one scan & classify pass over a non-empty sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Sequence length at classification time.
    pub len: usize,
    /// First item whose right edge passes the slacked left bound.
    pub left_boundary: usize,
    /// Last index considered by the scan (clamped to `len - 1`).
    pub scan_end: usize,
    /// Items that must be uncloaked.
    pub uncloak: Range<usize>,
    /// Items overlapping the unslacked window.
    pub onscreen: Range<usize>,
}

impl Classification {
    /// Items that must be cloaked: everything outside `[left_boundary, scan_end]`.
    pub fn cloak_indices(&self) -> impl Iterator<Item = usize> {
        let tail_start = (self.scan_end + 1).max(self.left_boundary);
        (0..self.left_boundary).chain(tail_start..self.len)
    }

    /// Whether nothing is on screen.
    pub fn nothing_onscreen(&self) -> bool {
        self.onscreen.is_empty()
    }
}

/// Classify `len` items against `viewport`.
///
/// Returns `None` for an empty sequence. `span` is called lazily and only for
/// the items touched by the binary search and the forward scan.
pub fn classify<F>(len: usize, viewport: &Viewport, span: F) -> Option<Classification>
where
    F: Fn(usize) -> ItemSpan,
{
    if len == 0 {
        return None;
    }

    let left_boundary = find_left_boundary(len, viewport.viewport_left, |i| span(i).right);

    let mut cursor = left_boundary;
    let mut onscreen: Option<Range<usize>> = None;

    while cursor < len {
        let item = span(cursor);
        if !viewport.within_slack(item) {
            break;
        }

        if viewport.is_onscreen(item) {
            match onscreen.as_mut() {
                Some(range) => range.end = cursor + 1,
                None => onscreen = Some(cursor..cursor + 1),
            }
        }

        cursor += 1;
    }

    Some(Classification {
        len,
        left_boundary,
        scan_end: cursor.min(len - 1),
        uncloak: left_boundary..cursor,
        onscreen: onscreen.unwrap_or(left_boundary..left_boundary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contiguous layout of the given widths.
    fn spans(widths: &[f64]) -> Vec<ItemSpan> {
        let mut left = 0.0;
        widths
            .iter()
            .map(|&w| {
                let span = ItemSpan::new(left, w);
                left += w;
                span
            })
            .collect()
    }

    fn run(widths: &[f64], viewport: Viewport) -> Option<Classification> {
        let spans = spans(widths);
        classify(spans.len(), &viewport, |i| spans[i])
    }

    #[test]
    fn viewport_bands_with_default_slack() {
        let vp = Viewport::from_window(0.0, 250.0, 1000.0, 1.0, None);
        assert_eq!(vp.slack, 250.0);
        assert_eq!(vp.viewport_left, 0.0);
        assert_eq!(vp.window_left, 0.0);
        assert_eq!(vp.window_right, 250.0);
        assert_eq!(vp.viewport_right, 500.0);
    }

    #[test]
    fn viewport_bands_clamp_to_body_width() {
        let vp = Viewport::from_window(900.0, 250.0, 1000.0, 1.0, None);
        assert_eq!(vp.viewport_left, 650.0);
        assert_eq!(vp.window_right, 1000.0);
        assert_eq!(vp.viewport_right, 1000.0);
    }

    #[test]
    fn slack_is_rounded() {
        let vp = Viewport::from_window(1000.0, 333.0, 5000.0, 0.5, None);
        assert_eq!(vp.slack, 167.0);
        assert_eq!(vp.viewport_left, 833.0);
    }

    #[test]
    fn fixed_element_shifts_window_left_only() {
        let vp = Viewport::from_window(500.0, 200.0, 5000.0, 1.0, Some(40.0));
        assert_eq!(vp.window_left, 540.0);
        assert_eq!(vp.viewport_left, 300.0);
        assert_eq!(vp.window_right, 700.0);
        assert_eq!(vp.viewport_right, 900.0);
    }

    #[test]
    fn empty_sequence_is_not_classified() {
        let vp = Viewport::from_window(0.0, 250.0, 250.0, 1.0, None);
        assert_eq!(run(&[], vp), None);
    }

    #[test]
    fn ten_items_at_origin() {
        let vp = Viewport::from_window(0.0, 250.0, 1000.0, 1.0, None);
        let c = run(&[100.0; 10], vp).unwrap();

        assert_eq!(c.left_boundary, 0);
        assert_eq!(c.onscreen, 0..3);
        assert_eq!(c.uncloak, 0..5);
        assert_eq!(c.scan_end, 5);
        assert_eq!(c.cloak_indices().collect::<Vec<_>>(), vec![6, 7, 8, 9]);
    }

    #[test]
    fn scrolled_into_the_middle() {
        let vp = Viewport::from_window(400.0, 250.0, 1000.0, 1.0, None);
        let c = run(&[100.0; 10], vp).unwrap();

        // band [150, 900), window [400, 650)
        assert_eq!(c.left_boundary, 1);
        assert_eq!(c.onscreen, 4..7);
        assert_eq!(c.uncloak, 1..9);
        assert_eq!(c.scan_end, 9);
        assert_eq!(c.cloak_indices().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn scan_reaching_the_end_clamps_scan_end() {
        let vp = Viewport::from_window(800.0, 250.0, 1000.0, 1.0, None);
        let c = run(&[100.0; 10], vp).unwrap();

        assert_eq!(c.left_boundary, 5);
        assert_eq!(c.uncloak, 5..10);
        assert_eq!(c.scan_end, 9);
        assert_eq!(c.onscreen, 8..10);
        assert_eq!(
            c.cloak_indices().collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn scrolled_past_everything_cloaks_all() {
        // Body is wider than the items, e.g. trailing padding.
        let vp = Viewport::from_window(3000.0, 250.0, 5000.0, 1.0, None);
        let c = run(&[100.0; 4], vp).unwrap();

        assert_eq!(c.left_boundary, 4);
        assert!(c.uncloak.is_empty());
        assert!(c.nothing_onscreen());
        assert_eq!(c.cloak_indices().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn fixed_element_removes_occluded_items_from_onscreen() {
        let widths = [100.0; 10];
        let plain = run(&widths, Viewport::from_window(0.0, 250.0, 1000.0, 1.0, None)).unwrap();
        let shifted =
            run(&widths, Viewport::from_window(0.0, 250.0, 1000.0, 1.0, Some(120.0))).unwrap();

        assert_eq!(plain.onscreen, 0..3);
        assert_eq!(shifted.onscreen, 1..3);
        assert_eq!(plain.uncloak, shifted.uncloak);
    }

    #[test]
    fn uneven_widths() {
        // spans: [0,30) [30,530) [530,560) [560,1060)
        let vp = Viewport::from_window(540.0, 100.0, 1060.0, 0.0, None);
        let c = run(&[30.0, 500.0, 30.0, 500.0], vp).unwrap();

        assert_eq!(c.left_boundary, 2);
        assert_eq!(c.onscreen, 2..4);
        assert_eq!(c.uncloak, 2..4);
    }

    #[test]
    fn span_measure_applies_scroll_correction() {
        struct Fixed;
        impl GeometryProvider for Fixed {
            fn left_offset(&self, _key: ItemKey) -> f64 {
                10.0
            }
            fn width(&self, _key: ItemKey) -> f64 {
                20.0
            }
            fn scroll_offset(&self) -> f64 {
                0.0
            }
            fn viewport_width(&self) -> f64 {
                100.0
            }
            fn body_width(&self) -> f64 {
                100.0
            }
            fn scroll_correction(&self) -> f64 {
                5.0
            }
        }

        let span = ItemSpan::measure(&Fixed, ItemKey::new(0));
        assert_eq!(span, ItemSpan::new(15.0, 20.0));
    }
}
