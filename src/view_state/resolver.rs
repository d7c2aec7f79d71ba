//! Visibility window resolver - binary search for the left boundary item.
//!
//! Items are assumed to be laid out left to right with non-decreasing left
//! offsets. Under that assumption the predicate "right edge > viewport_left"
//! is monotonic over the sequence and can be bisected.
//!
//! # Complexity
//!
//! O(log n) right-edge evaluations, each of which is a geometry query.
//!
//! # Precondition
//!
//! Out-of-order offsets produce an arbitrary boundary. This is a caller error
//! and is neither detected nor reported.

use std::ops::Range;

/// Find the first index whose right edge exceeds `viewport_left`.
///
/// Returns `len` when no item qualifies.
///
/// # Examples
///
/// ```
/// # use cloakline::view_state::resolver::find_left_boundary;
/// // Three items of width 100 at 0, 100, 200.
/// let right_edge = |i: usize| (i as f64 + 1.0) * 100.0;
/// assert_eq!(find_left_boundary(3, 0.0, right_edge), 0);
/// assert_eq!(find_left_boundary(3, 100.0, right_edge), 1);
/// assert_eq!(find_left_boundary(3, 150.0, right_edge), 1);
/// assert_eq!(find_left_boundary(3, 300.0, right_edge), 3);
/// ```
pub fn find_left_boundary<F>(len: usize, viewport_left: f64, right_edge: F) -> usize
where
    F: Fn(usize) -> f64,
{
    find_left_boundary_in(0..len, viewport_left, right_edge)
}

/// Bounded variant of [`find_left_boundary`], searching only `range`.
///
/// An empty range returns `range.start`, the candidate insertion point.
pub fn find_left_boundary_in<F>(range: Range<usize>, viewport_left: f64, right_edge: F) -> usize
where
    F: Fn(usize) -> f64,
{
    let mut low = range.start;
    let mut high = range.end;

    while low < high {
        let mid = low + (high - low) / 2;

        if right_edge(mid) > viewport_left {
            // mid or something earlier is the boundary
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    low
}
