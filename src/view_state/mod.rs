//! View-state layer - pure visibility computation
//!
//! This module answers "what should be rendered" without touching the host.
//!
//! # Module Structure
//!
//! - `resolver`: binary search for the leftmost item inside the slacked band
//! - `classify`: `Viewport` bands and the scan & classify pass
//! - `visibility`: `VisibilityReport`, observer hooks and boundary tracking

pub mod classify;
pub mod resolver;
pub mod visibility;

pub use classify::{classify, Classification, ItemSpan, Viewport};
pub use resolver::{find_left_boundary, find_left_boundary_in};
pub use visibility::{
    BoundaryChanges, VisibilityObserver, VisibilityReport, VisibilityTracker,
};
