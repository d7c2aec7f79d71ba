//! Engine state machine.
//!
//! Side effects are decided synchronously and applied through a render queue,
//! so every transition is testable against the in-memory host.

pub mod coalescer;
pub mod lifecycle;
pub mod render_queue;
pub mod strip;

// Re-export for convenience
pub use coalescer::ScrollCoalescer;
pub use render_queue::{RenderQueue, Task};
pub use strip::CloakedStrip;
