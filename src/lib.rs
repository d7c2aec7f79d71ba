//! cloakline - viewport-driven cloaking for horizontal strips
//!
//! Only items near the visible viewport are materialized ("uncloaked");
//! off-screen items are reduced to fixed-width placeholders ("cloaked").
//!
//! The engine ([`state::CloakedStrip`]) is host-agnostic: geometry, events
//! and mounting go through the traits in [`host`]. [`sim::StripLayout`] is an
//! in-memory host used by the `cloakline` binary to replay scenarios.

pub mod config;
pub mod host;
pub mod logging;
pub mod model;
pub mod sim;
pub mod state;
pub mod view_state;

pub use config::CloakConfig;
pub use host::{EventSource, GeometryProvider, Host};
pub use state::CloakedStrip;
pub use view_state::{VisibilityObserver, VisibilityReport};
