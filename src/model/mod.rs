//! Domain model types (pure).
//!
//! Items, their identities and lifecycle states, plus the crate's error taxonomy.

pub mod error;
pub mod item;
pub mod types;

// Re-export for convenience
pub use error::{AppError, Diagnostic, ScenarioError};
pub use item::{CloakContent, Item};
pub use types::{ItemKey, KeyAllocator, LifecycleState};
