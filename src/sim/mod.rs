//! Simulation host and scenario runner.
//!
//! `StripLayout` stands in for a document so the engine can run headless:
//! from the CLI, in tests and in benchmarks.

pub mod layout;
pub mod scenario;
pub mod width_index;

pub use layout::{HostOp, MountHandle, MountRecord, SimController, StripLayout};
pub use scenario::{
    load_scenario, parse_scenario, run_scenario, Action, PassRecord, Scenario, ScenarioOutcome,
    TimedEvent,
};
pub use width_index::WidthIndex;
