//! Scenario data model, registry, and response selection (spec §3, §4.A, §4.D).

pub mod model;
pub mod registry;
pub mod selector;

pub use model::{MatchSpec, Response, Scenario};
pub use registry::ScenarioRegistry;
