//! Scenario-file configuration (spec §6): schema types and the loading
//! pipeline. Validation of individual scenarios (empty path/method/responses
//! rejected at the control-API boundary, spec §4.A) lives on
//! [`schema::ScenarioDef::into_scenario`] — both the file loader and
//! `POST /scenario` go through the same conversion, so there is exactly one
//! place that can reject a malformed scenario.

pub mod loader;
pub mod schema;

pub use loader::load_scenarios;
pub use schema::{ResponseDef, ScenarioDef, ScenarioFile, ServerSettings};
