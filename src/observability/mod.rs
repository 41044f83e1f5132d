//! Structured logging and Prometheus metrics (spec §6, `SPEC_FULL.md` §1).

pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
