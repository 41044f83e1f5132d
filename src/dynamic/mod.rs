//! Body template engine (spec §4.F): closed context plus single-pass
//! `{{ }}` substitution, applied to a matched scenario's response body
//! before it's written to the wire.

pub mod context;
pub mod template;

pub use context::{RequestContext, ServerContext, TemplateContext};
pub use template::render;
