//! Response selector (spec §4.D): rotates the cursor, applies the
//! probability gate, and reports the breaker outcome to record.

use crate::scenarios::model::{Response, Scenario};

/// Outcome of running a scenario through the selector.
pub enum Selection<'a> {
    /// Serve this response.
    Serve(&'a Response),
    /// Probability gate missed: fall through to the echo handler. Counts
    /// as a breaker success per spec §4.D / §9's Open Questions.
    FallThrough,
}

/// Selects a response for a matched scenario, advancing its cursor exactly
/// once (spec §4.D steps 1-3).
#[must_use]
pub fn select(scenario: &Scenario) -> Selection<'_> {
    let (_idx, response) = scenario.next_response();
    if response.probability_admits() {
        Selection::Serve(response)
    } else {
        Selection::FallThrough
    }
}
