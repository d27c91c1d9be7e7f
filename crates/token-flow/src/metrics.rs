//! Flow metrics
//!
//! - `token_flow_invocations_total` (counter): label `outcome`
//! - `token_flow_duration_seconds` (histogram): label `outcome`
//! - `token_flow_claims_challenges_total` (counter)
//!
//! All calls are no-ops until a recorder is installed.

use std::time::Duration;

use crate::state::Outcome;

pub const INVOCATIONS_TOTAL: &str = "token_flow_invocations_total";
pub const DURATION_SECONDS: &str = "token_flow_duration_seconds";
pub const CLAIMS_CHALLENGES_TOTAL: &str = "token_flow_claims_challenges_total";

/// Record a finished invocation.
pub fn record_outcome(outcome: Outcome, elapsed: Duration) {
    metrics::counter!(INVOCATIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!(DURATION_SECONDS, "outcome" => outcome.as_str())
        .record(elapsed.as_secs_f64());
}

/// Record a step-up request triggered by a claims challenge.
pub fn record_claims_challenge() {
    metrics::counter!(CLAIMS_CHALLENGES_TOTAL).increment(1);
}
