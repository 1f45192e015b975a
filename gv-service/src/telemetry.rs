//! Service Metrics
//!
//! Recorded through the `metrics` facade. The host installs a recorder (for
//! example a Prometheus exporter); without one every call is a no-op.
//!
//! # Metrics
//!
//! ## Counters
//! - `gv_messages_total` - Delivered messages by operation, outcome, code
//! - `gv_proposals_closed_total` - Proposals closed by result
//! - `gv_proposal_executions_total` - Proposal executions by outcome
//!
//! ## Histograms
//! - `gv_message_duration_seconds` - Delivery duration by operation

use gv_core::{ExecutorResult, GovError, ProposalResult};
use metrics::{counter, histogram};

pub const MESSAGES_TOTAL: &str = "gv_messages_total";
pub const MESSAGE_DURATION: &str = "gv_message_duration_seconds";
pub const PROPOSALS_CLOSED_TOTAL: &str = "gv_proposals_closed_total";
pub const EXECUTIONS_TOTAL: &str = "gv_proposal_executions_total";

/// `outcome` and `code` labels for a delivery result
///
/// Rejections that still persist a state change count as `persisted`.
pub fn outcome_labels(err: Option<&GovError>) -> (&'static str, &'static str) {
    match err {
        None => ("applied", "OK"),
        Some(e) if e.commits_state() => ("persisted", e.code()),
        Some(e) => ("rejected", e.code()),
    }
}

/// Record one delivered message
pub fn record_message(operation: &'static str, err: Option<&GovError>, duration_secs: f64) {
    let (outcome, code) = outcome_labels(err);
    counter!(
        MESSAGES_TOTAL,
        "operation" => operation,
        "outcome" => outcome,
        "code" => code
    )
    .increment(1);
    histogram!(MESSAGE_DURATION, "operation" => operation).record(duration_secs);
}

/// Record a proposal leaving SUBMITTED with a final result
pub fn record_proposal_closed(result: ProposalResult) {
    counter!(PROPOSALS_CLOSED_TOTAL, "result" => result.as_str()).increment(1);
}

/// Record the outcome of running a proposal's messages
pub fn record_execution(outcome: ExecutorResult) {
    counter!(EXECUTIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}
