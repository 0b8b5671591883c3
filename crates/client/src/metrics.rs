//! Metrics for the session lifecycle.
//!
//! Counters are recorded through the `metrics` facade, so recording is a
//! no-op until the embedding application installs a recorder/exporter.
//!
//! # Invariants
//! - Label names are `outcome` and `attempt`; values are static strings.
//! - Recording never fails and never blocks an auth flow.

/// Metric name for login attempts, labeled by `outcome`.
pub const METRIC_LOGINS_TOTAL: &str = "blog_session_logins_total";

/// Metric name for refresh calls made to the provider, labeled by `outcome`.
pub const METRIC_REFRESHES_TOTAL: &str = "blog_session_refreshes_total";

/// Metric name for transitions into the expired state.
pub const METRIC_EXPIRED_TOTAL: &str = "blog_session_expired_total";

/// Metric name for HTTP attempts made on authorized calls, labeled by `attempt`.
pub const METRIC_AUTHORIZED_REQUESTS_TOTAL: &str = "blog_session_authorized_requests_total";

/// Outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Rejected,
    Unavailable,
}

impl Outcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Rejected => "rejected",
            Outcome::Unavailable => "unavailable",
        }
    }
}

pub(crate) fn record_login(outcome: Outcome) {
    metrics::counter!(METRIC_LOGINS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

pub(crate) fn record_refresh(outcome: Outcome) {
    metrics::counter!(METRIC_REFRESHES_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

pub(crate) fn record_expired() {
    metrics::counter!(METRIC_EXPIRED_TOTAL).increment(1);
}

pub(crate) fn record_attempt(retry: bool) {
    let attempt = if retry { "retry" } else { "first" };
    metrics::counter!(METRIC_AUTHORIZED_REQUESTS_TOTAL, "attempt" => attempt).increment(1);
}
