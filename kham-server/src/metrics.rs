//! Prometheus metrics for kham-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const REGISTRATIONS_TOTAL: &str = "kham_registrations_total";
const USERS_REGISTERED: &str = "kham_users_registered";
const LOGINS_TOTAL: &str = "kham_logins_total";
const PROGRESS_SAVES_TOTAL: &str = "kham_progress_saves_total";
const LEADERBOARD_UPDATES_TOTAL: &str = "kham_leaderboard_updates_total";
const AUTH_FAILURES_TOTAL: &str = "kham_auth_failures_total";
const VALIDATION_FAILURES_TOTAL: &str = "kham_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a new account and the resulting account count.
#[allow(clippy::cast_precision_loss)]
pub fn record_registration(total_users: usize) {
    counter!(REGISTRATIONS_TOTAL).increment(1);
    gauge!(USERS_REGISTERED).set(total_users as f64);
}

/// Record a login attempt.
///
/// # Arguments
///
/// * `outcome` - "success", "bad_credentials" or "invalid"
pub fn record_login(outcome: &'static str) {
    counter!(LOGINS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a progress document write.
pub fn record_progress_save() {
    counter!(PROGRESS_SAVES_TOTAL).increment(1);
}

/// Record a leaderboard upsert.
pub fn record_leaderboard_update(period: &'static str) {
    counter!(LEADERBOARD_UPDATES_TOTAL, "period" => period).increment(1);
}

/// Record a rejected credential.
///
/// # Arguments
///
/// * `reason` - "missing_token" or "invalid_token"
pub fn record_auth_failure(reason: &'static str) {
    counter!(AUTH_FAILURES_TOTAL, "reason" => reason).increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `field` - Field that failed (username, password, character, period, ...)
pub fn record_validation_failure(field: &'static str) {
    counter!(VALIDATION_FAILURES_TOTAL, "field" => field).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_registration(1);
        record_login("success");
        record_progress_save();
        record_leaderboard_update("daily");
        record_auth_failure("missing_token");
        record_validation_failure("username");
    }
}
