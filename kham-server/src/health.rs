//! Health check endpoints for container probes.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe (remove from LB if fails)
//! - `/health` - Same as readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Document store answers reads
    pub store: bool,
    /// Lexicon has at least one playable level
    pub lexicon: bool,
    /// Registered accounts
    pub users: usize,
}

/// Liveness probe.
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: the store is readable and the lexicon is usable.
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let store_ok = state.store.is_available();
    let users = state.store.user_count();
    let lexicon_ok = state.lexicon.level_count() > 0;
    let all_ok = store_ok && lexicon_ok;

    let status = HealthStatus {
        status: if all_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            store: store_ok,
            lexicon: lexicon_ok,
            users,
        },
    };

    let code = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy",
            version: "0.1.0",
            checks: HealthChecks {
                store: true,
                lexicon: true,
                users: 3,
            },
        };

        let json = serde_json::to_value(&status).expect("should serialize");
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"]["lexicon"], true);
        assert_eq!(json["checks"]["users"], 3);
    }

    #[tokio::test]
    async fn test_readiness_reports_healthy() {
        let (code, Json(status)) = readiness(State(AppState::in_memory())).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(status.status, "healthy");
        assert_eq!(status.checks.users, 0);
    }

    #[tokio::test]
    async fn test_readiness_reports_missing_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut state = AppState::in_memory();
        state.store = crate::DocumentStore::with_data_dir(dir.path()).expect("store");
        std::fs::remove_dir_all(dir.path().join("users")).expect("remove");

        let (code, Json(status)) = readiness(State(state)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status.status, "unhealthy");
        assert!(!status.checks.store);
    }
}
