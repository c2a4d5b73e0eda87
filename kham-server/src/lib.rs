//! # Kham Server Library
//!
//! Accounts, bearer-token auth, progress documents and leaderboards for the
//! Kham vocabulary game. Used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use kham_core::Lexicon;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod store;

pub use auth::{AuthUser, TokenIssuer};
pub use config::Config;
pub use error::ApiError;
pub use store::{DocumentStore, StoreError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Accounts, progress and leaderboards.
    pub store: DocumentStore,
    /// Bearer token issuer.
    pub tokens: TokenIssuer,
    /// Level table used to normalize progress writes.
    pub lexicon: Arc<Lexicon>,
    /// Prometheus handle; `/metrics` answers 404 without one.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state over a store and lexicon.
    #[must_use]
    pub fn new(store: DocumentStore, lexicon: Arc<Lexicon>, token_ttl: chrono::Duration) -> Self {
        Self {
            store,
            tokens: TokenIssuer::new(token_ttl),
            lexicon,
            metrics: None,
        }
    }

    /// In-memory store, built-in lexicon, default token lifetime.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            DocumentStore::new(),
            Arc::new(Lexicon::thai()),
            chrono::Duration::days(i64::from(config::DEFAULT_TOKEN_TTL_DAYS)),
        )
    }

    /// Attach the Prometheus handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Build a CORS layer for the given origins. Unparseable origins are skipped.
#[must_use]
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            o.parse()
                .inspect_err(|_| tracing::warn!(origin = %o, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// Build the full router.
pub fn app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(routes::service_info))
        .route("/metrics", get(routes::metrics_handler))
        // Health check endpoints
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/api/auth/register", post(routes::register))
        .route("/api/auth/login", post(routes::login))
        .route(
            "/api/user/profile",
            get(routes::get_profile).put(routes::update_profile),
        )
        .route(
            "/api/progress",
            get(routes::get_progress).put(routes::put_progress),
        )
        .route("/api/leaderboard", post(routes::submit_leaderboard))
        .route("/api/leaderboard/{period}", get(routes::get_leaderboard))
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(allowed_origins))
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
