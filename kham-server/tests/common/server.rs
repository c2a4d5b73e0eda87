//! Test server harness for integration tests.
//!
//! Spins up the real router on a random port so tests can talk to it over
//! HTTP with `reqwest` or through `HttpGateway`.

use std::net::SocketAddr;
use std::path::Path;

use kham_server::{AppState, DocumentStore};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with an in-memory store.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start() -> Self {
        Self::start_with_state(AppState::in_memory()).await
    }

    /// Start a server persisting under `dir`.
    #[allow(dead_code)]
    pub async fn start_with_data_dir(dir: &Path) -> Self {
        let mut state = AppState::in_memory();
        state.store = DocumentStore::with_data_dir(dir).expect("store");
        Self::start_with_state(state).await
    }

    /// Start a server over prepared state.
    pub async fn start_with_state(state: AppState) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let app = kham_server::app(state.clone(), &["http://localhost:5500".to_string()]);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:1234/`.
    #[allow(dead_code)]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Absolute URL for a path starting with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Server state, for assertions against the store.
    #[allow(dead_code)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Register an account and return its bearer token.
    #[allow(dead_code)]
    pub async fn register(&self, client: &reqwest::Client, username: &str) -> String {
        let response = client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "password": "secret",
                "characterId": 2,
            }))
            .send()
            .await
            .expect("register request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.expect("register body");
        body["token"].as_str().expect("token").to_string()
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
