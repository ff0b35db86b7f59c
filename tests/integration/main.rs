//! speedtest integration test harness.
//!
//! Each test boots the full router on 127.0.0.1:0 inside its own runtime
//! and talks to it over real TCP with reqwest:
//!
//!   cargo test --test integration
//!
//! Shared reports go to an in-memory store the test can inspect directly.
//! Geolocation is disabled unless a test supplies its own lookup.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use speedtest_api::ApiState;
use speedtest_core::SpeedtestConfig;
use speedtest_services::{DisabledGeoLookup, GeoLookup, MemoryShareStore};

mod download;
mod health;
mod network;
mod ping;
mod share;
mod upload;

// ── Harness ───────────────────────────────────────────────────────────────────

pub struct TestServer {
    pub addr: SocketAddr,
    pub store: MemoryShareStore,
    pub client: reqwest::Client,
    prefix: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl TestServer {
    /// Origin without prefix, e.g. `http://127.0.0.1:41234`.
    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for a path outside the API prefix.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base(), path)
    }

    /// Absolute URL for a path under the API prefix.
    pub fn api(&self, path: &str) -> String {
        format!("{}{}{}", self.base(), self.prefix, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(SpeedtestConfig::default(), Arc::new(DisabledGeoLookup)).await
}

pub async fn spawn_with_config(config: SpeedtestConfig) -> Result<TestServer> {
    spawn_with(config, Arc::new(DisabledGeoLookup)).await
}

pub async fn spawn_with(config: SpeedtestConfig, geo: Arc<dyn GeoLookup>) -> Result<TestServer> {
    let store = MemoryShareStore::new();
    let state = ApiState::with_collaborators(&config, geo, Arc::new(store.clone()));
    let app = speedtest_api::router(state, &config.server)?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(speedtest_api::serve_listener(
        listener,
        app,
        config.server.tcp_user_timeout_secs,
        async move {
            let _ = rx.await;
        },
    ));

    Ok(TestServer {
        addr,
        store,
        client: reqwest::Client::new(),
        prefix: config.server.api_prefix.trim_end_matches('/').to_string(),
        shutdown: Some(tx),
        task,
    })
}
