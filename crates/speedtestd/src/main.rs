//! speedtestd — network speed test server.

use std::time::Duration;

use anyhow::Result;

use speedtest_api::ApiState;
use speedtest_core::SpeedtestConfig;

mod purge;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = SpeedtestConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = SpeedtestConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        SpeedtestConfig::default()
    });
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        prefix = %config.server.api_prefix,
        "speedtestd starting"
    );

    let state = ApiState::from_config(&config)?;
    tracing::info!(
        download_max = state.download_limits.max_bytes,
        upload_max = state.upload_sink.limits().max_bytes,
        early_abort = state.upload_sink.limits().early_abort,
        "measurement limits"
    );

    // ── Shutdown signal ──────────────────────────────────────────────────────

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Share purge ──────────────────────────────────────────────────────────

    let purge_task = {
        let every = config.share.purge_interval_secs;
        let store = state.share_store.clone();
        let clock = state.clock;
        tokio::spawn(async move {
            if every == 0 {
                std::future::pending::<()>().await;
            }
            purge::purge_loop(store, clock, Duration::from_secs(every)).await;
        })
    };

    // ── HTTP API ─────────────────────────────────────────────────────────────

    let api_task = {
        let mut shutdown_rx = shutdown_tx.subscribe();
        let server = config.server.clone();
        tokio::spawn(async move {
            let graceful = async move {
                let _ = shutdown_rx.recv().await;
            };
            speedtest_api::serve(state, &server, graceful).await
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    tokio::select! {
        r = api_task => match r {
            Ok(Ok(())) => tracing::info!("shut down"),
            Ok(Err(e)) => {
                tracing::error!(error = format!("{e:#}"), "API server failed");
                return Err(e);
            }
            Err(e) => tracing::error!("API task exited: {:?}", e),
        },
        r = purge_task => tracing::error!("purge task exited: {:?}", r),
    }

    Ok(())
}
