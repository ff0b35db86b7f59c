//! HTTP API handlers — measurement endpoints plus the auxiliary
//! geolocation, scoring, region, card and share endpoints.

pub mod health;
pub mod network;
pub mod share;
pub mod speedtest;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::HOST;
use axum::http::HeaderMap;

use speedtest_core::config::GeoConfig;
use speedtest_core::{DownloadLimits, ServerClock, SpeedtestConfig, UploadSink};
use speedtest_services::{
    CardRenderer, DisabledGeoLookup, GeoLookup, IpApiLookup, MemoryShareStore, ShareStore,
    SqliteShareStore, SvgCardRenderer,
};

#[derive(Clone)]
pub struct ApiState {
    pub clock: ServerClock,
    pub download_limits: DownloadLimits,
    pub upload_sink: UploadSink,
    pub geo: Arc<dyn GeoLookup>,
    pub share_store: Arc<dyn ShareStore>,
    pub card_renderer: Arc<dyn CardRenderer>,
    /// How long a shared report stays readable.
    pub share_retention: Duration,
}

impl ApiState {
    /// Wire every collaborator from config: SQLite share store unless the
    /// storage path is empty, ip-api lookups unless geolocation is disabled.
    pub fn from_config(config: &SpeedtestConfig) -> anyhow::Result<Self> {
        let share_store: Arc<dyn ShareStore> = if config.share.storage_path.as_os_str().is_empty() {
            tracing::info!("shared reports kept in memory");
            Arc::new(MemoryShareStore::new())
        } else {
            let path = &config.share.storage_path;
            tracing::info!(path = %path.display(), "shared reports stored in SQLite");
            Arc::new(SqliteShareStore::open(path)?)
        };

        Ok(Self::with_collaborators(
            config,
            geo_lookup(&config.geo)?,
            share_store,
        ))
    }

    /// Same limits as `from_config`, caller-supplied geolocation and storage.
    pub fn with_collaborators(
        config: &SpeedtestConfig,
        geo: Arc<dyn GeoLookup>,
        share_store: Arc<dyn ShareStore>,
    ) -> Self {
        Self {
            clock: ServerClock::new(),
            download_limits: config.download_limits(),
            upload_sink: UploadSink::new(config.upload_limits()),
            geo,
            share_store,
            card_renderer: Arc::new(SvgCardRenderer),
            share_retention: Duration::from_secs(
                u64::from(config.share.retention_days) * 24 * 60 * 60,
            ),
        }
    }
}

fn geo_lookup(config: &GeoConfig) -> anyhow::Result<Arc<dyn GeoLookup>> {
    if !config.enabled {
        tracing::info!("geolocation lookups disabled");
        return Ok(Arc::new(DisabledGeoLookup));
    }
    let lookup = IpApiLookup::new(&config.endpoint, Duration::from_secs(config.timeout_secs))?;
    Ok(Arc::new(lookup))
}

// ── Shared helpers ────────────────────────────────────────────────────────────

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client address as seen through common proxy headers, falling back to the
/// socket peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(ip) = header_str(headers, "cf-connecting-ip") {
        return ip.to_string();
    }
    if let Some(first) = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(ip) = header_str(headers, "x-real-ip") {
        return ip.to_string();
    }
    peer.ip().to_string()
}

fn ip_type(ip: &str) -> &'static str {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => "IPv6",
        Ok(IpAddr::V4(_)) => "IPv4",
        Err(_) if ip.contains(':') => "IPv6",
        Err(_) => "IPv4",
    }
}

/// `scheme://host` the client used to reach us.
fn base_url(headers: &HeaderMap) -> String {
    let scheme = header_str(headers, "x-forwarded-proto").unwrap_or("http");
    let host = header_str(headers, "x-forwarded-host")
        .or_else(|| header_str(headers, HOST.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

// Re-export handler functions for use in router setup.
pub use health::{handle_health, handle_root};
pub use network::{
    handle_generate_share_card, handle_ip_info, handle_network_quality, handle_server_region,
    handle_server_regions,
};
pub use share::{handle_share_create, handle_share_get};
pub use speedtest::{handle_download, handle_ping, handle_upload};
