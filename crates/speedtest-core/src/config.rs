//! Configuration system for the speedtest server.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SPEEDTEST_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/speedtest/config.toml
//!   3. ~/.config/speedtest/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::download::{
    DownloadLimits, DEFAULT_DOWNLOAD_BYTES, MAX_DOWNLOAD_BYTES, MIN_DOWNLOAD_BYTES,
};
use crate::upload::{UploadLimits, MAX_UPLOAD_BYTES};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedtestConfig {
    pub server: ServerConfig,
    pub speedtest: MeasurementConfig,
    pub share: ShareConfig,
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix every measurement and auxiliary route is nested under.
    pub api_prefix: String,
    /// Allowed CORS origins. A single "*" allows any origin.
    pub cors_origins: Vec<String>,
    /// TCP_USER_TIMEOUT applied to accepted sockets (Linux). 0 = kernel default.
    pub tcp_user_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    pub download_default_bytes: u64,
    pub download_min_bytes: u64,
    pub download_max_bytes: u64,
    pub upload_max_bytes: u64,
    /// Max wait for the next body chunk before an upload is abandoned. 0 = no limit.
    pub upload_idle_timeout_secs: u64,
    /// Stop reading as soon as an upload crosses `upload_max_bytes`.
    pub upload_early_abort: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// SQLite database for shared reports. Empty = in-memory store.
    pub storage_path: PathBuf,
    pub retention_days: u32,
    /// Background sweep of expired reports. 0 = only purge on read.
    pub purge_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_prefix: "/api/v1".to_string(),
            cors_origins: vec!["*".to_string()],
            tcp_user_timeout_secs: 30,
        }
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            download_default_bytes: DEFAULT_DOWNLOAD_BYTES,
            download_min_bytes: MIN_DOWNLOAD_BYTES,
            download_max_bytes: MAX_DOWNLOAD_BYTES,
            upload_max_bytes: MAX_UPLOAD_BYTES,
            upload_idle_timeout_secs: 30,
            upload_early_abort: false,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            storage_path: data_dir().join("shared_reports.db"),
            retention_days: 7,
            purge_interval_secs: 3600,
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://ip-api.com/json".to_string(),
            timeout_secs: 10,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("speedtest")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("speedtest")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SpeedtestConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            SpeedtestConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SPEEDTEST_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&SpeedtestConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply `SPEEDTEST_<SECTION>__<FIELD>` overrides resolved through
    /// `lookup`. Values that fail to parse leave the field unchanged.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).map(|v| v == "true" || v == "1");

        if let Some(v) = lookup("SPEEDTEST_SERVER__HOST") {
            self.server.host = v;
        }
        if let Some(p) = parsed(&lookup, "SPEEDTEST_SERVER__PORT") {
            self.server.port = p;
        }
        if let Some(v) = lookup("SPEEDTEST_SERVER__API_PREFIX") {
            self.server.api_prefix = v;
        }
        if let Some(v) = lookup("SPEEDTEST_SERVER__CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SERVER__TCP_USER_TIMEOUT_SECS") {
            self.server.tcp_user_timeout_secs = n;
        }

        let m = &mut self.speedtest;
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SPEEDTEST__DOWNLOAD_DEFAULT_BYTES") {
            m.download_default_bytes = n;
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SPEEDTEST__DOWNLOAD_MIN_BYTES") {
            m.download_min_bytes = n;
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SPEEDTEST__DOWNLOAD_MAX_BYTES") {
            m.download_max_bytes = n;
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SPEEDTEST__UPLOAD_MAX_BYTES") {
            m.upload_max_bytes = n;
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SPEEDTEST__UPLOAD_IDLE_TIMEOUT_SECS") {
            m.upload_idle_timeout_secs = n;
        }
        if let Some(b) = flag("SPEEDTEST_SPEEDTEST__UPLOAD_EARLY_ABORT") {
            m.upload_early_abort = b;
        }

        if let Some(v) = lookup("SPEEDTEST_SHARE__STORAGE_PATH") {
            self.share.storage_path = PathBuf::from(v);
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SHARE__RETENTION_DAYS") {
            self.share.retention_days = n;
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_SHARE__PURGE_INTERVAL_SECS") {
            self.share.purge_interval_secs = n;
        }

        if let Some(b) = flag("SPEEDTEST_GEO__ENABLED") {
            self.geo.enabled = b;
        }
        if let Some(v) = lookup("SPEEDTEST_GEO__ENDPOINT") {
            self.geo.endpoint = v;
        }
        if let Some(n) = parsed(&lookup, "SPEEDTEST_GEO__TIMEOUT_SECS") {
            self.geo.timeout_secs = n;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.speedtest;
        if m.download_min_bytes == 0 || m.download_min_bytes > m.download_max_bytes {
            return Err(ConfigError::Invalid(format!(
                "download range [{}, {}] is empty",
                m.download_min_bytes, m.download_max_bytes
            )));
        }
        if !self.server.api_prefix.is_empty() && !self.server.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "api_prefix {:?} must start with '/'",
                self.server.api_prefix
            )));
        }
        Ok(())
    }

    pub fn download_limits(&self) -> DownloadLimits {
        DownloadLimits {
            default_bytes: self.speedtest.download_default_bytes,
            min_bytes: self.speedtest.download_min_bytes,
            max_bytes: self.speedtest.download_max_bytes,
        }
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_bytes: self.speedtest.upload_max_bytes,
            idle_timeout: secs(self.speedtest.upload_idle_timeout_secs),
            early_abort: self.speedtest.upload_early_abort,
        }
    }
}

fn parsed<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn secs(n: u64) -> Option<Duration> {
    (n > 0).then(|| Duration::from_secs(n))
}
