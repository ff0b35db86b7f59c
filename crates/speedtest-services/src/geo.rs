//! IP geolocation.
//!
//! Best effort only: every failure path (timeout, refused connection, non-200,
//! `"status": "fail"`, undecodable reply) collapses into `GeoRecord::default()`.
//! Callers never see an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const IP_API_FIELDS: &str = "status,message,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as,proxy,hosting,query";

/// Geolocation record. Field names on the wire follow ip-api.com.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoRecord {
    pub isp: String,
    pub org: String,
    #[serde(rename = "as")]
    pub as_name: String,
    pub city: String,
    #[serde(rename = "regionName")]
    pub region: String,
    pub country: String,
    #[serde(rename = "countryCode")]
    pub country_code: String,
    pub timezone: String,
    pub proxy: bool,
    pub hosting: bool,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Default for GeoRecord {
    fn default() -> Self {
        Self {
            isp: "Unknown ISP".to_string(),
            org: String::new(),
            as_name: "Unknown".to_string(),
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
            country: "Unknown".to_string(),
            country_code: "XX".to_string(),
            timezone: "Unknown".to_string(),
            proxy: false,
            hosting: false,
            lat: None,
            lon: None,
        }
    }
}

impl GeoRecord {
    /// Leading `AS12345` token of the `as` field, or the whole field.
    pub fn asn(&self) -> String {
        if self.as_name.is_empty() {
            return "Unknown".to_string();
        }
        match self.as_name.split(' ').next() {
            Some(first) if first.starts_with("AS") => first.to_string(),
            _ => self.as_name.clone(),
        }
    }

    pub fn vpn_detected(&self) -> bool {
        self.proxy || self.hosting
    }
}

#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> GeoRecord;
}

/// Lookup disabled by config; always answers with the default record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeoLookup;

#[async_trait]
impl GeoLookup for DisabledGeoLookup {
    async fn lookup(&self, _ip: &str) -> GeoRecord {
        GeoRecord::default()
    }
}

#[derive(Deserialize)]
struct IpApiReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    record: GeoRecord,
}

/// ip-api.com style JSON endpoint.
#[derive(Debug, Clone)]
pub struct IpApiLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl IpApiLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, ip: &str) -> Result<Option<GeoRecord>, reqwest::Error> {
        let url = format!("{}/{}?fields={}", self.endpoint, ip, IP_API_FIELDS);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            tracing::warn!(ip, status = %resp.status(), "geo lookup returned non-success status");
            return Ok(None);
        }
        let reply: IpApiReply = resp.json().await?;
        if reply.status != "success" {
            tracing::debug!(ip, message = ?reply.message, "geo lookup declined");
            return Ok(None);
        }
        Ok(Some(reply.record))
    }
}

#[async_trait]
impl GeoLookup for IpApiLookup {
    async fn lookup(&self, ip: &str) -> GeoRecord {
        match self.fetch(ip).await {
            Ok(Some(record)) => record,
            Ok(None) => GeoRecord::default(),
            Err(e) => {
                tracing::warn!(ip, error = %e, "geo lookup failed");
                GeoRecord::default()
            }
        }
    }
}
