//! Auxiliary endpoints: client IP info, quality scoring, region catalog,
//! share card rendering.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::header::{ACCEPT_LANGUAGE, USER_AGENT};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use speedtest_services::{
    calculate_network_quality, find_server, region_catalog, NetworkQuality, NetworkQualityInput,
    RenderedCard, ServerInfo, ServerRegion, ShareCard,
};

use super::{base_url, client_ip, header_str, ip_type, ApiState};
use crate::error::ApiError;

// ── /ip-info (GET) ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IpInfoResponse {
    pub ip: String,
    pub user_agent: String,
    pub accept_language: String,
    pub server_time: String,
    pub isp: String,
    pub org: String,
    pub asn: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub country_code: String,
    pub timezone: String,
    pub ip_type: String,
    pub vpn_detected: bool,
    pub reverse_dns: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub async fn handle_ip_info(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<IpInfoResponse> {
    let ip = client_ip(&headers, peer);
    let geo = state.geo.lookup(&ip).await;
    tracing::debug!(%ip, isp = %geo.isp, country = %geo.country_code, "ip info resolved");

    Json(IpInfoResponse {
        ip_type: ip_type(&ip).to_string(),
        user_agent: header_str(&headers, USER_AGENT.as_str())
            .unwrap_or("Unknown")
            .to_string(),
        accept_language: header_str(&headers, ACCEPT_LANGUAGE.as_str())
            .unwrap_or("Unknown")
            .to_string(),
        server_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        asn: geo.asn(),
        vpn_detected: geo.vpn_detected(),
        reverse_dns: String::new(),
        latitude: geo.lat,
        longitude: geo.lon,
        isp: geo.isp,
        org: geo.org,
        city: geo.city,
        region: geo.region,
        country: geo.country,
        country_code: geo.country_code,
        timezone: geo.timezone,
        ip,
    })
}

// ── /network-quality (POST) ───────────────────────────────────────────────────

pub async fn handle_network_quality(
    payload: Result<Json<NetworkQualityInput>, JsonRejection>,
) -> Result<Json<NetworkQuality>, ApiError> {
    let Json(input) = payload?;
    let quality = calculate_network_quality(&input);
    tracing::debug!(
        score = quality.overall_score,
        grade = %quality.grade,
        "network quality scored"
    );
    Ok(Json(quality))
}

// ── /server-regions (GET) ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ServerRegionsResponse {
    pub regions: Vec<ServerRegion>,
}

pub async fn handle_server_regions(headers: HeaderMap) -> Json<ServerRegionsResponse> {
    Json(ServerRegionsResponse {
        regions: region_catalog(&base_url(&headers)),
    })
}

pub async fn handle_server_region(
    Path(server_id): Path<String>,
    headers: HeaderMap,
) -> Json<ServerInfo> {
    Json(find_server(&server_id, &base_url(&headers)))
}

// ── /generate-share-card (POST) ───────────────────────────────────────────────

pub async fn handle_generate_share_card(
    State(state): State<ApiState>,
    payload: Result<Json<ShareCard>, JsonRejection>,
) -> Result<Json<RenderedCard>, ApiError> {
    let Json(card) = payload?;
    let rendered = state.card_renderer.render(&card, Utc::now())?;
    tracing::debug!(filename = %rendered.filename, theme = %card.theme, "share card rendered");
    Ok(Json(rendered))
}
