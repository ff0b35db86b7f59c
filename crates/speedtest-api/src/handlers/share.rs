//! /share handlers — create and read expiring report links.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use speedtest_services::{fetch_live, new_share_id, ShareLookup};

use super::ApiState;
use crate::error::ApiError;

/// Unix ms → RFC 3339 UTC.
fn rfc3339(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

// ── /share/create (POST) ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateShareRequest {
    pub report_data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CreateShareResponse {
    pub share_id: String,
    pub expires_at: String,
    pub url_path: String,
}

pub async fn handle_share_create(
    State(state): State<ApiState>,
    payload: Result<Json<CreateShareRequest>, JsonRejection>,
) -> Result<Json<CreateShareResponse>, ApiError> {
    let Json(req) = payload?;

    let share_id = new_share_id();
    let created_at_ms = state.clock.now_ms();
    let retention_ms = i64::try_from(state.share_retention.as_millis()).unwrap_or(i64::MAX);
    let expires_at_ms = created_at_ms.saturating_add(retention_ms);

    state
        .share_store
        .put(&share_id, &req.report_data, created_at_ms, expires_at_ms)?;
    tracing::info!(%share_id, expires_at_ms, "shared report created");

    Ok(Json(CreateShareResponse {
        url_path: format!("/report/{share_id}"),
        expires_at: rfc3339(expires_at_ms),
        share_id,
    }))
}

// ── /share/{share_id} (GET) ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SharedReportResponse {
    pub share_id: String,
    pub report_data: serde_json::Value,
    pub expires_at: String,
    pub created_at: String,
}

pub async fn handle_share_get(
    State(state): State<ApiState>,
    Path(share_id): Path<String>,
) -> Result<Json<SharedReportResponse>, ApiError> {
    match fetch_live(state.share_store.as_ref(), &share_id, state.clock.now_ms())? {
        ShareLookup::Found(report) => Ok(Json(SharedReportResponse {
            share_id: report.share_id,
            report_data: report.report_data,
            expires_at: rfc3339(report.expires_at_ms),
            created_at: rfc3339(report.created_at_ms),
        })),
        ShareLookup::Missing => Err(ApiError::NotFound(
            "Report not found or expired".to_string(),
        )),
        ShareLookup::Expired => {
            tracing::debug!(%share_id, "shared report expired on read");
            Err(ApiError::NotFound("Report has expired".to_string()))
        }
    }
}
