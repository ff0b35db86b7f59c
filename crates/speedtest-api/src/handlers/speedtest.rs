//! /speedtest handlers — ping echo, download stream, upload sink.

use std::convert::Infallible;
use std::time::Instant;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::Deserialize;

use speedtest_core::{
    parse_requested_size, DownloadJob, PingExchange, PingRequest, UploadResult,
};

use super::ApiState;
use crate::error::ApiError;

pub const X_BYTES_TOTAL: HeaderName = HeaderName::from_static("x-bytes-total");
pub const X_SERVER_TIME: HeaderName = HeaderName::from_static("x-server-time");

const NO_STORE: &str = "no-store, no-cache, must-revalidate";

// ── /speedtest/ping (POST) ────────────────────────────────────────────────────

pub async fn handle_ping(
    State(state): State<ApiState>,
    payload: Result<Json<PingRequest>, JsonRejection>,
) -> Result<Json<PingExchange>, ApiError> {
    let received = Instant::now();
    let Json(request) = payload?;
    Ok(Json(PingExchange::respond(request, &state.clock, received)))
}

// ── /speedtest/download (GET) ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// Kept raw so integers outside `i64` clamp instead of failing.
    pub size: Option<String>,
}

pub async fn handle_download(
    State(state): State<ApiState>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let requested = params
        .size
        .as_deref()
        .map(parse_requested_size)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let job = DownloadJob::new(requested, &state.download_limits);
    tracing::debug!(
        requested = ?job.requested,
        size = job.size,
        chunks = job.chunk_count(),
        "download started"
    );

    let headers = [
        (CONTENT_TYPE, "application/octet-stream".to_string()),
        (CONTENT_LENGTH, job.size.to_string()),
        (X_BYTES_TOTAL, job.size.to_string()),
        (X_SERVER_TIME, state.clock.now_ms().to_string()),
        (CACHE_CONTROL, NO_STORE.to_string()),
    ];
    let body = Body::from_stream(job.into_stream().map(Ok::<_, Infallible>));
    Ok((headers, body).into_response())
}

// ── /speedtest/upload (POST) ──────────────────────────────────────────────────

pub async fn handle_upload(
    State(state): State<ApiState>,
    body: Body,
) -> Result<Json<UploadResult>, ApiError> {
    let result = state
        .upload_sink
        .consume(body.into_data_stream(), &state.clock)
        .await?;
    tracing::debug!(
        received_bytes = result.received_bytes,
        elapsed_seconds = result.elapsed_seconds,
        upload_bps = result.upload_bps,
        "upload measured"
    );
    Ok(Json(result))
}
