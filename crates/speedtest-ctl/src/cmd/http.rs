//! Shared HTTP request helpers for CLI commands.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

const API_PREFIX: &str = "/api/v1";

pub fn api_url(server: &str, path: &str) -> String {
    format!("{}{}{}", server.trim_end_matches('/'), API_PREFIX, path)
}

pub fn root_url(server: &str, path: &str) -> String {
    format!("{}{}", server.trim_end_matches('/'), path)
}

/// One client per invocation so measurements reuse a warm connection.
pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("speedtest-ctl/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

pub async fn send(request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
    let resp = request
        .send()
        .await
        .with_context(|| format!("failed to connect to speedtestd at {} — is it running?", url))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("{} returned {}: {}", url, status, body.trim());
    }
    Ok(resp)
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T> {
    send(client.get(url), url)
        .await?
        .json::<T>()
        .await
        .context("failed to parse response")
}

pub async fn post_json_body<T, R>(client: &reqwest::Client, url: &str, body: &T) -> Result<R>
where
    T: Serialize,
    R: for<'de> Deserialize<'de>,
{
    send(client.post(url).json(body), url)
        .await?
        .json::<R>()
        .await
        .context("failed to parse response")
}
