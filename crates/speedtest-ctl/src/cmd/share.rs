//! share and report commands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::http::{api_url, client, get_json, post_json_body};

#[derive(Serialize)]
struct CreateRequest {
    report_data: serde_json::Value,
}

#[derive(Deserialize)]
struct CreateResponse {
    share_id: String,
    expires_at: String,
    url_path: String,
}

#[derive(Deserialize)]
struct ReportResponse {
    share_id: String,
    report_data: serde_json::Value,
    created_at: String,
    expires_at: String,
}

pub async fn cmd_share(server: &str, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let report_data: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let resp: CreateResponse = post_json_body(
        &client()?,
        &api_url(server, "/share/create"),
        &CreateRequest { report_data },
    )
    .await?;

    println!("Shared as {}", resp.share_id);
    println!("  path    : {}", resp.url_path);
    println!("  expires : {}", resp.expires_at);
    Ok(())
}

pub async fn cmd_report(server: &str, share_id: &str) -> Result<()> {
    let resp: ReportResponse =
        get_json(&client()?, &api_url(server, &format!("/share/{share_id}"))).await?;

    println!("Report {}", resp.share_id);
    println!("  created : {}", resp.created_at);
    println!("  expires : {}", resp.expires_at);
    println!(
        "{}",
        serde_json::to_string_pretty(&resp.report_data).context("failed to format report")?
    );
    Ok(())
}
