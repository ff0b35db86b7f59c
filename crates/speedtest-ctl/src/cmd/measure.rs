//! ping, download, upload and full-run commands.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use speedtest_core::chunk::random_chunk;
use speedtest_core::{PingExchange, PingRequest, UploadResult};

use super::http::{api_url, client, post_json_body, send};
use super::stats::{mbps, summarize, PingStats};

pub const DEFAULT_PING_COUNT: u32 = 10;
pub const DEFAULT_TRANSFER_BYTES: u64 = 10 * 1024 * 1024;

const PING_GAP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct Transfer {
    pub bytes: u64,
    pub seconds: f64,
    pub mbps: f64,
}

fn unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ── Measurements ──────────────────────────────────────────────────────────────

pub async fn measure_ping(
    client: &reqwest::Client,
    server: &str,
    count: u32,
) -> Result<PingStats> {
    let url = api_url(server, "/speedtest/ping");
    let mut samples = Vec::with_capacity(count as usize);

    for seq in 0..count {
        let request = PingRequest {
            client_time: unix_ms(),
            seq: i64::from(seq),
        };
        let start = Instant::now();
        match post_json_body::<_, PingExchange>(client, &url, &request).await {
            Ok(reply) if reply.seq == request.seq => {
                samples.push(start.elapsed().as_secs_f64() * 1000.0);
            }
            Ok(reply) => eprintln!("  ping {seq}: server echoed seq {}", reply.seq),
            Err(e) => eprintln!("  ping {seq} failed: {e:#}"),
        }
        tokio::time::sleep(PING_GAP).await;
    }

    summarize(&samples).context("all ping attempts failed")
}

pub async fn measure_download(
    client: &reqwest::Client,
    server: &str,
    size: u64,
) -> Result<Transfer> {
    let url = format!("{}?size={}", api_url(server, "/speedtest/download"), size);
    let start = Instant::now();
    let mut resp = send(client.get(&url), &url).await?;

    let announced = resp
        .headers()
        .get("x-bytes-total")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let mut bytes: u64 = 0;
    while let Some(chunk) = resp.chunk().await.context("download interrupted")? {
        bytes += chunk.len() as u64;
    }
    let seconds = start.elapsed().as_secs_f64();

    if let Some(expected) = announced {
        if expected != bytes {
            bail!("download ended after {bytes} of {expected} announced bytes");
        }
    }

    Ok(Transfer {
        bytes,
        seconds,
        mbps: mbps(bytes, seconds),
    })
}

/// Rate comes from the server's own count and clock.
pub async fn measure_upload(
    client: &reqwest::Client,
    server: &str,
    size: u64,
) -> Result<Transfer> {
    let url = api_url(server, "/speedtest/upload");
    let payload = random_chunk(usize::try_from(size).context("upload size too large")?);

    let result: UploadResult = send(client.post(&url).body(payload), &url)
        .await?
        .json()
        .await
        .context("failed to parse response")?;

    Ok(Transfer {
        bytes: result.received_bytes,
        seconds: result.elapsed_seconds,
        mbps: result.upload_bps as f64 / 1_000_000.0,
    })
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_ping(server: &str, count: u32) -> Result<()> {
    let stats = measure_ping(&client()?, server, count).await?;

    println!("═══════════════════════════════════════");
    println!("  Ping");
    println!("═══════════════════════════════════════");
    print_ping(&stats, count);
    Ok(())
}

pub async fn cmd_download(server: &str, size: u64) -> Result<()> {
    let t = measure_download(&client()?, server, size).await?;

    println!("═══════════════════════════════════════");
    println!("  Download");
    println!("═══════════════════════════════════════");
    print_transfer(&t);
    Ok(())
}

pub async fn cmd_upload(server: &str, size: u64) -> Result<()> {
    let t = measure_upload(&client()?, server, size).await?;

    println!("═══════════════════════════════════════");
    println!("  Upload");
    println!("═══════════════════════════════════════");
    print_transfer(&t);
    Ok(())
}

#[derive(Serialize)]
struct QualityRequest {
    ping: f64,
    jitter: f64,
    download_mbps: f64,
    upload_mbps: f64,
    packet_loss: f64,
}

#[derive(Deserialize)]
struct QualityResponse {
    overall_score: i64,
    grade: String,
    grade_label: String,
    recommendations: Vec<Recommendation>,
    summary: String,
}

#[derive(Deserialize)]
struct Recommendation {
    label: String,
    icon: String,
    suitable: bool,
    description: String,
}

pub async fn cmd_run(server: &str, count: u32, size: u64) -> Result<()> {
    let client = client()?;

    println!("═══════════════════════════════════════");
    println!("  Speed Test: {}", server);
    println!("═══════════════════════════════════════");

    let ping = measure_ping(&client, server, count).await?;
    print_ping(&ping, count);

    let down = measure_download(&client, server, size).await?;
    println!("  Download         : {:.2} Mbps", down.mbps);

    let up = measure_upload(&client, server, size).await?;
    println!("  Upload           : {:.2} Mbps", up.mbps);

    let packet_loss = f64::from(count - ping.samples as u32) / f64::from(count.max(1)) * 100.0;
    let quality: QualityResponse = post_json_body(
        &client,
        &api_url(server, "/network-quality"),
        &QualityRequest {
            ping: ping.latency_ms,
            jitter: ping.jitter_ms,
            download_mbps: down.mbps,
            upload_mbps: up.mbps,
            packet_loss,
        },
    )
    .await?;

    println!();
    println!(
        "  Quality          : {} ({}), {}/100",
        quality.grade, quality.grade_label, quality.overall_score
    );
    println!("  {}", quality.summary);
    println!();
    for r in &quality.recommendations {
        let mark = if r.suitable { "✓" } else { "✗" };
        println!("  {} {} {:<15} {}", mark, r.icon, r.label, r.description);
    }
    Ok(())
}

fn print_ping(stats: &PingStats, count: u32) {
    println!("  Latency          : {:.1} ms", stats.latency_ms);
    println!("  Jitter           : {:.1} ms", stats.jitter_ms);
    println!("  Samples          : {}/{}", stats.samples, count);
}

fn print_transfer(t: &Transfer) {
    println!("  Bytes            : {}", t.bytes);
    println!("  Elapsed          : {:.3} s", t.seconds);
    println!("  Throughput       : {:.2} Mbps", t.mbps);
}
