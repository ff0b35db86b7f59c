//! health, ip-info and regions commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{api_url, client, get_json, root_url};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RootResponse {
    status: String,
    service: String,
    version: String,
}

#[derive(Deserialize)]
struct IpInfo {
    ip: String,
    ip_type: String,
    isp: String,
    org: String,
    asn: String,
    city: String,
    region: String,
    country: String,
    country_code: String,
    timezone: String,
    vpn_detected: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Deserialize)]
struct RegionsResponse {
    regions: Vec<Region>,
}

#[derive(Deserialize)]
struct Region {
    id: String,
    name: String,
    servers: Vec<Server>,
}

#[derive(Deserialize)]
struct Server {
    id: String,
    name: String,
    flag: String,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_health(server: &str) -> Result<()> {
    let resp: RootResponse = get_json(&client()?, &root_url(server, "/")).await?;
    println!("{} {}: {}", resp.service, resp.version, resp.status);
    Ok(())
}

pub async fn cmd_ip_info(server: &str) -> Result<()> {
    let info: IpInfo = get_json(&client()?, &api_url(server, "/ip-info")).await?;

    println!("═══════════════════════════════════════");
    println!("  Connection");
    println!("═══════════════════════════════════════");
    println!("  IP               : {} ({})", info.ip, info.ip_type);
    println!("  ISP              : {}", info.isp);
    if !info.org.is_empty() {
        println!("  Organisation     : {}", info.org);
    }
    println!("  ASN              : {}", info.asn);
    println!(
        "  Location         : {}, {}, {} ({})",
        info.city, info.region, info.country, info.country_code
    );
    println!("  Timezone         : {}", info.timezone);
    if let (Some(lat), Some(lon)) = (info.latitude, info.longitude) {
        println!("  Coordinates      : {:.4}, {:.4}", lat, lon);
    }
    println!(
        "  VPN / hosting    : {}",
        if info.vpn_detected { "detected" } else { "no" }
    );
    Ok(())
}

pub async fn cmd_regions(server: &str) -> Result<()> {
    let resp: RegionsResponse = get_json(&client()?, &api_url(server, "/server-regions")).await?;

    for region in &resp.regions {
        println!("  ┌─ {} ({})", region.name, region.id);
        for (i, s) in region.servers.iter().enumerate() {
            let branch = if i + 1 == region.servers.len() { "└─" } else { "│ " };
            println!("  {} {} {:<24} {}", branch, s.flag, s.name, s.id);
        }
    }
    Ok(())
}
