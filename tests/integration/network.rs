use crate::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use speedtest_services::GeoRecord;

/// Answers every lookup with the same record and remembers the last IP.
struct FixedGeo {
    last_ip: std::sync::Mutex<Option<String>>,
}

#[async_trait]
impl GeoLookup for FixedGeo {
    async fn lookup(&self, ip: &str) -> GeoRecord {
        *self.last_ip.lock().unwrap() = Some(ip.to_string());
        GeoRecord {
            isp: "Example Fibre".to_string(),
            org: "Example Org".to_string(),
            as_name: "AS64500 Example Fibre".to_string(),
            city: "Frankfurt".to_string(),
            region: "Hesse".to_string(),
            country: "Germany".to_string(),
            country_code: "DE".to_string(),
            timezone: "Europe/Berlin".to_string(),
            proxy: false,
            hosting: true,
            lat: Some(50.11),
            lon: Some(8.68),
        }
    }
}

#[tokio::test]
async fn test_ip_info_uses_forwarded_address_and_geo_record() -> Result<()> {
    let geo = Arc::new(FixedGeo {
        last_ip: std::sync::Mutex::new(None),
    });
    let server = spawn_with(SpeedtestConfig::default(), geo.clone()).await?;

    let body: Value = server
        .client
        .get(server.api("/ip-info"))
        .header("x-forwarded-for", "2001:db8::7, 10.0.0.1")
        .header("user-agent", "integration/1.0")
        .header("accept-language", "de-DE")
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["ip"], "2001:db8::7");
    assert_eq!(geo.last_ip.lock().unwrap().as_deref(), Some("2001:db8::7"));
    assert_eq!(body["ip_type"], "IPv6");
    assert_eq!(body["user_agent"], "integration/1.0");
    assert_eq!(body["accept_language"], "de-DE");
    assert_eq!(body["isp"], "Example Fibre");
    assert_eq!(body["asn"], "AS64500");
    assert_eq!(body["region"], "Hesse");
    assert_eq!(body["country_code"], "DE");
    assert_eq!(body["vpn_detected"], true);
    assert_eq!(body["reverse_dns"], "");
    assert_eq!(body["latitude"], 50.11);
    assert!(body["server_time"].as_str().unwrap().ends_with('Z'));
    Ok(())
}

#[tokio::test]
async fn test_ip_info_falls_back_to_peer_and_defaults() -> Result<()> {
    let server = spawn_server().await?;

    let body: Value = server
        .client
        .get(server.api("/ip-info"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["ip"], "127.0.0.1");
    assert_eq!(body["ip_type"], "IPv4");
    assert_eq!(body["isp"], "Unknown ISP");
    assert_eq!(body["country_code"], "XX");
    assert_eq!(body["asn"], "Unknown");
    assert_eq!(body["vpn_detected"], false);
    assert!(body["latitude"].is_null());
    Ok(())
}

#[tokio::test]
async fn test_network_quality_scores_input() -> Result<()> {
    let server = spawn_server().await?;

    let resp = server
        .client
        .post(server.api("/network-quality"))
        .json(&json!({ "ping": 30, "jitter": 4, "download_mbps": 40, "upload_mbps": 10 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await?;
    assert_eq!(body["overall_score"], 50);
    assert_eq!(body["grade"], "D");
    assert_eq!(body["grade_label"], "Poor");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 6);
    assert!(body["summary"].as_str().unwrap().starts_with("Below average"));
    Ok(())
}

#[tokio::test]
async fn test_network_quality_requires_all_metrics() -> Result<()> {
    let server = spawn_server().await?;

    let resp = server
        .client
        .post(server.api("/network-quality"))
        .json(&json!({ "ping": 30, "jitter": 4 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 422);
    Ok(())
}

#[tokio::test]
async fn test_server_regions_point_at_request_host() -> Result<()> {
    let server = spawn_server().await?;

    let body: Value = server
        .client
        .get(server.api("/server-regions"))
        .send()
        .await?
        .json()
        .await?;

    let regions = body["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 6);
    assert_eq!(regions[0]["id"], "auto");
    for region in regions {
        for s in region["servers"].as_array().unwrap() {
            assert_eq!(s["endpoint"], server.base());
            assert!(s["ping"].is_null());
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_server_region_lookup_and_fallback() -> Result<()> {
    let server = spawn_server().await?;

    let london: Value = server
        .client
        .get(server.api("/server-regions/eu-london"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(london["name"], "London, UK");
    assert_eq!(london["region"], "europe");

    let unknown: Value = server
        .client
        .get(server.api("/server-regions/moon-base"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(unknown["id"], "auto-best");
    Ok(())
}

#[tokio::test]
async fn test_generate_share_card() -> Result<()> {
    let server = spawn_server().await?;

    let resp = server
        .client
        .post(server.api("/generate-share-card"))
        .json(&json!({
            "download_mbps": 93.4, "upload_mbps": 12.0, "ping": 14.0, "jitter": 2.1,
            "quality_score": 84, "grade": "A", "isp": "Example Fibre",
            "location": "Frankfurt, Germany", "server_region": "Frankfurt",
            "timestamp": "2026-10-16T12:00:00Z", "theme": "light"
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await?;
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("speedtest_result_"));
    assert!(filename.ends_with(".svg"));
    assert!(!body["image_base64"].as_str().unwrap().is_empty());
    Ok(())
}
