use crate::*;
use serde_json::{json, Value};

#[tokio::test]
async fn test_root_and_health_endpoints() -> Result<()> {
    let server = spawn_server().await?;

    let root: Value = server.client.get(server.url("/")).send().await?.json().await?;
    assert_eq!(root["status"], "healthy");
    assert_eq!(root["service"], "SpeedTest API");
    assert_eq!(root["version"], "1.0.0");

    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health, json!({ "status": "ok" }));
    Ok(())
}

#[tokio::test]
async fn test_cors_any_origin_exposes_measurement_headers() -> Result<()> {
    let server = spawn_server().await?;

    let preflight = server
        .client
        .request(reqwest::Method::OPTIONS, server.api("/speedtest/upload"))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await?;
    assert!(preflight.status().is_success());
    assert_eq!(
        preflight.headers()["access-control-allow-origin"],
        "*"
    );

    let resp = server
        .client
        .get(server.api("/speedtest/download?size=1024"))
        .header("origin", "http://localhost:5173")
        .send()
        .await?;
    let exposed = resp.headers()["access-control-expose-headers"]
        .to_str()?
        .to_ascii_lowercase();
    assert!(exposed.contains("x-bytes-total"));
    assert!(exposed.contains("x-server-time"));
    assert!(exposed.contains("content-length"));
    Ok(())
}

#[tokio::test]
async fn test_cors_explicit_origins_allow_credentials() -> Result<()> {
    let mut config = SpeedtestConfig::default();
    config.server.cors_origins = vec!["https://speed.example".to_string()];
    let server = spawn_with_config(config).await?;

    let resp = server
        .client
        .post(server.api("/speedtest/ping"))
        .header("origin", "https://speed.example")
        .json(&json!({ "client_time": 1, "seq": 1 }))
        .send()
        .await?;
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "https://speed.example"
    );
    assert_eq!(resp.headers()["access-control-allow-credentials"], "true");

    let other = server
        .client
        .post(server.api("/speedtest/ping"))
        .header("origin", "https://elsewhere.example")
        .json(&json!({ "client_time": 1, "seq": 1 }))
        .send()
        .await?;
    assert!(other.headers().get("access-control-allow-origin").is_none());
    Ok(())
}

#[tokio::test]
async fn test_custom_api_prefix() -> Result<()> {
    let mut config = SpeedtestConfig::default();
    config.server.api_prefix = "/v2".to_string();
    let server = spawn_with_config(config).await?;

    let resp = server
        .client
        .post(server.url("/v2/speedtest/ping"))
        .json(&json!({ "client_time": 1, "seq": 2 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let old = server
        .client
        .post(server.url("/api/v1/speedtest/ping"))
        .json(&json!({ "client_time": 1, "seq": 2 }))
        .send()
        .await?;
    assert_eq!(old.status(), 404);
    Ok(())
}
