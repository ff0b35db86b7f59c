use crate::*;
use serde_json::Value;

async fn upload(server: &TestServer, body: Vec<u8>) -> Result<reqwest::Response> {
    Ok(server
        .client
        .post(server.api("/speedtest/upload"))
        .header("content-type", "application/octet-stream")
        .body(body)
        .send()
        .await?)
}

#[tokio::test]
async fn test_upload_counts_every_byte() -> Result<()> {
    let server = spawn_server().await?;

    let resp = upload(&server, vec![0xA5; 1_000_000]).await?;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await?;
    assert_eq!(body["received_bytes"], 1_000_000);
    assert!(body["server_time"].as_i64().unwrap() > 0);

    let elapsed = body["elapsed_seconds"].as_f64().unwrap();
    let bps = body["upload_bps"].as_u64().unwrap();
    if elapsed > 0.0 {
        let expected = 8_000_000.0 / elapsed;
        assert!((bps as f64 - expected).abs() <= 1.0 + expected * 1e-9);
    } else {
        assert_eq!(bps, 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_upload_empty_body() -> Result<()> {
    let server = spawn_server().await?;

    let body: Value = upload(&server, Vec::new()).await?.json().await?;
    assert_eq!(body["received_bytes"], 0);
    assert_eq!(body["upload_bps"], 0);
    Ok(())
}

#[tokio::test]
async fn test_upload_at_ceiling_is_accepted() -> Result<()> {
    let mut config = SpeedtestConfig::default();
    config.speedtest.upload_max_bytes = 4096;
    let server = spawn_with_config(config).await?;

    let body: Value = upload(&server, vec![1; 4096]).await?.json().await?;
    assert_eq!(body["received_bytes"], 4096);
    Ok(())
}

#[tokio::test]
async fn test_upload_over_fifty_mebibytes_is_rejected() -> Result<()> {
    let server = spawn_server().await?;

    let resp = upload(&server, vec![0; 60_000_000]).await?;
    assert_eq!(resp.status(), 413);

    let body: Value = resp.json().await?;
    assert_eq!(body, serde_json::json!({ "error": "Upload too large" }));
    assert!(body.get("upload_bps").is_none());
    Ok(())
}

#[tokio::test]
async fn test_upload_early_abort_rejects_over_ceiling() -> Result<()> {
    let mut config = SpeedtestConfig::default();
    config.speedtest.upload_max_bytes = 1000;
    config.speedtest.upload_early_abort = true;
    let server = spawn_with_config(config).await?;

    let resp = upload(&server, vec![0; 5000]).await?;
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "Upload too large");
    Ok(())
}

#[tokio::test]
async fn test_server_keeps_serving_after_rejected_upload() -> Result<()> {
    let mut config = SpeedtestConfig::default();
    config.speedtest.upload_max_bytes = 1000;
    let server = spawn_with_config(config).await?;

    assert_eq!(upload(&server, vec![0; 2000]).await?.status(), 413);
    let body: Value = upload(&server, vec![0; 10]).await?.json().await?;
    assert_eq!(body["received_bytes"], 10);
    Ok(())
}
