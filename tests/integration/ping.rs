use crate::*;
use serde_json::{json, Value};

#[tokio::test]
async fn test_ping_echoes_client_fields() -> Result<()> {
    let server = spawn_server().await?;

    let resp = server
        .client
        .post(server.api("/speedtest/ping"))
        .json(&json!({ "client_time": 1000, "seq": 5 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await?;
    assert_eq!(body["seq"], 5);
    assert_eq!(body["client_time"], 1000);
    assert!(body["server_time"].as_i64().unwrap() > 0);
    assert!(body["server_process_time"].as_i64().unwrap() >= 0);
    Ok(())
}

#[tokio::test]
async fn test_ping_server_time_never_decreases() -> Result<()> {
    let server = spawn_server().await?;

    let mut last = i64::MIN;
    for seq in 0..10 {
        let body: Value = server
            .client
            .post(server.api("/speedtest/ping"))
            .json(&json!({ "client_time": 0, "seq": seq }))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(body["seq"], seq);
        let t = body["server_time"].as_i64().unwrap();
        assert!(t >= last, "server_time went backwards: {t} < {last}");
        last = t;
    }
    Ok(())
}

#[tokio::test]
async fn test_ping_rejects_malformed_bodies() -> Result<()> {
    let server = spawn_server().await?;

    for body in [
        json!({ "seq": 1 }),
        json!({ "client_time": "soon", "seq": 1 }),
        json!({ "client_time": 1.5, "seq": 1 }),
    ] {
        let resp = server
            .client
            .post(server.api("/speedtest/ping"))
            .json(&body)
            .send()
            .await?;
        assert_eq!(resp.status(), 422, "body {body} should be rejected");
        let err: Value = resp.json().await?;
        assert!(err["detail"].is_string());
    }

    let resp = server
        .client
        .post(server.api("/speedtest/ping"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), 422);
    Ok(())
}
