use crate::*;
use serde_json::{json, Value};
use speedtest_services::ShareStore;

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[tokio::test]
async fn test_share_create_then_fetch() -> Result<()> {
    let server = spawn_server().await?;
    let report = json!({ "download_mbps": 93.4, "ping": 14, "history": [1, 2, 3] });

    let created: Value = server
        .client
        .post(server.api("/share/create"))
        .json(&json!({ "report_data": report }))
        .send()
        .await?
        .json()
        .await?;

    let share_id = created["share_id"].as_str().unwrap().to_string();
    assert_eq!(share_id.len(), 12);
    assert!(share_id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(created["url_path"], format!("/report/{share_id}"));

    let stored = server.store.get(&share_id)?.expect("report stored");
    assert_eq!(stored.expires_at_ms - stored.created_at_ms, WEEK_MS);

    let resp = server
        .client
        .get(server.api(&format!("/share/{share_id}")))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let fetched: Value = resp.json().await?;
    assert_eq!(fetched["share_id"], share_id.as_str());
    assert_eq!(fetched["report_data"], report);
    assert_eq!(fetched["expires_at"], created["expires_at"]);
    assert!(fetched["created_at"].as_str().unwrap().ends_with('Z'));
    Ok(())
}

#[tokio::test]
async fn test_share_unknown_id_is_not_found() -> Result<()> {
    let server = spawn_server().await?;

    let resp = server
        .client
        .get(server.api("/share/000000000000"))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await?;
    assert_eq!(body["detail"], "Report not found or expired");
    Ok(())
}

#[tokio::test]
async fn test_share_expired_report_is_gone() -> Result<()> {
    let server = spawn_server().await?;
    server
        .store
        .put("deadbeef0001", &json!({ "old": true }), 0, 1)?;

    let resp = server
        .client
        .get(server.api("/share/deadbeef0001"))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    assert!(server.store.get("deadbeef0001")?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_share_requires_report_data() -> Result<()> {
    let server = spawn_server().await?;

    let resp = server
        .client
        .post(server.api("/share/create"))
        .json(&json!({ "something_else": 1 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 422);
    assert!(server.store.is_empty());
    Ok(())
}
