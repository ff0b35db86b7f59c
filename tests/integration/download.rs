use crate::*;

async fn download(server: &TestServer, query: &str) -> Result<reqwest::Response> {
    Ok(server
        .client
        .get(format!("{}{}", server.api("/speedtest/download"), query))
        .send()
        .await?)
}

fn header<'a>(resp: &'a reqwest::Response, name: &str) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_download_default_is_one_mebibyte() -> Result<()> {
    let server = spawn_server().await?;

    let resp = download(&server, "").await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "x-bytes-total"), "1048576");
    assert_eq!(header(&resp, "content-length"), "1048576");
    assert_eq!(header(&resp, "content-type"), "application/octet-stream");
    assert_eq!(
        header(&resp, "cache-control"),
        "no-store, no-cache, must-revalidate"
    );
    assert!(header(&resp, "x-server-time").parse::<i64>()? > 0);

    assert_eq!(resp.bytes().await?.len(), 1_048_576);
    Ok(())
}

#[tokio::test]
async fn test_download_clamps_to_ceiling() -> Result<()> {
    let server = spawn_server().await?;

    let resp = download(&server, "?size=20000000").await?;
    assert_eq!(header(&resp, "x-bytes-total"), "10485760");
    assert_eq!(resp.bytes().await?.len(), 10_485_760);
    Ok(())
}

#[tokio::test]
async fn test_download_clamps_to_floor() -> Result<()> {
    let server = spawn_server().await?;

    for query in ["?size=500", "?size=0", "?size=-7"] {
        let resp = download(&server, query).await?;
        assert_eq!(header(&resp, "x-bytes-total"), "1024", "query {query}");
        assert_eq!(resp.bytes().await?.len(), 1024);
    }
    Ok(())
}

#[tokio::test]
async fn test_download_clamps_integers_beyond_i64() -> Result<()> {
    let server = spawn_server().await?;

    let resp = download(&server, "?size=99999999999999999999").await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "x-bytes-total"), "10485760");
    assert_eq!(resp.bytes().await?.len(), 10_485_760);

    let resp = download(&server, "?size=-99999999999999999999").await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "x-bytes-total"), "1024");
    assert_eq!(resp.bytes().await?.len(), 1024);
    Ok(())
}

#[tokio::test]
async fn test_download_exact_multiple_of_chunk_size() -> Result<()> {
    let server = spawn_server().await?;

    let resp = download(&server, "?size=131072").await?;
    assert_eq!(resp.bytes().await?.len(), 131_072);
    Ok(())
}

#[tokio::test]
async fn test_download_rejects_non_integer_size() -> Result<()> {
    let server = spawn_server().await?;

    for query in ["?size=lots", "?size=1.5", "?size="] {
        let resp = download(&server, query).await?;
        assert_eq!(resp.status(), 422, "query {query}");
        let body: serde_json::Value = resp.json().await?;
        assert!(body["detail"].as_str().is_some_and(|d| d.contains("integer")));
    }
    Ok(())
}

#[tokio::test]
async fn test_download_payload_is_not_constant() -> Result<()> {
    let server = spawn_server().await?;

    let first = download(&server, "?size=4096").await?.bytes().await?;
    let second = download(&server, "?size=4096").await?.bytes().await?;
    assert_ne!(first, second);
    assert!(first.iter().any(|&b| b != first[0]));
    Ok(())
}

#[tokio::test]
async fn test_download_abandoned_mid_stream_leaves_server_healthy() -> Result<()> {
    let server = spawn_server().await?;

    let mut resp = download(&server, "?size=10485760").await?;
    let first = resp.chunk().await?.expect("at least one chunk");
    assert!(!first.is_empty());
    drop(resp);

    let resp = download(&server, "?size=2048").await?;
    assert_eq!(resp.bytes().await?.len(), 2048);
    Ok(())
}
