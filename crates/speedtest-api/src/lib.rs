pub mod error;
pub mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_LENGTH;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::serve::ListenerExt;
use axum::Router;
use tokio::net::{TcpListener, TcpStream};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use speedtest_core::config::ServerConfig;

pub use error::ApiError;
pub use handlers::ApiState;

/// Full application router: health endpoints at the root, everything else
/// nested under `server.api_prefix`.
pub fn router(state: ApiState, server: &ServerConfig) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/speedtest/ping", post(handlers::handle_ping))
        .route("/speedtest/download", get(handlers::handle_download))
        .route(
            "/speedtest/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/ip-info", get(handlers::handle_ip_info))
        .route("/network-quality", post(handlers::handle_network_quality))
        .route("/server-regions", get(handlers::handle_server_regions))
        .route(
            "/server-regions/{server_id}",
            get(handlers::handle_server_region),
        )
        .route(
            "/generate-share-card",
            post(handlers::handle_generate_share_card),
        )
        .route("/share/create", post(handlers::handle_share_create))
        .route("/share/{share_id}", get(handlers::handle_share_get))
        .with_state(state);

    let root = Router::new()
        .route("/", get(handlers::handle_root))
        .route("/health", get(handlers::handle_health));

    let prefix = server.api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        root.merge(api_routes)
    } else {
        root.nest(prefix, api_routes)
    };

    Ok(app.layer(configure_cors(&server.cors_origins)?))
}

/// `*` (or no entries) allows any origin without credentials; an explicit
/// list allows credentials.
pub fn configure_cors(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([
            CONTENT_LENGTH,
            handlers::speedtest::X_BYTES_TOTAL,
            handlers::speedtest::X_SERVER_TIME,
        ]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }

    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {o}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true))
}

/// Bind `server.host:server.port` and serve until `shutdown` resolves.
pub async fn serve(
    state: ApiState,
    server: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state, server)?;
    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", server.host, server.port))?;
    serve_listener(listener, app, server.tcp_user_timeout_secs, shutdown).await
}

/// Serve `app` on an already bound listener. Accepted sockets get
/// `TCP_NODELAY` and, on Linux, `TCP_USER_TIMEOUT` so a peer that stops
/// acknowledging data is dropped instead of pinning a stream forever.
pub async fn serve_listener(
    listener: TcpListener,
    app: Router,
    tcp_user_timeout_secs: u64,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "API listening");

    let user_timeout =
        (tcp_user_timeout_secs > 0).then(|| Duration::from_secs(tcp_user_timeout_secs));
    let listener = listener.tap_io(move |tcp| {
        if let Err(e) = tune_socket(tcp, user_timeout) {
            tracing::trace!(error = %e, "failed to tune accepted socket");
        }
    });

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    tracing::info!(%addr, "API stopped");
    Ok(())
}

fn tune_socket(tcp: &mut TcpStream, user_timeout: Option<Duration>) -> std::io::Result<()> {
    tcp.set_nodelay(true)?;
    if let Some(timeout) = user_timeout {
        set_user_timeout(tcp, timeout)?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn set_user_timeout(tcp: &TcpStream, timeout: Duration) -> std::io::Result<()> {
    socket2::SockRef::from(tcp).set_tcp_user_timeout(Some(timeout))
}

#[cfg(not(target_os = "linux"))]
fn set_user_timeout(_tcp: &TcpStream, _timeout: Duration) -> std::io::Result<()> {
    Ok(())
}
