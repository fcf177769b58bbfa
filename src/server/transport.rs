//! HTTP transport for the invocation runtime.

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use super::handlers;
use crate::entrypoint::Entrypoint;

/// Default listening port of the hosted runtime.
pub const DEFAULT_PORT: u16 = 8080;

/// Builds the runtime router: `POST /invocations` and `GET /ping`.
pub fn router(entrypoint: Entrypoint) -> Router {
    Router::new()
        .route("/invocations", post(handlers::invocations_handler))
        .route("/ping", get(handlers::ping_handler))
        .with_state(entrypoint)
}

/// Serves the runtime on `host:port` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails to bind or encounters a runtime error.
pub async fn serve_http(entrypoint: Entrypoint, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let tcp_listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "kb-agent runtime listening");

    axum::serve(tcp_listener, router(entrypoint))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    Ok(())
}
