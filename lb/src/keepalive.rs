//! Keep-alive HTTP endpoint
//!
//! Hosting platforms that idle processes without inbound traffic get pinged
//! here. The endpoint only reports that the process is up.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::routing::get;
use eyre::{Context, Result};
use tracing::{debug, info};

pub const ALIVE_BODY: &str = "Bot is running";

pub fn build_router() -> Router {
    Router::new().route("/", get(index))
}

/// Serve the keep-alive endpoint until `shutdown` resolves
pub async fn run_keepalive<F>(bind: &str, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    debug!(%bind, port, "run_keepalive: called");
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .context(format!("Invalid keep-alive address {bind}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind keep-alive endpoint on {addr}"))?;
    info!("Keep-alive listening on http://{addr}");

    axum::serve(listener, build_router())
        .with_graceful_shutdown(shutdown)
        .await
        .context("Keep-alive server failed")?;
    info!("Keep-alive shut down");
    Ok(())
}

async fn index() -> &'static str {
    ALIVE_BODY
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn send_request(uri: &str) -> axum::response::Response {
        build_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_reports_alive() {
        let response = send_request("/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], ALIVE_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = send_request("/status").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_keepalive_rejects_bad_address() {
        let err = run_keepalive("not an address", 8080, async {}).await.unwrap_err();
        assert!(err.to_string().contains("Invalid keep-alive address"));
    }

    #[tokio::test]
    async fn test_run_keepalive_stops_on_shutdown() {
        let result = run_keepalive("127.0.0.1", 0, async {}).await;
        assert!(result.is_ok());
    }
}
