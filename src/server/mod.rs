//! Inbound notification endpoints.
//!
//! Serves the three receiving surfaces (Webmention form POST, Pingback
//! XML-RPC, Trackback form POST) plus a minimal content page that
//! advertises this instance's own endpoints via `Link` and `X-Pingback`
//! headers. The server runs alongside the host application and never blocks
//! its write path.

mod pingback;
mod trackback;
mod webmention;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::error_handling::LinkbackError;
use crate::ingest::Pipeline;
use crate::store::{ContentKey, ContentStore};
use crate::utils::escape_html;

/// Shared state for the inbound endpoints.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub content: Arc<dyn ContentStore>,
    /// Base URL this instance advertises its endpoints under.
    pub base_url: String,
}

/// Builds the inbound router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/content/{id}", get(content_handler))
        .route("/webmention", post(webmention::receive_webmention))
        .route("/xmlrpc", post(pingback::receive_pingback))
        .route("/trackback/{id}", post(trackback::receive_trackback))
        .with_state(state)
}

/// Creates and starts the inbound server.
pub async fn start_server(port: u16, state: AppState) -> Result<(), anyhow::Error> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind inbound server to port {}: {}", port, e))?;

    log::info!("Inbound server listening on port {}", port);
    log::info!("  - Webmention: POST /webmention");
    log::info!("  - Pingback:   POST /xmlrpc");
    log::info!("  - Trackback:  POST /trackback/{{id}}");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Inbound server error: {}", e))?;

    Ok(())
}

/// Capability headers advertised on served content: where to send
/// Webmentions and Pingbacks for this instance.
pub fn advertisement_headers(base_url: &str) -> [(String, String); 2] {
    let base = base_url.trim_end_matches('/');
    [
        (
            "Link".to_string(),
            format!("<{base}/webmention>; rel=\"webmention\""),
        ),
        ("X-Pingback".to_string(), format!("{base}/xmlrpc")),
    ]
}

async fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Minimal content page. Real rendering belongs to the host application;
/// this exists so the advertised endpoints resolve against something and so
/// the capability headers are served from day one.
async fn content_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.content.resolve_local_content(ContentKey::Id(id)).await {
        Ok(Some(item)) if item.is_local => {
            let headers = advertisement_headers(&state.base_url);
            let body = format!(
                "<!DOCTYPE html><html><head><title>{}</title></head>\
                 <body><article class=\"h-entry\">\
                 <a class=\"u-url\" href=\"{}\">{}</a>\
                 </article></body></html>",
                escape_html(&item.uri),
                escape_html(&item.url),
                escape_html(&item.uri),
            );
            (
                StatusCode::OK,
                [
                    ("content-type", "text/html; charset=utf-8".to_string()),
                    (headers[0].0.as_str(), headers[0].1.clone()),
                    (headers[1].0.as_str(), headers[1].1.clone()),
                ],
                body,
            )
                .into_response()
        }
        Ok(_) => (StatusCode::NOT_FOUND, "no such content").into_response(),
        Err(e) => {
            log::error!("Content lookup failed for id {id}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "lookup failed").into_response()
        }
    }
}

/// Maps a pipeline error to an HTTP status for the form-based endpoints.
/// Client mistakes, including a source the sender claims but we cannot
/// fetch, are 400; our own persistence problems are 500.
fn error_status(e: &LinkbackError) -> StatusCode {
    match e {
        LinkbackError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}
