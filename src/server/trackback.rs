//! Trackback receiving endpoint.
//!
//! Classic Trackback: a form POST against a per-content URL, answered with
//! a small XML document whose `<error>` element is 0 on success. The posted
//! title/excerpt/blog_name are advisory only; the pipeline verifies and
//! parses the source page itself, same as the other protocols.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::notify::xmlrpc::escape_xml;
use crate::store::ContentKey;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct TrackbackParams {
    pub url: String,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub blog_name: Option<String>,
}

/// Handles `POST /trackback/{id}`.
pub async fn receive_trackback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(params): Form<TrackbackParams>,
) -> Response {
    debug!(
        "Trackback ping for content {id} from {} (title: {:?}, blog: {:?}, excerpt: {:?})",
        params.url, params.title, params.blog_name, params.excerpt
    );

    let target = match state.content.resolve_local_content(ContentKey::Id(id)).await {
        Ok(Some(item)) if item.is_local => item,
        Ok(_) => return trackback_error("no such target"),
        Err(e) => {
            warn!("Trackback target lookup failed for {id}: {e}");
            return trackback_error("target lookup failed");
        }
    };

    match state.pipeline.ingest(&params.url, &target).await {
        Ok(report) => {
            info!(
                "Trackback from {} to content {id} -> {}",
                params.url, report.record.uri
            );
            trackback_ok()
        }
        Err(e) => {
            warn!("Trackback from {} to content {id} rejected: {e}", params.url);
            trackback_error(&e.to_string())
        }
    }
}

fn trackback_ok() -> Response {
    let body = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<response><error>0</error></response>\n";
    (StatusCode::OK, [("content-type", "text/xml")], body).into_response()
}

fn trackback_error(message: &str) -> Response {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <response><error>1</error><message>{}</message></response>\n",
        escape_xml(message)
    );
    (StatusCode::OK, [("content-type", "text/xml")], body).into_response()
}
