//! Webmention receiving endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use log::{info, warn};
use serde::Deserialize;
use url::Url;

use super::{error_status, AppState};

#[derive(Debug, Deserialize)]
pub struct WebmentionParams {
    pub source: String,
    pub target: String,
}

/// Handles `POST /webmention` with form-encoded `source` and `target`.
pub async fn receive_webmention(
    State(state): State<AppState>,
    Form(params): Form<WebmentionParams>,
) -> Response {
    if !is_http_url(&params.source) || !is_http_url(&params.target) {
        return (StatusCode::BAD_REQUEST, "source and target must be HTTP(S) URLs")
            .into_response();
    }
    if params.source == params.target {
        return (StatusCode::BAD_REQUEST, "source and target must differ").into_response();
    }

    let target_ref = match state.pipeline.resolve_target(&params.target).await {
        Ok(target_ref) => target_ref,
        Err(e) => {
            warn!("Webmention target rejected ({}): {e}", params.target);
            return (error_status(&e), e.to_string()).into_response();
        }
    };

    match state.pipeline.ingest(&params.source, &target_ref).await {
        Ok(report) => {
            info!(
                "Webmention from {} to {} -> {} (created: {})",
                params.source, params.target, report.record.uri, report.created
            );
            (StatusCode::ACCEPTED, "Accepted").into_response()
        }
        Err(e) => {
            warn!(
                "Webmention from {} to {} rejected: {e}",
                params.source, params.target
            );
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

fn is_http_url(value: &str) -> bool {
    value.len() <= crate::config::MAX_URL_LENGTH
        && matches!(Url::parse(value), Ok(u) if u.scheme() == "http" || u.scheme() == "https")
}
