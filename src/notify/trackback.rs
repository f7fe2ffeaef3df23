//! Trackback delivery: form-encoded post metadata.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::TRACKBACK_EXCERPT_LENGTH;
use crate::fetch::Fetcher;

use super::{LocalPost, SendFailure};

static TB_ERROR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<error>\s*(\d+)").expect("error code regex is valid"));
static TB_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<message>\s*([^<]*)").expect("message regex is valid"));

pub(super) async fn send(
    fetcher: &Fetcher,
    post: &LocalPost,
    endpoint: &str,
) -> Result<(), SendFailure> {
    let excerpt: String = post.excerpt.chars().take(TRACKBACK_EXCERPT_LENGTH).collect();
    let result = fetcher
        .post_form(
            endpoint,
            &[
                ("title", post.title.as_str()),
                ("excerpt", excerpt.as_str()),
                ("url", post.url.as_str()),
                ("blog_name", post.blog_name.as_str()),
            ],
        )
        .await
        .map_err(SendFailure::Transport)?;

    if result.status != 200 {
        return Err(SendFailure::Rejected(format!("HTTP {}", result.status)));
    }

    // Classic trackback reports failure inside a 200 response body.
    if let Some(code) = TB_ERROR_CODE
        .captures(&result.body)
        .and_then(|c| c[1].parse::<i64>().ok())
        .filter(|&c| c != 0)
    {
        let message = TB_MESSAGE
            .captures(&result.body)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        return Err(SendFailure::Fault { code, message });
    }

    Ok(())
}
