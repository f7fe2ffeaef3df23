//! Inbound target resolution.
//!
//! Maps the `target` URL named by an inbound notification to the local
//! content item it refers to. Resolution follows the effective URL after
//! redirects, tries an exact URI lookup, then falls back to interpreting a
//! trailing numeric path segment as a local content id. Content not owned by
//! this instance is never a valid target.

use log::debug;
use url::Url;

use crate::error_handling::LinkbackError;
use crate::fetch::Fetcher;
use crate::store::{ContentKey, ContentStore, LocalContentRef, StoreError};

/// Resolves a claimed target URL to a locally owned content item.
pub async fn resolve_target(
    fetcher: &Fetcher,
    store: &dyn ContentStore,
    url: &str,
) -> Result<LocalContentRef, LinkbackError> {
    let head = fetcher.head(url).await?;
    let effective = head.effective_url;
    debug!("Resolving target {url} (effective {effective})");

    if let Some(item) = store
        .resolve_local_content(ContentKey::Uri(&effective))
        .await
        .map_err(|e| store_failure(url, e))?
    {
        return require_local(url, item);
    }

    if let Some(id) = trailing_numeric_id(&effective) {
        if let Some(item) = store
            .resolve_local_content(ContentKey::Id(id))
            .await
            .map_err(|e| store_failure(url, e))?
        {
            return require_local(url, item);
        }
    }

    Err(LinkbackError::UnresolvableTarget(url.to_string()))
}

fn require_local(url: &str, item: LocalContentRef) -> Result<LocalContentRef, LinkbackError> {
    if item.is_local {
        Ok(item)
    } else {
        // Remote content known to the store must never be treated as a
        // valid backlink target.
        Err(LinkbackError::UnresolvableTarget(url.to_string()))
    }
}

fn store_failure(url: &str, e: StoreError) -> LinkbackError {
    LinkbackError::Persistence {
        url: url.to_string(),
        message: e.to_string(),
    }
}

/// Extracts a trailing numeric path segment, e.g. `/notice/42` -> `42`.
fn trailing_numeric_id(url: &str) -> Option<i64> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?
        .parse::<i64>()
        .ok()
}
