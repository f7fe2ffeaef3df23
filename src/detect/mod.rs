//! Backlink protocol autodetection.
//!
//! Inspects a fetched response for endpoint advertisements in strict
//! priority order: Webmention, then Pingback, then Trackback. The first
//! advertised endpoint wins and short-circuits the remaining checks.
//! A page advertising nothing is a normal outcome, not an error.

pub mod rel_scan;

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use strum_macros::Display as DisplayMacro;
use url::Url;

use crate::config::{WEBMENTION_REL, WEBMENTION_REL_LEGACY};
use crate::fetch::FetchResult;

/// The three supported backlink protocols, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DisplayMacro)]
#[strum(serialize_all = "lowercase")]
pub enum BacklinkProtocol {
    Webmention,
    Pingback,
    Trackback,
}

/// A detected notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkEndpoint {
    pub protocol: BacklinkProtocol,
    pub endpoint: String,
}

/// Detects the backlink endpoint advertised by a fetched page, if any.
pub fn detect(fetch: &FetchResult) -> Option<BacklinkEndpoint> {
    let endpoint = detect_webmention(fetch)
        .or_else(|| detect_pingback(fetch))
        .or_else(|| detect_trackback(fetch));
    match &endpoint {
        Some(e) => debug!(
            "Detected {} endpoint {} for {}",
            e.protocol, e.endpoint, fetch.effective_url
        ),
        None => debug!("No backlink endpoint advertised by {}", fetch.effective_url),
    }
    endpoint
}

fn detect_webmention(fetch: &FetchResult) -> Option<BacklinkEndpoint> {
    let rels = [WEBMENTION_REL, WEBMENTION_REL_LEGACY];

    for header in fetch.header_all("link") {
        if let Some(href) = link_header_endpoint(header, &rels) {
            return Some(BacklinkEndpoint {
                protocol: BacklinkProtocol::Webmention,
                endpoint: resolve_endpoint(&href, &fetch.effective_url),
            });
        }
    }

    rel_scan::find_rel_href(&fetch.body, &fetch.effective_url, &rels, false).map(|endpoint| {
        BacklinkEndpoint {
            protocol: BacklinkProtocol::Webmention,
            endpoint,
        }
    })
}

fn detect_pingback(fetch: &FetchResult) -> Option<BacklinkEndpoint> {
    if let Some(endpoint) = fetch.header("x-pingback") {
        return Some(BacklinkEndpoint {
            protocol: BacklinkProtocol::Pingback,
            endpoint: endpoint.to_string(),
        });
    }

    rel_scan::find_rel_href(&fetch.body, &fetch.effective_url, &["pingback"], false).map(
        |endpoint| BacklinkEndpoint {
            protocol: BacklinkProtocol::Pingback,
            endpoint,
        },
    )
}

fn detect_trackback(fetch: &FetchResult) -> Option<BacklinkEndpoint> {
    // Only anchors advertise trackback; a <link rel="trackback"> is not part
    // of the convention.
    rel_scan::find_rel_href(&fetch.body, &fetch.effective_url, &["trackback"], true)
        .or_else(|| rel_scan::find_trackback_rdf(&fetch.body, &fetch.effective_url))
        .map(|endpoint| BacklinkEndpoint {
            protocol: BacklinkProtocol::Trackback,
            endpoint,
        })
}

static LINK_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([^>]*)>\s*;([^<]*)"#).expect("link value regex is valid")
});
static LINK_REL_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)rel\s*=\s*(?:"([^"]*)"|'([^']*)'|([^;,\s]+))"#)
        .expect("rel param regex is valid")
});

/// Extracts the target of the first link-value in an HTTP `Link` header whose
/// rel contains one of `rels` as a whole token. An empty target (`<>`) means
/// the page itself and is returned as the empty string for the caller to
/// resolve.
fn link_header_endpoint(header: &str, rels: &[&str]) -> Option<String> {
    for capture in LINK_VALUE.captures_iter(header) {
        let href = capture[1].trim();
        let params = &capture[2];
        let Some(rel) = LINK_REL_PARAM.captures(params) else {
            continue;
        };
        let rel_value = rel
            .get(1)
            .or_else(|| rel.get(2))
            .or_else(|| rel.get(3))
            .map(|m| m.as_str())
            .unwrap_or("");
        let matched = rel_value
            .split_whitespace()
            .any(|token| rels.iter().any(|r| token.eq_ignore_ascii_case(r)));
        if matched {
            return Some(href.to_string());
        }
    }
    None
}

/// Resolves a possibly relative endpoint against the page URL. An empty
/// endpoint designates the page itself.
fn resolve_endpoint(endpoint: &str, page_url: &str) -> String {
    if endpoint.is_empty() {
        return page_url.to_string();
    }
    match Url::parse(page_url).and_then(|base| base.join(endpoint)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => endpoint.to_string(),
    }
}
