//! Rel/attribute scanning over untrusted HTML.
//!
//! One scanner serves all three protocol checks: whole-token `rel` lookup on
//! `<a>`/`<link>` elements, plus the RDF block scan used by Trackback
//! autodiscovery. Rel tokens are space-separated and matched as whole
//! tokens; `rel="not-webmention"` never matches `webmention`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use url::Url;

use crate::utils::parse_selector;

/// Finds the first `<link>`/`<a>` (or, with `anchors_only`, `<a>` alone)
/// whose `rel` contains one of `rels` as a whole token, returning its href
/// resolved against `base_url`. Document order decides ties.
pub fn find_rel_href(
    html: &str,
    base_url: &str,
    rels: &[&str],
    anchors_only: bool,
) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = if anchors_only {
        parse_selector("a[rel][href]")
    } else {
        parse_selector("link[rel][href], a[rel][href]")
    };

    for element in document.select(&selector) {
        let (Some(rel), Some(href)) = (element.value().attr("rel"), element.value().attr("href"))
        else {
            continue;
        };
        let matched = rel
            .split_whitespace()
            .any(|token| rels.iter().any(|r| token.eq_ignore_ascii_case(r)));
        if matched {
            return Some(resolve_href(href, base_url));
        }
    }
    None
}

static RDF_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<rdf:Description\s+([^>]*?)/?>"#).expect("RDF block regex is valid")
});
static DC_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)dc:identifier\s*=\s*["']([^"']*)["']"#).expect("identifier regex is valid")
});
static TRACKBACK_PING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)trackback:ping\s*=\s*["']([^"']*)["']"#).expect("ping regex is valid")
});

/// Scans embedded RDF for a Trackback autodiscovery block whose
/// `dc:identifier` names the fetched page, returning its `trackback:ping`
/// endpoint.
pub fn find_trackback_rdf(body: &str, page_url: &str) -> Option<String> {
    for block in RDF_BLOCK.captures_iter(body) {
        let attrs = &block[1];
        let identifier = DC_IDENTIFIER.captures(attrs).map(|c| c[1].to_string());
        if identifier.as_deref() != Some(page_url) {
            continue;
        }
        if let Some(ping) = TRACKBACK_PING.captures(attrs) {
            return Some(ping[1].to_string());
        }
    }
    None
}

fn resolve_href(href: &str, base_url: &str) -> String {
    let href = href.trim();
    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}
