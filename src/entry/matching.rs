//! Lenient URL matching.
//!
//! Remote authors routinely link to local content with a different scheme,
//! a `www.` prefix, a fragment, or a trailing slash. Target comparison
//! ignores all four.

use crate::utils::parse_selector;
use scraper::Html;

/// Normalizes a URL for lenient comparison: strips the `http(s)://` scheme,
/// a leading `www.`, the fragment, and a single trailing slash.
pub fn normalize_for_match(url: &str) -> String {
    let s = url.trim();
    let s = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s);
    let s = s.strip_prefix("www.").unwrap_or(s);
    let s = s.split('#').next().unwrap_or(s);
    let s = s.strip_suffix('/').unwrap_or(s);
    s.to_string()
}

/// Whether two URLs are equal under lenient normalization.
pub fn lenient_match(a: &str, b: &str) -> bool {
    let a = normalize_for_match(a);
    !a.is_empty() && a == normalize_for_match(b)
}

/// Whether an HTML fragment contains an anchor whose href lenient-matches
/// the target.
pub fn html_links_to(html: &str, target: &str) -> bool {
    let fragment = Html::parse_fragment(html);
    let selector = parse_selector("a[href]");
    fragment
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .any(|href| lenient_match(href, target))
}

/// Whether a raw response body references the target at all. This is the
/// cheap pre-parse confirmation that guards against spam pings: the body
/// must contain the target in some lenient form before any microformat
/// parsing is attempted.
pub fn body_references_target(body: &str, target: &str) -> bool {
    if body.contains(target) {
        return true;
    }
    let normalized = normalize_for_match(target);
    !normalized.is_empty() && body.contains(&normalized)
}
