//! CSS selector parsing utilities.

use scraper::Selector;

/// Parses a CSS selector with a safe fallback.
///
/// If parsing fails, logs an error and returns a selector that matches
/// nothing (`*:not(*)`). This prevents panics on programming errors while
/// letting parsing of untrusted documents continue.
pub fn parse_selector(selector_str: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        log::error!(
            "Failed to parse CSS selector '{}': {}. Using fallback selector.",
            selector_str,
            e
        );
        Selector::parse("*:not(*)")
            .expect("Fallback selector '*:not(*)' should always parse")
    })
}
