//! Mention content construction.
//!
//! Picks the best body text offered by the entry, flattens it for length
//! checks, and truncates over-long remote content while always keeping an
//! attribution link back to the source.

use crate::config::MAX_MENTION_LENGTH;
use crate::mf2::Item;
use crate::utils::{escape_html, strip_tags};

/// Plain-text and rendered forms of a mention body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltContent {
    pub plain: String,
    pub rendered: String,
}

/// Builds the mention body from an entry: prefer `content`, else `summary`,
/// else `name`. Content exceeding the platform maximum is truncated with an
/// ellipsis and a "read more" anchor to the source appended; the
/// source-attribution link is never dropped when truncating.
pub fn build_mention_content(entry: &Item, source_url: &str) -> BuiltContent {
    let (html, plain) = if let Some(html) = entry.first_html("content") {
        (
            html.to_string(),
            entry
                .first_text("content")
                .map(str::to_string)
                .unwrap_or_else(|| strip_tags(html)),
        )
    } else if let Some(summary) = entry.first_text("summary") {
        (escape_html(summary), summary.to_string())
    } else {
        let name = entry.first_text("name").unwrap_or_default();
        (escape_html(name), name.to_string())
    };

    if plain.chars().count() <= MAX_MENTION_LENGTH {
        return BuiltContent {
            plain,
            rendered: html,
        };
    }

    // Reserve room for the ellipsis so the stored plain text stays within
    // the platform maximum.
    let truncated: String = plain.chars().take(MAX_MENTION_LENGTH - 1).collect();
    let truncated = truncated.trim_end().to_string();
    let plain_out = format!("{truncated}…");
    let rendered = format!(
        "{}… <a href=\"{}\">read more</a>",
        escape_html(&truncated),
        escape_html(source_url)
    );
    BuiltContent {
        plain: plain_out,
        rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mf2::PropertyValue;

    fn entry_with(property: &str, value: PropertyValue) -> Item {
        let mut item = Item {
            types: vec!["h-entry".to_string()],
            ..Item::default()
        };
        item.properties
            .entry(property.to_string())
            .or_default()
            .push(value);
        item
    }

    #[test]
    fn test_prefers_content_over_summary() {
        let mut entry = entry_with(
            "content",
            PropertyValue::Html {
                html: "<p>full body</p>".to_string(),
                text: "full body".to_string(),
            },
        );
        entry.properties.insert(
            "summary".to_string(),
            vec![PropertyValue::Text("short".to_string())],
        );
        let built = build_mention_content(&entry, "https://remote.example/p");
        assert_eq!(built.plain, "full body");
        assert_eq!(built.rendered, "<p>full body</p>");
    }

    #[test]
    fn test_falls_back_to_summary_then_name() {
        let entry = entry_with("summary", PropertyValue::Text("a summary".to_string()));
        let built = build_mention_content(&entry, "https://remote.example/p");
        assert_eq!(built.plain, "a summary");

        let entry = entry_with("name", PropertyValue::Text("Title only".to_string()));
        let built = build_mention_content(&entry, "https://remote.example/p");
        assert_eq!(built.plain, "Title only");
        assert_eq!(built.rendered, "Title only");
    }

    #[test]
    fn test_truncation_appends_source_link() {
        let long = "x".repeat(MAX_MENTION_LENGTH * 2);
        let entry = entry_with(
            "content",
            PropertyValue::Html {
                html: format!("<p>{long}</p>"),
                text: long.clone(),
            },
        );
        let built = build_mention_content(&entry, "https://remote.example/long-post");
        assert!(built.plain.chars().count() <= MAX_MENTION_LENGTH);
        assert!(built.plain.ends_with('…'));
        assert!(built
            .rendered
            .contains("<a href=\"https://remote.example/long-post\">read more</a>"));
    }

    #[test]
    fn test_content_at_limit_is_untouched() {
        let exact = "y".repeat(MAX_MENTION_LENGTH);
        let entry = entry_with(
            "content",
            PropertyValue::Html {
                html: exact.clone(),
                text: exact.clone(),
            },
        );
        let built = build_mention_content(&entry, "https://remote.example/p");
        assert_eq!(built.plain, exact);
        assert!(!built.rendered.contains("read more"));
    }

    #[test]
    fn test_summary_is_escaped_in_rendered_form() {
        let entry = entry_with(
            "summary",
            PropertyValue::Text("tags <b> stay text".to_string()),
        );
        let built = build_mention_content(&entry, "https://remote.example/p");
        assert_eq!(built.rendered, "tags &lt;b&gt; stay text");
    }
}
