//! Entry location and semantic classification.
//!
//! Given a parsed source document and the local target URL, finds the entry
//! that actually references the target and maps it to one of five semantic
//! types. Classification precedence is fixed: the document rel-table's
//! `in-reply-to` outranks property-level matches, which are checked in the
//! order in-reply-to, repost-of, like-of, tag-of; everything else is a plain
//! mention.

mod matching;

use std::str::FromStr;

use strum_macros::Display as DisplayMacro;

use crate::mf2::{Item, ParsedDocument, PropertyValue};

pub use matching::{body_references_target, html_links_to, lenient_match, normalize_for_match};

/// Semantic type of a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DisplayMacro)]
#[strum(serialize_all = "lowercase")]
pub enum EntryType {
    Reply,
    Repost,
    Like,
    Tag,
    Mention,
}

/// Explicit RSVP value carried by a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DisplayMacro)]
#[strum(serialize_all = "lowercase")]
pub enum RsvpValue {
    Yes,
    No,
    Maybe,
}

impl FromStr for RsvpValue {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(RsvpValue::Yes),
            "no" => Ok(RsvpValue::No),
            "maybe" => Ok(RsvpValue::Maybe),
            _ => Err(()),
        }
    }
}

/// Property keys that classify an entry, checked in this order.
const CLASSIFYING_PROPERTIES: [(&str, EntryType); 4] = [
    ("in-reply-to", EntryType::Reply),
    ("repost-of", EntryType::Repost),
    ("like-of", EntryType::Like),
    ("tag-of", EntryType::Tag),
];

/// Locates the entry that references the target.
///
/// Preference order: the first entry with a property or content link that
/// lenient-matches the target; else the first `h-entry` in the document
/// (after one level of `h-feed` unwrapping); else a minimal entry
/// synthesized from the document `<title>`. Always produces an entry, so a
/// bare page with no microformats still yields a usable mention.
pub fn find_entry(doc: &ParsedDocument, target_url: &str) -> Item {
    let entries = doc.entries();

    if let Some(matched) = entries.iter().find(|e| entry_references(e, target_url)) {
        return (*matched).clone();
    }

    if let Some(first) = entries.first() {
        return (*first).clone();
    }

    // No microformats at all: synthesize from the document title.
    let mut item = Item {
        types: vec!["h-entry".to_string()],
        ..Item::default()
    };
    if let Some(title) = &doc.title {
        item.properties
            .entry("name".to_string())
            .or_default()
            .push(PropertyValue::Text(title.clone()));
    }
    item
}

/// Whether an entry references the target through any property value
/// (recursively through nested cite/entry `url` fields) or through an anchor
/// in its rendered `content`/`summary` HTML.
fn entry_references(entry: &Item, target_url: &str) -> bool {
    for values in entry.properties.values() {
        if values_reference(values, target_url) {
            return true;
        }
    }
    for prop in ["content", "summary"] {
        if let Some(html) = entry.first_html(prop) {
            if html_links_to(html, target_url) {
                return true;
            }
        }
    }
    false
}

fn values_reference(values: &[PropertyValue], target_url: &str) -> bool {
    values.iter().any(|value| match value {
        PropertyValue::Text(t) => lenient_match(t, target_url),
        PropertyValue::Html { .. } => false,
        PropertyValue::Item(nested) => nested
            .property("url")
            .iter()
            .filter_map(PropertyValue::as_text)
            .any(|u| lenient_match(u, target_url)),
    })
}

/// Whether a classifying property of the entry points at the target, either
/// directly or via a nested cite's `url`.
fn property_targets(entry: &Item, property: &str, target_url: &str) -> bool {
    values_reference(entry.property(property), target_url)
}

/// Classifies an entry against the target, returning the semantic type and
/// any explicit RSVP value.
pub fn classify(
    entry: &Item,
    doc: &ParsedDocument,
    target_url: &str,
) -> (EntryType, Option<RsvpValue>) {
    let rsvp = entry
        .first_text("rsvp")
        .and_then(|v| RsvpValue::from_str(v).ok());

    // Document-level rel="in-reply-to" pointing at the target wins outright.
    if doc
        .rel_urls("in-reply-to")
        .iter()
        .any(|u| lenient_match(u, target_url))
    {
        return (EntryType::Reply, rsvp);
    }

    for (property, entry_type) in CLASSIFYING_PROPERTIES {
        if property_targets(entry, property, target_url) {
            return (entry_type, rsvp);
        }
    }

    (EntryType::Mention, rsvp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mf2;

    const TARGET: &str = "https://local.example/notice/42";

    #[test]
    fn test_find_entry_prefers_referencing_entry() {
        let html = format!(
            r#"
            <div class="h-entry"><p class="p-name">unrelated</p></div>
            <div class="h-entry">
                <p class="p-name">the one</p>
                <a class="u-in-reply-to" href="{TARGET}">ctx</a>
            </div>
            "#
        );
        let doc = mf2::parse(&html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        assert_eq!(entry.first_text("name"), Some("the one"));
    }

    #[test]
    fn test_find_entry_falls_back_to_first_entry() {
        let html = r#"<div class="h-entry"><p class="p-name">only</p></div>"#;
        let doc = mf2::parse(html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        assert_eq!(entry.first_text("name"), Some("only"));
    }

    #[test]
    fn test_find_entry_synthesizes_from_title() {
        let doc = mf2::parse(
            "<html><head><title>Hello</title></head><body>plain</body></html>",
            "https://remote.example/",
        );
        let entry = find_entry(&doc, TARGET);
        assert!(entry.has_type("h-entry"));
        assert_eq!(entry.first_text("name"), Some("Hello"));
    }

    #[test]
    fn test_entry_matched_through_content_anchor() {
        let html = format!(
            r#"
            <div class="h-entry">
                <div class="e-content">nice post: <a href="{TARGET}">here</a></div>
            </div>
            "#
        );
        let doc = mf2::parse(&html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        assert!(entry.first_html("content").is_some());
        let (kind, _) = classify(&entry, &doc, TARGET);
        assert_eq!(kind, EntryType::Mention);
    }

    #[test]
    fn test_classify_reply_from_rel_table() {
        let html = format!(
            r#"
            <a rel="in-reply-to" href="{TARGET}">ctx</a>
            <div class="h-entry"><p class="p-content">hi</p></div>
            "#
        );
        let doc = mf2::parse(&html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        let (kind, _) = classify(&entry, &doc, TARGET);
        assert_eq!(kind, EntryType::Reply);
    }

    #[test]
    fn test_classify_precedence_reply_over_like() {
        let html = format!(
            r#"
            <div class="h-entry">
                <a class="u-like-of" href="{TARGET}">fav</a>
                <a class="u-in-reply-to" href="{TARGET}">ctx</a>
            </div>
            "#
        );
        let doc = mf2::parse(&html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        let (kind, _) = classify(&entry, &doc, TARGET);
        assert_eq!(kind, EntryType::Reply);
    }

    #[test]
    fn test_classify_repost_via_nested_cite() {
        let html = format!(
            r#"
            <div class="h-entry">
                <div class="u-repost-of h-cite">
                    <a class="u-url" href="{TARGET}">original</a>
                </div>
            </div>
            "#
        );
        let doc = mf2::parse(&html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        let (kind, _) = classify(&entry, &doc, TARGET);
        assert_eq!(kind, EntryType::Repost);
    }

    #[test]
    fn test_classify_like_with_lenient_url() {
        let html = r#"
            <div class="h-entry">
                <a class="u-like-of" href="http://www.local.example/notice/42/">fav</a>
            </div>
        "#;
        let doc = mf2::parse(html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        let (kind, _) = classify(&entry, &doc, TARGET);
        assert_eq!(kind, EntryType::Like);
    }

    #[test]
    fn test_classify_mention_when_nothing_targets() {
        let html = r#"<div class="h-entry"><p class="p-content">unrelated</p></div>"#;
        let doc = mf2::parse(html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        let (kind, rsvp) = classify(&entry, &doc, TARGET);
        assert_eq!(kind, EntryType::Mention);
        assert!(rsvp.is_none());
    }

    #[test]
    fn test_rsvp_extraction() {
        let html = format!(
            r#"
            <div class="h-entry">
                <a class="u-in-reply-to" href="{TARGET}">event</a>
                <data class="p-rsvp" value="yes">Yes</data>
            </div>
            "#
        );
        let doc = mf2::parse(&html, "https://remote.example/");
        let entry = find_entry(&doc, TARGET);
        let (kind, rsvp) = classify(&entry, &doc, TARGET);
        assert_eq!(kind, EntryType::Reply);
        assert_eq!(rsvp, Some(RsvpValue::Yes));
    }

    #[test]
    fn test_entry_type_display() {
        assert_eq!(EntryType::Reply.to_string(), "reply");
        assert_eq!(EntryType::Mention.to_string(), "mention");
        assert_eq!(RsvpValue::Maybe.to_string(), "maybe");
    }
}
