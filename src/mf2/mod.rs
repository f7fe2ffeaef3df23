//! Microformats2 extraction from remote HTML.
//!
//! Parses an arbitrary remote document into a tree of [`Item`]s plus a
//! document-wide rel-table. Parsing is lenient: html5ever recovers from
//! malformed markup, so this module never fails on bad input; at worst it
//! produces an empty document.

mod item;

use std::collections::HashMap;

use scraper::{ElementRef, Html};
use url::Url;

pub use item::{Item, PropertyValue};

use crate::utils::parse_selector;

/// A fully parsed remote document. Read-only once produced.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Top-level microformat items in document order.
    pub items: Vec<Item>,
    /// rel name -> href list, from every `<a rel>` and `<link rel>`.
    pub rels: HashMap<String, Vec<String>>,
    /// The document `<title>`, if present.
    pub title: Option<String>,
}

impl ParsedDocument {
    /// URLs registered under a rel value; empty slice if none.
    pub fn rel_urls(&self, rel: &str) -> &[String] {
        self.rels.get(rel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Top-level `h-entry` items, unwrapping one level of `h-feed`.
    pub fn entries(&self) -> Vec<&Item> {
        let mut out = Vec::new();
        for item in &self.items {
            if item.has_type("h-entry") {
                out.push(item);
            } else if item.has_type("h-feed") {
                for child in &item.children {
                    if child.has_type("h-entry") {
                        out.push(child);
                    }
                }
            }
        }
        out
    }

    /// Every item in the document, depth-first, including nested property
    /// values and children.
    pub fn all_items(&self) -> Vec<&Item> {
        fn walk<'a>(item: &'a Item, out: &mut Vec<&'a Item>) {
            out.push(item);
            for values in item.properties.values() {
                for value in values {
                    if let PropertyValue::Item(nested) = value {
                        walk(nested, out);
                    }
                }
            }
            for child in &item.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        for item in &self.items {
            walk(item, &mut out);
        }
        out
    }
}

/// Parses an HTML document into items and a rel-table, resolving relative
/// URLs against `base_url`.
pub fn parse(html: &str, base_url: &str) -> ParsedDocument {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let mut items = Vec::new();
    collect_roots(document.root_element(), base.as_ref(), &mut items);

    ParsedDocument {
        items,
        rels: collect_rels(&document, base.as_ref()),
        title: extract_title(&document),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = parse_selector("title");
    document
        .select(&selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn collect_rels(document: &Html, base: Option<&Url>) -> HashMap<String, Vec<String>> {
    let mut rels: HashMap<String, Vec<String>> = HashMap::new();
    let selector = parse_selector("a[rel][href], link[rel][href]");
    for element in document.select(&selector) {
        let (Some(rel), Some(href)) = (element.value().attr("rel"), element.value().attr("href"))
        else {
            continue;
        };
        let resolved = resolve_url(href, base);
        for token in rel.split_whitespace() {
            let urls = rels.entry(token.to_ascii_lowercase()).or_default();
            if !urls.contains(&resolved) {
                urls.push(resolved.clone());
            }
        }
    }
    rels
}

/// Root `h-*` classes of an element, or `None` if it starts no item.
fn root_types(element: ElementRef) -> Option<Vec<String>> {
    let types: Vec<String> = element
        .value()
        .classes()
        .filter(|c| c.starts_with("h-") && c.len() > 2)
        .map(str::to_string)
        .collect();
    if types.is_empty() {
        None
    } else {
        Some(types)
    }
}

/// Property classes (`p-`/`u-`/`dt-`/`e-`) of an element as (prefix, name).
fn property_classes(element: ElementRef) -> Vec<(char, String)> {
    element
        .value()
        .classes()
        .filter_map(|c| {
            let (prefix, name) = c.split_once('-')?;
            if name.is_empty() {
                return None;
            }
            match prefix {
                "p" | "u" | "e" => Some((prefix.chars().next().unwrap(), name.to_string())),
                "dt" => Some(('d', name.to_string())),
                _ => None,
            }
        })
        .collect()
}

fn collect_roots(element: ElementRef, base: Option<&Url>, out: &mut Vec<Item>) {
    if let Some(types) = root_types(element) {
        out.push(parse_item(element, types, base));
        return;
    }
    for child in child_elements(element) {
        collect_roots(child, base, out);
    }
}

fn parse_item(element: ElementRef, types: Vec<String>, base: Option<&Url>) -> Item {
    let mut item = Item {
        types,
        ..Item::default()
    };
    for child in child_elements(element) {
        collect_properties(child, base, &mut item);
    }

    // Implied url: an <a>/<area>/<link> root carries its own href.
    if !item.properties.contains_key("url") {
        if let ("a" | "area" | "link", Some(href)) =
            (element.value().name(), element.value().attr("href"))
        {
            item.properties
                .entry("url".to_string())
                .or_default()
                .push(PropertyValue::Text(resolve_url(href, base)));
        }
    }

    // Implied name: a simple item with no parsed body takes its text
    // content. Covers the common `<a class="p-author h-card" href=..>Name</a>`
    // shape without polluting entries that carry real properties.
    let only_implied_props = item
        .properties
        .keys()
        .all(|k| k == "url" || k == "photo");
    if only_implied_props && item.children.is_empty() {
        let text = normalize_whitespace(&element.text().collect::<String>());
        if !text.is_empty() {
            item.properties
                .entry("name".to_string())
                .or_default()
                .push(PropertyValue::Text(text));
        }
    }

    item
}

fn collect_properties(element: ElementRef, base: Option<&Url>, item: &mut Item) {
    let props = property_classes(element);

    if let Some(types) = root_types(element) {
        // A nested h-* consumes its whole subtree: either as a property
        // value or as an anonymous child item.
        let nested = parse_item(element, types, base);
        if props.is_empty() {
            item.children.push(nested);
        } else {
            for (_, name) in props {
                item.properties
                    .entry(name)
                    .or_default()
                    .push(PropertyValue::Item(nested.clone()));
            }
        }
        return;
    }

    for (prefix, name) in props {
        let value = match prefix {
            'u' => PropertyValue::Text(url_value(element, base)),
            'd' => PropertyValue::Text(datetime_value(element)),
            'e' => PropertyValue::Html {
                html: element.inner_html(),
                text: normalize_whitespace(&element.text().collect::<String>()),
            },
            _ => PropertyValue::Text(normalize_whitespace(&element.text().collect::<String>())),
        };
        item.properties.entry(name).or_default().push(value);
    }

    for child in child_elements(element) {
        collect_properties(child, base, item);
    }
}

/// Value of a `u-*` property: the URL-bearing attribute appropriate for the
/// element, resolved against the base, falling back to text content.
fn url_value(element: ElementRef, base: Option<&Url>) -> String {
    let tag = element.value().name();
    let attr = match tag {
        "a" | "area" | "link" => element.value().attr("href"),
        "img" | "audio" | "video" | "source" | "iframe" => element.value().attr("src"),
        "object" => element.value().attr("data"),
        _ => None,
    };
    match attr {
        Some(v) => resolve_url(v, base),
        None => normalize_whitespace(&element.text().collect::<String>()),
    }
}

/// Value of a `dt-*` property: the `datetime` attribute when present.
fn datetime_value(element: ElementRef) -> String {
    match element.value().attr("datetime") {
        Some(v) => v.trim().to_string(),
        None => normalize_whitespace(&element.text().collect::<String>()),
    }
}

fn resolve_url(href: &str, base: Option<&Url>) -> String {
    let href = href.trim();
    match base {
        Some(base) => match base.join(href) {
            Ok(joined) => joined.to_string(),
            Err(_) => href.to_string(),
        },
        None => href.to_string(),
    }
}

fn child_elements(element: ElementRef) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_entry() {
        let html = r#"
            <html><body>
                <article class="h-entry">
                    <h1 class="p-name">Hello World</h1>
                    <a class="u-url" href="/post/1">permalink</a>
                    <div class="e-content"><p>Some <b>bold</b> text</p></div>
                </article>
            </body></html>
        "#;
        let doc = parse(html, "https://remote.example/post/1");
        assert_eq!(doc.items.len(), 1);
        let entry = &doc.items[0];
        assert!(entry.has_type("h-entry"));
        assert_eq!(entry.first_text("name"), Some("Hello World"));
        assert_eq!(
            entry.first_text("url"),
            Some("https://remote.example/post/1")
        );
        let html_value = entry.first_html("content").unwrap();
        assert!(html_value.contains("<b>bold</b>"));
        assert_eq!(entry.first_text("content"), Some("Some bold text"));
    }

    #[test]
    fn test_nested_card_becomes_property_item() {
        let html = r#"
            <div class="h-entry">
                <a class="p-author h-card" href="https://author.example/">
                    <span class="p-name">Alice</span>
                </a>
                <p class="p-content">hi</p>
            </div>
        "#;
        let doc = parse(html, "https://remote.example/");
        let entry = &doc.items[0];
        let author = entry.first_item("author").expect("author item");
        assert!(author.has_type("h-card"));
        assert_eq!(author.first_text("name"), Some("Alice"));
    }

    #[test]
    fn test_bare_nested_item_becomes_child() {
        let html = r#"
            <div class="h-feed">
                <div class="h-entry"><p class="p-name">One</p></div>
                <div class="h-entry"><p class="p-name">Two</p></div>
            </div>
        "#;
        let doc = parse(html, "https://remote.example/");
        assert_eq!(doc.items.len(), 1);
        assert!(doc.items[0].has_type("h-feed"));
        assert_eq!(doc.items[0].children.len(), 2);

        // h-feed is unwrapped one level during entry search
        let entries = doc.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].first_text("name"), Some("One"));
    }

    #[test]
    fn test_rel_table_with_relative_hrefs() {
        let html = r#"
            <html><head>
                <link rel="webmention" href="/wm">
            </head><body>
                <a rel="in-reply-to" href="https://local.example/notice/42">ctx</a>
                <a rel="nofollow in-reply-to" href="https://local.example/notice/43">ctx</a>
            </body></html>
        "#;
        let doc = parse(html, "https://remote.example/post/1");
        assert_eq!(
            doc.rel_urls("webmention"),
            &["https://remote.example/wm".to_string()]
        );
        assert_eq!(doc.rel_urls("in-reply-to").len(), 2);
        assert_eq!(doc.rel_urls("nofollow").len(), 1);
    }

    #[test]
    fn test_title_extraction() {
        let doc = parse(
            "<html><head><title>  Hello  World </title></head><body></body></html>",
            "https://remote.example/",
        );
        assert_eq!(doc.title.as_deref(), Some("Hello World"));
    }

    #[test]
    fn test_malformed_html_does_not_panic() {
        let doc = parse(
            "<div class=\"h-entry\"><p class=\"p-name\">broken<div></span></p>",
            "https://remote.example/",
        );
        assert_eq!(doc.items.len(), 1);
    }

    #[test]
    fn test_document_without_microformats() {
        let doc = parse(
            "<html><head><title>Plain</title></head><body><p>text</p></body></html>",
            "https://remote.example/",
        );
        assert!(doc.items.is_empty());
        assert!(doc.entries().is_empty());
        assert_eq!(doc.title.as_deref(), Some("Plain"));
    }

    #[test]
    fn test_dt_property_prefers_datetime_attr() {
        let html = r#"
            <div class="h-entry">
                <time class="dt-published" datetime="2024-03-01T10:00:00Z">March 1</time>
            </div>
        "#;
        let doc = parse(html, "https://remote.example/");
        assert_eq!(
            doc.items[0].first_text("published"),
            Some("2024-03-01T10:00:00Z")
        );
    }

    #[test]
    fn test_u_property_from_img_src() {
        let html = r#"
            <div class="h-entry">
                <img class="u-photo" src="/cat.jpg" alt="">
            </div>
        "#;
        let doc = parse(html, "https://remote.example/post/1");
        assert_eq!(
            doc.items[0].first_text("photo"),
            Some("https://remote.example/cat.jpg")
        );
    }
}
