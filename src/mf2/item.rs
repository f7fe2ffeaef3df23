//! Parsed microformats2 items.

use std::collections::HashMap;

/// A single parsed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Plain text (`p-*`, `u-*`, `dt-*` properties).
    Text(String),
    /// Embedded markup (`e-*` properties), kept both raw and flattened.
    Html { html: String, text: String },
    /// A nested microformat item (e.g. an `h-card` author or `h-cite`).
    Item(Item),
}

impl PropertyValue {
    /// The text form of this value, if it has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(t) => Some(t),
            PropertyValue::Html { text, .. } => Some(text),
            PropertyValue::Item(_) => None,
        }
    }

    /// The nested item, if this value is one.
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            PropertyValue::Item(item) => Some(item),
            _ => None,
        }
    }
}

/// A microformats2 item: an element carrying one or more `h-*` root classes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    /// Root types, e.g. `["h-entry"]`.
    pub types: Vec<String>,
    /// Parsed properties by name (without the `p-`/`u-`/`dt-`/`e-` prefix).
    pub properties: HashMap<String, Vec<PropertyValue>>,
    /// Nested items not consumed as property values.
    pub children: Vec<Item>,
}

impl Item {
    pub fn has_type(&self, t: &str) -> bool {
        self.types.iter().any(|ty| ty == t)
    }

    /// All values of a property; empty slice if absent.
    pub fn property(&self, name: &str) -> &[PropertyValue] {
        self.properties.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First text value of a property.
    pub fn first_text(&self, name: &str) -> Option<&str> {
        self.property(name).iter().find_map(PropertyValue::as_text)
    }

    /// First raw-HTML value of a property (`e-*` only).
    pub fn first_html(&self, name: &str) -> Option<&str> {
        self.property(name).iter().find_map(|v| match v {
            PropertyValue::Html { html, .. } => Some(html.as_str()),
            _ => None,
        })
    }

    /// First nested item carried by a property.
    pub fn first_item(&self, name: &str) -> Option<&Item> {
        self.property(name).iter().find_map(PropertyValue::as_item)
    }
}
