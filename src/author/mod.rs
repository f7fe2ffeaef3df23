//! Remote author resolution.
//!
//! Extracts or synthesizes the actor behind a remote mention. Resolution
//! order: the entry's own `author` h-card, then a document-level h-card
//! whose `url` lenient-matches the effective URL, then a synthetic actor
//! built from whatever name the page offers and the effective URL itself.

use log::debug;

use crate::entry::lenient_match;
use crate::fetch::FetchResult;
use crate::mf2::{Item, ParsedDocument};

/// A remote actor identity, prior to identity-store resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteActor {
    /// Display name.
    pub name: String,
    /// Canonical profile URL.
    pub profile_url: String,
    /// Short handle (nickname), when the card declares one.
    pub handle: Option<String>,
}

/// Resolves the author of an entry within its source document.
pub fn resolve_author(entry: &Item, doc: &ParsedDocument, fetch: &FetchResult) -> RemoteActor {
    if let Some(card) = entry.first_item("author").filter(|i| i.has_type("h-card")) {
        debug!("Author resolved from entry h-card for {}", fetch.effective_url);
        return card_to_actor(card, &fetch.effective_url);
    }

    if let Some(card) = doc.all_items().into_iter().find(|item| {
        item.has_type("h-card")
            && item
                .first_text("url")
                .is_some_and(|u| lenient_match(u, &fetch.effective_url))
    }) {
        debug!(
            "Author resolved from document h-card for {}",
            fetch.effective_url
        );
        return card_to_actor(card, &fetch.effective_url);
    }

    // Synthetic actor: the page itself stands in as the author's profile.
    let name = entry
        .first_text("name")
        .map(str::to_string)
        .or_else(|| doc.title.clone())
        .unwrap_or_else(|| fetch.effective_url.clone());
    debug!("Synthesized author '{name}' for {}", fetch.effective_url);
    RemoteActor {
        name,
        profile_url: fetch.effective_url.clone(),
        handle: None,
    }
}

fn card_to_actor(card: &Item, effective_url: &str) -> RemoteActor {
    let profile_url = card
        .first_text("url")
        .map(str::to_string)
        .unwrap_or_else(|| effective_url.to_string());
    let name = card
        .first_text("name")
        .or_else(|| card.first_text("nickname"))
        .map(str::to_string)
        .unwrap_or_else(|| profile_url.clone());
    RemoteActor {
        name,
        profile_url,
        handle: card.first_text("nickname").map(str::to_string),
    }
}
