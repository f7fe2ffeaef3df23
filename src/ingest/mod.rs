//! Mention ingestion pipeline.
//!
//! Orchestrates the full inbound flow: fetch the source, confirm it actually
//! references the target, dedupe against previously ingested records, parse
//! and classify the entry, resolve the author, build the body, and persist
//! exactly once. Re-running ingestion for the same (source, target) pair is
//! a no-op returning the existing record.

mod content;

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::author;
use crate::entry::{self, body_references_target, EntryType, RsvpValue};
use crate::error_handling::{ErrorType, LinkbackError, ProcessingStats};
use crate::fetch::Fetcher;
use crate::mf2::{self, PropertyValue};
use crate::store::{
    ActorRecord, ContentStore, IdentityStore, LocalContentRef, MentionOptions, MentionRecordRef,
    StoreError,
};
use crate::target;

pub use content::{build_mention_content, BuiltContent};

/// Result of an ingestion: the record reference, and whether this call
/// created it (false when dedupe short-circuited to an existing record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub record: MentionRecordRef,
    pub created: bool,
}

/// The externally visible "save remote mention" operation.
pub struct Pipeline {
    fetcher: Fetcher,
    content: Arc<dyn ContentStore>,
    identity: Arc<dyn IdentityStore>,
    stats: Arc<ProcessingStats>,
}

impl Pipeline {
    pub fn new(
        fetcher: Fetcher,
        content: Arc<dyn ContentStore>,
        identity: Arc<dyn IdentityStore>,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            fetcher,
            content,
            identity,
            stats,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Resolves an inbound target URL to local content.
    pub async fn resolve_target(&self, url: &str) -> Result<LocalContentRef, LinkbackError> {
        let resolved = target::resolve_target(&self.fetcher, self.content.as_ref(), url).await;
        if matches!(resolved, Err(LinkbackError::UnresolvableTarget(_))) {
            self.stats.increment_error(ErrorType::TargetUnresolvable);
        }
        resolved
    }

    /// Ingests a remote mention of `target` published at `source_url`.
    pub async fn ingest(
        &self,
        source_url: &str,
        target: &LocalContentRef,
    ) -> Result<IngestReport, LinkbackError> {
        let fetch = match self.fetcher.get(source_url).await {
            Ok(fetch) => fetch,
            Err(e) => {
                self.stats.increment_error(ErrorType::FetchNetworkError);
                return Err(e);
            }
        };
        let fetch = match fetch.require_success() {
            Ok(fetch) => fetch,
            Err(e) => {
                self.stats.increment_error(ErrorType::FetchStatusError);
                return Err(e);
            }
        };

        // Spam guard: the body must reference the target before any parsing
        // is attempted.
        if !body_references_target(&fetch.body, &target.url) {
            self.stats.increment_error(ErrorType::BacklinkUnconfirmed);
            return Err(LinkbackError::UnconfirmedBacklink(source_url.to_string()));
        }

        // First dedupe pass: effective URL, then the URL as submitted.
        if let Some(existing) = self.find_existing(&fetch.effective_url).await? {
            debug!("Duplicate mention (effective URL) from {source_url}");
            return Ok(IngestReport {
                record: existing,
                created: false,
            });
        }
        if let Some(existing) = self.find_existing(source_url).await? {
            debug!("Duplicate mention (original source URL) from {source_url}");
            return Ok(IngestReport {
                record: existing,
                created: false,
            });
        }

        let doc = mf2::parse(&fetch.body, &fetch.effective_url);
        let entry_item = entry::find_entry(&doc, &target.url);
        let (kind, rsvp) = entry::classify(&entry_item, &doc, &target.url);
        let actor = author::resolve_author(&entry_item, &doc, &fetch);

        let author_record = self.resolve_actor_record(source_url, &actor).await?;

        // Second dedupe pass on the entry's own declared permalink.
        if let Some(permalink) = entry_item.first_text("url") {
            if permalink != fetch.effective_url {
                if let Some(existing) = self.find_existing(permalink).await? {
                    debug!("Duplicate mention (declared permalink) from {source_url}");
                    return Ok(IngestReport {
                        record: existing,
                        created: false,
                    });
                }
            }
        }

        let built = build_mention_content(&entry_item, source_url);
        let options = MentionOptions {
            uri: fetch.effective_url.clone(),
            url: source_url.to_string(),
            rendered: built.rendered,
            target: target.clone(),
            kind,
            rsvp: rsvp.filter(|_| kind == EntryType::Reply),
            tags: property_texts(&entry_item.property("category")),
            attachments: attachment_urls(&entry_item),
            created_at: published_at(&entry_item),
        };

        if is_favorite_event(kind, options.rsvp) {
            debug!(
                "Persisting {} from {source_url} as favorite/RSVP event on {}",
                kind, target.uri
            );
        }

        let record = self
            .content
            .create_mention(&author_record, &built.plain, &options)
            .await
            .map_err(|e| {
                self.stats.increment_error(ErrorType::PersistenceFailure);
                LinkbackError::Persistence {
                    url: source_url.to_string(),
                    message: e.to_string(),
                }
            })?;

        info!(
            "Saved {} mention of {} from {} as {}",
            kind, target.uri, source_url, record.uri
        );
        Ok(IngestReport {
            record,
            created: true,
        })
    }

    /// Two-key lookup (as-URI, then as-URL) used by both dedupe passes.
    async fn find_existing(&self, key: &str) -> Result<Option<MentionRecordRef>, LinkbackError> {
        if let Some(existing) = self
            .content
            .find_by_uri(key)
            .await
            .map_err(|e| self.store_failure(key, e))?
        {
            return Ok(Some(existing));
        }
        self.content
            .find_by_url(key)
            .await
            .map_err(|e| self.store_failure(key, e))
    }

    async fn resolve_actor_record(
        &self,
        source_url: &str,
        actor: &author::RemoteActor,
    ) -> Result<ActorRecord, LinkbackError> {
        match self
            .identity
            .find_actor_by_profile_url(&actor.profile_url)
            .await
            .map_err(|e| self.store_failure(source_url, e))?
        {
            Some(existing) if existing.is_local => {
                self.stats.increment_error(ErrorType::ActorConflict);
                Err(LinkbackError::LocalActorConflict(actor.profile_url.clone()))
            }
            Some(existing) => Ok(existing),
            None => self
                .identity
                .create_remote_actor(&actor.name, &actor.profile_url, actor.handle.as_deref())
                .await
                .map_err(|e| self.store_failure(source_url, e)),
        }
    }

    fn store_failure(&self, url: &str, e: StoreError) -> LinkbackError {
        LinkbackError::Persistence {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Whether the mention persists as a favorite/RSVP-style event rather than
/// a plain mention post: a like, or a reply carrying an explicit RSVP.
fn is_favorite_event(kind: EntryType, rsvp: Option<RsvpValue>) -> bool {
    kind == EntryType::Like || (kind == EntryType::Reply && rsvp.is_some())
}

fn property_texts(values: &[PropertyValue]) -> Vec<String> {
    values
        .iter()
        .filter_map(PropertyValue::as_text)
        .map(str::to_string)
        .collect()
}

fn attachment_urls(entry: &crate::mf2::Item) -> Vec<String> {
    ["photo", "video", "audio"]
        .iter()
        .flat_map(|p| property_texts(&entry.property(p)))
        .collect()
}

fn published_at(entry: &crate::mf2::Item) -> Option<DateTime<Utc>> {
    let raw = entry.first_text("published")?;
    DateTime::<chrono::FixedOffset>::from_str(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
