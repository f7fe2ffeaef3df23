//! Content and identity store interfaces.
//!
//! The backlink pipeline only talks to the surrounding application through
//! these two narrow traits. Mention records and remote actors are owned by
//! the store once handed off; the pipeline never retains references across
//! invocations.
//!
//! Two implementations ship with the crate: [`sqlite::SqliteStore`], the
//! reference implementation, and [`memory::MemoryStore`] for tests and
//! lightweight embedding.

pub mod memory;
mod pool;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::entry::{EntryType, RsvpValue};

pub use pool::{init_db_pool_with_path, run_migrations};

/// Store operation failure.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL execution error.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// The store rejected the record for a non-SQL reason.
    #[error("store rejected record: {0}")]
    Rejected(String),
}

/// A locally owned content item, the valid target of a backlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalContentRef {
    pub id: i64,
    /// Globally unique URI of the item.
    pub uri: String,
    /// Public URL the item is served at.
    pub url: String,
    /// Whether this instance owns the item. Remote content known to the
    /// store is never a valid backlink target.
    pub is_local: bool,
}

/// Handle of a persisted mention record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRecordRef {
    pub id: i64,
    pub uri: String,
}

/// An actor known to the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRecord {
    pub id: i64,
    pub name: String,
    pub profile_url: String,
    pub handle: Option<String>,
    /// Local accounts must never be resolved as remote mention authors.
    pub is_local: bool,
}

/// Lookup key for local content: by URI or by numeric id.
#[derive(Debug, Clone, Copy)]
pub enum ContentKey<'a> {
    Uri(&'a str),
    Id(i64),
}

/// Creation parameters for a mention record.
#[derive(Debug, Clone)]
pub struct MentionOptions {
    /// Canonical URI, normally the effective source URL. Uniqueness is
    /// enforced on this key by the store.
    pub uri: String,
    /// Source URL as originally submitted.
    pub url: String,
    /// Rendered HTML of the mention body.
    pub rendered: String,
    /// The local content item the mention targets.
    pub target: LocalContentRef,
    /// Semantic type of the mention.
    pub kind: EntryType,
    /// RSVP value, when the mention is an RSVP-style reply.
    pub rsvp: Option<RsvpValue>,
    /// Tag list extracted from the source entry.
    pub tags: Vec<String>,
    /// Attachment URLs (photos etc.) extracted from the source entry.
    pub attachments: Vec<String>,
    /// Explicit creation timestamp; the source's published date when known.
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Mention/content persistence, consumed by the pipeline.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Looks up an existing mention by its canonical URI.
    async fn find_by_uri(&self, uri: &str) -> Result<Option<MentionRecordRef>, StoreError>;

    /// Looks up an existing mention by its source URL.
    async fn find_by_url(&self, url: &str) -> Result<Option<MentionRecordRef>, StoreError>;

    /// Persists a mention record. Must be atomic: on failure nothing is
    /// written. A canonical-URI collision with a concurrently created record
    /// resolves to the existing record rather than an error.
    async fn create_mention(
        &self,
        author: &ActorRecord,
        content: &str,
        options: &MentionOptions,
    ) -> Result<MentionRecordRef, StoreError>;

    /// Resolves a local content item by URI or id.
    async fn resolve_local_content(
        &self,
        key: ContentKey<'_>,
    ) -> Result<Option<LocalContentRef>, StoreError>;
}

/// Actor identity lookup and creation, consumed by the author resolver.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Finds the actor owning a profile URL, local or remote.
    async fn find_actor_by_profile_url(
        &self,
        url: &str,
    ) -> Result<Option<ActorRecord>, StoreError>;

    /// Creates a minimal remote actor record. The identity store owns the
    /// record thereafter.
    async fn create_remote_actor(
        &self,
        name: &str,
        profile_url: &str,
        handle: Option<&str>,
    ) -> Result<ActorRecord, StoreError>;
}
