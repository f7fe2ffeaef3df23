//! In-memory store for tests and lightweight embedding.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ActorRecord, ContentKey, ContentStore, IdentityStore, LocalContentRef, MentionOptions,
    MentionRecordRef, StoreError,
};

/// A mention as captured by the in-memory store, with everything a test
/// needs to assert on.
#[derive(Debug, Clone)]
pub struct StoredMention {
    pub record: MentionRecordRef,
    pub author: ActorRecord,
    pub content: String,
    pub options: MentionOptions,
}

#[derive(Default)]
struct Inner {
    mentions: Vec<StoredMention>,
    actors: Vec<ActorRecord>,
    content: Vec<LocalContentRef>,
    fail_mentions: bool,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store keeping everything in a `Mutex`-guarded vec. Mirrors the uniqueness
/// semantics of the SQLite store: creating a mention with an existing
/// canonical URI returns the existing record.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a content item and returns its reference.
    pub fn add_content(&self, uri: &str, url: &str, is_local: bool) -> LocalContentRef {
        let mut inner = self.inner.lock().unwrap();
        let item = LocalContentRef {
            id: inner.next_id(),
            uri: uri.to_string(),
            url: url.to_string(),
            is_local,
        };
        inner.content.push(item.clone());
        item
    }

    /// Registers a local account.
    pub fn add_local_actor(&self, name: &str, profile_url: &str) -> ActorRecord {
        let mut inner = self.inner.lock().unwrap();
        let actor = ActorRecord {
            id: inner.next_id(),
            name: name.to_string(),
            profile_url: profile_url.to_string(),
            handle: None,
            is_local: true,
        };
        inner.actors.push(actor.clone());
        actor
    }

    /// Makes the next `create_mention` call fail, for persistence-error paths.
    pub fn fail_next_mention(&self) {
        self.inner.lock().unwrap().fail_mentions = true;
    }

    /// Snapshot of all stored mentions.
    pub fn mentions(&self) -> Vec<StoredMention> {
        self.inner.lock().unwrap().mentions.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn find_by_uri(&self, uri: &str) -> Result<Option<MentionRecordRef>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .mentions
            .iter()
            .find(|m| m.options.uri == uri)
            .map(|m| m.record.clone()))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<MentionRecordRef>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .mentions
            .iter()
            .find(|m| m.options.url == url)
            .map(|m| m.record.clone()))
    }

    async fn create_mention(
        &self,
        author: &ActorRecord,
        content: &str,
        options: &MentionOptions,
    ) -> Result<MentionRecordRef, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_mentions {
            inner.fail_mentions = false;
            return Err(StoreError::Rejected("simulated store failure".to_string()));
        }
        if let Some(existing) = inner.mentions.iter().find(|m| m.options.uri == options.uri) {
            return Ok(existing.record.clone());
        }
        let record = MentionRecordRef {
            id: inner.next_id(),
            uri: options.uri.clone(),
        };
        inner.mentions.push(StoredMention {
            record: record.clone(),
            author: author.clone(),
            content: content.to_string(),
            options: options.clone(),
        });
        Ok(record)
    }

    async fn resolve_local_content(
        &self,
        key: ContentKey<'_>,
    ) -> Result<Option<LocalContentRef>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .content
            .iter()
            .find(|c| match key {
                ContentKey::Uri(uri) => c.uri == uri || c.url == uri,
                ContentKey::Id(id) => c.id == id,
            })
            .cloned())
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_actor_by_profile_url(
        &self,
        url: &str,
    ) -> Result<Option<ActorRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .actors
            .iter()
            .find(|a| a.profile_url == url)
            .cloned())
    }

    async fn create_remote_actor(
        &self,
        name: &str,
        profile_url: &str,
        handle: Option<&str>,
    ) -> Result<ActorRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let actor = ActorRecord {
            id: inner.next_id(),
            name: name.to_string(),
            profile_url: profile_url.to_string(),
            handle: handle.map(str::to_string),
            is_local: false,
        };
        inner.actors.push(actor.clone());
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    fn options_for(target: &LocalContentRef, uri: &str) -> MentionOptions {
        MentionOptions {
            uri: uri.to_string(),
            url: uri.to_string(),
            rendered: String::new(),
            target: target.clone(),
            kind: EntryType::Mention,
            rsvp: None,
            tags: vec![],
            attachments: vec![],
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_uri_returns_existing() {
        let store = MemoryStore::new();
        let target = store.add_content("tag:1", "https://local.example/1", true);
        let author = store
            .create_remote_actor("r", "https://remote.example/", None)
            .await
            .unwrap();
        let options = options_for(&target, "https://remote.example/p");
        let first = store.create_mention(&author, "a", &options).await.unwrap();
        let second = store.create_mention(&author, "b", &options).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.mentions().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_mention() {
        let store = MemoryStore::new();
        let target = store.add_content("tag:1", "https://local.example/1", true);
        let author = store
            .create_remote_actor("r", "https://remote.example/", None)
            .await
            .unwrap();
        store.fail_next_mention();
        let options = options_for(&target, "https://remote.example/p");
        assert!(store.create_mention(&author, "a", &options).await.is_err());
        // next call succeeds again
        assert!(store.create_mention(&author, "a", &options).await.is_ok());
    }
}
