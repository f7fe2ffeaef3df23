//! SQLite-backed reference implementation of the store interfaces.
//!
//! Uniqueness of mention records is enforced by the UNIQUE index on
//! `mentions.uri`; a concurrent insert of the same canonical URI loses the
//! race and resolves to the existing row. That constraint, not an in-process
//! lock, is what keeps concurrent ingestions of one source down to a single
//! record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sqlx::{Row, SqlitePool};

use super::{
    init_db_pool_with_path, run_migrations, ActorRecord, ContentKey, ContentStore, IdentityStore,
    LocalContentRef, MentionOptions, MentionRecordRef, StoreError,
};

/// Store backed by a SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Opens (creating if necessary) the database at `path` and applies
    /// migrations.
    pub async fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let pool = init_db_pool_with_path(path).await?;
        run_migrations(&pool)
            .await
            .map_err(|e| StoreError::Rejected(format!("migration failed: {e}")))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Registers a content item. Rows with `is_local = true` are valid
    /// backlink targets.
    pub async fn insert_content(
        &self,
        uri: &str,
        url: &str,
        is_local: bool,
    ) -> Result<LocalContentRef, StoreError> {
        let row = sqlx::query(
            "INSERT INTO local_content (uri, url, is_local, created_at) VALUES (?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(uri)
        .bind(url)
        .bind(is_local)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(LocalContentRef {
            id: row.get::<i64, _>("id"),
            uri: uri.to_string(),
            url: url.to_string(),
            is_local,
        })
    }

    /// Registers a local account, used when seeding an instance.
    pub async fn insert_local_actor(
        &self,
        name: &str,
        profile_url: &str,
    ) -> Result<ActorRecord, StoreError> {
        let row = sqlx::query(
            "INSERT INTO actors (name, profile_url, handle, is_local, created_at) \
             VALUES (?, ?, NULL, 1, ?) RETURNING id",
        )
        .bind(name)
        .bind(profile_url)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(ActorRecord {
            id: row.get::<i64, _>("id"),
            name: name.to_string(),
            profile_url: profile_url.to_string(),
            handle: None,
            is_local: true,
        })
    }

    async fn mention_ref_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<MentionRecordRef>, StoreError> {
        // column is one of two fixed identifiers, never user input
        let sql = format!("SELECT id, uri FROM mentions WHERE {column} = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.map(|r| MentionRecordRef {
            id: r.get::<i64, _>("id"),
            uri: r.get::<String, _>("uri"),
        }))
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn find_by_uri(&self, uri: &str) -> Result<Option<MentionRecordRef>, StoreError> {
        self.mention_ref_where("uri", uri).await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<MentionRecordRef>, StoreError> {
        self.mention_ref_where("url", url).await
    }

    async fn create_mention(
        &self,
        author: &ActorRecord,
        content: &str,
        options: &MentionOptions,
    ) -> Result<MentionRecordRef, StoreError> {
        let created_at = options
            .created_at
            .unwrap_or_else(Utc::now)
            .timestamp_millis();
        let tags = serde_json::to_string(&options.tags).unwrap_or_else(|_| "[]".to_string());
        let attachments =
            serde_json::to_string(&options.attachments).unwrap_or_else(|_| "[]".to_string());

        let insert = sqlx::query(
            "INSERT INTO mentions \
             (uri, url, author_id, content, rendered, kind, rsvp, target_id, tags, attachments, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&options.uri)
        .bind(&options.url)
        .bind(author.id)
        .bind(content)
        .bind(&options.rendered)
        .bind(options.kind.to_string())
        .bind(options.rsvp.map(|r| r.to_string()))
        .bind(options.target.id)
        .bind(tags)
        .bind(attachments)
        .bind(created_at)
        .fetch_one(self.pool.as_ref())
        .await;

        match insert {
            Ok(row) => Ok(MentionRecordRef {
                id: row.get::<i64, _>("id"),
                uri: options.uri.clone(),
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                debug!(
                    "Lost canonical-URI race for {}; resolving to existing record",
                    options.uri
                );
                self.find_by_uri(&options.uri)
                    .await?
                    .ok_or_else(|| StoreError::Sql(sqlx::Error::Database(db)))
            }
            Err(e) => Err(StoreError::Sql(e)),
        }
    }

    async fn resolve_local_content(
        &self,
        key: ContentKey<'_>,
    ) -> Result<Option<LocalContentRef>, StoreError> {
        let row = match key {
            ContentKey::Uri(uri) => {
                // Content is addressable by its canonical URI or its public URL;
                // inbound targets usually name the latter.
                sqlx::query("SELECT id, uri, url, is_local FROM local_content WHERE uri = ? OR url = ?")
                    .bind(uri)
                    .bind(uri)
                    .fetch_optional(self.pool.as_ref())
                    .await?
            }
            ContentKey::Id(id) => {
                sqlx::query("SELECT id, uri, url, is_local FROM local_content WHERE id = ?")
                    .bind(id)
                    .fetch_optional(self.pool.as_ref())
                    .await?
            }
        };
        Ok(row.map(|r| LocalContentRef {
            id: r.get::<i64, _>("id"),
            uri: r.get::<String, _>("uri"),
            url: r.get::<String, _>("url"),
            is_local: r.get::<bool, _>("is_local"),
        }))
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn find_actor_by_profile_url(
        &self,
        url: &str,
    ) -> Result<Option<ActorRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, profile_url, handle, is_local FROM actors WHERE profile_url = ?",
        )
        .bind(url)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(row.map(|r| ActorRecord {
            id: r.get::<i64, _>("id"),
            name: r.get::<String, _>("name"),
            profile_url: r.get::<String, _>("profile_url"),
            handle: r.get::<Option<String>, _>("handle"),
            is_local: r.get::<bool, _>("is_local"),
        }))
    }

    async fn create_remote_actor(
        &self,
        name: &str,
        profile_url: &str,
        handle: Option<&str>,
    ) -> Result<ActorRecord, StoreError> {
        let row = sqlx::query(
            "INSERT INTO actors (name, profile_url, handle, is_local, created_at) \
             VALUES (?, ?, ?, 0, ?) RETURNING id",
        )
        .bind(name)
        .bind(profile_url)
        .bind(handle)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(ActorRecord {
            id: row.get::<i64, _>("id"),
            name: name.to_string(),
            profile_url: profile_url.to_string(),
            handle: handle.map(str::to_string),
            is_local: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    async fn open_test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteStore::open(&dir.path().join("test.db"))
            .await
            .expect("open store");
        (store, dir)
    }

    fn options_for(target: &LocalContentRef, uri: &str) -> MentionOptions {
        MentionOptions {
            uri: uri.to_string(),
            url: uri.to_string(),
            rendered: "<p>hi</p>".to_string(),
            target: target.clone(),
            kind: EntryType::Mention,
            rsvp: None,
            tags: vec![],
            attachments: vec![],
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_mention() {
        let (store, _dir) = open_test_store().await;
        let target = store
            .insert_content("tag:local,1", "https://local.example/notice/1", true)
            .await
            .unwrap();
        let author = store
            .create_remote_actor("Remote", "https://remote.example/", None)
            .await
            .unwrap();

        let options = options_for(&target, "https://remote.example/post/1");
        let record = store.create_mention(&author, "hi", &options).await.unwrap();

        let by_uri = store
            .find_by_uri("https://remote.example/post/1")
            .await
            .unwrap();
        assert_eq!(by_uri, Some(record.clone()));
        let by_url = store
            .find_by_url("https://remote.example/post/1")
            .await
            .unwrap();
        assert_eq!(by_url, Some(record));
    }

    #[tokio::test]
    async fn test_duplicate_uri_resolves_to_existing_record() {
        let (store, _dir) = open_test_store().await;
        let target = store
            .insert_content("tag:local,1", "https://local.example/notice/1", true)
            .await
            .unwrap();
        let author = store
            .create_remote_actor("Remote", "https://remote.example/", None)
            .await
            .unwrap();

        let options = options_for(&target, "https://remote.example/post/1");
        let first = store.create_mention(&author, "hi", &options).await.unwrap();
        let second = store.create_mention(&author, "hi", &options).await.unwrap();
        assert_eq!(first, second);

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM mentions")
            .fetch_one(store.pool())
            .await
            .map(|r| r.get("n"))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_resolve_local_content_by_uri_and_id() {
        let (store, _dir) = open_test_store().await;
        let item = store
            .insert_content("tag:local,42", "https://local.example/notice/42", true)
            .await
            .unwrap();

        let by_uri = store
            .resolve_local_content(ContentKey::Uri("tag:local,42"))
            .await
            .unwrap();
        assert_eq!(by_uri, Some(item.clone()));
        let by_id = store
            .resolve_local_content(ContentKey::Id(item.id))
            .await
            .unwrap();
        assert_eq!(by_id, Some(item));

        let missing = store
            .resolve_local_content(ContentKey::Id(9999))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_local_actor_flag() {
        let (store, _dir) = open_test_store().await;
        store
            .insert_local_actor("alice", "https://local.example/alice")
            .await
            .unwrap();
        let actor = store
            .find_actor_by_profile_url("https://local.example/alice")
            .await
            .unwrap()
            .expect("actor exists");
        assert!(actor.is_local);

        let remote = store
            .create_remote_actor("bob", "https://remote.example/bob", Some("bob"))
            .await
            .unwrap();
        assert!(!remote.is_local);
        assert_eq!(remote.handle.as_deref(), Some("bob"));
    }
}
