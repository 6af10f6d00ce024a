//! Identity and interaction snapshots on top of the local key-value store.
//!
//! All access to the shared keys goes through the functions here; nothing
//! else in the crate knows the key names.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::db;
use crate::model::{Identity, InteractionState};

pub const GUEST_ID_KEY: &str = "guestId";
pub const USER_ID_KEY: &str = "user_id";
pub const USER_PROFILE_KEY: &str = "user";
const ANONYMOUS: &str = "anonymous";
const SNAPSHOT_PREFIX: &str = "article_";
const SNAPSHOT_SUFFIX: &str = "_interactions";

/// Key of the per-article interaction snapshot.
pub fn interactions_key(article_id: &str) -> String {
    format!("{}{}{}", SNAPSHOT_PREFIX, article_id, SNAPSHOT_SUFFIX)
}

/// A persisted snapshot together with its article and last write time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub article_id: String,
    pub state: InteractionState,
    pub updated_at: NaiveDateTime,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// SQLite-backed store shared by every view using the same database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: db::Pool,
}

impl SqliteStore {
    pub fn new(pool: db::Pool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = db::init_pool(database_url).await?;
        db::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Every readable interaction snapshot, ordered by key.
    pub async fn snapshots(&self) -> Result<Vec<StoredSnapshot>> {
        let rows = db::kv_list_prefix(&self.pool, SNAPSHOT_PREFIX).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(article_id) = row
                .key
                .strip_prefix(SNAPSHOT_PREFIX)
                .and_then(|rest| rest.strip_suffix(SNAPSHOT_SUFFIX))
            else {
                continue;
            };
            match serde_json::from_str(&row.value) {
                Ok(state) => out.push(StoredSnapshot {
                    article_id: article_id.to_string(),
                    state,
                    updated_at: row.updated_at,
                }),
                Err(err) => warn!(?err, key = %row.key, "skipping unreadable snapshot"),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        db::kv_get(&self.pool, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        db::kv_set(&self.pool, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        db::kv_remove(&self.pool, key).await
    }
}

/// Generate a fresh guest identifier: `guest-{unix_millis}-{random}`.
pub fn new_guest_id() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("guest-{}-{}", Utc::now().timestamp_millis(), &random[..8])
}

/// Resolve who is reading. A user counts as logged in only when both the id
/// (not `"anonymous"`) and the profile are present; otherwise the stored
/// guest id is used, generated on first use.
pub async fn resolve_identity(store: &dyn KeyValueStore) -> Result<Identity> {
    let user_id = store.get(USER_ID_KEY).await?;
    let profile = store.get(USER_PROFILE_KEY).await?;
    if let (Some(id), Some(_)) = (user_id, profile) {
        if !id.trim().is_empty() && id != ANONYMOUS {
            return Ok(Identity::User(id));
        }
    }

    if let Some(guest) = store.get(GUEST_ID_KEY).await? {
        if !guest.trim().is_empty() {
            return Ok(Identity::Guest(guest));
        }
    }
    let guest = new_guest_id();
    store
        .set(GUEST_ID_KEY, &guest)
        .await
        .context("failed to persist guest id")?;
    debug!(guest_id = %guest, "generated guest identity");
    Ok(Identity::Guest(guest))
}

/// Load the local snapshot for an article. Unreadable snapshots are treated
/// as absent.
pub async fn load_snapshot(
    store: &dyn KeyValueStore,
    article_id: &str,
) -> Result<Option<InteractionState>> {
    let Some(raw) = store.get(&interactions_key(article_id)).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Ok(Some(state)),
        Err(err) => {
            warn!(?err, article_id, "discarding unreadable interaction snapshot");
            Ok(None)
        }
    }
}

pub async fn save_snapshot(
    store: &dyn KeyValueStore,
    article_id: &str,
    state: &InteractionState,
) -> Result<()> {
    let raw = serde_json::to_string(state)?;
    store.set(&interactions_key(article_id), &raw).await
}

/// Drop the local snapshot for an article. Counters and flags start over on
/// the next mount.
pub async fn forget_snapshot(store: &dyn KeyValueStore, article_id: &str) -> Result<()> {
    store.remove(&interactions_key(article_id)).await
}
