//! Row models returned by the repository.

use chrono::NaiveDateTime;

/// One key-value row with its last write time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at: NaiveDateTime,
}
