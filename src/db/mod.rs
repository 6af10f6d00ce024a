//! Local persistent store backed by SQLite.
//!
//! - `model`: row types returned by queries.
//! - `repo`: SQL-only functions over the `kv_store` table.
//!
//! This plays the role of a browser's origin-wide key-value storage: every
//! view in the process (and every process sharing the file) reads and writes
//! the same keys without coordination, so concurrent writers race and the
//! last write wins.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::KvEntry;
