//! SQLite storage bootstrap, schema migration and transaction scoping.
//!
//! # Responsibility
//! - Own the single connection to the journal database (`Store`).
//! - Apply schema migrations in deterministic order.
//! - Provide all-or-nothing transaction scopes for multi-statement writes.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write journal data before migrations succeed.
//! - Foreign keys are enforced on every connection handed out by the store.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;
mod store;

pub use store::Store;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The backing file could not be opened, created or read as a database.
    StorageUnavailable {
        /// `None` for in-memory stores.
        path: Option<PathBuf>,
        source: rusqlite::Error,
    },
    /// The store handle was already closed.
    Closed,
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable {
                path: Some(path),
                source,
            } => write!(f, "storage unavailable at `{}`: {source}", path.display()),
            Self::StorageUnavailable { path: None, source } => {
                write!(f, "in-memory storage unavailable: {source}")
            }
            Self::Closed => write!(f, "storage unavailable: store is closed"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::Closed | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl DbError {
    /// Whether this error means the store cannot be used at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. } | Self::Closed)
    }
}
