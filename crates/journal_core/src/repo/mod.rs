//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data-access contract per entity family.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate content before any SQL mutation.
//! - Parent deletes remove children first inside one store transaction.
//! - Repository APIs return semantic errors (`NotFound`, `QuotaExceeded`, ...)
//!   in addition to DB transport errors.

pub mod affirmation_repo;
pub mod creativity_repo;
pub mod gratitude_repo;
pub mod prompt_repo;
pub mod response_repo;

use crate::db::DbError;
use crate::model::{ContentValidationError, EntityId};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every repository and service operation.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContentValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: EntityId,
    },
    QuotaExceeded {
        entry_date: NaiveDate,
        limit: u32,
    },
    /// Rotation found no prompt left to assign.
    ExhaustedPool,
    InvalidData(String),
}

/// Caller-facing classification of a [`RepoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The store could not be opened or was already closed.
    StorageUnavailable,
    /// A SQLite statement failed or persisted data is unreadable.
    Storage,
    NotFound,
    InvalidInput,
    QuotaExceeded,
    ExhaustedPool,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::Db(err) if err.is_unavailable() => ErrorKind::StorageUnavailable,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Storage,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Self::ExhaustedPool => ErrorKind::ExhaustedPool,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::QuotaExceeded { entry_date, limit } => write!(
                f,
                "maximum number of entries for {entry_date} reached ({limit})"
            ),
            Self::ExhaustedPool => write!(f, "no unassigned prompt left to rotate in"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::QuotaExceeded { .. }
            | Self::ExhaustedPool
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ContentValidationError> for RepoError {
    fn from(value: ContentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A repository whose rows mark calendar days with activity.
///
/// Feeds the streak calculator.
pub trait ActivityLog {
    /// Distinct activity days, most recent first.
    fn activity_dates(&self) -> RepoResult<Vec<NaiveDate>>;
}

fn row_exists(conn: &Connection, table: &'static str, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Collects `entry_date` values from a `SELECT DISTINCT entry_date ...` query.
fn query_dates(conn: &Connection, sql: &str) -> RepoResult<Vec<NaiveDate>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut dates = Vec::new();
    while let Some(row) = rows.next()? {
        dates.push(row.get(0)?);
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RepoError};
    use crate::db::DbError;
    use crate::model::ContentValidationError;

    #[test]
    fn kinds_map_to_caller_taxonomy() {
        assert_eq!(
            RepoError::from(ContentValidationError::EmptyText { field: "text" }).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(RepoError::from(DbError::Closed).kind(), ErrorKind::StorageUnavailable);
        assert_eq!(
            RepoError::NotFound {
                entity: "prompt",
                id: 7
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(RepoError::ExhaustedPool.kind(), ErrorKind::ExhaustedPool);
        assert_eq!(
            RepoError::from(rusqlite::Error::InvalidQuery).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = RepoError::NotFound {
            entity: "affirmation",
            id: 42,
        };
        assert_eq!(err.to_string(), "affirmation not found: 42");
    }
}
