//! Owned handle to the journal database.
//!
//! # Responsibility
//! - Hold the one connection every repository borrows.
//! - Scope multi-statement writes in immediate transactions.
//!
//! # Invariants
//! - After `close()`, every access fails with `DbError::Closed`.
//! - `with_transaction` commits only when the closure returns `Ok`; any error
//!   (or panic) drops the transaction, which rolls it back.

use super::open::{open_db, open_db_in_memory};
use super::{DbError, DbResult};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};

/// Single owner of the journal SQLite connection.
///
/// Repositories borrow `&Store`; there is no process-wide handle.
#[derive(Debug)]
pub struct Store {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens (or creates) the database file at `path` and applies migrations.
    ///
    /// # Errors
    /// - `DbError::StorageUnavailable` when the file cannot be opened/created
    ///   or is not a readable SQLite database.
    /// - `DbError::UnsupportedSchemaVersion` when the file was written by a
    ///   newer schema.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = open_db(path)?;
        Ok(Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory store with the full schema.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self {
            conn: Some(conn),
            path: None,
        })
    }

    /// Backing file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Releases the connection. A second call is a no-op.
    pub fn close(&mut self) -> DbResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                // The returned connection is dropped here; the handle stays closed.
                warn!("event=db_close module=db status=error error={}", err);
                Err(err.into())
            }
        }
    }

    /// Borrows the live connection.
    pub fn connection(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::Closed)
    }

    /// Runs `f` inside one atomic unit.
    ///
    /// The transaction is opened with `BEGIN IMMEDIATE` so the write lock is
    /// held from the first statement; check-then-act sequences inside `f`
    /// observe a stable view.
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let conn = self.connection()?;
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
            .map_err(DbError::from)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(DbError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=db_rollback module=db status=error error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.conn.is_some() {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::db::DbError;

    #[test]
    fn close_twice_is_a_noop() {
        let mut store = Store::open_in_memory().unwrap();
        assert!(store.is_open());
        store.close().unwrap();
        store.close().unwrap();
        assert!(!store.is_open());
        assert!(matches!(store.connection(), Err(DbError::Closed)));
    }

    #[test]
    fn transaction_commits_on_ok() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_transaction(|tx| -> Result<(), DbError> {
                tx.execute(
                    "INSERT INTO affirmations (text, created_at, updated_at) VALUES ('a', 1, 1);",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let count: i64 = store
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM affirmations;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn transaction_rolls_back_on_err() {
        let store = Store::open_in_memory().unwrap();
        let result = store.with_transaction(|tx| -> Result<(), DbError> {
            tx.execute(
                "INSERT INTO affirmations (text, created_at, updated_at) VALUES ('a', 1, 1);",
                [],
            )?;
            Err(DbError::Closed)
        });
        assert!(matches!(result, Err(DbError::Closed)));

        let count: i64 = store
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM affirmations;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn closed_store_rejects_transactions() {
        let mut store = Store::open_in_memory().unwrap();
        store.close().unwrap();
        let result = store.with_transaction(|_tx| -> Result<(), DbError> { Ok(()) });
        assert!(matches!(result, Err(DbError::Closed)));
    }
}
