//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.
//! - Returned connections are writable.
//! - Open and bootstrap failures surface as `DbError::StorageUnavailable`,
//!   except schema-version mismatches which keep their own variant.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{ffi, Connection, DatabaseName};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub(crate) fn open_db(path: &Path) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let unavailable = |source: rusqlite::Error| DbError::StorageUnavailable {
        path: Some(path.to_path_buf()),
        source,
    };

    let conn = Connection::open(path).map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        unavailable(err)
    })?;

    finish_open(conn, "file", started_at, unavailable)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub(crate) fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let unavailable = |source: rusqlite::Error| DbError::StorageUnavailable { path: None, source };

    let conn = Connection::open_in_memory().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        unavailable(err)
    })?;

    finish_open(conn, "memory", started_at, unavailable)
}

fn finish_open(
    mut conn: Connection,
    mode: &str,
    started_at: Instant,
    unavailable: impl Fn(rusqlite::Error) -> DbError,
) -> DbResult<Connection> {
    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            match err {
                DbError::Sqlite(source) => Err(unavailable(source)),
                other => Err(other),
            }
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    // SQLite silently downgrades to read-only when the file is not writable.
    if conn.is_readonly(DatabaseName::Main)? {
        return Err(DbError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_READONLY),
            Some("database file is not writable".to_string()),
        )));
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}
