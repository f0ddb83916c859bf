//! Journal schema versions and the upgrade path between them.
//!
//! # Invariants
//! - Versions are strictly increasing; the schema version lives in
//!   `PRAGMA user_version`.
//! - All pending versions are applied in one transaction: a failed upgrade
//!   leaves the file at its previous version.
//! - A file stamped with a version newer than this build knows is refused.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaVersion {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_VERSIONS: &[SchemaVersion] = &[SchemaVersion {
    version: 1,
    name: "init",
    sql: include_str!("0001_init.sql"),
}];

/// Newest schema version this build can create.
pub fn latest_version() -> u32 {
    SCHEMA_VERSIONS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file is newer than this build.
/// - `DbError::Sqlite` when a migration statement fails; nothing is applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();

    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaVersion> = SCHEMA_VERSIONS
        .iter()
        .filter(|step| step.version > from)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=done from_version={} to_version={}",
        from, latest
    );
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
