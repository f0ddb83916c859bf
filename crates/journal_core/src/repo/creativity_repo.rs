//! Creativity journal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one free-text creativity entry per calendar day.
//! - Provide upsert-by-date semantics for the journal editor.
//!
//! # Invariants
//! - `save` keeps `created_at` of an existing entry and refreshes `updated_at`.
//! - `entry_date` is unique (schema index + check-then-act in one transaction).

use super::{query_dates, ActivityLog, RepoError, RepoResult};
use crate::db::Store;
use crate::model::dated_note::CreativityEntry;
use crate::model::{validate_entry_date, validate_text, EntityId};
use crate::time::Clock;
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const CREATIVITY_SELECT_SQL: &str = "SELECT
    id,
    text,
    entry_date,
    created_at,
    updated_at
FROM creativity_entries";

/// Repository interface for creativity journal operations.
pub trait CreativityRepository {
    /// Creates the entry for `entry_date`, or replaces its text if it exists.
    ///
    /// `entry_date` must not be after today.
    fn save(&self, text: &str, entry_date: NaiveDate) -> RepoResult<CreativityEntry>;
    fn get(&self, id: EntityId) -> RepoResult<CreativityEntry>;
    fn get_by_date(&self, entry_date: NaiveDate) -> RepoResult<Option<CreativityEntry>>;
    /// All entries, newest first by creation time.
    fn list_all(&self) -> RepoResult<Vec<CreativityEntry>>;
    /// All entries, most recent `entry_date` first.
    fn list_by_entry_date(&self) -> RepoResult<Vec<CreativityEntry>>;
    fn update(&self, id: EntityId, text: &str) -> RepoResult<CreativityEntry>;
    fn delete(&self, id: EntityId) -> RepoResult<()>;
    fn has_entry_for(&self, entry_date: NaiveDate) -> RepoResult<bool>;
}

/// SQLite-backed creativity journal repository.
pub struct SqliteCreativityRepository<'s> {
    store: &'s Store,
    clock: &'s dyn Clock,
}

impl<'s> SqliteCreativityRepository<'s> {
    pub fn new(store: &'s Store, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }
}

impl CreativityRepository for SqliteCreativityRepository<'_> {
    fn save(&self, text: &str, entry_date: NaiveDate) -> RepoResult<CreativityEntry> {
        validate_text("creativity.text", text)?;
        validate_entry_date("creativity.entry_date", entry_date, self.clock.today())?;
        let now = self.clock.now_millis();

        self.store.with_transaction(|tx| {
            if let Some(existing) = find_by_date(tx, entry_date)? {
                tx.execute(
                    "UPDATE creativity_entries SET text = ?1, updated_at = ?2 WHERE id = ?3;",
                    params![text, now, existing.id],
                )?;
                debug!(
                    "event=creativity_save module=repo status=ok mode=update entry_id={}",
                    existing.id
                );
                return Ok(CreativityEntry {
                    text: text.to_string(),
                    updated_at: now,
                    ..existing
                });
            }

            tx.execute(
                "INSERT INTO creativity_entries (text, entry_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3);",
                params![text, entry_date, now],
            )?;
            let id = tx.last_insert_rowid();
            debug!(
                "event=creativity_save module=repo status=ok mode=insert entry_id={}",
                id
            );

            Ok(CreativityEntry {
                id,
                text: text.to_string(),
                entry_date,
                created_at: now,
                updated_at: now,
            })
        })
    }

    fn get(&self, id: EntityId) -> RepoResult<CreativityEntry> {
        let entry = self
            .store
            .connection()?
            .query_row(
                &format!("{CREATIVITY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_creativity_row,
            )
            .optional()?;

        entry.ok_or(RepoError::NotFound {
            entity: "creativity entry",
            id,
        })
    }

    fn get_by_date(&self, entry_date: NaiveDate) -> RepoResult<Option<CreativityEntry>> {
        find_by_date(self.store.connection()?, entry_date)
    }

    fn list_all(&self) -> RepoResult<Vec<CreativityEntry>> {
        list_ordered(self.store.connection()?, "created_at DESC, id DESC")
    }

    fn list_by_entry_date(&self) -> RepoResult<Vec<CreativityEntry>> {
        list_ordered(self.store.connection()?, "entry_date DESC, id DESC")
    }

    fn update(&self, id: EntityId, text: &str) -> RepoResult<CreativityEntry> {
        validate_text("creativity.text", text)?;
        let changed = self.store.connection()?.execute(
            "UPDATE creativity_entries SET text = ?1, updated_at = ?2 WHERE id = ?3;",
            params![text, self.clock.now_millis(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "creativity entry",
                id,
            });
        }

        self.get(id)
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .store
            .connection()?
            .execute("DELETE FROM creativity_entries WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "creativity entry",
                id,
            });
        }
        Ok(())
    }

    fn has_entry_for(&self, entry_date: NaiveDate) -> RepoResult<bool> {
        let exists: i64 = self.store.connection()?.query_row(
            "SELECT EXISTS(SELECT 1 FROM creativity_entries WHERE entry_date = ?1);",
            [entry_date],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl ActivityLog for SqliteCreativityRepository<'_> {
    fn activity_dates(&self) -> RepoResult<Vec<NaiveDate>> {
        query_dates(
            self.store.connection()?,
            "SELECT DISTINCT entry_date FROM creativity_entries ORDER BY entry_date DESC;",
        )
    }
}

fn list_ordered(conn: &Connection, order_by: &str) -> RepoResult<Vec<CreativityEntry>> {
    let mut stmt = conn.prepare(&format!("{CREATIVITY_SELECT_SQL} ORDER BY {order_by};"))?;
    let mut rows = stmt.query([])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_creativity_row(row)?);
    }
    Ok(entries)
}

fn find_by_date(conn: &Connection, entry_date: NaiveDate) -> RepoResult<Option<CreativityEntry>> {
    let entry = conn
        .query_row(
            &format!("{CREATIVITY_SELECT_SQL} WHERE entry_date = ?1;"),
            [entry_date],
            parse_creativity_row,
        )
        .optional()?;
    Ok(entry)
}

fn parse_creativity_row(row: &Row<'_>) -> rusqlite::Result<CreativityEntry> {
    Ok(CreativityEntry {
        id: row.get("id")?,
        text: row.get("text")?,
        entry_date: row.get("entry_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
