//! Affirmation repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist affirmations and their append-only completion logs.
//! - Resolve the active affirmation (newest by creation time).
//! - Derive the distinct completion days used by streak analytics.
//!
//! # Invariants
//! - Deleting an affirmation removes its completion logs in the same
//!   transaction.
//! - Several completions on one day collapse to a single activity day.

use super::{row_exists, ActivityLog, RepoError, RepoResult};
use crate::db::Store;
use crate::model::affirmation::{Affirmation, CompletionLog};
use crate::model::{validate_text, EntityId};
use crate::time::{local_date_of_millis, local_day_bounds, Clock};
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const AFFIRMATION_SELECT_SQL: &str = "SELECT
    id,
    text,
    created_at,
    updated_at
FROM affirmations";

/// Repository interface for affirmation operations.
pub trait AffirmationRepository {
    /// Stores a new affirmation, which becomes the active one.
    fn add(&self, text: &str) -> RepoResult<Affirmation>;
    fn get(&self, id: EntityId) -> RepoResult<Affirmation>;
    /// All affirmations, newest first.
    fn list_all(&self) -> RepoResult<Vec<Affirmation>>;
    fn update(&self, id: EntityId, text: &str) -> RepoResult<Affirmation>;
    /// Deletes the affirmation and all of its completion logs.
    fn delete(&self, id: EntityId) -> RepoResult<()>;
    /// The most recently created affirmation, if any exists.
    fn active(&self) -> RepoResult<Option<Affirmation>>;
    fn log_completion(&self, affirmation_id: EntityId) -> RepoResult<CompletionLog>;
    /// All completion logs, newest first.
    fn list_completions(&self) -> RepoResult<Vec<CompletionLog>>;
    fn delete_completion(&self, log_id: EntityId) -> RepoResult<()>;
    /// Whether any affirmation was completed today.
    ///
    /// `affirmation_id` must exist, but the day check is not scoped to it: a
    /// completion of any affirmation counts.
    fn is_completed_today(&self, affirmation_id: EntityId) -> RepoResult<bool>;
}

/// SQLite-backed affirmation repository.
pub struct SqliteAffirmationRepository<'s> {
    store: &'s Store,
    clock: &'s dyn Clock,
}

impl<'s> SqliteAffirmationRepository<'s> {
    pub fn new(store: &'s Store, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }
}

impl AffirmationRepository for SqliteAffirmationRepository<'_> {
    fn add(&self, text: &str) -> RepoResult<Affirmation> {
        validate_text("affirmation.text", text)?;
        let conn = self.store.connection()?;

        let now = self.clock.now_millis();
        conn.execute(
            "INSERT INTO affirmations (text, created_at, updated_at) VALUES (?1, ?2, ?2);",
            params![text, now],
        )?;

        Ok(Affirmation {
            id: conn.last_insert_rowid(),
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: EntityId) -> RepoResult<Affirmation> {
        let affirmation = self
            .store
            .connection()?
            .query_row(
                &format!("{AFFIRMATION_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_affirmation_row,
            )
            .optional()?;

        affirmation.ok_or(RepoError::NotFound {
            entity: "affirmation",
            id,
        })
    }

    fn list_all(&self) -> RepoResult<Vec<Affirmation>> {
        let conn = self.store.connection()?;
        let mut stmt = conn.prepare(&format!(
            "{AFFIRMATION_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut affirmations = Vec::new();
        while let Some(row) = rows.next()? {
            affirmations.push(parse_affirmation_row(row)?);
        }
        Ok(affirmations)
    }

    fn update(&self, id: EntityId, text: &str) -> RepoResult<Affirmation> {
        validate_text("affirmation.text", text)?;
        let changed = self.store.connection()?.execute(
            "UPDATE affirmations SET text = ?1, updated_at = ?2 WHERE id = ?3;",
            params![text, self.clock.now_millis(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "affirmation",
                id,
            });
        }

        self.get(id)
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let removed_logs = self.store.with_transaction(|tx| -> RepoResult<usize> {
            if !row_exists(tx, "affirmations", id)? {
                return Err(RepoError::NotFound {
                    entity: "affirmation",
                    id,
                });
            }

            let removed = tx.execute(
                "DELETE FROM completion_logs WHERE affirmation_id = ?1;",
                [id],
            )?;
            tx.execute("DELETE FROM affirmations WHERE id = ?1;", [id])?;
            Ok(removed)
        })?;

        info!(
            "event=affirmation_delete module=repo status=ok affirmation_id={} logs_removed={}",
            id, removed_logs
        );
        Ok(())
    }

    fn active(&self) -> RepoResult<Option<Affirmation>> {
        let affirmation = self
            .store
            .connection()?
            .query_row(
                &format!("{AFFIRMATION_SELECT_SQL} ORDER BY created_at DESC, id DESC LIMIT 1;"),
                [],
                parse_affirmation_row,
            )
            .optional()?;
        Ok(affirmation)
    }

    fn log_completion(&self, affirmation_id: EntityId) -> RepoResult<CompletionLog> {
        let completed_at = self.clock.now_millis();

        self.store.with_transaction(|tx| {
            if !row_exists(tx, "affirmations", affirmation_id)? {
                return Err(RepoError::NotFound {
                    entity: "affirmation",
                    id: affirmation_id,
                });
            }

            tx.execute(
                "INSERT INTO completion_logs (affirmation_id, completed_at) VALUES (?1, ?2);",
                params![affirmation_id, completed_at],
            )?;

            Ok(CompletionLog {
                id: tx.last_insert_rowid(),
                affirmation_id,
                completed_at,
            })
        })
    }

    fn list_completions(&self) -> RepoResult<Vec<CompletionLog>> {
        let conn = self.store.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, affirmation_id, completed_at
             FROM completion_logs
             ORDER BY completed_at DESC, id DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut logs = Vec::new();
        while let Some(row) = rows.next()? {
            logs.push(CompletionLog {
                id: row.get("id")?,
                affirmation_id: row.get("affirmation_id")?,
                completed_at: row.get("completed_at")?,
            });
        }
        Ok(logs)
    }

    fn delete_completion(&self, log_id: EntityId) -> RepoResult<()> {
        let changed = self
            .store
            .connection()?
            .execute("DELETE FROM completion_logs WHERE id = ?1;", [log_id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "completion log",
                id: log_id,
            });
        }
        Ok(())
    }

    fn is_completed_today(&self, affirmation_id: EntityId) -> RepoResult<bool> {
        let conn = self.store.connection()?;
        if !row_exists(conn, "affirmations", affirmation_id)? {
            return Err(RepoError::NotFound {
                entity: "affirmation",
                id: affirmation_id,
            });
        }

        let (start, end) = local_day_bounds(self.clock.today());
        let completed: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM completion_logs
                WHERE completed_at >= ?1 AND completed_at < ?2
            );",
            [start, end],
            |row| row.get(0),
        )?;
        Ok(completed == 1)
    }
}

impl ActivityLog for SqliteAffirmationRepository<'_> {
    /// Local calendar days with at least one completion of any affirmation.
    fn activity_dates(&self) -> RepoResult<Vec<NaiveDate>> {
        completion_dates(self.store.connection()?)
    }
}

fn completion_dates(conn: &Connection) -> RepoResult<Vec<NaiveDate>> {
    let mut stmt = conn.prepare("SELECT completed_at FROM completion_logs;")?;
    let mut rows = stmt.query([])?;
    let mut days = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let completed_at: i64 = row.get(0)?;
        let day = local_date_of_millis(completed_at).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid completed_at value `{completed_at}` in completion_logs.completed_at"
            ))
        })?;
        days.insert(day);
    }
    Ok(days.into_iter().rev().collect())
}

fn parse_affirmation_row(row: &Row<'_>) -> rusqlite::Result<Affirmation> {
    Ok(Affirmation {
        id: row.get("id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
