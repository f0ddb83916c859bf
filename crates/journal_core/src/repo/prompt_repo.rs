//! Prompt repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `prompts` with cascading removal of `responses`.
//! - Expose the rotation queries used by the daily prompt selector.
//!
//! # Invariants
//! - `assigned_date` is written only through `assign_date`, and only while it
//!   is still NULL.
//! - Deleting a prompt removes its responses in the same transaction.

use super::{row_exists, RepoError, RepoResult};
use crate::db::Store;
use crate::model::prompt::Prompt;
use crate::model::{validate_text, EntityId};
use crate::time::Clock;
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROMPT_SELECT_SQL: &str = "SELECT
    id,
    text,
    assigned_date,
    created_at
FROM prompts";

/// Repository interface for prompt operations.
pub trait PromptRepository {
    fn add(&self, text: &str) -> RepoResult<Prompt>;
    fn get(&self, id: EntityId) -> RepoResult<Prompt>;
    /// All prompts, newest first.
    fn list_all(&self) -> RepoResult<Vec<Prompt>>;
    /// Replaces prompt text. Rotation state is untouched.
    fn update(&self, id: EntityId, text: &str) -> RepoResult<Prompt>;
    /// Deletes the prompt and every response written against it.
    fn delete(&self, id: EntityId) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;
    /// Any prompt picked at random, without assigning it to a day.
    fn random(&self) -> RepoResult<Option<Prompt>>;
}

/// SQLite-backed prompt repository.
pub struct SqlitePromptRepository<'s> {
    store: &'s Store,
    clock: &'s dyn Clock,
}

impl<'s> SqlitePromptRepository<'s> {
    pub fn new(store: &'s Store, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }
}

impl PromptRepository for SqlitePromptRepository<'_> {
    fn add(&self, text: &str) -> RepoResult<Prompt> {
        validate_text("prompt.text", text)?;
        let conn = self.store.connection()?;

        let created_at = self.clock.now_millis();
        conn.execute(
            "INSERT INTO prompts (text, created_at) VALUES (?1, ?2);",
            params![text, created_at],
        )?;

        Ok(Prompt {
            id: conn.last_insert_rowid(),
            text: text.to_string(),
            assigned_date: None,
            created_at,
        })
    }

    fn get(&self, id: EntityId) -> RepoResult<Prompt> {
        find_by_id(self.store.connection()?, id)?.ok_or(RepoError::NotFound {
            entity: "prompt",
            id,
        })
    }

    fn list_all(&self) -> RepoResult<Vec<Prompt>> {
        let conn = self.store.connection()?;
        let mut stmt = conn.prepare(&format!(
            "{PROMPT_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut prompts = Vec::new();
        while let Some(row) = rows.next()? {
            prompts.push(parse_prompt_row(row)?);
        }
        Ok(prompts)
    }

    fn update(&self, id: EntityId, text: &str) -> RepoResult<Prompt> {
        validate_text("prompt.text", text)?;
        let conn = self.store.connection()?;

        let changed = conn.execute(
            "UPDATE prompts SET text = ?1 WHERE id = ?2;",
            params![text, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "prompt",
                id,
            });
        }

        self.get(id)
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let removed_responses = self.store.with_transaction(|tx| -> RepoResult<usize> {
            if !row_exists(tx, "prompts", id)? {
                return Err(RepoError::NotFound {
                    entity: "prompt",
                    id,
                });
            }

            let removed = tx.execute("DELETE FROM responses WHERE prompt_id = ?1;", [id])?;
            tx.execute("DELETE FROM prompts WHERE id = ?1;", [id])?;
            Ok(removed)
        })?;

        info!(
            "event=prompt_delete module=repo status=ok prompt_id={} responses_removed={}",
            id, removed_responses
        );
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self.store.connection()?.query_row(
            "SELECT COUNT(*) FROM prompts;",
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative prompt count `{count}`")))
    }

    fn random(&self) -> RepoResult<Option<Prompt>> {
        let conn = self.store.connection()?;
        let prompt = conn
            .query_row(
                &format!("{PROMPT_SELECT_SQL} ORDER BY RANDOM() LIMIT 1;"),
                [],
                parse_prompt_row,
            )
            .optional()?;
        Ok(prompt)
    }
}

pub(crate) fn find_by_id(conn: &Connection, id: EntityId) -> RepoResult<Option<Prompt>> {
    let prompt = conn
        .query_row(
            &format!("{PROMPT_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_prompt_row,
        )
        .optional()?;
    Ok(prompt)
}

/// Prompt already rotated in on `date`, if any.
pub(crate) fn find_assigned_on(conn: &Connection, date: NaiveDate) -> RepoResult<Option<Prompt>> {
    let prompt = conn
        .query_row(
            &format!("{PROMPT_SELECT_SQL} WHERE assigned_date = ?1 ORDER BY id ASC LIMIT 1;"),
            [date],
            parse_prompt_row,
        )
        .optional()?;
    Ok(prompt)
}

/// Uniformly random prompt that has never been assigned a day.
pub(crate) fn pick_unassigned(conn: &Connection) -> RepoResult<Option<Prompt>> {
    let prompt = conn
        .query_row(
            &format!("{PROMPT_SELECT_SQL} WHERE assigned_date IS NULL ORDER BY RANDOM() LIMIT 1;"),
            [],
            parse_prompt_row,
        )
        .optional()?;
    Ok(prompt)
}

/// Marks an unassigned prompt as used on `date`.
///
/// Returns `false` when the prompt is missing or already carries a date.
pub(crate) fn assign_date(conn: &Connection, id: EntityId, date: NaiveDate) -> RepoResult<bool> {
    let changed = conn.execute(
        "UPDATE prompts
         SET assigned_date = ?1
         WHERE id = ?2
           AND assigned_date IS NULL;",
        params![date, id],
    )?;
    Ok(changed == 1)
}

fn parse_prompt_row(row: &Row<'_>) -> rusqlite::Result<Prompt> {
    Ok(Prompt {
        id: row.get("id")?,
        text: row.get("text")?,
        assigned_date: row.get("assigned_date")?,
        created_at: row.get("created_at")?,
    })
}
