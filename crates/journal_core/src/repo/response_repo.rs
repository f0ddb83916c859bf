//! Response repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist answers written against prompts, keeping full history.
//! - Provide day-scoped views (today's answer, answers on a date, last N days).
//!
//! # Invariants
//! - A response can only be created for an existing prompt.
//! - Day boundaries are local midnights computed by `crate::time`.

use super::prompt_repo::find_by_id as find_prompt;
use super::{row_exists, RepoError, RepoResult};
use crate::db::Store;
use crate::model::prompt::{AnsweredPrompt, Response};
use crate::model::{validate_text, EntityId};
use crate::time::{days_before, local_day_bounds, local_day_start_millis, Clock};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const RESPONSE_SELECT_SQL: &str = "SELECT
    id,
    prompt_id,
    text,
    created_at,
    updated_at
FROM responses";

/// Repository interface for response operations.
pub trait ResponseRepository {
    fn add(&self, prompt_id: EntityId, text: &str) -> RepoResult<Response>;
    fn get(&self, id: EntityId) -> RepoResult<Response>;
    /// All responses, newest first.
    fn list_all(&self) -> RepoResult<Vec<Response>>;
    /// Answer history of one prompt, newest first.
    fn list_for_prompt(&self, prompt_id: EntityId) -> RepoResult<Vec<Response>>;
    /// Responses created on the given local calendar day, newest first.
    fn list_on_date(&self, date: NaiveDate) -> RepoResult<Vec<Response>>;
    /// Responses created during the last `days` calendar days, today included.
    fn list_recent(&self, days: u32) -> RepoResult<Vec<Response>>;
    /// Newest response written today together with its prompt.
    fn latest_today(&self) -> RepoResult<Option<AnsweredPrompt>>;
    fn update(&self, id: EntityId, text: &str) -> RepoResult<Response>;
    fn delete(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed response repository.
pub struct SqliteResponseRepository<'s> {
    store: &'s Store,
    clock: &'s dyn Clock,
}

impl<'s> SqliteResponseRepository<'s> {
    pub fn new(store: &'s Store, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    fn list_where(&self, filter: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Response>> {
        let conn = self.store.connection()?;
        let mut stmt = conn.prepare(&format!(
            "{RESPONSE_SELECT_SQL} {filter} ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next()? {
            responses.push(parse_response_row(row)?);
        }
        Ok(responses)
    }
}

impl ResponseRepository for SqliteResponseRepository<'_> {
    fn add(&self, prompt_id: EntityId, text: &str) -> RepoResult<Response> {
        validate_text("response.text", text)?;
        let now = self.clock.now_millis();

        self.store.with_transaction(|tx| {
            if !row_exists(tx, "prompts", prompt_id)? {
                return Err(RepoError::NotFound {
                    entity: "prompt",
                    id: prompt_id,
                });
            }

            tx.execute(
                "INSERT INTO responses (prompt_id, text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3);",
                params![prompt_id, text, now],
            )?;

            Ok(Response {
                id: tx.last_insert_rowid(),
                prompt_id,
                text: text.to_string(),
                created_at: now,
                updated_at: now,
            })
        })
    }

    fn get(&self, id: EntityId) -> RepoResult<Response> {
        find_by_id(self.store.connection()?, id)?.ok_or(RepoError::NotFound {
            entity: "response",
            id,
        })
    }

    fn list_all(&self) -> RepoResult<Vec<Response>> {
        self.list_where("", Vec::new())
    }

    fn list_for_prompt(&self, prompt_id: EntityId) -> RepoResult<Vec<Response>> {
        self.list_where("WHERE prompt_id = ?", vec![Value::Integer(prompt_id)])
    }

    fn list_on_date(&self, date: NaiveDate) -> RepoResult<Vec<Response>> {
        let (start, end) = local_day_bounds(date);
        self.list_where(
            "WHERE created_at >= ? AND created_at < ?",
            vec![Value::Integer(start), Value::Integer(end)],
        )
    }

    fn list_recent(&self, days: u32) -> RepoResult<Vec<Response>> {
        if days == 0 {
            return Ok(Vec::new());
        }

        let first_day = days_before(self.clock.today(), u64::from(days - 1));
        self.list_where(
            "WHERE created_at >= ?",
            vec![Value::Integer(local_day_start_millis(first_day))],
        )
    }

    fn latest_today(&self) -> RepoResult<Option<AnsweredPrompt>> {
        let conn = self.store.connection()?;
        let (start, end) = local_day_bounds(self.clock.today());

        let response = conn
            .query_row(
                &format!(
                    "{RESPONSE_SELECT_SQL}
                     WHERE created_at >= ?1 AND created_at < ?2
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1;"
                ),
                [start, end],
                parse_response_row,
            )
            .optional()?;

        let Some(response) = response else {
            return Ok(None);
        };

        // Foreign keys guarantee the parent exists while the response does.
        let prompt = find_prompt(conn, response.prompt_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "response {} references missing prompt {}",
                response.id, response.prompt_id
            ))
        })?;

        Ok(Some(AnsweredPrompt { response, prompt }))
    }

    fn update(&self, id: EntityId, text: &str) -> RepoResult<Response> {
        validate_text("response.text", text)?;
        let conn = self.store.connection()?;

        let changed = conn.execute(
            "UPDATE responses SET text = ?1, updated_at = ?2 WHERE id = ?3;",
            params![text, self.clock.now_millis(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "response",
                id,
            });
        }

        self.get(id)
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .store
            .connection()?
            .execute("DELETE FROM responses WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "response",
                id,
            });
        }
        Ok(())
    }
}

fn find_by_id(conn: &Connection, id: EntityId) -> RepoResult<Option<Response>> {
    let response = conn
        .query_row(
            &format!("{RESPONSE_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_response_row,
        )
        .optional()?;
    Ok(response)
}

fn parse_response_row(row: &Row<'_>) -> rusqlite::Result<Response> {
    Ok(Response {
        id: row.get("id")?,
        prompt_id: row.get("prompt_id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
