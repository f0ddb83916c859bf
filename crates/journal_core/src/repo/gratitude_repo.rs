//! Gratitude repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist gratitude items keyed by calendar day.
//! - Enforce the per-day item ceiling before any insert.
//! - Provide per-day and grouped read models.
//!
//! # Invariants
//! - Count-then-insert runs inside one immediate transaction, so the ceiling
//!   holds for a single writer.
//! - Items inside a day are ordered oldest first; days newest first.

use super::{query_dates, ActivityLog, RepoError, RepoResult};
use crate::db::Store;
use crate::model::dated_note::{GratitudeDay, GratitudeItem, GRATITUDE_DAILY_LIMIT};
use crate::model::{validate_entry_date, validate_text, EntityId};
use crate::time::Clock;
use chrono::NaiveDate;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};

const GRATITUDE_SELECT_SQL: &str = "SELECT
    id,
    text,
    entry_date,
    created_at
FROM gratitude_items";

/// Repository interface for gratitude operations.
pub trait GratitudeRepository {
    /// Adds an item for today.
    fn add(&self, text: &str) -> RepoResult<GratitudeItem>;
    /// Adds an item for `entry_date`, which must not be after today.
    fn add_on(&self, text: &str, entry_date: NaiveDate) -> RepoResult<GratitudeItem>;
    fn get(&self, id: EntityId) -> RepoResult<GratitudeItem>;
    /// All items, newest first.
    fn list_all(&self) -> RepoResult<Vec<GratitudeItem>>;
    fn update(&self, id: EntityId, text: &str) -> RepoResult<GratitudeItem>;
    fn delete(&self, id: EntityId) -> RepoResult<()>;
    /// Items of one day, oldest first.
    fn list_for_date(&self, entry_date: NaiveDate) -> RepoResult<Vec<GratitudeItem>>;
    fn list_today(&self) -> RepoResult<Vec<GratitudeItem>>;
    fn count_for_date(&self, entry_date: NaiveDate) -> RepoResult<u32>;
    fn has_entries_today(&self) -> RepoResult<bool>;
    /// Every day with items, newest day first.
    fn list_by_day(&self) -> RepoResult<Vec<GratitudeDay>>;
    /// The `days` most recent days that have items, newest day first.
    fn list_recent_days(&self, days: u32) -> RepoResult<Vec<GratitudeDay>>;
}

/// SQLite-backed gratitude repository.
pub struct SqliteGratitudeRepository<'s> {
    store: &'s Store,
    clock: &'s dyn Clock,
}

impl<'s> SqliteGratitudeRepository<'s> {
    pub fn new(store: &'s Store, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    fn group_by_day(&self, dates: Vec<NaiveDate>) -> RepoResult<Vec<GratitudeDay>> {
        let conn = self.store.connection()?;
        let mut days = Vec::with_capacity(dates.len());
        for date in dates {
            days.push(GratitudeDay {
                date,
                items: items_for_date(conn, date)?,
            });
        }
        Ok(days)
    }
}

impl GratitudeRepository for SqliteGratitudeRepository<'_> {
    fn add(&self, text: &str) -> RepoResult<GratitudeItem> {
        self.add_on(text, self.clock.today())
    }

    fn add_on(&self, text: &str, entry_date: NaiveDate) -> RepoResult<GratitudeItem> {
        validate_text("gratitude.text", text)?;
        validate_entry_date("gratitude.entry_date", entry_date, self.clock.today())?;
        let created_at = self.clock.now_millis();

        self.store.with_transaction(|tx| {
            let existing = count_for_date(tx, entry_date)?;
            if existing >= GRATITUDE_DAILY_LIMIT {
                warn!(
                    "event=gratitude_add module=repo status=rejected error_code=quota_exceeded entry_date={} count={}",
                    entry_date, existing
                );
                return Err(RepoError::QuotaExceeded {
                    entry_date,
                    limit: GRATITUDE_DAILY_LIMIT,
                });
            }

            tx.execute(
                "INSERT INTO gratitude_items (text, entry_date, created_at) VALUES (?1, ?2, ?3);",
                params![text, entry_date, created_at],
            )?;

            Ok(GratitudeItem {
                id: tx.last_insert_rowid(),
                text: text.to_string(),
                entry_date,
                created_at,
            })
        })
    }

    fn get(&self, id: EntityId) -> RepoResult<GratitudeItem> {
        let item = self
            .store
            .connection()?
            .query_row(
                &format!("{GRATITUDE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_gratitude_row,
            )
            .optional()?;

        item.ok_or(RepoError::NotFound {
            entity: "gratitude item",
            id,
        })
    }

    fn list_all(&self) -> RepoResult<Vec<GratitudeItem>> {
        let conn = self.store.connection()?;
        let mut stmt = conn.prepare(&format!(
            "{GRATITUDE_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_gratitude_row(row)?);
        }
        Ok(items)
    }

    fn update(&self, id: EntityId, text: &str) -> RepoResult<GratitudeItem> {
        validate_text("gratitude.text", text)?;
        let changed = self.store.connection()?.execute(
            "UPDATE gratitude_items SET text = ?1 WHERE id = ?2;",
            params![text, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "gratitude item",
                id,
            });
        }

        self.get(id)
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .store
            .connection()?
            .execute("DELETE FROM gratitude_items WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "gratitude item",
                id,
            });
        }
        Ok(())
    }

    fn list_for_date(&self, entry_date: NaiveDate) -> RepoResult<Vec<GratitudeItem>> {
        items_for_date(self.store.connection()?, entry_date)
    }

    fn list_today(&self) -> RepoResult<Vec<GratitudeItem>> {
        self.list_for_date(self.clock.today())
    }

    fn count_for_date(&self, entry_date: NaiveDate) -> RepoResult<u32> {
        count_for_date(self.store.connection()?, entry_date)
    }

    fn has_entries_today(&self) -> RepoResult<bool> {
        Ok(self.count_for_date(self.clock.today())? > 0)
    }

    fn list_by_day(&self) -> RepoResult<Vec<GratitudeDay>> {
        let dates = self.activity_dates()?;
        self.group_by_day(dates)
    }

    fn list_recent_days(&self, days: u32) -> RepoResult<Vec<GratitudeDay>> {
        let mut dates = self.activity_dates()?;
        dates.truncate(usize::try_from(days).unwrap_or(usize::MAX));
        self.group_by_day(dates)
    }
}

impl ActivityLog for SqliteGratitudeRepository<'_> {
    fn activity_dates(&self) -> RepoResult<Vec<NaiveDate>> {
        query_dates(
            self.store.connection()?,
            "SELECT DISTINCT entry_date FROM gratitude_items ORDER BY entry_date DESC;",
        )
    }
}

fn items_for_date(conn: &Connection, entry_date: NaiveDate) -> RepoResult<Vec<GratitudeItem>> {
    let mut stmt = conn.prepare(&format!(
        "{GRATITUDE_SELECT_SQL} WHERE entry_date = ?1 ORDER BY created_at ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([entry_date])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_gratitude_row(row)?);
    }
    Ok(items)
}

fn count_for_date(conn: &Connection, entry_date: NaiveDate) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM gratitude_items WHERE entry_date = ?1;",
        [entry_date],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_gratitude_row(row: &Row<'_>) -> rusqlite::Result<GratitudeItem> {
    Ok(GratitudeItem {
        id: row.get("id")?,
        text: row.get("text")?,
        entry_date: row.get("entry_date")?,
        created_at: row.get("created_at")?,
    })
}
