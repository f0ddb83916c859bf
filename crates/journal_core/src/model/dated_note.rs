//! Notes keyed by calendar day: gratitude items and creativity entries.
//!
//! # Invariants
//! - At most `GRATITUDE_DAILY_LIMIT` gratitude items share one `entry_date`.
//! - At most one creativity entry exists per `entry_date`.

use super::EntityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum gratitude items accepted for a single calendar day.
pub const GRATITUDE_DAILY_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GratitudeItem {
    pub id: EntityId,
    pub text: String,
    pub entry_date: NaiveDate,
    pub created_at: i64,
}

/// Gratitude items of one day, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GratitudeDay {
    pub date: NaiveDate,
    pub items: Vec<GratitudeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativityEntry {
    pub id: EntityId,
    pub text: String,
    pub entry_date: NaiveDate,
    pub created_at: i64,
    pub updated_at: i64,
}
