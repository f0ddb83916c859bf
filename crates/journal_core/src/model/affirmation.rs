//! Affirmations and their completion history.
//!
//! There is no "active" flag: the active affirmation is the newest row by
//! creation time, and older rows are kept as history.

use super::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affirmation {
    pub id: EntityId,
    pub text: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One recorded completion of an affirmation. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionLog {
    pub id: EntityId,
    pub affirmation_id: EntityId,
    pub completed_at: i64,
}
