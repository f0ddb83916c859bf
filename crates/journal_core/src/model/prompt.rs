//! Reflection prompts and the responses written against them.

use super::EntityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A reusable reflection question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: EntityId,
    pub text: String,
    /// Calendar day this prompt was rotated in. Set once, never changed.
    pub assigned_date: Option<NaiveDate>,
    pub created_at: i64,
}

impl Prompt {
    /// Whether the rotation selector has not used this prompt yet.
    pub fn is_unassigned(&self) -> bool {
        self.assigned_date.is_none()
    }
}

/// Free-text answer to a prompt. A prompt may collect many over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: EntityId,
    pub prompt_id: EntityId,
    pub text: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The most recent response written today, paired with its prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredPrompt {
    pub response: Response,
    pub prompt: Prompt,
}
