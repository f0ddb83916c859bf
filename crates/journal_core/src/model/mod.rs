//! Journal domain records.
//!
//! # Responsibility
//! - Define the records handed to hosts (serialized as camelCase).
//! - Own content validation shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a surrogate `i64` id that is never reused.
//! - Timestamps are epoch milliseconds; calendar dates are `NaiveDate`.

pub mod affirmation;
pub mod dated_note;
pub mod prompt;

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate row identity assigned by the store.
pub type EntityId = i64;

/// Rejected user-provided content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentValidationError {
    /// Content is empty or whitespace only.
    EmptyText { field: &'static str },
    /// A day-keyed entry dated after the current calendar day.
    FutureDate {
        field: &'static str,
        date: NaiveDate,
        today: NaiveDate,
    },
}

impl Display for ContentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText { field } => write!(f, "{field} must not be empty"),
            Self::FutureDate { field, date, today } => {
                write!(f, "{field} {date} is after today ({today})")
            }
        }
    }
}

impl Error for ContentValidationError {}

/// Checks free-text content before it reaches storage.
///
/// Content is stored as given; only blank input is rejected.
pub fn validate_text(field: &'static str, text: &str) -> Result<(), ContentValidationError> {
    if text.trim().is_empty() {
        return Err(ContentValidationError::EmptyText { field });
    }
    Ok(())
}

/// Rejects entry dates after `today`.
pub fn validate_entry_date(
    field: &'static str,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), ContentValidationError> {
    if date > today {
        return Err(ContentValidationError::FutureDate { field, date, today });
    }
    Ok(())
}
