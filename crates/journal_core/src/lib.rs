//! Persistence and temporal analytics for the reflection journal.
//! This crate is the single source of truth for journal invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod time;

pub use db::{DbError, DbResult, Store};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::affirmation::{Affirmation, CompletionLog};
pub use model::dated_note::{CreativityEntry, GratitudeDay, GratitudeItem, GRATITUDE_DAILY_LIMIT};
pub use model::prompt::{AnsweredPrompt, Prompt, Response};
pub use model::{ContentValidationError, EntityId};
pub use repo::affirmation_repo::{AffirmationRepository, SqliteAffirmationRepository};
pub use repo::creativity_repo::{CreativityRepository, SqliteCreativityRepository};
pub use repo::gratitude_repo::{GratitudeRepository, SqliteGratitudeRepository};
pub use repo::prompt_repo::{PromptRepository, SqlitePromptRepository};
pub use repo::response_repo::{ResponseRepository, SqliteResponseRepository};
pub use repo::{ActivityLog, ErrorKind, RepoError, RepoResult};
pub use service::rotation::RotationSelector;
pub use service::streak::{current_streak, StreakCalculator};
pub use time::{Clock, FixedClock, SystemClock};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
