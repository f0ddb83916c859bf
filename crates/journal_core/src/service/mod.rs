//! Derived journal behavior layered on repositories.
//!
//! # Responsibility
//! - Rotate one unused prompt in per calendar day.
//! - Compute consecutive-day streaks from any activity log.
//! - Keep hosts decoupled from storage details.

pub mod rotation;
pub mod streak;
