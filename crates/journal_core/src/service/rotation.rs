//! Daily prompt rotation.
//!
//! # Responsibility
//! - Pick the prompt shown on the current calendar day.
//!
//! # Invariants
//! - Repeated calls on one day return the same prompt.
//! - At most one prompt carries a given `assigned_date`.
//! - A prompt assigned to a day is never reassigned.
//! - Lookup, pick and assignment run in one store transaction.

use crate::db::Store;
use crate::model::prompt::Prompt;
use crate::repo::prompt_repo::{assign_date, find_assigned_on, pick_unassigned};
use crate::repo::{RepoError, RepoResult};
use crate::time::Clock;
use log::{info, warn};

/// Chooses the active prompt for "today" as reported by the clock.
pub struct RotationSelector<'s> {
    store: &'s Store,
    clock: &'s dyn Clock,
}

impl<'s> RotationSelector<'s> {
    pub fn new(store: &'s Store, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Returns today's prompt, assigning a random unused one on first call.
    ///
    /// # Errors
    /// - `RepoError::ExhaustedPool` when today has no prompt yet and every
    ///   prompt has already been assigned to another day.
    pub fn select_for_today(&self) -> RepoResult<Prompt> {
        let today = self.clock.today();

        self.store.with_transaction(|tx| {
            if let Some(prompt) = find_assigned_on(tx, today)? {
                return Ok(prompt);
            }

            let Some(mut prompt) = pick_unassigned(tx)? else {
                warn!(
                    "event=prompt_rotate module=service status=error error_code=exhausted_pool date={}",
                    today
                );
                return Err(RepoError::ExhaustedPool);
            };

            if !assign_date(tx, prompt.id, today)? {
                return Err(RepoError::InvalidData(format!(
                    "prompt {} could not be assigned to {today}",
                    prompt.id
                )));
            }

            info!(
                "event=prompt_rotate module=service status=ok prompt_id={} date={}",
                prompt.id, today
            );
            prompt.assigned_date = Some(today);
            Ok(prompt)
        })
    }

    /// Today's prompt if one was already rotated in, without assigning.
    pub fn peek_today(&self) -> RepoResult<Option<Prompt>> {
        find_assigned_on(self.store.connection()?, self.clock.today())
    }
}
