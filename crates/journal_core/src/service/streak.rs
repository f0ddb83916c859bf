//! Consecutive-day streak calculation.
//!
//! A streak is the number of consecutive calendar days with activity that
//! ends today or yesterday. A gap longer than one day before today resets it
//! to zero even though older activity is still stored. Activity recorded for a
//! day after today does not anchor a streak.

use crate::repo::{ActivityLog, RepoResult};
use crate::time::{days_before, Clock};
use chrono::NaiveDate;

/// Counts the current streak over activity `dates` relative to `today`.
///
/// `dates` may arrive in any order and may contain duplicates; they are
/// collapsed to distinct days, most recent first, before counting.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&anchor) = days.first() else {
        return 0;
    };
    if anchor != today && anchor != days_before(today, 1) {
        return 0;
    }

    let mut streak = 1;
    for (offset, day) in days.iter().enumerate().skip(1) {
        if *day != days_before(anchor, offset as u64) {
            break;
        }
        streak += 1;
    }
    streak
}

/// Applies [`current_streak`] to any activity log using the shared clock.
pub struct StreakCalculator<'c> {
    clock: &'c dyn Clock,
}

impl<'c> StreakCalculator<'c> {
    pub fn new(clock: &'c dyn Clock) -> Self {
        Self { clock }
    }

    /// Current streak of the given activity log.
    pub fn streak_for(&self, log: &dyn ActivityLog) -> RepoResult<u32> {
        let dates = log.activity_dates()?;
        Ok(current_streak(&dates, self.clock.today()))
    }
}

#[cfg(test)]
mod tests {
    use super::current_streak;
    use crate::time::days_before;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid test date")
    }

    fn ago(days: u64) -> NaiveDate {
        days_before(today(), days)
    }

    #[test]
    fn empty_series_has_no_streak() {
        assert_eq!(current_streak(&[], today()), 0);
    }

    #[test]
    fn three_days_ending_today() {
        assert_eq!(current_streak(&[today(), ago(1), ago(2)], today()), 3);
    }

    #[test]
    fn streak_may_end_yesterday() {
        assert_eq!(current_streak(&[ago(1), ago(2), ago(3), ago(5)], today()), 3);
    }

    #[test]
    fn gap_before_yesterday_resets_to_zero() {
        assert_eq!(current_streak(&[ago(2), ago(3)], today()), 0);
    }

    #[test]
    fn first_gap_stops_counting() {
        assert_eq!(current_streak(&[today(), ago(2), ago(3)], today()), 1);
    }

    #[test]
    fn duplicates_and_order_do_not_matter() {
        let dates = [ago(1), today(), ago(1), ago(2), today()];
        assert_eq!(current_streak(&dates, today()), 3);
    }

    #[test]
    fn streak_crosses_leap_day() {
        // 2024-03-02, 03-01, 02-29, 02-28
        let dates = [ago(0), ago(1), ago(2), ago(3)];
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(current_streak(&dates, today()), 4);
    }

    #[test]
    fn future_activity_does_not_anchor_a_streak() {
        let tomorrow = today().succ_opt().unwrap();
        assert_eq!(current_streak(&[tomorrow, today()], today()), 0);
    }
}
