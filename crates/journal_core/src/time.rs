//! Calendar-day source of truth for rotation and streak logic.
//!
//! # Responsibility
//! - Answer "what day is it" for every core component through one trait.
//! - Convert between epoch-millisecond timestamps and local calendar days.
//!
//! # Invariants
//! - Calendar days are computed in the process-local timezone.
//! - Persisted timestamps are epoch milliseconds produced by a `Clock`.

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone};
use std::cell::Cell;

/// Source of the current instant for core operations.
///
/// Repositories and services never call `Local::now()` directly, so tests can
/// pin the calendar with [`FixedClock`].
pub trait Clock {
    /// Current local instant.
    fn now(&self) -> DateTime<Local>;

    /// Current instant as epoch milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Current local calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// The calendar day before [`Clock::today`].
    fn yesterday(&self) -> NaiveDate {
        days_before(self.today(), 1)
    }
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Pins the clock to noon of `date`.
    ///
    /// Noon avoids ambiguous or skipped local times around DST transitions.
    pub fn at_noon(date: NaiveDate) -> Self {
        Self::new(local_noon(date))
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: DateTime<Local>) {
        self.now.set(now);
    }

    /// Moves the clock to noon of `date`.
    pub fn set_date(&self, date: NaiveDate) {
        self.set(local_noon(date));
    }

    /// Advances the clock by `millis` milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        self.now
            .set(self.now.get() + chrono::Duration::milliseconds(millis));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

/// Returns `date` shifted `days` calendar days into the past.
///
/// Saturates at `NaiveDate::MIN` instead of panicking.
pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

/// Local calendar day of an epoch-millisecond timestamp.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn local_date_of_millis(millis: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|instant| instant.date_naive())
}

/// Epoch milliseconds of local midnight starting `date`.
///
/// When midnight does not exist locally (DST gap), the first valid instant of
/// the day is used.
pub fn local_day_start_millis(date: NaiveDate) -> i64 {
    let midnight = date.and_time(chrono::NaiveTime::default());
    match Local.from_local_datetime(&midnight).earliest() {
        Some(instant) => instant.timestamp_millis(),
        None => {
            // Skip forward in 1h steps until the local time exists.
            let mut probe = midnight;
            for _ in 0..24 {
                probe += chrono::Duration::hours(1);
                if let Some(instant) = Local.from_local_datetime(&probe).earliest() {
                    return instant.timestamp_millis();
                }
            }
            midnight.and_utc().timestamp_millis()
        }
    }
}

/// `[start, end)` epoch-millisecond range covering a local calendar day.
pub fn local_day_bounds(date: NaiveDate) -> (i64, i64) {
    let start = local_day_start_millis(date);
    let end = match date.checked_add_days(Days::new(1)) {
        Some(next) => local_day_start_millis(next),
        None => i64::MAX,
    };
    (start, end)
}

fn local_noon(date: NaiveDate) -> DateTime<Local> {
    let noon = date.and_time(chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
    Local
        .from_local_datetime(&noon)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&noon))
}
