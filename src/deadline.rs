// ⏳ Deadline Calculator - 180-day protest window
//
// deadline       = liquidation_date + 180 calendar days
// days_remaining = deadline - today, in whole days (negative once passed)
//
// "today" comes from a `Clock` so callers that need reproducible output can
// pin it. The pipeline reads the clock once per run.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Fixed regulatory protest window after liquidation.
pub const PROTEST_WINDOW_DAYS: u64 = 180;

/// Deadlines closer than this are urgent.
pub const URGENT_WINDOW_DAYS: i64 = 90;

// ============================================================================
// CLOCK
// ============================================================================

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

// ============================================================================
// CALCULATIONS
// ============================================================================

pub fn protest_deadline(liquidation_date: Option<NaiveDate>) -> Option<NaiveDate> {
    liquidation_date?.checked_add_days(Days::new(PROTEST_WINDOW_DAYS))
}

pub fn days_remaining(deadline: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    deadline.map(|d| (d - today).num_days())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeadlineStatus {
    /// 90 days or more left
    Open,
    /// 0 <= days_remaining < 90
    Urgent,
    /// Deadline already passed
    Overdue,
    /// No liquidation date, so no clock is running
    Unknown,
}

impl DeadlineStatus {
    pub fn classify(days_remaining: Option<i64>) -> Self {
        match days_remaining {
            None => DeadlineStatus::Unknown,
            Some(d) if d < 0 => DeadlineStatus::Overdue,
            Some(d) if d < URGENT_WINDOW_DAYS => DeadlineStatus::Urgent,
            Some(_) => DeadlineStatus::Open,
        }
    }
}
