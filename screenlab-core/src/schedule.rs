//! Rebalance throttle keys.
//!
//! The coarse selector runs at most once per distinct key. How a date maps
//! to a key decides the rebalance cadence.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque throttle key. Two cycles with equal keys never both run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CycleKey(pub i64);

impl fmt::Display for CycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Date-to-key discretizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceSchedule {
    /// Key is the day of the month (1..=31).
    ///
    /// Keys repeat every month, so this only suppresses a rerun on the same
    /// calendar day-number as the previous run. With daily delivery it
    /// effectively reruns every trading day, and two consecutive runs a
    /// month apart on the same day-number are skipped.
    #[default]
    DayOfMonth,
    /// Key is the calendar month; one run per month.
    CalendarMonth,
    /// Key is the calendar day; one run per date.
    Daily,
}

impl RebalanceSchedule {
    pub fn key_for(&self, date: NaiveDate) -> CycleKey {
        match self {
            RebalanceSchedule::DayOfMonth => CycleKey(i64::from(date.day())),
            RebalanceSchedule::CalendarMonth => {
                CycleKey(i64::from(date.year()) * 12 + i64::from(date.month0()))
            }
            RebalanceSchedule::Daily => CycleKey(i64::from(date.num_days_from_ce())),
        }
    }
}
