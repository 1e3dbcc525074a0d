//! Pay period model.
//!
//! This module contains the [`PayPeriod`] type: one calendar month expressed
//! as an inclusive date range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar month resolved to its first and last day.
///
/// Instances are normally produced by
/// [`resolve_period`](crate::calculation::resolve_period), which guarantees
/// that `start_date` is the first and `end_date` the last day of
/// `year`-`month`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::resolve_period;
/// use chrono::NaiveDate;
///
/// let period = resolve_period(2025, 9).unwrap();
///
/// assert_eq!(period.total_days(), 30);
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()));
/// assert!(!period.contains_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// The first day of the period (inclusive).
    pub start_date: NaiveDate,
    /// The last day of the period (inclusive).
    pub end_date: NaiveDate,
}

impl PayPeriod {
    /// Checks if a given date falls within this pay period.
    ///
    /// The check is inclusive of both start and end dates.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Number of days in the period, both ends inclusive.
    ///
    /// Returns 0 for an inverted range.
    pub fn total_days(&self) -> u32 {
        let span = (self.end_date - self.start_date).num_days();
        if span < 0 { 0 } else { span as u32 + 1 }
    }

    /// Returns the period as `YYYY-MM`.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}
