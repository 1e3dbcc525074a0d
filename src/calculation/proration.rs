//! Day-level proration for partial-period employment.
//!
//! This module works out how many days of a pay period an employee was
//! employed for, given their hire date and optional termination date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::PayPeriod;

/// Worked and total day counts for one employee within one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proration {
    /// Days the employee was employed within the period, both ends inclusive.
    pub worked_days: u32,
    /// Days in the period, both ends inclusive.
    pub total_days: u32,
}

impl Proration {
    /// Returns true when an item should be generated for this overlap.
    pub fn is_payable(&self) -> bool {
        self.worked_days > 0 && self.total_days > 0
    }

    /// Returns true when the employee was employed for the whole period.
    pub fn is_full_period(&self) -> bool {
        self.is_payable() && self.worked_days == self.total_days
    }
}

fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = (end - start).num_days();
    if span < 0 { 0 } else { span as u32 + 1 }
}

/// Computes the overlap between an employment span and a period.
///
/// The employment span starts at `hired_on` and ends at `terminated_on`
/// (inclusive) or runs open-ended. The result is clamped to
/// `[period_start, period_end]`:
///
/// - an inverted period yields `0/0`
/// - termination before the period yields `0/total`
/// - hire after the period, or termination before hire, yields `0/total`
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::overlap_days;
/// use chrono::NaiveDate;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
///
/// // Hired mid-month, still employed
/// let proration = overlap_days(d(9, 16), None, d(9, 1), d(9, 30));
/// assert_eq!(proration.worked_days, 15);
/// assert_eq!(proration.total_days, 30);
/// ```
pub fn overlap_days(
    hired_on: NaiveDate,
    terminated_on: Option<NaiveDate>,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Proration {
    if period_end < period_start {
        return Proration {
            worked_days: 0,
            total_days: 0,
        };
    }

    let total_days = inclusive_days(period_start, period_end);
    let not_worked = Proration {
        worked_days: 0,
        total_days,
    };

    let effective_start = period_start.max(hired_on);
    let effective_end = match terminated_on {
        Some(end) if end < period_start => return not_worked,
        Some(end) => period_end.min(end),
        None => period_end,
    };

    if effective_end < effective_start {
        return not_worked;
    }

    Proration {
        worked_days: inclusive_days(effective_start, effective_end),
        total_days,
    }
}

/// Convenience wrapper over [`overlap_days`] for a resolved [`PayPeriod`].
pub fn prorate_for_period(
    hired_on: NaiveDate,
    terminated_on: Option<NaiveDate>,
    period: &PayPeriod,
) -> Proration {
    overlap_days(hired_on, terminated_on, period.start_date, period.end_date)
}
