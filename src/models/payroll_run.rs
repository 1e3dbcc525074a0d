//! Payroll run model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payroll run for one calendar month.
///
/// At most one run exists per `(period_year, period_month)`. A run owns the
/// payroll items produced by its most recent materialization.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayrollRun;
/// use chrono::Utc;
///
/// let run = PayrollRun {
///     id: 1,
///     period_year: 2025,
///     period_month: 10,
///     locked: false,
///     created_at: Utc::now(),
/// };
/// assert_eq!(run.period_label(), "2025-10");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Store-assigned identifier.
    pub id: i64,
    /// Calendar year of the period.
    pub period_year: i32,
    /// Calendar month of the period (1-12).
    pub period_month: u32,
    /// Reserved write-protection flag; recomputation does not consult it.
    pub locked: bool,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
}

impl PayrollRun {
    /// Returns the period as `YYYY-MM`.
    pub fn period_label(&self) -> String {
        format!("{:04}-{:02}", self.period_year, self.period_month)
    }

    /// Returns true if this run covers the given period.
    pub fn covers(&self, year: i32, month: u32) -> bool {
        self.period_year == year && self.period_month == month
    }
}
