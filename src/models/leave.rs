//! Leave records.
//!
//! Leaves share the storage contract but do not feed into payroll
//! computation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A stored leave entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    /// Store-assigned identifier.
    pub id: i64,
    /// The employee on leave.
    pub employee_id: i64,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Free-text reason.
    pub reason: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Leave {
    /// Number of calendar days covered, both ends inclusive.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Payload for creating a leave entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLeave {
    /// The employee on leave.
    pub employee_id: i64,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Free-text reason.
    #[serde(default)]
    pub reason: String,
}

impl NewLeave {
    /// Checks that the employee reference is set and the range is not inverted.
    pub fn validate(&self) -> EngineResult<()> {
        if self.employee_id <= 0 {
            return Err(EngineError::validation("employee_id", "must be positive"));
        }
        if self.end_date < self.start_date {
            return Err(EngineError::validation(
                "end_date",
                format!("{} is before start date {}", self.end_date, self.start_date),
            ));
        }
        Ok(())
    }

    /// Builds the stored record once the store has assigned an id.
    pub fn into_leave(self, id: i64, created_at: DateTime<Utc>) -> Leave {
        Leave {
            id,
            employee_id: self.employee_id,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            created_at,
        }
    }
}
