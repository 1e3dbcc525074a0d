//! Employee model and related types.
//!
//! This module defines the [`Employee`] record as stored by the engine, the
//! [`NewEmployee`] payload used to create one, and the [`EmployeeStatus`]
//! lifecycle flag.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Lifecycle status of an employee.
///
/// Employees are never deleted; leaving the company flips the status to
/// `Terminated` and records a termination date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// Currently employed and included in payroll runs.
    #[default]
    Active,
    /// No longer employed; excluded from payroll runs.
    Terminated,
}

impl EmployeeStatus {
    /// Returns the storage representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Terminated => "terminated",
        }
    }

    /// Parses the storage representation of the status.
    pub fn parse(value: &str) -> EngineResult<Self> {
        match value {
            "active" => Ok(EmployeeStatus::Active),
            "terminated" => Ok(EmployeeStatus::Terminated),
            other => Err(EngineError::validation(
                "status",
                format!("must be 'active' or 'terminated', got '{other}'"),
            )),
        }
    }
}

/// Represents an employee as persisted by a [`PayrollStore`](crate::storage::PayrollStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Store-assigned identifier.
    pub id: i64,
    /// Employee code (e.g., "E001").
    pub code: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Department, descriptive only.
    #[serde(default)]
    pub department: String,
    /// Position, descriptive only.
    #[serde(default)]
    pub position: String,
    /// Bank account used by payment exports.
    #[serde(default)]
    pub bank_account: String,
    /// Full-period (monthly) salary before proration.
    pub base_salary: Decimal,
    /// First day of employment.
    pub hired_on: NaiveDate,
    /// Last day of employment, if the employee has left.
    pub terminated_on: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: EmployeeStatus,
    /// Withholding tax rate; `None` falls back to the configured default.
    pub withholding_rate: Option<Decimal>,
    /// Provident fund contribution rate.
    pub provident_fund_rate: Decimal,
    /// Whether the social security contribution applies.
    pub social_security_enabled: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Returns true if the employee takes part in payroll runs.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{Employee, EmployeeStatus};
    /// use chrono::{NaiveDate, Utc};
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: 1,
    ///     code: "E001".to_string(),
    ///     first_name: "Ada".to_string(),
    ///     last_name: "Lovelace".to_string(),
    ///     department: String::new(),
    ///     position: String::new(),
    ///     bank_account: String::new(),
    ///     base_salary: Decimal::new(50000, 0),
    ///     hired_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     terminated_on: None,
    ///     status: EmployeeStatus::Active,
    ///     withholding_rate: None,
    ///     provident_fund_rate: Decimal::new(3, 2),
    ///     social_security_enabled: true,
    ///     created_at: Utc::now(),
    /// };
    /// assert!(employee.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Returns "first last", tolerating a blank half.
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (_, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (false, false) => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

fn default_provident_fund_rate() -> Decimal {
    Decimal::new(3, 2)
}

fn default_social_security_enabled() -> bool {
    true
}

/// Payload for creating an employee.
///
/// Defaults mirror what the creation endpoint applies when a field is
/// omitted: active status, a 3% provident fund rate, and social security
/// enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Employee code (e.g., "E001").
    pub code: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Department, descriptive only.
    #[serde(default)]
    pub department: String,
    /// Position, descriptive only.
    #[serde(default)]
    pub position: String,
    /// Bank account used by payment exports.
    #[serde(default)]
    pub bank_account: String,
    /// Full-period salary before proration.
    pub base_salary: Decimal,
    /// First day of employment.
    pub hired_on: NaiveDate,
    /// Last day of employment, if known at creation.
    #[serde(default)]
    pub terminated_on: Option<NaiveDate>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: EmployeeStatus,
    /// Withholding tax rate; `None` falls back to the configured default.
    #[serde(default)]
    pub withholding_rate: Option<Decimal>,
    /// Provident fund contribution rate.
    #[serde(default = "default_provident_fund_rate")]
    pub provident_fund_rate: Decimal,
    /// Whether the social security contribution applies.
    #[serde(default = "default_social_security_enabled")]
    pub social_security_enabled: bool,
}

impl NewEmployee {
    /// Creates a payload with the required fields and default deduction settings.
    pub fn new(
        code: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        base_salary: Decimal,
        hired_on: NaiveDate,
    ) -> Self {
        Self {
            code: code.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            department: String::new(),
            position: String::new(),
            bank_account: String::new(),
            base_salary,
            hired_on,
            terminated_on: None,
            status: EmployeeStatus::Active,
            withholding_rate: None,
            provident_fund_rate: default_provident_fund_rate(),
            social_security_enabled: default_social_security_enabled(),
        }
    }

    /// Checks the record invariants.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when a name or code is blank, the
    /// salary is negative, above [`MAX_MONEY`] or finer than cents, a rate is
    /// outside `[0, 1]` or has more than six places, or the termination date
    /// precedes the hire date.
    pub fn validate(&self) -> EngineResult<()> {
        for (field, value) in [
            ("code", &self.code),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                return Err(EngineError::validation(field, "must not be blank"));
            }
        }

        if self.base_salary < Decimal::ZERO {
            return Err(EngineError::validation("base_salary", "must be >= 0"));
        }
        validate_money_bound("base_salary", self.base_salary)?;
        if self.base_salary.normalize().scale() > MONEY_SCALE {
            return Err(EngineError::validation(
                "base_salary",
                format!("must have at most {MONEY_SCALE} decimal places"),
            ));
        }

        validate_rate("provident_fund_rate", self.provident_fund_rate)?;
        if let Some(rate) = self.withholding_rate {
            validate_rate("withholding_rate", rate)?;
        }

        validate_termination(self.hired_on, self.terminated_on)
    }

    /// Builds the stored record once the store has assigned an id.
    pub fn into_employee(self, id: i64, created_at: DateTime<Utc>) -> Employee {
        Employee {
            id,
            code: self.code,
            first_name: self.first_name,
            last_name: self.last_name,
            department: self.department,
            position: self.position,
            bank_account: self.bank_account,
            base_salary: self.base_salary,
            hired_on: self.hired_on,
            terminated_on: self.terminated_on,
            status: self.status,
            withholding_rate: self.withholding_rate,
            provident_fund_rate: self.provident_fund_rate,
            social_security_enabled: self.social_security_enabled,
            created_at,
        }
    }

    /// Returns a copy with surrounding whitespace trimmed from text fields.
    pub fn trimmed(mut self) -> Self {
        for value in [
            &mut self.code,
            &mut self.first_name,
            &mut self.last_name,
            &mut self.department,
            &mut self.position,
            &mut self.bank_account,
        ] {
            *value = value.trim().to_string();
        }
        self
    }
}

/// Largest monetary amount a `NUMERIC(18, 2)` column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 2);
/// Decimal places stored for salaries.
pub const MONEY_SCALE: u32 = 2;
/// Decimal places stored for rates, `NUMERIC(9, 6)`.
pub const RATE_SCALE: u32 = 6;

/// Rejects amounts above [`MAX_MONEY`].
pub(crate) fn validate_money_bound(field: &str, amount: Decimal) -> EngineResult<()> {
    if amount > MAX_MONEY {
        return Err(EngineError::validation(
            field,
            format!("must not exceed {MAX_MONEY}"),
        ));
    }
    Ok(())
}

/// Rejects rates outside `[0, 1]` or finer than [`RATE_SCALE`] places.
pub(crate) fn validate_rate(field: &str, rate: Decimal) -> EngineResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(EngineError::validation(field, "must be between 0 and 1"));
    }
    if rate.normalize().scale() > RATE_SCALE {
        return Err(EngineError::validation(
            field,
            format!("must have at most {RATE_SCALE} decimal places"),
        ));
    }
    Ok(())
}

/// Rejects a termination date earlier than the hire date.
pub(crate) fn validate_termination(
    hired_on: NaiveDate,
    terminated_on: Option<NaiveDate>,
) -> EngineResult<()> {
    match terminated_on {
        Some(end) if end < hired_on => Err(EngineError::validation(
            "terminated_on",
            format!("{end} is before hire date {hired_on}"),
        )),
        _ => Ok(()),
    }
}
