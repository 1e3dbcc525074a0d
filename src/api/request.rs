//! Request types for the payroll engine API.
//!
//! Dates arrive as strings so that both `YYYY-MM-DD` and RFC 3339 values are
//! accepted; conversion into domain payloads normalizes them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{parse_calendar_date, parse_period};
use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeStatus, NewEmployee, NewLeave};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: usize = 200;

/// Request body for `POST /api/v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Request body for `POST /api/v1/employees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployeeRequest {
    /// Employee code (e.g., "E001").
    pub code: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Department.
    #[serde(default)]
    pub department: String,
    /// Position.
    #[serde(default)]
    pub position: String,
    /// Bank account.
    #[serde(default)]
    pub bank_account: String,
    /// Full-period salary.
    pub base_salary: Decimal,
    /// Hire date, `YYYY-MM-DD` or RFC 3339.
    pub hired_on: String,
    /// Termination date, `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub terminated_on: Option<String>,
    /// Lifecycle status; defaults to active.
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
    /// Withholding tax rate; omitted means the configured default.
    #[serde(default)]
    pub withholding_rate: Option<Decimal>,
    /// Provident fund rate; defaults to 0.03.
    #[serde(default)]
    pub provident_fund_rate: Option<Decimal>,
    /// Social security eligibility; defaults to true.
    #[serde(default)]
    pub social_security_enabled: Option<bool>,
}

impl TryFrom<CreateEmployeeRequest> for NewEmployee {
    type Error = EngineError;

    fn try_from(request: CreateEmployeeRequest) -> EngineResult<Self> {
        let hired_on = parse_calendar_date("hired_on", &request.hired_on)?;
        let mut employee = NewEmployee::new(
            request.code,
            request.first_name,
            request.last_name,
            request.base_salary,
            hired_on,
        );

        employee.department = request.department;
        employee.position = request.position;
        employee.bank_account = request.bank_account;
        employee.terminated_on = parse_optional_date("terminated_on", request.terminated_on)?;
        employee.withholding_rate = request.withholding_rate;
        if let Some(status) = request.status {
            employee.status = status;
        }
        if let Some(rate) = request.provident_fund_rate {
            employee.provident_fund_rate = rate;
        }
        if let Some(enabled) = request.social_security_enabled {
            employee.social_security_enabled = enabled;
        }

        Ok(employee)
    }
}

/// Request body for `PUT /api/v1/employees/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status.
    pub status: EmployeeStatus,
    /// Termination date, `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub terminated_on: Option<String>,
}

impl UpdateStatusRequest {
    /// Parses the termination date, if any.
    pub fn termination_date(&self) -> EngineResult<Option<chrono::NaiveDate>> {
        parse_optional_date("terminated_on", self.terminated_on.clone())
    }
}

/// Request body for `POST /api/v1/payroll/runs`.
///
/// Either `year` and `month`, or a `pay_date` designator (`YYYY-MM`,
/// `YYYY-MM-DD` or RFC 3339).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// Period year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Period month.
    #[serde(default)]
    pub month: Option<u32>,
    /// Alternative period designator.
    #[serde(default)]
    pub pay_date: Option<String>,
}

impl CreateRunRequest {
    /// Resolves the requested `(year, month)`.
    pub fn period(&self) -> EngineResult<(i32, u32)> {
        match (self.year, self.month, self.pay_date.as_deref()) {
            (Some(year), Some(month), _) => Ok((year, month)),
            (_, _, Some(pay_date)) => parse_period(pay_date),
            _ => Err(EngineError::validation(
                "period",
                "provide year and month, or pay_date",
            )),
        }
    }
}

/// Query parameters for `GET /api/v1/employees`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEmployeesQuery {
    /// Case-insensitive filter over code, names and department.
    #[serde(default)]
    pub q: Option<String>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Records to skip.
    #[serde(default)]
    pub offset: Option<usize>,
}

impl ListEmployeesQuery {
    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Records to skip.
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Lower-cased, trimmed search term, if any.
    pub fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

/// Request body for `POST /api/v1/leave`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeaveRequest {
    /// The employee on leave.
    pub employee_id: i64,
    /// First day, `YYYY-MM-DD` or RFC 3339.
    pub start_date: String,
    /// Last day, `YYYY-MM-DD` or RFC 3339.
    pub end_date: String,
    /// Free-text reason.
    #[serde(default)]
    pub reason: String,
}

impl TryFrom<CreateLeaveRequest> for NewLeave {
    type Error = EngineError;

    fn try_from(request: CreateLeaveRequest) -> EngineResult<Self> {
        Ok(NewLeave {
            employee_id: request.employee_id,
            start_date: parse_calendar_date("start_date", &request.start_date)?,
            end_date: parse_calendar_date("end_date", &request.end_date)?,
            reason: request.reason.trim().to_string(),
        })
    }
}

fn parse_optional_date(
    field: &str,
    value: Option<String>,
) -> EngineResult<Option<chrono::NaiveDate>> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_calendar_date(field, &raw))
        .transpose()
}
