//! Core data models for the payroll engine.
//!
//! This module contains all the domain records the engine reads and writes.

mod employee;
mod leave;
mod pay_period;
mod payroll_item;
mod payroll_run;

pub use employee::{Employee, EmployeeStatus, MAX_MONEY, MONEY_SCALE, NewEmployee, RATE_SCALE};
pub(crate) use employee::{validate_money_bound, validate_rate, validate_termination};
pub use leave::{Leave, NewLeave};
pub use pay_period::PayPeriod;
pub use payroll_item::{NewPayrollItem, PayrollItem, PayrollItemOverride};
pub use payroll_run::PayrollRun;
