//! Calculation logic for the payroll engine.
//!
//! This module contains the pure functions that turn employee records into
//! payroll amounts: period resolution and date normalization, day-level
//! proration for partial employment, and the deduction engine with its
//! single rounding rule.

mod deductions;
mod period;
mod proration;

pub use deductions::{
    DeductionBreakdown, DeductionRates, MONEY_DECIMAL_PLACES, compute_item, round_money,
};
pub use period::{normalize_date, parse_calendar_date, parse_period, resolve_period};
pub use proration::{Proration, overlap_days, prorate_for_period};
