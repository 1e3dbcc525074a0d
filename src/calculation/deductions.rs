//! Deduction engine.
//!
//! This module turns a full-period salary and a [`Proration`] into the five
//! monetary amounts of a payroll item: prorated gross, withholding tax,
//! social security contribution, provident fund contribution and net pay.
//!
//! All arithmetic is carried at full [`Decimal`] precision. Each component is
//! rounded exactly once, at the end, through [`round_money`]; net pay is then
//! derived from the rounded components so that
//! `net = prorated - tax - social_security - provident_fund` holds exactly.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::proration::Proration;
use crate::config::DeductionConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, NewPayrollItem};

/// Number of decimal places carried by every monetary output.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Rounds a monetary amount to two places, half away from zero.
///
/// This is the only rounding applied to payroll amounts.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("2.345").unwrap()), Decimal::from_str("2.35").unwrap());
/// assert_eq!(round_money(Decimal::from_str("-2.345").unwrap()), Decimal::from_str("-2.35").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Per-employee deduction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRates {
    /// Withholding tax rate; `None` uses the configured default.
    pub withholding_rate: Option<Decimal>,
    /// Provident fund contribution rate.
    pub provident_fund_rate: Decimal,
    /// Whether the social security contribution applies.
    pub social_security_enabled: bool,
}

impl DeductionRates {
    /// Extracts the deduction parameters stored on an employee.
    pub fn for_employee(employee: &Employee) -> Self {
        Self {
            withholding_rate: employee.withholding_rate,
            provident_fund_rate: employee.provident_fund_rate,
            social_security_enabled: employee.social_security_enabled,
        }
    }
}

/// The computed amounts for one employee, rounded to two places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    /// Base salary scaled by worked days.
    pub prorated: Decimal,
    /// Withholding tax.
    pub tax: Decimal,
    /// Social security contribution (capped).
    pub social_security: Decimal,
    /// Provident fund contribution (uncapped).
    pub provident_fund: Decimal,
    /// Net pay.
    pub net: Decimal,
    /// The withholding rate that was applied, after fallback.
    pub withholding_rate: Decimal,
}

impl DeductionBreakdown {
    /// Builds the persistable item for a run and employee.
    pub fn into_new_item(
        self,
        run_id: i64,
        employee_id: i64,
        proration: Proration,
    ) -> NewPayrollItem {
        NewPayrollItem {
            run_id,
            employee_id,
            prorated_base: self.prorated,
            tax_withheld: self.tax,
            social_security: self.social_security,
            provident_fund: self.provident_fund,
            net_pay: self.net,
            worked_days: proration.worked_days,
            total_days: proration.total_days,
        }
    }
}

/// Computes the payroll amounts for one employee.
///
/// Returns `None` when the proration has no worked days or an empty period;
/// no item is generated in that case.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] on `base_salary` when an intermediate
/// amount overflows [`Decimal`].
///
/// # Arguments
///
/// * `base_salary` - The full-period salary
/// * `proration` - Worked and total days within the period
/// * `rates` - The employee's deduction parameters
/// * `config` - Statutory constants (social security rate and cap, default
///   withholding rate, exemption threshold)
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{compute_item, DeductionRates, Proration};
/// use payroll_engine::config::DeductionConfig;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let rates = DeductionRates {
///     withholding_rate: None,
///     provident_fund_rate: dec("0.03"),
///     social_security_enabled: true,
/// };
/// let proration = Proration { worked_days: 15, total_days: 30 };
///
/// let result = compute_item(dec("50000"), proration, &rates, &DeductionConfig::default())
///     .unwrap()
///     .unwrap();
/// assert_eq!(result.prorated, dec("25000.00"));
/// assert_eq!(result.social_security, dec("750.00"));
/// assert_eq!(result.provident_fund, dec("750.00"));
/// assert_eq!(result.tax, dec("1175.00"));
/// assert_eq!(result.net, dec("22325.00"));
/// ```
pub fn compute_item(
    base_salary: Decimal,
    proration: Proration,
    rates: &DeductionRates,
    config: &DeductionConfig,
) -> EngineResult<Option<DeductionBreakdown>> {
    if !proration.is_payable() {
        return Ok(None);
    }

    let out_of_range = || {
        EngineError::validation("base_salary", format!("{base_salary} is too large to compute"))
    };

    let prorated = base_salary
        .checked_mul(Decimal::from(proration.worked_days))
        .and_then(|scaled| scaled.checked_div(Decimal::from(proration.total_days)))
        .ok_or_else(out_of_range)?;

    let social_security = if rates.social_security_enabled {
        config
            .social_security_rate
            .checked_mul(prorated.min(config.social_security_cap_base))
            .ok_or_else(out_of_range)?
    } else {
        Decimal::ZERO
    };
    let provident_fund = rates
        .provident_fund_rate
        .checked_mul(prorated)
        .ok_or_else(out_of_range)?;

    let withholding_rate = match rates.withholding_rate {
        Some(rate) => rate,
        None => {
            debug!(
                default_rate = %config.default_withholding_rate,
                "No withholding rate configured for employee, using default"
            );
            config.default_withholding_rate
        }
    };

    let taxable = prorated
        .checked_sub(social_security)
        .and_then(|amount| amount.checked_sub(provident_fund))
        .ok_or_else(out_of_range)?;
    let tax = if taxable <= config.tax_exemption_threshold {
        Decimal::ZERO
    } else {
        taxable
            .checked_sub(config.tax_exemption_threshold)
            .and_then(|amount| withholding_rate.checked_mul(amount))
            .ok_or_else(out_of_range)?
    };

    let prorated = round_money(prorated);
    let tax = round_money(tax);
    let social_security = round_money(social_security);
    let provident_fund = round_money(provident_fund);
    let net = prorated
        .checked_sub(tax)
        .and_then(|amount| amount.checked_sub(social_security))
        .and_then(|amount| amount.checked_sub(provident_fund))
        .map(round_money)
        .ok_or_else(out_of_range)?;

    Ok(Some(DeductionBreakdown {
        prorated,
        tax,
        social_security,
        provident_fund,
        net,
        withholding_rate,
    }))
}
