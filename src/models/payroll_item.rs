//! Payroll item models.
//!
//! A [`PayrollItem`] is one employee's computed line within a payroll run.
//! Items are written by the materializer in bulk through [`NewPayrollItem`]
//! and only ever patched afterwards through an explicit
//! [`PayrollItemOverride`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One employee's computed pay for a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollItem {
    /// Store-assigned identifier.
    pub id: i64,
    /// The owning run.
    pub run_id: i64,
    /// The employee this line was computed for.
    pub employee_id: i64,
    /// Base salary after proration.
    pub prorated_base: Decimal,
    /// Withholding tax.
    pub tax_withheld: Decimal,
    /// Social security contribution.
    pub social_security: Decimal,
    /// Provident fund contribution.
    pub provident_fund: Decimal,
    /// Amount payable to the employee.
    pub net_pay: Decimal,
    /// Days worked within the period.
    pub worked_days: u32,
    /// Days in the period.
    pub total_days: u32,
    /// When the line was generated.
    pub generated_at: DateTime<Utc>,
}

impl PayrollItem {
    /// Sum of all deductions on this line.
    pub fn total_deductions(&self) -> Decimal {
        self.tax_withheld + self.social_security + self.provident_fund
    }

    /// Reference string used by payment exports.
    ///
    /// ```
    /// # use payroll_engine::models::PayrollItem;
    /// # use chrono::Utc;
    /// # use rust_decimal::Decimal;
    /// let item = PayrollItem {
    ///     id: 9,
    ///     run_id: 4,
    ///     employee_id: 2,
    ///     prorated_base: Decimal::new(1000000, 2),
    ///     tax_withheld: Decimal::new(50000, 2),
    ///     social_security: Decimal::ZERO,
    ///     provident_fund: Decimal::ZERO,
    ///     net_pay: Decimal::new(950000, 2),
    ///     worked_days: 30,
    ///     total_days: 30,
    ///     generated_at: Utc::now(),
    /// };
    /// assert_eq!(item.reference(), "RUN-4");
    /// assert_eq!(item.display_amount(), "9500.00");
    /// ```
    pub fn reference(&self) -> String {
        format!("RUN-{}", self.run_id)
    }

    /// Net pay formatted with exactly two decimal places.
    pub fn display_amount(&self) -> String {
        format!("{:.2}", self.net_pay)
    }
}

/// A payroll item that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayrollItem {
    /// The owning run.
    pub run_id: i64,
    /// The employee this line was computed for.
    pub employee_id: i64,
    /// Base salary after proration.
    pub prorated_base: Decimal,
    /// Withholding tax.
    pub tax_withheld: Decimal,
    /// Social security contribution.
    pub social_security: Decimal,
    /// Provident fund contribution.
    pub provident_fund: Decimal,
    /// Amount payable to the employee.
    pub net_pay: Decimal,
    /// Days worked within the period.
    pub worked_days: u32,
    /// Days in the period.
    pub total_days: u32,
}

impl NewPayrollItem {
    /// Attaches a store-assigned id and generation timestamp.
    pub fn into_item(self, id: i64, generated_at: DateTime<Utc>) -> PayrollItem {
        PayrollItem {
            id,
            run_id: self.run_id,
            employee_id: self.employee_id,
            prorated_base: self.prorated_base,
            tax_withheld: self.tax_withheld,
            social_security: self.social_security,
            provident_fund: self.provident_fund,
            net_pay: self.net_pay,
            worked_days: self.worked_days,
            total_days: self.total_days,
            generated_at,
        }
    }
}

/// Manual correction of a single payroll item.
///
/// Omitted fields keep their current value. Net pay is always recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollItemOverride {
    /// Replacement prorated base.
    #[serde(default)]
    pub prorated_base: Option<Decimal>,
    /// Replacement withholding tax.
    #[serde(default)]
    pub tax_withheld: Option<Decimal>,
    /// Replacement social security contribution.
    #[serde(default)]
    pub social_security: Option<Decimal>,
    /// Replacement provident fund contribution.
    #[serde(default)]
    pub provident_fund: Option<Decimal>,
}

impl PayrollItemOverride {
    /// Returns true when no field would change.
    pub fn is_empty(&self) -> bool {
        self.prorated_base.is_none()
            && self.tax_withheld.is_none()
            && self.social_security.is_none()
            && self.provident_fund.is_none()
    }

    /// Named replacement values, for validation and logging.
    pub fn fields(&self) -> [(&'static str, Option<Decimal>); 4] {
        [
            ("prorated_base", self.prorated_base),
            ("tax_withheld", self.tax_withheld),
            ("social_security", self.social_security),
            ("provident_fund", self.provident_fund),
        ]
    }
}
