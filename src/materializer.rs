//! Run materialization.
//!
//! [`RunMaterializer`] drives the clear-and-regenerate protocol: it resolves
//! a run's period, prorates and computes every active employee, and replaces
//! the run's items in one store call. Recomputing a run always yields a fresh
//! item set that fully supersedes the previous one.

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::calculation::{
    DeductionRates, compute_item, prorate_for_period, resolve_period, round_money,
};
use crate::config::DeductionConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    MAX_MONEY, NewPayrollItem, PayrollItem, PayrollItemOverride, PayrollRun,
    validate_money_bound,
};
use crate::storage::PayrollStore;

/// Orchestrates payroll run creation, calculation and item maintenance.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use payroll_engine::config::DeductionConfig;
/// use payroll_engine::materializer::RunMaterializer;
/// use payroll_engine::storage::InMemoryStore;
///
/// # tokio_test_block(async {
/// let materializer = RunMaterializer::new(Arc::new(InMemoryStore::new()), DeductionConfig::default());
/// let run = materializer.create_run(2025, 9).await.unwrap();
/// assert_eq!(materializer.calculate(run.id).await.unwrap(), 0);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(future: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(future)
/// # }
/// ```
pub struct RunMaterializer<S: PayrollStore + ?Sized> {
    store: Arc<S>,
    deductions: DeductionConfig,
    // Held while a period is looked up and, if new, first calculated.
    materializing: Arc<Mutex<()>>,
}

impl<S: PayrollStore + ?Sized> Clone for RunMaterializer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            deductions: self.deductions.clone(),
            materializing: Arc::clone(&self.materializing),
        }
    }
}

impl<S: PayrollStore + ?Sized> RunMaterializer<S> {
    /// Creates a materializer over a store with the given deduction constants.
    pub fn new(store: Arc<S>, deductions: DeductionConfig) -> Self {
        Self {
            store,
            deductions,
            materializing: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the deduction constants in use.
    pub fn deductions(&self) -> &DeductionConfig {
        &self.deductions
    }

    /// Returns the run for `year`-`month`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPeriod`] for an invalid period; nothing
    /// is written in that case.
    pub async fn create_run(&self, year: i32, month: u32) -> EngineResult<PayrollRun> {
        let period = resolve_period(year, month)?;

        if let Some(existing) = self.store.get_run_by_period(year, month).await? {
            debug!(run_id = existing.id, period = %period.label(), "Payroll run already exists");
            return Ok(existing);
        }

        let run = self.store.create_run(year, month).await?;
        info!(run_id = run.id, period = %period.label(), "Payroll run created");
        Ok(run)
    }

    /// Recomputes every item of a run and returns how many were generated.
    ///
    /// Active employees with no worked days in the period are skipped. The
    /// previous item set is replaced atomically.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RunNotFound`] when the run does not exist, and
    /// [`EngineError::Validation`] when an employee's amounts cannot be
    /// computed. Existing items are left untouched in that case.
    pub async fn calculate(&self, run_id: i64) -> EngineResult<usize> {
        let start_time = Instant::now();

        let run = self
            .store
            .get_run(run_id)
            .await?
            .ok_or(EngineError::RunNotFound { run_id })?;
        let period = resolve_period(run.period_year, run.period_month)?;
        let employees = self.store.list_active_employees().await?;

        let mut items: Vec<NewPayrollItem> = Vec::with_capacity(employees.len());
        for employee in &employees {
            let proration = prorate_for_period(employee.hired_on, employee.terminated_on, &period);
            let rates = DeductionRates::for_employee(employee);

            let computed = compute_item(employee.base_salary, proration, &rates, &self.deductions)
                .map_err(|err| {
                    warn!(
                        run_id = run.id,
                        employee_id = employee.id,
                        error = %err,
                        "Failed to compute payroll item"
                    );
                    err
                })?;
            match computed {
                Some(breakdown) => {
                    items.push(breakdown.into_new_item(run.id, employee.id, proration));
                }
                None => {
                    debug!(
                        run_id = run.id,
                        employee_id = employee.id,
                        worked_days = proration.worked_days,
                        "Employee has no worked days in period, skipping"
                    );
                }
            }
        }

        let saved = match self.store.replace_items(run.id, items).await {
            Ok(saved) => saved,
            Err(err) => {
                warn!(run_id = run.id, error = %err, "Failed to replace payroll items");
                return Err(err);
            }
        };

        info!(
            run_id = run.id,
            period = %period.label(),
            employees = employees.len(),
            items = saved.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Payroll run calculated"
        );
        Ok(saved.len())
    }

    /// Returns the run and items for a period, materializing it on first use.
    ///
    /// An existing run is returned with its stored items and is not
    /// recalculated. Concurrent callers through clones of one materializer
    /// never observe a run between its creation and its first calculation.
    pub async fn get_or_create_by_period(
        &self,
        year: i32,
        month: u32,
    ) -> EngineResult<(PayrollRun, Vec<PayrollItem>)> {
        let period = resolve_period(year, month)?;

        let _materializing = self.materializing.lock().await;
        let run = match self.store.get_run_by_period(year, month).await? {
            Some(run) => run,
            None => {
                let run = self.store.create_run(year, month).await?;
                info!(run_id = run.id, period = %period.label(), "Materializing new payroll run");
                self.calculate(run.id).await?;
                run
            }
        };

        let items = self.store.list_items(run.id).await?;
        Ok((run, items))
    }

    /// Lists the items of an existing run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RunNotFound`] when the run does not exist.
    pub async fn list_items(&self, run_id: i64) -> EngineResult<Vec<PayrollItem>> {
        if self.store.get_run(run_id).await?.is_none() {
            return Err(EngineError::RunNotFound { run_id });
        }
        self.store.list_items(run_id).await
    }

    /// Replaces selected amounts of one item and recomputes its net pay.
    ///
    /// The run itself is not recalculated; a later [`calculate`](Self::calculate)
    /// discards the override.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] when no amount is given or one is negative
    /// - [`EngineError::ItemNotFound`] when the item does not exist
    pub async fn override_item(
        &self,
        item_id: i64,
        changes: PayrollItemOverride,
    ) -> EngineResult<PayrollItem> {
        if changes.is_empty() {
            return Err(EngineError::validation(
                "amounts",
                "at least one amount must be provided",
            ));
        }
        for (field, value) in changes.fields() {
            if let Some(amount) = value {
                if amount < Decimal::ZERO {
                    return Err(EngineError::validation(field, "must not be negative"));
                }
                validate_money_bound(field, amount)?;
            }
        }

        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(EngineError::ItemNotFound { item_id })?;

        if let Some(amount) = changes.prorated_base {
            item.prorated_base = round_money(amount);
        }
        if let Some(amount) = changes.tax_withheld {
            item.tax_withheld = round_money(amount);
        }
        if let Some(amount) = changes.social_security {
            item.social_security = round_money(amount);
        }
        if let Some(amount) = changes.provident_fund {
            item.provident_fund = round_money(amount);
        }
        item.net_pay = item
            .prorated_base
            .checked_sub(item.total_deductions())
            .map(round_money)
            .filter(|net| net.abs() <= MAX_MONEY)
            .ok_or_else(|| EngineError::validation("amounts", "net pay is out of range"))?;

        let updated = self.store.update_item(&item).await?;
        info!(
            item_id = updated.id,
            run_id = updated.run_id,
            net_pay = %updated.net_pay,
            "Payroll item overridden"
        );
        Ok(updated)
    }
}
