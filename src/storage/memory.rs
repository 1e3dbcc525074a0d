//! In-memory storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use super::PayrollStore;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, EmployeeStatus, Leave, NewEmployee, NewLeave, NewPayrollItem, PayrollItem,
    PayrollRun, validate_termination,
};

#[derive(Debug, Default)]
struct Sequences {
    employee: i64,
    run: i64,
    item: i64,
    leave: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    employees: BTreeMap<i64, Employee>,
    runs: BTreeMap<i64, PayrollRun>,
    items: BTreeMap<i64, PayrollItem>,
    leaves: BTreeMap<i64, Leave>,
    sequences: Sequences,
}

impl Tables {
    fn ensure_run(&self, run_id: i64) -> EngineResult<()> {
        if self.runs.contains_key(&run_id) {
            Ok(())
        } else {
            Err(EngineError::RunNotFound { run_id })
        }
    }

    fn ensure_employee(&self, employee_id: i64) -> EngineResult<()> {
        if self.employees.contains_key(&employee_id) {
            Ok(())
        } else {
            Err(EngineError::EmployeeNotFound { employee_id })
        }
    }

    fn insert_item(&mut self, item: NewPayrollItem) -> PayrollItem {
        let id = next_id(&mut self.sequences.item);
        let item = item.into_item(id, Utc::now());
        self.items.insert(id, item.clone());
        item
    }
}

/// Payroll store kept entirely in process memory.
///
/// Every table sits behind one lock, so multi-table operations such as
/// [`replace_items`](PayrollStore::replace_items) are atomic with respect to
/// readers. Ordered maps keep list results sorted by id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayrollStore for InMemoryStore {
    async fn create_employee(&self, employee: NewEmployee) -> EngineResult<Employee> {
        let employee = employee.trimmed();
        employee.validate()?;

        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.sequences.employee);
        let employee = employee.into_employee(id, Utc::now());
        tables.employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn get_employee(&self, id: i64) -> EngineResult<Option<Employee>> {
        Ok(self.tables.read().await.employees.get(&id).cloned())
    }

    async fn list_employees(&self) -> EngineResult<Vec<Employee>> {
        Ok(self.tables.read().await.employees.values().cloned().collect())
    }

    async fn list_active_employees(&self) -> EngineResult<Vec<Employee>> {
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .values()
            .filter(|employee| employee.is_active())
            .cloned()
            .collect())
    }

    async fn update_employee_status(
        &self,
        id: i64,
        status: EmployeeStatus,
        terminated_on: Option<NaiveDate>,
    ) -> EngineResult<Employee> {
        let mut tables = self.tables.write().await;
        let employee = tables
            .employees
            .get_mut(&id)
            .ok_or(EngineError::EmployeeNotFound { employee_id: id })?;

        validate_termination(employee.hired_on, terminated_on)?;
        employee.status = status;
        employee.terminated_on = terminated_on;
        Ok(employee.clone())
    }

    async fn create_run(&self, year: i32, month: u32) -> EngineResult<PayrollRun> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.runs.values().find(|run| run.covers(year, month)) {
            return Ok(existing.clone());
        }

        let id = next_id(&mut tables.sequences.run);
        let run = PayrollRun {
            id,
            period_year: year,
            period_month: month,
            locked: false,
            created_at: Utc::now(),
        };
        tables.runs.insert(id, run.clone());
        Ok(run)
    }

    async fn get_run(&self, id: i64) -> EngineResult<Option<PayrollRun>> {
        Ok(self.tables.read().await.runs.get(&id).cloned())
    }

    async fn get_run_by_period(&self, year: i32, month: u32) -> EngineResult<Option<PayrollRun>> {
        let tables = self.tables.read().await;
        Ok(tables
            .runs
            .values()
            .find(|run| run.covers(year, month))
            .cloned())
    }

    async fn clear_items(&self, run_id: i64) -> EngineResult<()> {
        self.tables
            .write()
            .await
            .items
            .retain(|_, item| item.run_id != run_id);
        Ok(())
    }

    async fn save_item(&self, item: NewPayrollItem) -> EngineResult<PayrollItem> {
        let mut tables = self.tables.write().await;
        tables.ensure_run(item.run_id)?;
        tables.ensure_employee(item.employee_id)?;
        Ok(tables.insert_item(item))
    }

    async fn list_items(&self, run_id: i64) -> EngineResult<Vec<PayrollItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn get_item(&self, id: i64) -> EngineResult<Option<PayrollItem>> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn update_item(&self, item: &PayrollItem) -> EngineResult<PayrollItem> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .items
            .get_mut(&item.id)
            .ok_or(EngineError::ItemNotFound { item_id: item.id })?;

        stored.prorated_base = item.prorated_base;
        stored.tax_withheld = item.tax_withheld;
        stored.social_security = item.social_security;
        stored.provident_fund = item.provident_fund;
        stored.net_pay = item.net_pay;
        Ok(stored.clone())
    }

    async fn replace_items(
        &self,
        run_id: i64,
        items: Vec<NewPayrollItem>,
    ) -> EngineResult<Vec<PayrollItem>> {
        if let Some(stray) = items.iter().find(|item| item.run_id != run_id) {
            return Err(EngineError::validation(
                "run_id",
                format!("item belongs to run {} not {run_id}", stray.run_id),
            ));
        }

        let mut tables = self.tables.write().await;
        tables.ensure_run(run_id)?;
        for item in &items {
            tables.ensure_employee(item.employee_id)?;
        }
        tables.items.retain(|_, item| item.run_id != run_id);

        Ok(items
            .into_iter()
            .map(|item| tables.insert_item(item))
            .collect())
    }

    async fn create_leave(&self, leave: NewLeave) -> EngineResult<Leave> {
        leave.validate()?;

        let mut tables = self.tables.write().await;
        tables.ensure_employee(leave.employee_id)?;

        let id = next_id(&mut tables.sequences.leave);
        let leave = leave.into_leave(id, Utc::now());
        tables.leaves.insert(id, leave.clone());
        Ok(leave)
    }

    async fn list_leaves(&self) -> EngineResult<Vec<Leave>> {
        Ok(self.tables.read().await.leaves.values().cloned().collect())
    }
}
