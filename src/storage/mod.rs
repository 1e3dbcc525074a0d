//! Storage port for payroll records.
//!
//! [`PayrollStore`] is the single seam between the engine and persistence.
//! Business logic depends only on the trait; two backends implement it:
//!
//! - [`InMemoryStore`]: maps behind one `tokio::sync::RwLock`
//! - [`PostgresStore`]: PostgreSQL through `sqlx`
//!
//! Both backends guarantee the same contract:
//!
//! - ids are assigned per entity type, strictly increasing from 1
//! - list results are ordered by id ascending
//! - records are returned by value, never as references into the store
//! - `NewEmployee` and `NewLeave` are validated before any mutation
//! - `create_run` returns the existing run when the period already has one
//! - `replace_items` is atomic: readers see the old set or the new set

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::models::{
    Employee, EmployeeStatus, Leave, NewEmployee, NewLeave, NewPayrollItem, PayrollItem,
    PayrollRun,
};

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Persistence operations required by the run materializer and the API.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Validates and inserts an employee.
    async fn create_employee(&self, employee: NewEmployee) -> EngineResult<Employee>;

    /// Looks up an employee by id.
    async fn get_employee(&self, id: i64) -> EngineResult<Option<Employee>>;

    /// Lists every employee.
    async fn list_employees(&self) -> EngineResult<Vec<Employee>>;

    /// Lists employees whose status is `active`.
    async fn list_active_employees(&self) -> EngineResult<Vec<Employee>>;

    /// Sets an employee's status and termination date.
    ///
    /// Fails with `EmployeeNotFound` when the id is unknown, or `Validation`
    /// when the termination date precedes the hire date.
    async fn update_employee_status(
        &self,
        id: i64,
        status: EmployeeStatus,
        terminated_on: Option<NaiveDate>,
    ) -> EngineResult<Employee>;

    /// Returns the run for the period, creating it if absent.
    async fn create_run(&self, year: i32, month: u32) -> EngineResult<PayrollRun>;

    /// Looks up a run by id.
    async fn get_run(&self, id: i64) -> EngineResult<Option<PayrollRun>>;

    /// Looks up a run by period.
    async fn get_run_by_period(&self, year: i32, month: u32) -> EngineResult<Option<PayrollRun>>;

    /// Deletes every item of a run.
    async fn clear_items(&self, run_id: i64) -> EngineResult<()>;

    /// Inserts one item. Fails with `RunNotFound` when the run is unknown.
    async fn save_item(&self, item: NewPayrollItem) -> EngineResult<PayrollItem>;

    /// Lists the items of a run; empty when the run has none or is unknown.
    async fn list_items(&self, run_id: i64) -> EngineResult<Vec<PayrollItem>>;

    /// Looks up an item by id.
    async fn get_item(&self, id: i64) -> EngineResult<Option<PayrollItem>>;

    /// Overwrites the monetary fields of an existing item.
    ///
    /// Ownership, day counts and `generated_at` are kept from the stored row.
    async fn update_item(&self, item: &PayrollItem) -> EngineResult<PayrollItem>;

    /// Replaces all items of a run with `items`.
    ///
    /// The default composes [`clear_items`](Self::clear_items) and
    /// [`save_item`](Self::save_item) and is not atomic; both bundled
    /// backends override it.
    async fn replace_items(
        &self,
        run_id: i64,
        items: Vec<NewPayrollItem>,
    ) -> EngineResult<Vec<PayrollItem>> {
        self.clear_items(run_id).await?;

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            saved.push(self.save_item(item).await?);
        }
        Ok(saved)
    }

    /// Validates and inserts a leave entry.
    async fn create_leave(&self, leave: NewLeave) -> EngineResult<Leave>;

    /// Lists every leave entry.
    async fn list_leaves(&self) -> EngineResult<Vec<Leave>>;
}
