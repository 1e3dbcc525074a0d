//! PostgreSQL storage backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::migrate::Migrator;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;

use super::PayrollStore;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, EmployeeStatus, Leave, NewEmployee, NewLeave, NewPayrollItem, PayrollItem,
    PayrollRun, validate_termination,
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: i64,
    code: String,
    first_name: String,
    last_name: String,
    department: String,
    position: String,
    bank_account: String,
    base_salary: Decimal,
    hired_on: NaiveDate,
    terminated_on: Option<NaiveDate>,
    status: String,
    withholding_rate: Option<Decimal>,
    provident_fund_rate: Decimal,
    social_security_enabled: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = EngineError;

    fn try_from(row: EmployeeRow) -> EngineResult<Self> {
        Ok(Employee {
            id: row.id,
            code: row.code,
            first_name: row.first_name,
            last_name: row.last_name,
            department: row.department,
            position: row.position,
            bank_account: row.bank_account,
            base_salary: row.base_salary,
            hired_on: row.hired_on,
            terminated_on: row.terminated_on,
            status: EmployeeStatus::parse(&row.status)?,
            withholding_rate: row.withholding_rate,
            provident_fund_rate: row.provident_fund_rate,
            social_security_enabled: row.social_security_enabled,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RunRow {
    id: i64,
    period_year: i32,
    period_month: i32,
    locked: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<RunRow> for PayrollRun {
    type Error = EngineError;

    fn try_from(row: RunRow) -> EngineResult<Self> {
        Ok(PayrollRun {
            id: row.id,
            period_year: row.period_year,
            period_month: from_column("period_month", row.period_month)?,
            locked: row.locked,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    run_id: i64,
    employee_id: i64,
    prorated_base: Decimal,
    tax_withheld: Decimal,
    social_security: Decimal,
    provident_fund: Decimal,
    net_pay: Decimal,
    worked_days: i32,
    total_days: i32,
    generated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for PayrollItem {
    type Error = EngineError;

    fn try_from(row: ItemRow) -> EngineResult<Self> {
        Ok(PayrollItem {
            id: row.id,
            run_id: row.run_id,
            employee_id: row.employee_id,
            prorated_base: row.prorated_base,
            tax_withheld: row.tax_withheld,
            social_security: row.social_security,
            provident_fund: row.provident_fund,
            net_pay: row.net_pay,
            worked_days: from_column("worked_days", row.worked_days)?,
            total_days: from_column("total_days", row.total_days)?,
            generated_at: row.generated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LeaveRow {
    id: i64,
    employee_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<LeaveRow> for Leave {
    fn from(row: LeaveRow) -> Self {
        Leave {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

fn from_column(column: &str, value: i32) -> EngineResult<u32> {
    u32::try_from(value)
        .map_err(|_| EngineError::storage("invalid stored value", format!("{column}={value}")))
}

fn to_column(field: &str, value: u32) -> EngineResult<i32> {
    i32::try_from(value).map_err(|_| EngineError::validation(field, "value is out of range"))
}

fn convert_all<R, T>(rows: Vec<R>) -> EngineResult<Vec<T>>
where
    T: TryFrom<R, Error = EngineError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn map_item_insert_error(error: sqlx::Error, employee_id: i64) -> EngineError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
        && database_error.constraint() == Some("payroll_items_employee_id_fkey")
    {
        return EngineError::EmployeeNotFound { employee_id };
    }

    EngineError::storage("failed to insert payroll item", error)
}

/// Payroll store backed by PostgreSQL.
///
/// Multi-row writes (`replace_items`) run in one transaction; `create_run`
/// relies on the unique period key so concurrent callers share one run.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> EngineResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|error| EngineError::storage("failed to run migrations", error))
    }

    async fn begin(&self) -> EngineResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| EngineError::storage("failed to begin transaction", error))
    }

    async fn insert_item(
        transaction: &mut Transaction<'static, Postgres>,
        item: NewPayrollItem,
    ) -> EngineResult<PayrollItem> {
        let employee_id = item.employee_id;
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO payroll_items (
                run_id, employee_id, prorated_base, tax_withheld, social_security,
                provident_fund, net_pay, worked_days, total_days
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, run_id, employee_id, prorated_base, tax_withheld, social_security,
                      provident_fund, net_pay, worked_days, total_days, generated_at
            "#,
        )
        .bind(item.run_id)
        .bind(item.employee_id)
        .bind(item.prorated_base)
        .bind(item.tax_withheld)
        .bind(item.social_security)
        .bind(item.provident_fund)
        .bind(item.net_pay)
        .bind(to_column("worked_days", item.worked_days)?)
        .bind(to_column("total_days", item.total_days)?)
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| map_item_insert_error(error, employee_id))?;

        row.try_into()
    }

    async fn lock_run(
        transaction: &mut Transaction<'static, Postgres>,
        run_id: i64,
    ) -> EngineResult<()> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM payroll_runs
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(run_id)
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| EngineError::storage("failed to lock payroll run", error))?
        .ok_or(EngineError::RunNotFound { run_id })?;

        Ok(())
    }

    async fn commit(transaction: Transaction<'static, Postgres>) -> EngineResult<()> {
        transaction
            .commit()
            .await
            .map_err(|error| EngineError::storage("failed to commit transaction", error))
    }
}

#[async_trait]
impl PayrollStore for PostgresStore {
    async fn create_employee(&self, employee: NewEmployee) -> EngineResult<Employee> {
        let employee = employee.trimmed();
        employee.validate()?;

        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            INSERT INTO employees (
                code, first_name, last_name, department, position, bank_account,
                base_salary, hired_on, terminated_on, status, withholding_rate,
                provident_fund_rate, social_security_enabled
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, code, first_name, last_name, department, position, bank_account,
                      base_salary, hired_on, terminated_on, status, withholding_rate,
                      provident_fund_rate, social_security_enabled, created_at
            "#,
        )
        .bind(&employee.code)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(&employee.bank_account)
        .bind(employee.base_salary)
        .bind(employee.hired_on)
        .bind(employee.terminated_on)
        .bind(employee.status.as_str())
        .bind(employee.withholding_rate)
        .bind(employee.provident_fund_rate)
        .bind(employee.social_security_enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to insert employee", error))?;

        row.try_into()
    }

    async fn get_employee(&self, id: i64) -> EngineResult<Option<Employee>> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, code, first_name, last_name, department, position, bank_account,
                   base_salary, hired_on, terminated_on, status, withholding_rate,
                   provident_fund_rate, social_security_enabled, created_at
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to load employee", error))?
        .map(Employee::try_from)
        .transpose()
    }

    async fn list_employees(&self) -> EngineResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, code, first_name, last_name, department, position, bank_account,
                   base_salary, hired_on, terminated_on, status, withholding_rate,
                   provident_fund_rate, social_security_enabled, created_at
            FROM employees
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to list employees", error))?;

        convert_all(rows)
    }

    async fn list_active_employees(&self) -> EngineResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, code, first_name, last_name, department, position, bank_account,
                   base_salary, hired_on, terminated_on, status, withholding_rate,
                   provident_fund_rate, social_security_enabled, created_at
            FROM employees
            WHERE status = 'active'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to list active employees", error))?;

        convert_all(rows)
    }

    async fn update_employee_status(
        &self,
        id: i64,
        status: EmployeeStatus,
        terminated_on: Option<NaiveDate>,
    ) -> EngineResult<Employee> {
        let existing = self
            .get_employee(id)
            .await?
            .ok_or(EngineError::EmployeeNotFound { employee_id: id })?;
        validate_termination(existing.hired_on, terminated_on)?;

        sqlx::query_as::<_, EmployeeRow>(
            r#"
            UPDATE employees
            SET status = $2, terminated_on = $3
            WHERE id = $1
            RETURNING id, code, first_name, last_name, department, position, bank_account,
                      base_salary, hired_on, terminated_on, status, withholding_rate,
                      provident_fund_rate, social_security_enabled, created_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(terminated_on)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to update employee status", error))?
        .ok_or(EngineError::EmployeeNotFound { employee_id: id })?
        .try_into()
    }

    async fn create_run(&self, year: i32, month: u32) -> EngineResult<PayrollRun> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, RunRow>(
            r#"
            INSERT INTO payroll_runs (period_year, period_month)
            VALUES ($1, $2)
            ON CONFLICT (period_year, period_month)
            DO UPDATE SET locked = payroll_runs.locked
            RETURNING id, period_year, period_month, locked, created_at
            "#,
        )
        .bind(year)
        .bind(to_column("month", month)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to create payroll run", error))?;

        debug!(run_id = row.id, year, month, "Resolved payroll run row");
        row.try_into()
    }

    async fn get_run(&self, id: i64) -> EngineResult<Option<PayrollRun>> {
        sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, period_year, period_month, locked, created_at
            FROM payroll_runs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to load payroll run", error))?
        .map(PayrollRun::try_from)
        .transpose()
    }

    async fn get_run_by_period(&self, year: i32, month: u32) -> EngineResult<Option<PayrollRun>> {
        sqlx::query_as::<_, RunRow>(
            r#"
            SELECT id, period_year, period_month, locked, created_at
            FROM payroll_runs
            WHERE period_year = $1 AND period_month = $2
            "#,
        )
        .bind(year)
        .bind(to_column("month", month)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to load payroll run by period", error))?
        .map(PayrollRun::try_from)
        .transpose()
    }

    async fn clear_items(&self, run_id: i64) -> EngineResult<()> {
        sqlx::query(
            r#"
            DELETE FROM payroll_items
            WHERE run_id = $1
            "#,
        )
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to clear payroll items", error))?;

        Ok(())
    }

    async fn save_item(&self, item: NewPayrollItem) -> EngineResult<PayrollItem> {
        let mut transaction = self.begin().await?;
        Self::lock_run(&mut transaction, item.run_id).await?;
        let saved = Self::insert_item(&mut transaction, item).await?;
        Self::commit(transaction).await?;
        Ok(saved)
    }

    async fn list_items(&self, run_id: i64) -> EngineResult<Vec<PayrollItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, run_id, employee_id, prorated_base, tax_withheld, social_security,
                   provident_fund, net_pay, worked_days, total_days, generated_at
            FROM payroll_items
            WHERE run_id = $1
            ORDER BY id
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to list payroll items", error))?;

        convert_all(rows)
    }

    async fn get_item(&self, id: i64) -> EngineResult<Option<PayrollItem>> {
        sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, run_id, employee_id, prorated_base, tax_withheld, social_security,
                   provident_fund, net_pay, worked_days, total_days, generated_at
            FROM payroll_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to load payroll item", error))?
        .map(PayrollItem::try_from)
        .transpose()
    }

    async fn update_item(&self, item: &PayrollItem) -> EngineResult<PayrollItem> {
        sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE payroll_items
            SET prorated_base = $2,
                tax_withheld = $3,
                social_security = $4,
                provident_fund = $5,
                net_pay = $6
            WHERE id = $1
            RETURNING id, run_id, employee_id, prorated_base, tax_withheld, social_security,
                      provident_fund, net_pay, worked_days, total_days, generated_at
            "#,
        )
        .bind(item.id)
        .bind(item.prorated_base)
        .bind(item.tax_withheld)
        .bind(item.social_security)
        .bind(item.provident_fund)
        .bind(item.net_pay)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to update payroll item", error))?
        .ok_or(EngineError::ItemNotFound { item_id: item.id })?
        .try_into()
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

        let mut transaction = self.begin().await?;
        Self::lock_run(&mut transaction, run_id).await?;

        sqlx::query(
            r#"
            DELETE FROM payroll_items
            WHERE run_id = $1
            "#,
        )
        .bind(run_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| EngineError::storage("failed to clear payroll items", error))?;

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            saved.push(Self::insert_item(&mut transaction, item).await?);
        }

        Self::commit(transaction).await?;
        Ok(saved)
    }

    async fn create_leave(&self, leave: NewLeave) -> EngineResult<Leave> {
        leave.validate()?;
        if self.get_employee(leave.employee_id).await?.is_none() {
            return Err(EngineError::EmployeeNotFound {
                employee_id: leave.employee_id,
            });
        }

        let row = sqlx::query_as::<_, LeaveRow>(
            r#"
            INSERT INTO leaves (employee_id, start_date, end_date, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id, employee_id, start_date, end_date, reason, created_at
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to insert leave", error))?;

        Ok(row.into())
    }

    async fn list_leaves(&self) -> EngineResult<Vec<Leave>> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT id, employee_id, start_date, end_date, reason, created_at
            FROM leaves
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| EngineError::storage("failed to list leaves", error))?;

        Ok(rows.into_iter().map(Leave::from).collect())
    }
}
