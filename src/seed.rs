//! Demo data for a fresh store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::NewEmployee;
use crate::storage::PayrollStore;

const SAMPLE_EMPLOYEES: [(&str, &str, &str, &str, &str, i64); 5] = [
    ("E001", "Somchai", "Jaidee", "Engineering", "Software Engineer", 50_000),
    ("E002", "Suda", "Rakdee", "Finance", "Accountant", 45_000),
    ("E003", "Anan", "Sukjai", "Operations", "Coordinator", 40_000),
    ("E004", "Malee", "Thongdee", "Support", "Support Officer", 30_000),
    ("E005", "Preecha", "Wongsa", "Sales", "Account Manager", 48_000),
];

/// Inserts the sample employees when the store has none.
///
/// Returns how many employees were inserted; zero when the store already
/// holds data.
pub async fn seed_sample_employees(store: &dyn PayrollStore) -> EngineResult<usize> {
    if !store.list_employees().await?.is_empty() {
        return Ok(0);
    }

    let hired_on = NaiveDate::from_ymd_opt(2024, 1, 1)
        .ok_or_else(|| EngineError::validation("hired_on", "invalid sample hire date"))?;

    for (code, first_name, last_name, department, position, salary) in SAMPLE_EMPLOYEES {
        let mut employee =
            NewEmployee::new(code, first_name, last_name, Decimal::new(salary, 0), hired_on);
        employee.department = department.to_string();
        employee.position = position.to_string();
        employee.bank_account = format!("000-0-{:05}-{}", salary / 10, &code[1..]);
        store.create_employee(employee).await?;
    }

    info!(count = SAMPLE_EMPLOYEES.len(), "Seeded sample employees");
    Ok(SAMPLE_EMPLOYEES.len())
}
