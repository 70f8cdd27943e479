//! # Expense Repository
//!
//! Money staff spend out of the cash they hold. Expenses reduce both the
//! day's profit and the employee's cash position.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use roost_core::validation::{validate_amount, validate_id, validate_name};
use roost_core::{DateRange, EmployeeExpense, Money, NewExpense};

use super::directory::fetch_employee;
use super::generate_id;
use super::loading::window_bounds;
use crate::error::{DbError, DbResult};

const EXPENSE_COLUMNS: &str = "id, tenant_id, employee_id, name, value_cents, expense_date, created_at";

/// Repository for employee expenses.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        ExpenseRepository { pool, tenant_id }
    }

    pub async fn create(&self, input: NewExpense) -> DbResult<EmployeeExpense> {
        let name = input.name.trim().to_string();
        validate_name("name", &name)?;
        validate_amount("value", input.value)?;

        let mut conn = self.pool.acquire().await?;
        fetch_employee(&mut conn, &self.tenant_id, &input.employee_id).await?;

        let now = Utc::now();
        let expense = EmployeeExpense {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            employee_id: input.employee_id,
            name,
            value_cents: input.value.cents(),
            expense_date: input.expense_date.unwrap_or(now),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO employee_expenses (id, tenant_id, employee_id, name, value_cents, expense_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.tenant_id)
        .bind(&expense.employee_id)
        .bind(&expense.name)
        .bind(expense.value_cents)
        .bind(expense.expense_date)
        .bind(expense.created_at)
        .execute(&mut *conn)
        .await?;

        info!(id = %expense.id, employee_id = %expense.employee_id, value = %expense.value(), "Expense recorded");
        Ok(expense)
    }

    /// Lists expenses, newest first.
    pub async fn list(
        &self,
        employee_id: Option<&str>,
        range: Option<DateRange>,
    ) -> DbResult<Vec<EmployeeExpense>> {
        let (from, to) = window_bounds(range);
        let sql = format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM employee_expenses
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR employee_id = ?2)
              AND (?3 IS NULL OR expense_date >= ?3)
              AND (?4 IS NULL OR expense_date < ?4)
            ORDER BY expense_date DESC
            "#
        );
        let rows = sqlx::query_as::<_, EmployeeExpense>(&sql)
            .bind(&self.tenant_id)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        validate_id("expense_id", id)?;
        let result = sqlx::query("DELETE FROM employee_expenses WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        info!(id = %id, "Expense deleted");
        Ok(())
    }
}

/// Sum of a staff member's expenses, inside `conn`'s transaction.
pub(crate) async fn spent_by(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: &str,
) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(value_cents), 0) FROM employee_expenses WHERE tenant_id = ?1 AND employee_id = ?2",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Money::from_cents(cents))
}
