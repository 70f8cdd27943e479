//! # Transfer Repository
//!
//! Cash handed from one staff member to another.
//!
//! ```text
//! available = Σ paid amounts they recorded − Σ their expenses
//!           + Σ transfers in − Σ transfers out
//! ```
//!
//! The sender's position is computed and checked inside the same
//! transaction that inserts the transfer.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use roost_core::ledger::{cash_position, check_transfer};
use roost_core::validation::{validate_distinct_parties, validate_positive_amount};
use roost_core::{CashPosition, Money, NewTransfer, Transfer, TransferSummary};

use super::directory::fetch_employee;
use super::expense::spent_by;
use super::generate_id;
use super::payment::collected_by;
use crate::error::DbResult;

const TRANSFER_COLUMNS: &str =
    "id, tenant_id, from_employee_id, to_employee_id, amount_cents, note, transfer_date, created_at";

/// Repository for staff cash transfers.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl TransferRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        TransferRepository { pool, tenant_id }
    }

    /// Moves cash between two staff members.
    ///
    /// ## Errors
    /// - `InvalidInput` when sender and receiver are the same or the amount
    ///   is not positive
    /// - `NotFound` when either employee does not exist
    /// - `InsufficientFunds` when the sender holds less than `amount`
    pub async fn create(&self, input: NewTransfer) -> DbResult<Transfer> {
        validate_distinct_parties(&input.from_employee_id, &input.to_employee_id)?;
        validate_positive_amount("amount", input.amount)?;

        let mut tx = self.pool.begin().await?;

        fetch_employee(&mut tx, &self.tenant_id, &input.from_employee_id).await?;
        fetch_employee(&mut tx, &self.tenant_id, &input.to_employee_id).await?;

        let position = position_of(&mut tx, &self.tenant_id, &input.from_employee_id).await?;
        if let Err(e) = check_transfer(&position, input.amount) {
            warn!(
                from = %input.from_employee_id,
                available = %position.available,
                requested = %input.amount,
                "Transfer rejected"
            );
            return Err(e.into());
        }

        let now = Utc::now();
        let transfer = Transfer {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            from_employee_id: input.from_employee_id,
            to_employee_id: input.to_employee_id,
            amount_cents: input.amount.cents(),
            note: input.note,
            transfer_date: input.transfer_date.unwrap_or(now),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO transfers (
                id, tenant_id, from_employee_id, to_employee_id,
                amount_cents, note, transfer_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.tenant_id)
        .bind(&transfer.from_employee_id)
        .bind(&transfer.to_employee_id)
        .bind(transfer.amount_cents)
        .bind(&transfer.note)
        .bind(transfer.transfer_date)
        .bind(transfer.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = %transfer.id,
            from = %transfer.from_employee_id,
            to = %transfer.to_employee_id,
            amount = %transfer.amount(),
            "Transfer recorded"
        );
        Ok(transfer)
    }

    /// Lists transfers, newest first; with an employee, those they sent or
    /// received.
    pub async fn list(&self, employee_id: Option<&str>) -> DbResult<Vec<Transfer>> {
        let sql = format!(
            r#"
            SELECT {TRANSFER_COLUMNS} FROM transfers
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR from_employee_id = ?2 OR to_employee_id = ?2)
            ORDER BY transfer_date DESC, created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, Transfer>(&sql)
            .bind(&self.tenant_id)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn summary(&self, employee_id: &str) -> DbResult<TransferSummary> {
        let mut conn = self.pool.acquire().await?;
        fetch_employee(&mut conn, &self.tenant_id, employee_id).await?;
        let (total_in, count_in, total_out, count_out) =
            transfer_totals(&mut conn, &self.tenant_id, employee_id).await?;
        Ok(TransferSummary {
            employee_id: employee_id.to_string(),
            total_in,
            total_out,
            count_in,
            count_out,
        })
    }

    pub async fn cash_position(&self, employee_id: &str) -> DbResult<CashPosition> {
        let mut conn = self.pool.acquire().await?;
        fetch_employee(&mut conn, &self.tenant_id, employee_id).await?;
        position_of(&mut conn, &self.tenant_id, employee_id).await
    }
}

async fn position_of(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: &str,
) -> DbResult<CashPosition> {
    let collected = collected_by(conn, tenant_id, employee_id).await?;
    let expenses = spent_by(conn, tenant_id, employee_id).await?;
    let (transfers_in, _, transfers_out, _) = transfer_totals(conn, tenant_id, employee_id).await?;
    Ok(cash_position(employee_id, collected, expenses, transfers_in, transfers_out))
}

/// `(Σ in, count in, Σ out, count out)` for one employee.
async fn transfer_totals(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: &str,
) -> DbResult<(Money, i64, Money, i64)> {
    let (in_cents, count_in, out_cents, count_out): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN to_employee_id = ?2 THEN amount_cents END), 0),
            COUNT(CASE WHEN to_employee_id = ?2 THEN 1 END),
            COALESCE(SUM(CASE WHEN from_employee_id = ?2 THEN amount_cents END), 0),
            COUNT(CASE WHEN from_employee_id = ?2 THEN 1 END)
        FROM transfers
        WHERE tenant_id = ?1
        "#,
    )
    .bind(tenant_id)
    .bind(employee_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok((
        Money::from_cents(in_cents),
        count_in,
        Money::from_cents(out_cents),
        count_out,
    ))
}
