//! # Payment Repository
//!
//! Customer payments. A payment restates the customer's balance rather
//! than subtracting from it, so payment order matters.
//!
//! ```text
//!   create  → Restate(new payment's remaining)
//!   update  → Restate(re-settled remaining)
//!   delete  → Restate(most recently recorded remaining payment's
//!             remaining), or Restate(0) if none is left
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use roost_core::ledger::settle_payment;
use roost_core::validation::validate_id;
use roost_core::{DebtEntry, EmployeeCollection, Money, NewPayment, Payment, PaymentPatch};

use super::customer::{fetch_customer, post_debt_entry};
use super::generate_id;
use crate::error::{DbError, DbResult};

const PAYMENT_COLUMNS: &str = r#"
    id, tenant_id, customer_id, recorded_by,
    total_price_cents, paid_amount_cents, discount_cents, remaining_amount_cents,
    status, method, payment_date, notes, created_at, updated_at
"#;

/// Repository for customer payments.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        PaymentRepository { pool, tenant_id }
    }

    /// Records a payment and overwrites the customer's debt with its
    /// remainder.
    pub async fn create(&self, input: NewPayment) -> DbResult<Payment> {
        let settlement = settle_payment(input.total_price, input.paid_amount, input.discount)?;

        let mut tx = self.pool.begin().await?;

        fetch_customer(&mut tx, &self.tenant_id, &input.customer_id).await?;

        let now = Utc::now();
        let payment = Payment {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            customer_id: input.customer_id,
            recorded_by: input.recorded_by,
            total_price_cents: input.total_price.cents(),
            paid_amount_cents: input.paid_amount.cents(),
            discount_cents: input.discount.cents(),
            remaining_amount_cents: settlement.remaining.cents(),
            status: settlement.status,
            method: input.method,
            payment_date: input.payment_date.unwrap_or(now),
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %payment.id, customer_id = %payment.customer_id, "Inserting payment");

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, tenant_id, customer_id, recorded_by,
                total_price_cents, paid_amount_cents, discount_cents, remaining_amount_cents,
                status, method, payment_date, notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.tenant_id)
        .bind(&payment.customer_id)
        .bind(&payment.recorded_by)
        .bind(payment.total_price_cents)
        .bind(payment.paid_amount_cents)
        .bind(payment.discount_cents)
        .bind(payment.remaining_amount_cents)
        .bind(payment.status)
        .bind(payment.method)
        .bind(payment.payment_date)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await?;

        let outstanding = post_debt_entry(
            &mut tx,
            &self.tenant_id,
            &payment.customer_id,
            DebtEntry::Restate(settlement.remaining),
            &payment.id,
        )
        .await?;

        tx.commit().await?;

        info!(
            id = %payment.id,
            customer_id = %payment.customer_id,
            remaining = %settlement.remaining,
            outstanding = %outstanding,
            "Payment recorded"
        );
        Ok(payment)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        validate_id("payment_id", id)?;
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = ?1 AND id = ?2");
        let row = sqlx::query_as::<_, Payment>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lists payments, most recently recorded first.
    pub async fn list(&self, customer_id: Option<&str>) -> DbResult<Vec<Payment>> {
        let sql = format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE tenant_id = ?1 AND (?2 IS NULL OR customer_id = ?2)
            ORDER BY created_at DESC, rowid DESC
            "#
        );
        let rows = sqlx::query_as::<_, Payment>(&sql)
            .bind(&self.tenant_id)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Applies a partial update and re-settles the payment.
    pub async fn update(&self, id: &str, patch: PaymentPatch) -> DbResult<Payment> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_payment(&mut tx, &self.tenant_id, id).await?;

        let total_price = patch.total_price.unwrap_or(existing.total_price());
        let paid_amount = patch.paid_amount.unwrap_or(existing.paid_amount());
        let discount = patch.discount.unwrap_or(existing.discount());
        let settlement = settle_payment(total_price, paid_amount, discount)?;

        sqlx::query(
            r#"
            UPDATE payments SET
                total_price_cents = ?1, paid_amount_cents = ?2, discount_cents = ?3,
                remaining_amount_cents = ?4, status = ?5, method = ?6,
                payment_date = ?7, notes = ?8, updated_at = ?9
            WHERE tenant_id = ?10 AND id = ?11
            "#,
        )
        .bind(total_price.cents())
        .bind(paid_amount.cents())
        .bind(discount.cents())
        .bind(settlement.remaining.cents())
        .bind(settlement.status)
        .bind(patch.method.unwrap_or(existing.method))
        .bind(patch.payment_date.unwrap_or(existing.payment_date))
        .bind(patch.notes.or(existing.notes))
        .bind(Utc::now())
        .bind(&self.tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        post_debt_entry(
            &mut tx,
            &self.tenant_id,
            &existing.customer_id,
            DebtEntry::Restate(settlement.remaining),
            id,
        )
        .await?;

        let updated = fetch_payment(&mut tx, &self.tenant_id, id).await?;
        tx.commit().await?;

        info!(id = %id, remaining = %settlement.remaining, "Payment updated");
        Ok(updated)
    }

    /// Deletes a payment. The customer's debt falls back to the remainder of
    /// the most recently recorded payment still on file, or zero.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_payment(&mut tx, &self.tenant_id, id).await?;

        sqlx::query("DELETE FROM payments WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let previous: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT remaining_amount_cents FROM payments
            WHERE tenant_id = ?1 AND customer_id = ?2
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&existing.customer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let restated = previous.map(Money::from_cents).unwrap_or_default();
        let outstanding = post_debt_entry(
            &mut tx,
            &self.tenant_id,
            &existing.customer_id,
            DebtEntry::Restate(restated),
            id,
        )
        .await?;

        tx.commit().await?;

        info!(id = %id, outstanding = %outstanding, "Payment deleted");
        Ok(())
    }

    /// Paid amounts grouped by the staff member who recorded them.
    pub async fn employee_collections(&self) -> DbResult<Vec<EmployeeCollection>> {
        let rows: Vec<(Option<String>, i64, i64)> = sqlx::query_as(
            r#"
            SELECT recorded_by, COALESCE(SUM(paid_amount_cents), 0), COUNT(*)
            FROM payments
            WHERE tenant_id = ?1
            GROUP BY recorded_by
            ORDER BY SUM(paid_amount_cents) DESC
            "#,
        )
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(employee_id, paid, payment_count)| EmployeeCollection {
                employee_id,
                total_paid: Money::from_cents(paid),
                payment_count,
            })
            .collect())
    }
}

async fn fetch_payment(conn: &mut SqliteConnection, tenant_id: &str, id: &str) -> DbResult<Payment> {
    validate_id("payment_id", id)?;
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = ?1 AND id = ?2");
    sqlx::query_as::<_, Payment>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Payment", id))
}

/// Sum of cash a staff member has collected, inside `conn`'s transaction.
pub(crate) async fn collected_by(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: &str,
) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(paid_amount_cents), 0) FROM payments WHERE tenant_id = ?1 AND recorded_by = ?2",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Money::from_cents(cents))
}
