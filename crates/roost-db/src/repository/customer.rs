//! # Customer Repository
//!
//! Customers and their cached outstanding debt.
//!
//! ## Debt Cache
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Distribution and payment writes post a DebtEntry in their own          │
//! │  transaction:                                                           │
//! │                                                                         │
//! │    customer_debt_entries  ◄── INSERT (adjust | restate, amount)         │
//! │    customers.outstanding  ◄── entry.apply(cached balance)               │
//! │                                                                         │
//! │  recompute_outstanding replays the journal from zero and rewrites the   │
//! │  cache, so the cached value is always a function of stored entries.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use roost_core::ledger::replay_debt;
use roost_core::validation::{validate_id, validate_name};
use roost_core::{Customer, DebtEntry, Money, NewCustomer};

use super::generate_id;
use crate::error::{DbError, DbResult};

const CUSTOMER_COLUMNS: &str =
    "id, tenant_id, name, phone, address, outstanding_debts_cents, created_at, updated_at";

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        CustomerRepository { pool, tenant_id }
    }

    /// Creates a customer with no debt.
    pub async fn create(&self, input: NewCustomer) -> DbResult<Customer> {
        let name = input.name.trim().to_string();
        validate_name("name", &name)?;

        let now = Utc::now();
        let customer = Customer {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            name,
            phone: input.phone,
            address: input.address,
            outstanding_debts_cents: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, name, phone, address,
                outstanding_debts_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.outstanding_debts_cents)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = ?1 AND id = ?2");
        let row = sqlx::query_as::<_, Customer>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = ?1 ORDER BY name");
        let rows = sqlx::query_as::<_, Customer>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Customers who currently owe something, largest debt first.
    pub async fn list_debtors(&self) -> DbResult<Vec<Customer>> {
        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS} FROM customers
            WHERE tenant_id = ?1 AND outstanding_debts_cents > 0
            ORDER BY outstanding_debts_cents DESC, name
            "#
        );
        let rows = sqlx::query_as::<_, Customer>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Reads the cached outstanding debt.
    pub async fn outstanding_debt(&self, id: &str) -> DbResult<Money> {
        validate_id("customer_id", id)?;
        let customer = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;
        Ok(customer.outstanding_debts())
    }

    /// The customer's debt journal, oldest entry first.
    pub async fn debt_entries(&self, id: &str) -> DbResult<Vec<DebtEntry>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, &self.tenant_id, id).await?;
        load_entries(&mut conn, &self.tenant_id, id).await
    }

    /// Rebuilds the debt cache by replaying the customer's journal.
    pub async fn recompute_outstanding(&self, id: &str) -> DbResult<Money> {
        let mut tx = self.pool.begin().await?;
        let customer = fetch_customer(&mut tx, &self.tenant_id, id).await?;

        let outstanding = replay_debt(load_entries(&mut tx, &self.tenant_id, id).await?);
        if outstanding != customer.outstanding_debts() {
            warn!(
                customer_id = %id,
                cached = %customer.outstanding_debts(),
                replayed = %outstanding,
                "Debt cache drifted from journal"
            );
        }
        store_outstanding(&mut tx, &self.tenant_id, id, outstanding).await?;

        tx.commit().await?;
        Ok(outstanding)
    }
}

pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Customer> {
    validate_id("customer_id", id)?;
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = ?1 AND id = ?2");
    sqlx::query_as::<_, Customer>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", id))
}

/// Posts one journal entry and moves the cached balance, inside `conn`'s
/// transaction.
///
/// `source_id` is the distribution or payment that caused the movement.
pub(crate) async fn post_debt_entry(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    customer_id: &str,
    entry: DebtEntry,
    source_id: &str,
) -> DbResult<Money> {
    let cached: i64 = sqlx::query_scalar(
        "SELECT outstanding_debts_cents FROM customers WHERE tenant_id = ?1 AND id = ?2",
    )
    .bind(tenant_id)
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

    sqlx::query(
        r#"
        INSERT INTO customer_debt_entries (
            tenant_id, customer_id, kind, amount_cents, source_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(tenant_id)
    .bind(customer_id)
    .bind(entry.kind())
    .bind(entry.amount().cents())
    .bind(source_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let outstanding = entry.apply(Money::from_cents(cached));

    debug!(
        customer_id = %customer_id,
        kind = entry.kind(),
        amount = %entry.amount(),
        outstanding = %outstanding,
        "Posting debt entry"
    );

    store_outstanding(conn, tenant_id, customer_id, outstanding).await?;
    Ok(outstanding)
}

async fn load_entries(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    customer_id: &str,
) -> DbResult<Vec<DebtEntry>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT kind, amount_cents FROM customer_debt_entries
        WHERE tenant_id = ?1 AND customer_id = ?2
        ORDER BY seq
        "#,
    )
    .bind(tenant_id)
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(kind, cents)| {
            DebtEntry::from_parts(&kind, Money::from_cents(cents)).map_err(DbError::from)
        })
        .collect()
}

async fn store_outstanding(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    customer_id: &str,
    outstanding: Money,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE customers SET outstanding_debts_cents = ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
    )
    .bind(outstanding.cents())
    .bind(Utc::now())
    .bind(tenant_id)
    .bind(customer_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
