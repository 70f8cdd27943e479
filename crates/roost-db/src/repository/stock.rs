//! # Daily Stock Repository
//!
//! ```text
//! result = (Σ loading.net_weight − Σ distribution.net_weight) − admin_adjustment
//! ```
//!
//! Both sums are taken live over the day's window. A persisted row only
//! contributes the admin adjustment and notes; a day with no row reports
//! an adjustment of zero.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use roost_core::period::day_window;
use roost_core::reporting::stock_result;
use roost_core::{DailyStock, DateRange, StockSnapshot, Weight};

use super::generate_id;
use crate::error::DbResult;

const STOCK_COLUMNS: &str = r#"
    id, tenant_id, stock_date,
    net_loading_weight_grams, net_distribution_weight_grams,
    admin_adjustment_grams, result_grams,
    notes, created_at, updated_at
"#;

/// Repository for daily stock snapshots.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl StockRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        StockRepository { pool, tenant_id }
    }

    /// Computes the day's stock position without writing anything.
    pub async fn snapshot(&self, date: NaiveDate) -> DbResult<StockSnapshot> {
        let mut conn = self.pool.acquire().await?;
        let (net_loading, net_distribution) = day_totals(&mut conn, &self.tenant_id, date).await?;
        let persisted = fetch_stock(&mut conn, &self.tenant_id, date).await?;

        let (admin_adjustment, notes) = match &persisted {
            Some(row) => (Weight::from_grams(row.admin_adjustment_grams), row.notes.clone()),
            None => (Weight::zero(), None),
        };

        Ok(StockSnapshot {
            date,
            net_loading_weight: net_loading,
            net_distribution_weight: net_distribution,
            admin_adjustment,
            result: stock_result(net_loading, net_distribution, admin_adjustment),
            notes,
            persisted: persisted.is_some(),
        })
    }

    /// Stores the day's snapshot with an admin adjustment, replacing any
    /// earlier one for the same day.
    pub async fn upsert(
        &self,
        date: NaiveDate,
        admin_adjustment: Weight,
        notes: Option<String>,
    ) -> DbResult<DailyStock> {
        let mut tx = self.pool.begin().await?;

        let (net_loading, net_distribution) = day_totals(&mut tx, &self.tenant_id, date).await?;
        let result = stock_result(net_loading, net_distribution, admin_adjustment);

        let sql = format!(
            r#"
            INSERT INTO daily_stock (
                id, tenant_id, stock_date,
                net_loading_weight_grams, net_distribution_weight_grams,
                admin_adjustment_grams, result_grams,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT (tenant_id, stock_date) DO UPDATE SET
                net_loading_weight_grams = excluded.net_loading_weight_grams,
                net_distribution_weight_grams = excluded.net_distribution_weight_grams,
                admin_adjustment_grams = excluded.admin_adjustment_grams,
                result_grams = excluded.result_grams,
                notes = excluded.notes,
                updated_at = excluded.updated_at
            RETURNING {STOCK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, DailyStock>(&sql)
            .bind(generate_id())
            .bind(&self.tenant_id)
            .bind(date)
            .bind(net_loading.grams())
            .bind(net_distribution.grams())
            .bind(admin_adjustment.grams())
            .bind(result.grams())
            .bind(&notes)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(date = %date, result = %result, adjustment = %admin_adjustment, "Daily stock saved");
        Ok(row)
    }

    /// Persisted snapshots in a range, newest first.
    pub async fn list(&self, range: DateRange) -> DbResult<Vec<DailyStock>> {
        let sql = format!(
            r#"
            SELECT {STOCK_COLUMNS} FROM daily_stock
            WHERE tenant_id = ?1 AND stock_date >= ?2 AND stock_date <= ?3
            ORDER BY stock_date DESC
            "#
        );
        let rows = sqlx::query_as::<_, DailyStock>(&sql)
            .bind(&self.tenant_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

async fn fetch_stock(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    date: NaiveDate,
) -> DbResult<Option<DailyStock>> {
    let sql = format!("SELECT {STOCK_COLUMNS} FROM daily_stock WHERE tenant_id = ?1 AND stock_date = ?2");
    let row = sqlx::query_as::<_, DailyStock>(&sql)
        .bind(tenant_id)
        .bind(date)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// `(net loaded, net distributed)` over the day's window.
async fn day_totals(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    date: NaiveDate,
) -> DbResult<(Weight, Weight)> {
    let (from, to) = day_window(date);
    let loaded = sum_between(conn, "loadings", "loading_date", tenant_id, from, to).await?;
    let distributed = sum_between(conn, "distributions", "distribution_date", tenant_id, from, to).await?;
    Ok((loaded, distributed))
}

async fn sum_between(
    conn: &mut SqliteConnection,
    table: &str,
    date_column: &str,
    tenant_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DbResult<Weight> {
    let sql = format!(
        r#"
        SELECT COALESCE(SUM(net_weight_grams), 0) FROM {table}
        WHERE tenant_id = ?1 AND {date_column} >= ?2 AND {date_column} < ?3
        "#
    );
    let grams: i64 = sqlx::query_scalar(&sql)
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *conn)
        .await?;
    Ok(Weight::from_grams(grams))
}
