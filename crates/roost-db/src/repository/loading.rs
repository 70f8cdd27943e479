//! # Loading Repository
//!
//! Stock intake batches and their running distribution counters.
//!
//! ## Batch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Loading Batch Lifecycle                           │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── remaining = quantity / net, chicken type stock −= quantity     │
//! │                                                                         │
//! │  2. DRAWN BY DISTRIBUTIONS                                             │
//! │     └── distributed_* += allocation, remaining_* −= allocation         │
//! │     └── version += 1 on every counter write                            │
//! │                                                                         │
//! │  3. (OPTIONAL) UPDATE                                                  │
//! │     └── derived fields recomputed from merged quantity / weight / price│
//! │     └── may not shrink below what is already distributed               │
//! │                                                                         │
//! │  4. (OPTIONAL) DELETE                                                  │
//! │     └── only while nothing is distributed, stock restored              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Optimistic Versioning
//! Every write to a batch row is `UPDATE ... WHERE id = ? AND version = ?`.
//! A miss means another writer moved the counters first and surfaces as
//! `Conflict`; the caller retries the whole operation.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use roost_core::calculator::compute_loading_values;
use roost_core::settlement::{BatchAvailability, BatchCounters};
use roost_core::validation::validate_id;
use roost_core::{
    CoreError, DateRange, LoadingBatch, LoadingFilter, LoadingPatch, LoadingStats, LoadingWeight,
    Money, NewLoading, Weight,
};

use super::directory::{adjust_chicken_stock, fetch_supplier, resolve_chicken_type};
use super::generate_id;
use crate::error::{DbError, DbResult};

const LOADING_COLUMNS: &str = r#"
    id, tenant_id, supplier_id, chicken_type_id, recorded_by,
    quantity, gross_weight_grams, net_weight_grams, empty_weight_grams,
    unit_price_cents, total_cost_cents,
    distributed_quantity, distributed_net_weight_grams,
    remaining_quantity, remaining_net_weight_grams,
    loading_date, notes, version, created_at, updated_at
"#;

/// Repository for loading batches.
#[derive(Debug, Clone)]
pub struct LoadingRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl LoadingRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        LoadingRepository { pool, tenant_id }
    }

    /// Records a new intake batch.
    ///
    /// ## Errors
    /// - `InvalidInput` for a bad quantity, weight, price or id format
    /// - `NotFound` when the supplier or chicken type does not exist
    pub async fn create(&self, input: NewLoading) -> DbResult<LoadingBatch> {
        let values = compute_loading_values(input.quantity, input.weight, input.unit_price)?;

        let mut tx = self.pool.begin().await?;

        fetch_supplier(&mut tx, &self.tenant_id, &input.supplier_id).await?;
        let chicken_type = resolve_chicken_type(&mut tx, &self.tenant_id, &input.chicken_type).await?;

        let now = Utc::now();
        let batch = LoadingBatch {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            supplier_id: input.supplier_id,
            chicken_type_id: chicken_type.id,
            recorded_by: input.recorded_by,
            quantity: input.quantity,
            gross_weight_grams: gross_reading(input.weight),
            net_weight_grams: values.net_weight.grams(),
            empty_weight_grams: values.empty_weight.grams(),
            unit_price_cents: input.unit_price.cents(),
            total_cost_cents: values.total_amount.cents(),
            distributed_quantity: 0,
            distributed_net_weight_grams: 0,
            remaining_quantity: input.quantity,
            remaining_net_weight_grams: values.net_weight.grams(),
            loading_date: input.loading_date.unwrap_or(now),
            notes: input.notes,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %batch.id, chicken_type_id = %batch.chicken_type_id, "Inserting loading");

        sqlx::query(
            r#"
            INSERT INTO loadings (
                id, tenant_id, supplier_id, chicken_type_id, recorded_by,
                quantity, gross_weight_grams, net_weight_grams, empty_weight_grams,
                unit_price_cents, total_cost_cents,
                distributed_quantity, distributed_net_weight_grams,
                remaining_quantity, remaining_net_weight_grams,
                loading_date, notes, version, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11,
                ?12, ?13,
                ?14, ?15,
                ?16, ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&batch.id)
        .bind(&batch.tenant_id)
        .bind(&batch.supplier_id)
        .bind(&batch.chicken_type_id)
        .bind(&batch.recorded_by)
        .bind(batch.quantity)
        .bind(batch.gross_weight_grams)
        .bind(batch.net_weight_grams)
        .bind(batch.empty_weight_grams)
        .bind(batch.unit_price_cents)
        .bind(batch.total_cost_cents)
        .bind(batch.distributed_quantity)
        .bind(batch.distributed_net_weight_grams)
        .bind(batch.remaining_quantity)
        .bind(batch.remaining_net_weight_grams)
        .bind(batch.loading_date)
        .bind(&batch.notes)
        .bind(batch.version)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .execute(&mut *tx)
        .await?;

        adjust_chicken_stock(&mut tx, &self.tenant_id, &batch.chicken_type_id, -batch.quantity).await?;

        tx.commit().await?;

        info!(
            id = %batch.id,
            quantity = batch.quantity,
            net_weight = %batch.net_weight(),
            total_cost = %batch.total_cost(),
            "Loading recorded"
        );
        Ok(batch)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LoadingBatch>> {
        validate_id("loading_id", id)?;
        let sql = format!("SELECT {LOADING_COLUMNS} FROM loadings WHERE tenant_id = ?1 AND id = ?2");
        let row = sqlx::query_as::<_, LoadingBatch>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lists batches, newest loading date first.
    pub async fn list(&self, filter: &LoadingFilter) -> DbResult<Vec<LoadingBatch>> {
        let (from, to) = window_bounds(filter.range);
        let sql = format!(
            r#"
            SELECT {LOADING_COLUMNS} FROM loadings
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR chicken_type_id = ?2)
              AND (?3 IS NULL OR supplier_id = ?3)
              AND (?4 IS NULL OR recorded_by = ?4)
              AND (?5 IS NULL OR loading_date >= ?5)
              AND (?6 IS NULL OR loading_date < ?6)
            ORDER BY loading_date DESC, id
            "#
        );
        let rows = sqlx::query_as::<_, LoadingBatch>(&sql)
            .bind(&self.tenant_id)
            .bind(&filter.chicken_type_id)
            .bind(&filter.supplier_id)
            .bind(&filter.recorded_by)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Applies a partial update and recomputes the derived fields.
    ///
    /// When only the quantity changes and the batch was weighed gross, the
    /// stored gross reading is re-used so packaging is deducted again.
    ///
    /// ## Errors
    /// - `Conflict` when `expected_version` is stale or another writer wins
    /// - `InvalidInput` when the new size is below what is distributed
    pub async fn update(&self, id: &str, patch: LoadingPatch) -> DbResult<LoadingBatch> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_loading(&mut tx, &self.tenant_id, id).await?;
        if let Some(expected) = patch.expected_version {
            if expected != existing.version {
                return Err(DbError::conflict(format!(
                    "loading {id} is at version {}, expected {expected}",
                    existing.version
                )));
            }
        }

        let supplier_id = match patch.supplier_id {
            Some(supplier_id) => fetch_supplier(&mut tx, &self.tenant_id, &supplier_id).await?.id,
            None => existing.supplier_id.clone(),
        };
        let chicken_type_id = match &patch.chicken_type {
            Some(reference) => resolve_chicken_type(&mut tx, &self.tenant_id, reference).await?.id,
            None => existing.chicken_type_id.clone(),
        };
        let type_changed = chicken_type_id != existing.chicken_type_id;
        if type_changed && existing.distributed_quantity > 0 {
            return Err(DbError::conflict(format!(
                "loading {id} has {} units distributed; its chicken type cannot change",
                existing.distributed_quantity
            )));
        }

        let quantity = patch.quantity.unwrap_or(existing.quantity);
        let weight = patch.weight.unwrap_or(match existing.gross_weight_grams {
            Some(gross) => LoadingWeight::Gross(Weight::from_grams(gross)),
            None => LoadingWeight::Net(existing.net_weight()),
        });
        let unit_price = patch.unit_price.unwrap_or(existing.unit_price());
        let values = compute_loading_values(quantity, weight, unit_price)?;

        let counters = counters_of(&existing).resize(quantity, values.net_weight)?;

        if type_changed {
            adjust_chicken_stock(&mut tx, &self.tenant_id, &existing.chicken_type_id, existing.quantity).await?;
            adjust_chicken_stock(&mut tx, &self.tenant_id, &chicken_type_id, -quantity).await?;
        } else {
            adjust_chicken_stock(&mut tx, &self.tenant_id, &chicken_type_id, existing.quantity - quantity).await?;
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE loadings SET
                supplier_id = ?1, chicken_type_id = ?2,
                quantity = ?3, gross_weight_grams = ?4, net_weight_grams = ?5, empty_weight_grams = ?6,
                unit_price_cents = ?7, total_cost_cents = ?8,
                remaining_quantity = ?9, remaining_net_weight_grams = ?10,
                loading_date = ?11, notes = ?12,
                version = version + 1, updated_at = ?13
            WHERE tenant_id = ?14 AND id = ?15 AND version = ?16
            "#,
        )
        .bind(&supplier_id)
        .bind(&chicken_type_id)
        .bind(quantity)
        .bind(gross_reading(weight))
        .bind(values.net_weight.grams())
        .bind(values.empty_weight.grams())
        .bind(unit_price.cents())
        .bind(values.total_amount.cents())
        .bind(counters.remaining_quantity())
        .bind(counters.remaining_net_weight().grams())
        .bind(patch.loading_date.unwrap_or(existing.loading_date))
        .bind(patch.notes.or(existing.notes))
        .bind(now)
        .bind(&self.tenant_id)
        .bind(id)
        .bind(existing.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale_version(id));
        }

        let updated = fetch_loading(&mut tx, &self.tenant_id, id).await?;
        tx.commit().await?;

        info!(id = %id, version = updated.version, "Loading updated");
        Ok(updated)
    }

    /// Deletes a batch nothing has been distributed from.
    ///
    /// ## Errors
    /// - `Conflict` (`LoadingInUse`) when `distributed_quantity > 0`
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_loading(&mut tx, &self.tenant_id, id).await?;
        if existing.distributed_quantity > 0 {
            warn!(id = %id, distributed = existing.distributed_quantity, "Refusing to delete loading in use");
            return Err(CoreError::LoadingInUse {
                loading_id: id.to_string(),
                distributed_quantity: existing.distributed_quantity,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM loadings WHERE tenant_id = ?1 AND id = ?2 AND version = ?3")
            .bind(&self.tenant_id)
            .bind(id)
            .bind(existing.version)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(stale_version(id));
        }

        adjust_chicken_stock(&mut tx, &self.tenant_id, &existing.chicken_type_id, existing.quantity).await?;

        tx.commit().await?;

        info!(id = %id, "Loading deleted");
        Ok(())
    }

    /// Aggregate intake figures, optionally restricted to a date range.
    pub async fn stats(&self, range: Option<DateRange>) -> DbResult<LoadingStats> {
        let (from, to) = window_bounds(range);
        let (count, quantity, net_grams, cost_cents, price_cents): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(quantity), 0),
                    COALESCE(SUM(net_weight_grams), 0),
                    COALESCE(SUM(total_cost_cents), 0),
                    COALESCE(SUM(unit_price_cents), 0)
                FROM loadings
                WHERE tenant_id = ?1
                  AND (?2 IS NULL OR loading_date >= ?2)
                  AND (?3 IS NULL OR loading_date < ?3)
                "#,
            )
            .bind(&self.tenant_id)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        Ok(LoadingStats::from_totals(
            count,
            quantity,
            Weight::from_grams(net_grams),
            Money::from_cents(cost_cents),
            Money::from_cents(price_cents),
        ))
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

pub(crate) async fn fetch_loading(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<LoadingBatch> {
    validate_id("loading_id", id)?;
    let sql = format!("SELECT {LOADING_COLUMNS} FROM loadings WHERE tenant_id = ?1 AND id = ?2");
    sqlx::query_as::<_, LoadingBatch>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Loading", id))
}

/// Batches of a chicken type loaded before `until` that still hold stock.
pub(crate) async fn eligible_batches(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    chicken_type_id: &str,
    until: DateTime<Utc>,
) -> DbResult<Vec<BatchAvailability>> {
    let rows: Vec<(String, DateTime<Utc>, i64, i64)> = sqlx::query_as(
        r#"
        SELECT id, loading_date, remaining_quantity, remaining_net_weight_grams
        FROM loadings
        WHERE tenant_id = ?1 AND chicken_type_id = ?2
          AND loading_date < ?3 AND remaining_quantity > 0
        ORDER BY loading_date, id
        "#,
    )
    .bind(tenant_id)
    .bind(chicken_type_id)
    .bind(until)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(loading_id, loading_date, remaining_quantity, remaining_grams)| BatchAvailability {
            loading_id,
            loading_date,
            remaining_quantity,
            remaining_net_weight: Weight::from_grams(remaining_grams),
        })
        .collect())
}

pub(crate) fn counters_of(batch: &LoadingBatch) -> BatchCounters {
    BatchCounters {
        quantity: batch.quantity,
        net_weight: batch.net_weight(),
        distributed_quantity: batch.distributed_quantity,
        distributed_net_weight: batch.distributed_net_weight(),
    }
}

/// Stores new distribution counters on a batch read at `batch.version`.
pub(crate) async fn write_counters(
    conn: &mut SqliteConnection,
    batch: &LoadingBatch,
    counters: BatchCounters,
) -> DbResult<()> {
    debug!(
        id = %batch.id,
        distributed_quantity = counters.distributed_quantity,
        remaining_quantity = counters.remaining_quantity(),
        "Writing loading counters"
    );

    let result = sqlx::query(
        r#"
        UPDATE loadings SET
            distributed_quantity = ?1, distributed_net_weight_grams = ?2,
            remaining_quantity = ?3, remaining_net_weight_grams = ?4,
            version = version + 1, updated_at = ?5
        WHERE tenant_id = ?6 AND id = ?7 AND version = ?8
        "#,
    )
    .bind(counters.distributed_quantity)
    .bind(counters.distributed_net_weight.grams())
    .bind(counters.remaining_quantity())
    .bind(counters.remaining_net_weight().grams())
    .bind(Utc::now())
    .bind(&batch.tenant_id)
    .bind(&batch.id)
    .bind(batch.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(stale_version(&batch.id));
    }
    Ok(())
}

fn stale_version(id: &str) -> DbError {
    DbError::conflict(format!("loading {id} was modified concurrently"))
}

fn gross_reading(weight: LoadingWeight) -> Option<i64> {
    match weight {
        LoadingWeight::Gross(gross) => Some(gross.grams()),
        LoadingWeight::Net(_) => None,
    }
}

pub(crate) fn window_bounds(range: Option<DateRange>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match range {
        Some(range) => {
            let (from, to) = range.window();
            (Some(from), Some(to))
        }
        None => (None, None),
    }
}
