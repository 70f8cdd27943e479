//! # Distribution Repository
//!
//! Stock outflow to customers. Each write settles against a loading batch
//! and the customer's debt in one transaction.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                 │
//! │   1. customer exists, chicken type resolves                            │
//! │   2. eligible = batches of the type loaded before the end of the       │
//! │      distribution day with remaining_quantity > 0                      │
//! │   3. plan = plan_allocation(eligible, quantity, net)                   │
//! │   4. INSERT distribution (allocated_* / shortage_* recorded)           │
//! │   5. source batch: distributed += allocated   (version checked)        │
//! │   6. customer debt journal: Adjust(+total_amount)                      │
//! │  COMMIT                                                                │
//! │   7. shortage > 0 → over-distribution waste for (day, type)            │
//! │      best effort: failure is logged, the distribution stands           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update / Delete
//! Update re-plans against the same source batch only and posts the
//! change in total as a debt adjustment; delete gives the stored allocation
//! back and posts `Adjust(-total_amount)`. Neither rewrites waste already
//! booked.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use roost_core::calculator::compute_distribution_values;
use roost_core::period::{day_of, day_window};
use roost_core::settlement::{plan_allocation, plan_reallocation, BatchRemaining, CurrentAllocation};
use roost_core::validation::validate_id;
use roost_core::{
    DailyNetWeight, DebtEntry, Distribution, DistributionFilter, DistributionPatch, Money,
    NewDistribution, Weight,
};

use super::customer::{fetch_customer, post_debt_entry};
use super::directory::resolve_chicken_type;
use super::generate_id;
use super::loading::{counters_of, eligible_batches, fetch_loading, window_bounds, write_counters};
use super::waste::WasteRepository;
use crate::error::{DbError, DbResult};

const DISTRIBUTION_COLUMNS: &str = r#"
    id, tenant_id, customer_id, chicken_type_id, loading_id, recorded_by,
    quantity, gross_weight_grams, empty_weight_grams, net_weight_grams,
    unit_price_cents, total_amount_cents,
    allocated_quantity, allocated_net_weight_grams,
    shortage_quantity, shortage_net_weight_grams,
    distribution_date, notes, created_at, updated_at
"#;

/// Repository for distributions.
#[derive(Debug, Clone)]
pub struct DistributionRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl DistributionRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        DistributionRepository { pool, tenant_id }
    }

    /// Records a distribution and settles it.
    ///
    /// Never fails for lack of stock: whatever no batch can cover is
    /// recorded as shortage and booked as over-distribution waste.
    ///
    /// ## Errors
    /// - `InvalidInput` for a bad quantity, weight, price or id format
    /// - `NotFound` when the customer or chicken type does not exist
    /// - `Conflict` when the source batch changed underneath
    pub async fn create(&self, input: NewDistribution) -> DbResult<Distribution> {
        let values = compute_distribution_values(input.quantity, input.gross_weight, input.unit_price)?;
        let distribution_date = input.distribution_date.unwrap_or_else(Utc::now);
        let day = day_of(distribution_date);
        let (_, end_of_day) = day_window(day);

        let mut tx = self.pool.begin().await?;

        fetch_customer(&mut tx, &self.tenant_id, &input.customer_id).await?;
        let chicken_type = resolve_chicken_type(&mut tx, &self.tenant_id, &input.chicken_type).await?;

        let batches = eligible_batches(&mut tx, &self.tenant_id, &chicken_type.id, end_of_day).await?;
        let plan = plan_allocation(&batches, input.quantity, values.net_weight);

        debug!(
            source = ?plan.source,
            allocated = plan.allocated_quantity,
            shortage = plan.shortage_quantity,
            eligible = batches.len(),
            "Planned distribution allocation"
        );

        let now = Utc::now();
        let distribution = Distribution {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            customer_id: input.customer_id,
            chicken_type_id: chicken_type.id,
            loading_id: plan.source.clone(),
            recorded_by: input.recorded_by,
            quantity: input.quantity,
            gross_weight_grams: input.gross_weight.grams(),
            empty_weight_grams: values.empty_weight.grams(),
            net_weight_grams: values.net_weight.grams(),
            unit_price_cents: input.unit_price.cents(),
            total_amount_cents: values.total_amount.cents(),
            allocated_quantity: plan.allocated_quantity,
            allocated_net_weight_grams: plan.allocated_net_weight.grams(),
            shortage_quantity: plan.shortage_quantity,
            shortage_net_weight_grams: plan.shortage_net_weight.grams(),
            distribution_date,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        insert_distribution(&mut tx, &distribution).await?;

        if let Some(source) = &plan.source {
            let batch = fetch_loading(&mut tx, &self.tenant_id, source).await?;
            let counters = counters_of(&batch).consume(plan.allocated_quantity, plan.allocated_net_weight);
            write_counters(&mut tx, &batch, counters).await?;
        }

        post_debt_entry(
            &mut tx,
            &self.tenant_id,
            &distribution.customer_id,
            DebtEntry::Adjust(distribution.total_amount()),
            &distribution.id,
        )
        .await?;

        tx.commit().await?;

        info!(
            id = %distribution.id,
            customer_id = %distribution.customer_id,
            loading_id = ?distribution.loading_id,
            total_amount = %distribution.total_amount(),
            "Distribution recorded"
        );

        if plan.has_shortage() {
            let waste = WasteRepository::new(self.pool.clone(), self.tenant_id.clone());
            if let Err(e) = waste
                .record_over_distribution(
                    day,
                    &distribution.chicken_type_id,
                    plan.shortage_quantity,
                    plan.shortage_net_weight,
                )
                .await
            {
                warn!(
                    id = %distribution.id,
                    error = %e,
                    shortage_quantity = plan.shortage_quantity,
                    "Failed to book over-distribution waste"
                );
            }
        }

        Ok(distribution)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Distribution>> {
        validate_id("distribution_id", id)?;
        let sql = format!(
            "SELECT {DISTRIBUTION_COLUMNS} FROM distributions WHERE tenant_id = ?1 AND id = ?2"
        );
        let row = sqlx::query_as::<_, Distribution>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lists distributions, newest distribution date first.
    pub async fn list(&self, filter: &DistributionFilter) -> DbResult<Vec<Distribution>> {
        let (from, to) = window_bounds(filter.range);
        let sql = format!(
            r#"
            SELECT {DISTRIBUTION_COLUMNS} FROM distributions
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR customer_id = ?2)
              AND (?3 IS NULL OR chicken_type_id = ?3)
              AND (?4 IS NULL OR distribution_date >= ?4)
              AND (?5 IS NULL OR distribution_date < ?5)
            ORDER BY distribution_date DESC, created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, Distribution>(&sql)
            .bind(&self.tenant_id)
            .bind(&filter.customer_id)
            .bind(&filter.chicken_type_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Applies a partial update, re-settling against the same source batch.
    ///
    /// ## Errors
    /// - `InsufficientInventory` when growth exceeds the batch headroom
    ///   (`allocated + remaining`), or the distribution has no batch
    /// - `Conflict` when the source batch changed underneath
    pub async fn update(&self, id: &str, patch: DistributionPatch) -> DbResult<Distribution> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_distribution(&mut tx, &self.tenant_id, id).await?;

        let quantity = patch.quantity.unwrap_or(existing.quantity);
        let gross_weight = patch
            .gross_weight
            .unwrap_or(Weight::from_grams(existing.gross_weight_grams));
        let unit_price = patch
            .unit_price
            .unwrap_or(Money::from_cents(existing.unit_price_cents));
        let values = compute_distribution_values(quantity, gross_weight, unit_price)?;

        let batch = match &existing.loading_id {
            Some(loading_id) => Some(fetch_loading(&mut tx, &self.tenant_id, loading_id).await?),
            None => None,
        };

        let reallocation = plan_reallocation(
            existing.loading_id.as_deref(),
            CurrentAllocation {
                allocated_quantity: existing.allocated_quantity,
                allocated_net_weight: existing.allocated_net_weight(),
                shortage_quantity: existing.shortage_quantity,
                shortage_net_weight: Weight::from_grams(existing.shortage_net_weight_grams),
            },
            batch.as_ref().map(|b| BatchRemaining {
                quantity: b.remaining_quantity,
                net_weight: b.remaining_net_weight(),
            }),
            quantity,
            values.net_weight,
        )?;

        if let Some(batch) = &batch {
            if reallocation.delta_quantity != 0 || !reallocation.delta_net_weight.is_zero() {
                let counters = counters_of(batch)
                    .consume(reallocation.delta_quantity, reallocation.delta_net_weight);
                write_counters(&mut tx, batch, counters).await?;
            }
        }

        sqlx::query(
            r#"
            UPDATE distributions SET
                quantity = ?1, gross_weight_grams = ?2, empty_weight_grams = ?3, net_weight_grams = ?4,
                unit_price_cents = ?5, total_amount_cents = ?6,
                allocated_quantity = ?7, allocated_net_weight_grams = ?8,
                shortage_quantity = ?9, shortage_net_weight_grams = ?10,
                distribution_date = ?11, notes = ?12, updated_at = ?13
            WHERE tenant_id = ?14 AND id = ?15
            "#,
        )
        .bind(quantity)
        .bind(gross_weight.grams())
        .bind(values.empty_weight.grams())
        .bind(values.net_weight.grams())
        .bind(unit_price.cents())
        .bind(values.total_amount.cents())
        .bind(reallocation.allocated_quantity)
        .bind(reallocation.allocated_net_weight.grams())
        .bind(reallocation.shortage_quantity)
        .bind(reallocation.shortage_net_weight.grams())
        .bind(patch.distribution_date.unwrap_or(existing.distribution_date))
        .bind(patch.notes.or(existing.notes.clone()))
        .bind(Utc::now())
        .bind(&self.tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let delta = values.total_amount - existing.total_amount();
        if !delta.is_zero() {
            post_debt_entry(&mut tx, &self.tenant_id, &existing.customer_id, DebtEntry::Adjust(delta), id)
                .await?;
        }

        let updated = fetch_distribution(&mut tx, &self.tenant_id, id).await?;
        tx.commit().await?;

        info!(
            id = %id,
            delta_quantity = reallocation.delta_quantity,
            total_amount = %updated.total_amount(),
            "Distribution updated"
        );
        Ok(updated)
    }

    /// Deletes a distribution and gives its allocation back to the batch.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_distribution(&mut tx, &self.tenant_id, id).await?;

        if let Some(loading_id) = &existing.loading_id {
            let batch = fetch_loading(&mut tx, &self.tenant_id, loading_id).await?;
            let counters = counters_of(&batch)
                .consume(-existing.allocated_quantity, -existing.allocated_net_weight());
            write_counters(&mut tx, &batch, counters).await?;
        }

        sqlx::query("DELETE FROM distributions WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        post_debt_entry(
            &mut tx,
            &self.tenant_id,
            &existing.customer_id,
            DebtEntry::Adjust(-existing.total_amount()),
            id,
        )
        .await?;

        tx.commit().await?;

        info!(id = %id, released = existing.allocated_quantity, "Distribution deleted");
        Ok(())
    }

    /// Net weight distributed on one day.
    pub async fn daily_net_weight(&self, date: NaiveDate) -> DbResult<DailyNetWeight> {
        let (from, to) = day_window(date);
        let (grams, count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(net_weight_grams), 0), COUNT(*)
            FROM distributions
            WHERE tenant_id = ?1 AND distribution_date >= ?2 AND distribution_date < ?3
            "#,
        )
        .bind(&self.tenant_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailyNetWeight {
            date,
            total_net_weight: Weight::from_grams(grams),
            count,
        })
    }
}

pub(crate) async fn fetch_distribution(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Distribution> {
    validate_id("distribution_id", id)?;
    let sql = format!("SELECT {DISTRIBUTION_COLUMNS} FROM distributions WHERE tenant_id = ?1 AND id = ?2");
    sqlx::query_as::<_, Distribution>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Distribution", id))
}

async fn insert_distribution(conn: &mut SqliteConnection, d: &Distribution) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO distributions (
            id, tenant_id, customer_id, chicken_type_id, loading_id, recorded_by,
            quantity, gross_weight_grams, empty_weight_grams, net_weight_grams,
            unit_price_cents, total_amount_cents,
            allocated_quantity, allocated_net_weight_grams,
            shortage_quantity, shortage_net_weight_grams,
            distribution_date, notes, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12,
            ?13, ?14,
            ?15, ?16,
            ?17, ?18, ?19, ?20
        )
        "#,
    )
    .bind(&d.id)
    .bind(&d.tenant_id)
    .bind(&d.customer_id)
    .bind(&d.chicken_type_id)
    .bind(&d.loading_id)
    .bind(&d.recorded_by)
    .bind(d.quantity)
    .bind(d.gross_weight_grams)
    .bind(d.empty_weight_grams)
    .bind(d.net_weight_grams)
    .bind(d.unit_price_cents)
    .bind(d.total_amount_cents)
    .bind(d.allocated_quantity)
    .bind(d.allocated_net_weight_grams)
    .bind(d.shortage_quantity)
    .bind(d.shortage_net_weight_grams)
    .bind(d.distribution_date)
    .bind(&d.notes)
    .bind(d.created_at)
    .bind(d.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
