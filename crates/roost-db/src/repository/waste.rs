//! # Waste Repository
//!
//! One row per (day, chicken type). Over-distribution accumulates from
//! distribution shortages; other waste is entered by hand.
//!
//! ```text
//! ┌──────────────┬──────────────┬───────────────────────┬──────────────────┐
//! │ waste_date   │ chicken type │ over_distribution_*   │ other_waste_*    │
//! ├──────────────┼──────────────┼───────────────────────┼──────────────────┤
//! │ 2026-03-14   │ Broiler      │ += shortage (auto)    │ set by upsert    │
//! └──────────────┴──────────────┴───────────────────────┴──────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use roost_core::validation::{validate_count, validate_id, validate_weight};
use roost_core::{
    ChickenTypeWaste, DailyWaste, DateRange, WasteDay, WasteDayTotal, WasteEntry, WasteSummary,
    Weight,
};

use super::directory::resolve_chicken_type;
use super::generate_id;
use crate::error::DbResult;

const WASTE_COLUMNS: &str = r#"
    id, tenant_id, waste_date, chicken_type_id,
    over_distribution_quantity, over_distribution_net_weight_grams,
    other_waste_quantity, other_waste_net_weight_grams,
    notes, created_at, updated_at
"#;

/// Repository for daily waste.
#[derive(Debug, Clone)]
pub struct WasteRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl WasteRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        WasteRepository { pool, tenant_id }
    }

    /// Adds a distribution shortage to the day's over-distribution waste.
    pub async fn record_over_distribution(
        &self,
        date: NaiveDate,
        chicken_type_id: &str,
        quantity: i64,
        net_weight: Weight,
    ) -> DbResult<DailyWaste> {
        validate_id("chicken_type_id", chicken_type_id)?;
        validate_count("over_distribution_quantity", quantity)?;
        validate_weight("over_distribution_net_weight", net_weight)?;

        debug!(date = %date, chicken_type_id = %chicken_type_id, quantity, "Accumulating over-distribution");

        let sql = format!(
            r#"
            INSERT INTO daily_waste (
                id, tenant_id, waste_date, chicken_type_id,
                over_distribution_quantity, over_distribution_net_weight_grams,
                other_waste_quantity, other_waste_net_weight_grams,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, NULL, ?7, ?7)
            ON CONFLICT (tenant_id, waste_date, chicken_type_id) DO UPDATE SET
                over_distribution_quantity =
                    over_distribution_quantity + excluded.over_distribution_quantity,
                over_distribution_net_weight_grams =
                    over_distribution_net_weight_grams + excluded.over_distribution_net_weight_grams,
                updated_at = excluded.updated_at
            RETURNING {WASTE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, DailyWaste>(&sql)
            .bind(generate_id())
            .bind(&self.tenant_id)
            .bind(date)
            .bind(chicken_type_id)
            .bind(quantity)
            .bind(net_weight.grams())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!(
            date = %date,
            chicken_type_id = %chicken_type_id,
            total_over_quantity = row.over_distribution_quantity,
            "Over-distribution waste booked"
        );
        Ok(row)
    }

    /// Creates or replaces the day's waste figures for a chicken type.
    pub async fn upsert(&self, entry: WasteEntry) -> DbResult<DailyWaste> {
        validate_count("over_distribution_quantity", entry.over_distribution_quantity)?;
        validate_weight("over_distribution_net_weight", entry.over_distribution_net_weight)?;
        validate_count("other_waste_quantity", entry.other_waste_quantity)?;
        validate_weight("other_waste_net_weight", entry.other_waste_net_weight)?;

        let mut conn = self.pool.acquire().await?;
        let chicken_type = resolve_chicken_type(&mut conn, &self.tenant_id, &entry.chicken_type).await?;

        let sql = format!(
            r#"
            INSERT INTO daily_waste (
                id, tenant_id, waste_date, chicken_type_id,
                over_distribution_quantity, over_distribution_net_weight_grams,
                other_waste_quantity, other_waste_net_weight_grams,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT (tenant_id, waste_date, chicken_type_id) DO UPDATE SET
                over_distribution_quantity = excluded.over_distribution_quantity,
                over_distribution_net_weight_grams = excluded.over_distribution_net_weight_grams,
                other_waste_quantity = excluded.other_waste_quantity,
                other_waste_net_weight_grams = excluded.other_waste_net_weight_grams,
                notes = excluded.notes,
                updated_at = excluded.updated_at
            RETURNING {WASTE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, DailyWaste>(&sql)
            .bind(generate_id())
            .bind(&self.tenant_id)
            .bind(entry.date)
            .bind(&chicken_type.id)
            .bind(entry.over_distribution_quantity)
            .bind(entry.over_distribution_net_weight.grams())
            .bind(entry.other_waste_quantity)
            .bind(entry.other_waste_net_weight.grams())
            .bind(&entry.notes)
            .bind(Utc::now())
            .fetch_one(&mut *conn)
            .await?;

        info!(date = %entry.date, chicken_type = %chicken_type.name, "Waste entry saved");
        Ok(row)
    }

    /// All waste rows of one day.
    pub async fn for_date(&self, date: NaiveDate) -> DbResult<WasteDay> {
        let entries = self.rows_between(date, date).await?;
        let total_quantity = entries.iter().map(DailyWaste::total_waste_quantity).sum();
        let total_net_weight = entries.iter().map(DailyWaste::total_waste_net_weight).sum();
        Ok(WasteDay {
            date,
            entries,
            total_quantity,
            total_net_weight,
        })
    }

    /// Waste over a range, per chicken type and per day (newest first).
    pub async fn summary(&self, range: DateRange) -> DbResult<WasteSummary> {
        let rows = self.rows_between(range.start, range.end).await?;

        let names: HashMap<String, String> =
            sqlx::query_as::<_, (String, String)>("SELECT id, name FROM chicken_types WHERE tenant_id = ?1")
                .bind(&self.tenant_id)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .collect();

        let mut by_day: BTreeMap<NaiveDate, WasteDayTotal> = BTreeMap::new();
        let mut by_type: BTreeMap<String, ChickenTypeWaste> = BTreeMap::new();

        for row in &rows {
            let quantity = row.total_waste_quantity();
            let weight = row.total_waste_net_weight();

            let day = by_day.entry(row.waste_date).or_insert(WasteDayTotal {
                date: row.waste_date,
                total_quantity: 0,
                total_net_weight: Weight::zero(),
            });
            day.total_quantity += quantity;
            day.total_net_weight += weight;

            let per_type = by_type
                .entry(row.chicken_type_id.clone())
                .or_insert_with(|| ChickenTypeWaste {
                    chicken_type_id: row.chicken_type_id.clone(),
                    chicken_type_name: names.get(&row.chicken_type_id).cloned().unwrap_or_default(),
                    total_quantity: 0,
                    total_net_weight: Weight::zero(),
                    days: Vec::new(),
                });
            per_type.total_quantity += quantity;
            per_type.total_net_weight += weight;
            per_type.days.push(WasteDayTotal {
                date: row.waste_date,
                total_quantity: quantity,
                total_net_weight: weight,
            });
        }

        let mut by_chicken_type: Vec<ChickenTypeWaste> = by_type.into_values().collect();
        by_chicken_type.sort_by(|a, b| a.chicken_type_name.cmp(&b.chicken_type_name));

        Ok(WasteSummary {
            range,
            by_chicken_type,
            by_day: by_day.into_values().rev().collect(),
        })
    }

    /// Rows with `start <= waste_date <= end`, newest day first.
    async fn rows_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<DailyWaste>> {
        let sql = format!(
            r#"
            SELECT {WASTE_COLUMNS} FROM daily_waste
            WHERE tenant_id = ?1 AND waste_date >= ?2 AND waste_date <= ?3
            ORDER BY waste_date DESC, chicken_type_id
            "#
        );
        let rows = sqlx::query_as::<_, DailyWaste>(&sql)
            .bind(&self.tenant_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
