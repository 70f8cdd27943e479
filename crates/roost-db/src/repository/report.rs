//! # Profit Report Repository
//!
//! Read-side aggregation of the event log into daily profit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  term             source table        day taken from                   │
//! │  ───────────────  ──────────────────  ───────────────────────────────  │
//! │  revenue          distributions       distribution_date                │
//! │  loading_cost     loadings            loading_date                     │
//! │  expenses         employee_expenses   expense_date                     │
//! │  discounts        payments            payment_date                     │
//! │  waste_cost       daily_waste         waste_date (× current price)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here writes. Each term is fetched once for the whole window and
//! bucketed by UTC day in memory.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use roost_core::period::{day_of, day_window, DateRange};
use roost_core::reporting::waste_cost;
use roost_core::{DailyProfit, Money, ProfitBreakdown, ProfitHistory, Weight};

use crate::error::DbResult;

/// Repository for profit reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    tenant_id: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct DayTerms {
    revenue: Money,
    loading_cost: Money,
    expenses: Money,
    discounts: Money,
    waste_cost: Money,
}

impl DayTerms {
    fn breakdown(&self) -> ProfitBreakdown {
        ProfitBreakdown::new(
            self.revenue,
            self.loading_cost,
            self.expenses,
            self.discounts,
            self.waste_cost,
        )
    }
}

impl ReportRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        ReportRepository { pool, tenant_id }
    }

    /// Profit for one calendar day.
    pub async fn daily_profit(&self, date: NaiveDate) -> DbResult<DailyProfit> {
        let days = self.collect(Some(date), Some(date)).await?;
        let breakdown = days
            .get(&date)
            .map(DayTerms::breakdown)
            .unwrap_or_default();
        Ok(DailyProfit { date, breakdown })
    }

    /// Profit summed over an optional range; `None` bounds are open.
    ///
    /// `days` lists only days with activity, newest first.
    pub async fn profit_history(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<ProfitHistory> {
        if let (Some(start), Some(end)) = (start, end) {
            DateRange::new(start, end)?;
        }

        let days: Vec<DailyProfit> = self
            .collect(start, end)
            .await?
            .into_iter()
            .rev()
            .map(|(date, terms)| DailyProfit {
                date,
                breakdown: terms.breakdown(),
            })
            .collect();

        let total: ProfitBreakdown = days.iter().map(|d| d.breakdown).sum();

        debug!(days = days.len(), profit = %total.profit, "Profit history computed");

        Ok(ProfitHistory {
            start,
            end,
            total,
            days,
        })
    }

    /// Profit of the seven days ending on `end`.
    pub async fn weekly_profit(&self, end: NaiveDate) -> DbResult<ProfitHistory> {
        let week = DateRange::week_ending(end);
        self.profit_history(Some(week.start), Some(week.end)).await
    }

    async fn collect(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<BTreeMap<NaiveDate, DayTerms>> {
        let from = start.map(|d| day_window(d).0);
        let to = end.map(|d| day_window(d).1);

        let mut days: BTreeMap<NaiveDate, DayTerms> = BTreeMap::new();

        for (at, cents) in self
            .timed_amounts("distributions", "distribution_date", "total_amount_cents", from, to)
            .await?
        {
            days.entry(day_of(at)).or_default().revenue += Money::from_cents(cents);
        }
        for (at, cents) in self
            .timed_amounts("loadings", "loading_date", "total_cost_cents", from, to)
            .await?
        {
            days.entry(day_of(at)).or_default().loading_cost += Money::from_cents(cents);
        }
        for (at, cents) in self
            .timed_amounts("employee_expenses", "expense_date", "value_cents", from, to)
            .await?
        {
            days.entry(day_of(at)).or_default().expenses += Money::from_cents(cents);
        }
        for (at, cents) in self
            .timed_amounts("payments", "payment_date", "discount_cents", from, to)
            .await?
        {
            if cents != 0 {
                days.entry(day_of(at)).or_default().discounts += Money::from_cents(cents);
            }
        }

        let waste_rows: Vec<(NaiveDate, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                w.waste_date,
                w.over_distribution_net_weight_grams + w.other_waste_net_weight_grams,
                c.price_cents
            FROM daily_waste w
            JOIN chicken_types c ON c.id = w.chicken_type_id
            WHERE w.tenant_id = ?1
              AND (?2 IS NULL OR w.waste_date >= ?2)
              AND (?3 IS NULL OR w.waste_date <= ?3)
            "#,
        )
        .bind(&self.tenant_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        for (date, grams, price_cents) in waste_rows {
            let cost = waste_cost([(Weight::from_grams(grams), Money::from_cents(price_cents))]);
            if !cost.is_zero() {
                days.entry(date).or_default().waste_cost += cost;
            }
        }

        Ok(days)
    }

    /// `(operational date, amount)` rows of one table inside the window.
    async fn timed_amounts(
        &self,
        table: &str,
        date_column: &str,
        amount_column: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<(DateTime<Utc>, i64)>> {
        let sql = format!(
            r#"
            SELECT {date_column}, {amount_column} FROM {table}
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR {date_column} >= ?2)
              AND (?3 IS NULL OR {date_column} < ?3)
            "#
        );
        let rows = sqlx::query_as::<_, (DateTime<Utc>, i64)>(&sql)
            .bind(&self.tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
