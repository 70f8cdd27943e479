//! # Domain Types
//!
//! Ledger entities, their inputs, and the report shapes read back out.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ledger Entities                                 │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  LoadingBatch   │◄──│  Distribution   │──►│    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  quantity       │   │  quantity       │   │  outstanding_   │       │
//! │  │  net_weight     │   │  net_weight     │   │  debts (cache)  │       │
//! │  │  distributed_*  │   │  allocated_*    │   └────────▲────────┘       │
//! │  │  remaining_*    │   │  shortage_*     │            │                │
//! │  └─────────────────┘   └────────┬────────┘   ┌────────┴────────┐       │
//! │                                 │            │     Payment     │       │
//! │                                 ▼            │  remaining,     │       │
//! │                        ┌─────────────────┐   │  status         │       │
//! │                        │   DailyWaste    │   └─────────────────┘       │
//! │                        │ (day, type)     │                              │
//! │                        └─────────────────┘   ┌─────────────────┐       │
//! │                                              │   DailyStock    │       │
//! │                                              │ (day) snapshot  │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Convention
//! Entities store raw integers (`*_cents`, `*_grams`) so rows map straight
//! onto SQLite columns; typed accessors return [`Money`] and [`Weight`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::period::DateRange;
use crate::weight::Weight;

// =============================================================================
// Directories
// =============================================================================

/// A kind of bird with its current selling price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ChickenType {
    pub id: String,
    pub tenant_id: String,

    /// Display name, unique per tenant.
    pub name: String,

    /// Current price per kilogram in minor units.
    pub price_cents: i64,

    /// Running stock counter. Decremented by loadings, restored on delete.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ChickenType {
    /// Current price per kilogram.
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Reference to a chicken type as callers supply it.
///
/// Resolved once at the repository boundary into a canonical id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum ChickenTypeRef {
    ById(String),
    ByName(String),
}

impl ChickenTypeRef {
    pub fn id(id: impl Into<String>) -> Self {
        ChickenTypeRef::ById(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        ChickenTypeRef::ByName(name.into())
    }
}

impl std::fmt::Display for ChickenTypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChickenTypeRef::ById(id) => write!(f, "id:{}", id),
            ChickenTypeRef::ByName(name) => write!(f, "name:{}", name),
        }
    }
}

/// A customer account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,

    /// Cached debt projection, refreshed in the same transaction as every
    /// distribution or payment write. Never negative.
    pub outstanding_debts_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn outstanding_debts(&self) -> Money {
        Money::from_cents(self.outstanding_debts_cents)
    }
}

/// A supplier birds are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A staff member who records operations and carries collected cash.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewChickenType {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewEmployee {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

// =============================================================================
// Loading Batch
// =============================================================================

/// One intake of birds from a supplier.
///
/// ## Counters
/// ```text
/// remaining_quantity   = quantity   − distributed_quantity     (≥ 0)
/// remaining_net_weight = net_weight − distributed_net_weight   (≥ 0)
/// ```
/// Over-distribution never drives these negative; the excess is booked as
/// waste instead.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoadingBatch {
    pub id: String,
    pub tenant_id: String,
    pub supplier_id: String,
    pub chicken_type_id: String,
    pub recorded_by: Option<String>,

    pub quantity: i64,
    /// Scale reading, present when the net weight was derived from it.
    pub gross_weight_grams: Option<i64>,
    pub net_weight_grams: i64,
    pub empty_weight_grams: i64,
    /// Purchase price per kilogram.
    pub unit_price_cents: i64,
    pub total_cost_cents: i64,

    pub distributed_quantity: i64,
    pub distributed_net_weight_grams: i64,
    pub remaining_quantity: i64,
    pub remaining_net_weight_grams: i64,

    #[ts(as = "String")]
    pub loading_date: DateTime<Utc>,
    pub notes: Option<String>,

    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LoadingBatch {
    pub fn net_weight(&self) -> Weight {
        Weight::from_grams(self.net_weight_grams)
    }

    pub fn empty_weight(&self) -> Weight {
        Weight::from_grams(self.empty_weight_grams)
    }

    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    pub fn total_cost(&self) -> Money {
        Money::from_cents(self.total_cost_cents)
    }

    pub fn remaining_net_weight(&self) -> Weight {
        Weight::from_grams(self.remaining_net_weight_grams)
    }

    pub fn distributed_net_weight(&self) -> Weight {
        Weight::from_grams(self.distributed_net_weight_grams)
    }
}

/// How the net weight of an intake is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "grams", rename_all = "snake_case")]
#[ts(export)]
pub enum LoadingWeight {
    /// Net weight typed in directly, used as-is.
    Net(Weight),
    /// Scale reading; net is derived by deducting packaging.
    Gross(Weight),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLoading {
    pub supplier_id: String,
    pub chicken_type: ChickenTypeRef,
    #[serde(default)]
    pub recorded_by: Option<String>,
    pub quantity: i64,
    pub weight: LoadingWeight,
    pub unit_price: Money,
    /// Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub loading_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a loading. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoadingPatch {
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub chicken_type: Option<ChickenTypeRef>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub weight: Option<LoadingWeight>,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub loading_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    /// When set, the update fails with a conflict unless the stored
    /// version still matches.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoadingFilter {
    #[serde(default)]
    pub chicken_type_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
    #[serde(default)]
    pub range: Option<DateRange>,
}

// =============================================================================
// Distribution
// =============================================================================

/// One delivery of birds to a customer.
///
/// `allocated_*` is what was actually drawn from `loading_id`;
/// `shortage_*` is the part no batch could cover at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Distribution {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    pub chicken_type_id: String,
    /// Source batch; `None` when nothing was eligible.
    pub loading_id: Option<String>,
    pub recorded_by: Option<String>,

    pub quantity: i64,
    pub gross_weight_grams: i64,
    pub empty_weight_grams: i64,
    pub net_weight_grams: i64,
    /// Selling price per kilogram.
    pub unit_price_cents: i64,
    pub total_amount_cents: i64,

    pub allocated_quantity: i64,
    pub allocated_net_weight_grams: i64,
    pub shortage_quantity: i64,
    pub shortage_net_weight_grams: i64,

    #[ts(as = "String")]
    pub distribution_date: DateTime<Utc>,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Distribution {
    pub fn net_weight(&self) -> Weight {
        Weight::from_grams(self.net_weight_grams)
    }

    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    pub fn allocated_net_weight(&self) -> Weight {
        Weight::from_grams(self.allocated_net_weight_grams)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDistribution {
    pub customer_id: String,
    pub chicken_type: ChickenTypeRef,
    #[serde(default)]
    pub recorded_by: Option<String>,
    pub quantity: i64,
    pub gross_weight: Weight,
    pub unit_price: Money,
    /// Operational date. Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub distribution_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a distribution. Customer, chicken type and source
/// batch are fixed once committed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DistributionPatch {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub gross_weight: Option<Weight>,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub distribution_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DistributionFilter {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub chicken_type_id: Option<String>,
    #[serde(default)]
    pub range: Option<DateRange>,
}

// =============================================================================
// Payment
// =============================================================================

/// Settlement state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing left to pay.
    Completed,
    /// A remainder is still owed.
    Partial,
}

/// How a payment was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
}

/// A customer payment. Restates the customer's balance as `remaining`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    pub recorded_by: Option<String>,

    pub total_price_cents: i64,
    pub paid_amount_cents: i64,
    pub discount_cents: i64,
    pub remaining_amount_cents: i64,
    pub status: PaymentStatus,
    pub method: PaymentMethod,

    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    pub fn paid_amount(&self) -> Money {
        Money::from_cents(self.paid_amount_cents)
    }

    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    pub fn remaining_amount(&self) -> Money {
        Money::from_cents(self.remaining_amount_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub customer_id: String,
    #[serde(default)]
    pub recorded_by: Option<String>,
    pub total_price: Money,
    pub paid_amount: Money,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub method: PaymentMethod,
    /// Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentPatch {
    #[serde(default)]
    pub total_price: Option<Money>,
    #[serde(default)]
    pub paid_amount: Option<Money>,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Waste
// =============================================================================

/// Waste for one chicken type on one day.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyWaste {
    pub id: String,
    pub tenant_id: String,
    #[ts(as = "String")]
    pub waste_date: NaiveDate,
    pub chicken_type_id: String,

    /// Delivered beyond tracked supply.
    pub over_distribution_quantity: i64,
    pub over_distribution_net_weight_grams: i64,
    /// Dead, rejected or otherwise lost birds, entered by an operator.
    pub other_waste_quantity: i64,
    pub other_waste_net_weight_grams: i64,

    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl DailyWaste {
    pub fn total_waste_quantity(&self) -> i64 {
        self.over_distribution_quantity + self.other_waste_quantity
    }

    pub fn total_waste_net_weight(&self) -> Weight {
        Weight::from_grams(self.over_distribution_net_weight_grams + self.other_waste_net_weight_grams)
    }
}

/// Operator entry that replaces a day's waste row for one chicken type.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WasteEntry {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub chicken_type: ChickenTypeRef,
    #[serde(default)]
    pub over_distribution_quantity: i64,
    #[serde(default)]
    pub over_distribution_net_weight: Weight,
    #[serde(default)]
    pub other_waste_quantity: i64,
    #[serde(default)]
    pub other_waste_net_weight: Weight,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Daily Stock
// =============================================================================

/// Persisted per-day reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyStock {
    pub id: String,
    pub tenant_id: String,
    #[ts(as = "String")]
    pub stock_date: NaiveDate,
    pub net_loading_weight_grams: i64,
    pub net_distribution_weight_grams: i64,
    pub admin_adjustment_grams: i64,
    pub result_grams: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl DailyStock {
    pub fn result(&self) -> Weight {
        Weight::from_grams(self.result_grams)
    }
}

/// Stock reconciliation for a day, computed fresh from the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSnapshot {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub net_loading_weight: Weight,
    pub net_distribution_weight: Weight,
    pub admin_adjustment: Weight,
    pub result: Weight,
    pub notes: Option<String>,
    /// Whether an operator has saved a snapshot for this day.
    pub persisted: bool,
}

// =============================================================================
// Staff Cash
// =============================================================================

/// Money a staff member spent out of collected cash.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct EmployeeExpense {
    pub id: String,
    pub tenant_id: String,
    pub employee_id: String,
    pub name: String,
    pub value_cents: i64,
    #[ts(as = "String")]
    pub expense_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl EmployeeExpense {
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    pub employee_id: String,
    pub name: String,
    pub value: Money,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expense_date: Option<DateTime<Utc>>,
}

/// Cash handed from one staff member to another.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transfer {
    pub id: String,
    pub tenant_id: String,
    pub from_employee_id: String,
    pub to_employee_id: String,
    pub amount_cents: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub transfer_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransfer {
    pub from_employee_id: String,
    pub to_employee_id: String,
    pub amount: Money,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub transfer_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Reports
// =============================================================================

/// Profit for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyProfit {
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub breakdown: ProfitBreakdown,
}

/// The terms of the profit formula.
///
/// ```text
/// profit = revenue − loading_cost − expenses − discounts − waste_cost
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitBreakdown {
    pub revenue: Money,
    pub loading_cost: Money,
    pub expenses: Money,
    pub discounts: Money,
    pub waste_cost: Money,
    pub profit: Money,
}

/// Profit over a range (or all time) with its per-day rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitHistory {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
    pub total: ProfitBreakdown,
    pub days: Vec<DailyProfit>,
}

/// Aggregates over a set of loadings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoadingStats {
    pub count: i64,
    pub total_quantity: i64,
    pub total_net_weight: Weight,
    pub total_cost: Money,
    /// Mean of the per-kilogram purchase price, truncated.
    pub average_unit_price: Money,
}

/// Net weight delivered on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyNetWeight {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_net_weight: Weight,
    pub count: i64,
}

/// Payments collected by one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeCollection {
    /// `None` groups payments recorded without a staff member.
    pub employee_id: Option<String>,
    pub total_paid: Money,
    pub payment_count: i64,
}

/// Waste rows for one day with their totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WasteDay {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub entries: Vec<DailyWaste>,
    pub total_quantity: i64,
    pub total_net_weight: Weight,
}

/// Waste over a range, grouped both ways.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WasteSummary {
    pub range: DateRange,
    pub by_chicken_type: Vec<ChickenTypeWaste>,
    /// Newest day first.
    pub by_day: Vec<WasteDayTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChickenTypeWaste {
    pub chicken_type_id: String,
    pub chicken_type_name: String,
    pub total_quantity: i64,
    pub total_net_weight: Weight,
    pub days: Vec<WasteDayTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WasteDayTotal {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_quantity: i64,
    pub total_net_weight: Weight,
}

/// A staff member's cash on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashPosition {
    pub employee_id: String,
    pub collected: Money,
    pub expenses: Money,
    pub transfers_in: Money,
    pub transfers_out: Money,
    pub available: Money,
}

/// Transfers sent and received by one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferSummary {
    pub employee_id: String,
    pub total_in: Money,
    pub total_out: Money,
    pub count_in: i64,
    pub count_out: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chicken_type_ref_serialization() {
        let by_name = ChickenTypeRef::name("Broiler");
        let json = serde_json::to_string(&by_name).unwrap();
        assert_eq!(json, r#"{"by":"by_name","value":"Broiler"}"#);

        let parsed: ChickenTypeRef = serde_json::from_str(r#"{"by":"by_id","value":"ct-1"}"#).unwrap();
        assert_eq!(parsed, ChickenTypeRef::id("ct-1"));
    }

    #[test]
    fn test_loading_weight_serialization() {
        let parsed: LoadingWeight = serde_json::from_str(r#"{"kind":"gross","grams":500000}"#).unwrap();
        assert_eq!(parsed, LoadingWeight::Gross(Weight::from_kg(500)));
    }

    #[test]
    fn test_new_payment_defaults() {
        let parsed: NewPayment = serde_json::from_str(
            r#"{"customer_id":"c-1","total_price":1200,"paid_amount":1000}"#,
        )
        .unwrap();
        assert!(parsed.discount.is_zero());
        assert_eq!(parsed.method, PaymentMethod::Cash);
        assert!(parsed.payment_date.is_none());
    }

    #[test]
    fn test_waste_totals() {
        let now = Utc::now();
        let waste = DailyWaste {
            id: "w".into(),
            tenant_id: "t".into(),
            waste_date: now.date_naive(),
            chicken_type_id: "ct".into(),
            over_distribution_quantity: 80,
            over_distribution_net_weight_grams: 160_000,
            other_waste_quantity: 2,
            other_waste_net_weight_grams: 4_500,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(waste.total_waste_quantity(), 82);
        assert_eq!(waste.total_waste_net_weight(), Weight::from_grams(164_500));
    }
}
