//! # Repository Module
//!
//! Database repository implementations for the Roost ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ledger Writes                                        │
//! │                                                                         │
//! │  db.distributions().create(input)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │  ├── resolve customer + chicken type                                   │
//! │  ├── read eligible batches, plan allocation   (roost-core)             │
//! │  ├── INSERT distribution                                               │
//! │  ├── UPDATE loading ... WHERE version = ?     (optimistic check)       │
//! │  └── recompute customer outstanding debt      (roost-core)             │
//! │  COMMIT                                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shortage? → waste upsert (best effort, after commit)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository carries the tenant it was created for, and every
//! statement filters on it. Helpers that must join a caller's transaction
//! take `&mut SqliteConnection`.
//!
//! ## Available Repositories
//!
//! - [`customer::CustomerRepository`] - Customers and their debt cache
//! - [`directory`] - Suppliers, chicken types, employees
//! - [`loading::LoadingRepository`] - Stock intake batches
//! - [`distribution::DistributionRepository`] - Stock outflow and settlement
//! - [`payment::PaymentRepository`] - Customer payments
//! - [`waste::WasteRepository`] - Daily waste per chicken type
//! - [`stock::StockRepository`] - Daily stock snapshots
//! - [`report::ReportRepository`] - Profit reports
//! - [`expense::ExpenseRepository`] - Staff expenses
//! - [`transfer::TransferRepository`] - Staff cash transfers

pub mod customer;
pub mod directory;
pub mod distribution;
pub mod expense;
pub mod loading;
pub mod payment;
pub mod report;
pub mod stock;
pub mod transfer;
pub mod waste;

use uuid::Uuid;

/// Generates a new record ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
