//! # roost-db: Database Layer for Roost
//!
//! Persistence and transactional settlement for the Roost stock ledger.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Roost Data Flow                                  │
//! │                                                                         │
//! │  Caller (report CLI, service)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     roost-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ Loading, Distrib., │  │ (embedded) │  │   │
//! │  │   │ SqlitePool    │    │ Payment, Waste,    │  │ 001_init   │  │   │
//! │  │   │ tenant scope  │    │ Stock, Report, ... │  │            │  │   │
//! │  │   └───────────────┘    └─────────┬──────────┘  └────────────┘  │   │
//! │  │                                  │ ledger rules                 │   │
//! │  │                                  ▼                              │   │
//! │  │                          roost-core (pure)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, configuration and tenant scope
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roost_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/roost.db")).await?;
//!
//! let loading = db.loadings().create(new_loading).await?;
//! let distribution = db.distributions().create(new_distribution).await?;
//! let profit = db.reports().daily_profit(today).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::directory::{ChickenTypeRepository, EmployeeRepository, SupplierRepository};
pub use repository::distribution::DistributionRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::loading::LoadingRepository;
pub use repository::payment::PaymentRepository;
pub use repository::report::ReportRepository;
pub use repository::stock::StockRepository;
pub use repository::transfer::TransferRepository;
pub use repository::waste::WasteRepository;
