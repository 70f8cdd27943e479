//! # roost-core: Pure Business Logic for Roost
//!
//! Ledger arithmetic and settlement rules for a poultry wholesale business.
//! Everything here is a pure function over values; persistence and
//! transactions live in `roost-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Roost Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Callers (report CLI, back office)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ roost-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐   │   │
//! │  │  │ calculator │ │ settlement │ │   ledger   │ │ reporting  │   │   │
//! │  │  │ net weight │ │ batch pick │ │ payments   │ │ profit     │   │   │
//! │  │  │ amounts    │ │ shortage   │ │ debt, cash │ │ stock      │   │   │
//! │  │  └────────────┘ └────────────┘ └────────────┘ └────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    roost-db (Database Layer)                    │   │
//! │  │         SQLite repositories, transactions, migrations          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Ledger entities, inputs and report shapes
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`weight`] - Weight type in whole grams
//! - [`calculator`] - Empty weight, net weight and amount derivation
//! - [`settlement`] - Source batch selection and shortage detection
//! - [`ledger`] - Payment settlement, debt projection, staff cash checks
//! - [`reporting`] - Profit and stock reconciliation formulas
//! - [`period`] - Calendar-day windows
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use roost_core::calculator::compute_distribution_values;
//! use roost_core::{Money, Weight};
//!
//! // 30 birds, 300 kg on the scale, sold at 20 per kg
//! let values = compute_distribution_values(30, Weight::from_kg(300), Money::from_cents(20)).unwrap();
//!
//! assert_eq!(values.empty_weight, Weight::from_kg(240));
//! assert_eq!(values.net_weight, Weight::from_kg(60));
//! assert_eq!(values.total_amount.cents(), 1200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod error;
pub mod ledger;
pub mod money;
pub mod period;
pub mod reporting;
pub mod settlement;
pub mod types;
pub mod validation;
pub mod weight;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use ledger::DebtEntry;
pub use money::Money;
pub use period::DateRange;
pub use types::*;
pub use weight::Weight;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID used when no tenant is configured.
///
/// Every table carries `tenant_id`; single-business deployments run
/// entirely under this id.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Packaging (crate) weight deducted per bird.
///
/// ```text
/// empty_weight = quantity × 8 kg
/// ```
pub const PACKAGING_WEIGHT_PER_UNIT: Weight = Weight::from_kg(8);

/// Upper bound on birds in a single loading or distribution.
///
/// Catches typing mistakes (an extra zero) before they reach the ledger.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Upper bound on a single weight reading: 1 000 tonnes, in grams.
pub const MAX_WEIGHT_GRAMS: i64 = 1_000_000_000;

/// Upper bound on a single price or amount, in minor units.
///
/// With [`MAX_WEIGHT_GRAMS`], every `weight × price` product fits an `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;
