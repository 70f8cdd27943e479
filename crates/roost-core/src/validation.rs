//! # Validation Module
//!
//! Input rules checked before any ledger rule runs.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Deserialization (serde)                                      │
//! │  └── Shapes, integer types (no NaN or infinity can exist)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── quantity ≥ 1, weights and prices ≥ 0                              │
//! │  └── names, ids, distinct parties                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK constraints on counters                                     │
//! │  └── UNIQUE / FOREIGN KEY constraints                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::weight::Weight;
use crate::{MAX_AMOUNT_CENTS, MAX_QUANTITY, MAX_WEIGHT_GRAMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (customer, supplier, chicken type, expense).
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a record id.
///
/// ```rust
/// use roost_core::validation::validate_id;
///
/// assert!(validate_id("customer_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("customer_id", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a bird count.
///
/// ## Rules
/// - At least 1
/// - At most [`MAX_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a waste count, where zero is meaningful.
pub fn validate_count(field: &str, count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Weights are never negative, and at most [`MAX_WEIGHT_GRAMS`].
pub fn validate_weight(field: &str, weight: Weight) -> ValidationResult<()> {
    if weight.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if weight.grams() > MAX_WEIGHT_GRAMS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_WEIGHT_GRAMS,
        });
    }
    Ok(())
}

/// Prices and amounts are never negative, and at most [`MAX_AMOUNT_CENTS`].
/// Zero is allowed.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Cash movements must move something.
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// A transfer needs two different staff members.
pub fn validate_distinct_parties(from: &str, to: &str) -> ValidationResult<()> {
    if from == to {
        return Err(ValidationError::MustDiffer {
            field: "to_employee_id".to_string(),
            other: "from_employee_id".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
