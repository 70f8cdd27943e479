//! # Weight & Amount Calculator
//!
//! Derives the weighed fields of loadings and distributions. Called at the
//! top of every create and update, so stored values always equal the
//! formula applied to the stored inputs.
//!
//! ```text
//!   quantity ──► empty_weight = quantity × 8 kg
//!                     │
//!   gross ────────────┴──► net_weight = max(0, gross − empty)
//!   (or net, typed in) ──► net_weight = net
//!                                │
//!   unit_price (per kg) ─────────┴──► total = net_weight × unit_price
//! ```

use serde::Serialize;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::LoadingWeight;
use crate::validation::{validate_amount, validate_quantity, validate_weight};
use crate::weight::Weight;
use crate::{MAX_AMOUNT_CENTS, PACKAGING_WEIGHT_PER_UNIT};

/// Derived weights and amount of one loading or distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeighedValues {
    pub empty_weight: Weight,
    pub net_weight: Weight,
    pub total_amount: Money,
}

/// Packaging weight for a count of birds.
pub fn empty_weight(quantity: i64) -> Weight {
    PACKAGING_WEIGHT_PER_UNIT * quantity
}

/// Derives loading values from a typed-in net weight or a gross reading.
///
/// A typed-in net weight is used as-is, even when it exceeds what a gross
/// reading would have allowed.
///
/// ```rust
/// use roost_core::calculator::compute_loading_values;
/// use roost_core::{LoadingWeight, Money, Weight};
///
/// let v = compute_loading_values(100, LoadingWeight::Net(Weight::from_kg(500)), Money::from_cents(10)).unwrap();
/// assert_eq!(v.total_amount.cents(), 5000);
/// ```
pub fn compute_loading_values(
    quantity: i64,
    weight: LoadingWeight,
    unit_price: Money,
) -> CoreResult<WeighedValues> {
    validate_quantity(quantity)?;
    validate_amount("unit_price", unit_price)?;

    let empty = empty_weight(quantity);
    let net = match weight {
        LoadingWeight::Net(net) => {
            validate_weight("net_weight", net)?;
            net
        }
        LoadingWeight::Gross(gross) => {
            validate_weight("gross_weight", gross)?;
            (gross - empty).floor_zero()
        }
    };

    let total_amount = unit_price
        .checked_for_weight(net)
        .filter(|amount| amount.cents() <= MAX_AMOUNT_CENTS)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total_amount".to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        })?;

    Ok(WeighedValues {
        empty_weight: empty,
        net_weight: net,
        total_amount,
    })
}

/// Derives distribution values from a gross scale reading.
pub fn compute_distribution_values(
    quantity: i64,
    gross_weight: Weight,
    unit_price: Money,
) -> CoreResult<WeighedValues> {
    compute_loading_values(quantity, LoadingWeight::Gross(gross_weight), unit_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_loading_scenario() {
        let v = compute_loading_values(
            100,
            LoadingWeight::Net(Weight::from_kg(500)),
            Money::from_cents(10),
        )
        .unwrap();
        assert_eq!(v.empty_weight, Weight::from_kg(800));
        assert_eq!(v.net_weight, Weight::from_kg(500));
        assert_eq!(v.total_amount.cents(), 5000);
    }

    #[test]
    fn test_distribution_scenario() {
        let v = compute_distribution_values(30, Weight::from_kg(300), Money::from_cents(20)).unwrap();
        assert_eq!(v.empty_weight, Weight::from_kg(240));
        assert_eq!(v.net_weight, Weight::from_kg(60));
        assert_eq!(v.total_amount.cents(), 1200);
    }

    #[test]
    fn test_gross_below_packaging_clamps_to_zero() {
        let v = compute_distribution_values(10, Weight::from_kg(50), Money::from_cents(20)).unwrap();
        assert_eq!(v.net_weight, Weight::zero());
        assert!(v.total_amount.is_zero());
    }

    #[test]
    fn test_net_formula_holds_across_inputs() {
        for quantity in [1_i64, 7, 30, 250] {
            for gross_kg in [0_i64, 8, 100, 2_000] {
                for price in [0_i64, 1, 20, 975] {
                    let v = compute_distribution_values(
                        quantity,
                        Weight::from_kg(gross_kg),
                        Money::from_cents(price),
                    )
                    .unwrap();
                    let expected_net = (gross_kg - quantity * 8).max(0);
                    assert_eq!(v.net_weight, Weight::from_kg(expected_net));
                    assert_eq!(v.total_amount.cents(), expected_net * price);
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let err = compute_distribution_values(0, Weight::from_kg(10), Money::from_cents(1)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert!(compute_distribution_values(1, Weight::from_grams(-1), Money::from_cents(1)).is_err());
        assert!(compute_distribution_values(1, Weight::from_kg(10), Money::from_cents(-5)).is_err());
        assert!(compute_loading_values(1, LoadingWeight::Net(Weight::from_grams(-3)), Money::zero()).is_err());
    }

    #[test]
    fn test_huge_inputs_are_rejected_not_wrapped() {
        let err = compute_distribution_values(
            1,
            Weight::from_grams(9_000_000_000_000_000_000),
            Money::from_cents(1_000_000_000),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "gross_weight"
        ));

        // both inputs at their bounds: the product is still refused, never negative
        let err = compute_loading_values(
            1,
            LoadingWeight::Net(Weight::from_grams(crate::MAX_WEIGHT_GRAMS)),
            Money::from_cents(MAX_AMOUNT_CENTS),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "total_amount"
        ));
    }
}
