//! # Distribution Settlement Planning
//!
//! Decides which loading batch a distribution draws from, how much it
//! draws, and how much of the request no batch can cover.
//!
//! ## Create Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Eligible batches: same chicken type, loaded on or before the target   │
//! │  day, remaining_quantity > 0 (earlier days carry forward)              │
//! │                                                                         │
//! │   B1 remaining 40    B2 remaining 70    B3 remaining 12                │
//! │                          ▲                                             │
//! │                          └── source: largest remaining                 │
//! │                              (ties: earliest loading_date, then id)    │
//! │                                                                         │
//! │  allocated = min(requested, source.remaining)                          │
//! │  shortage  = max(0, requested − Σ remaining of ALL eligible)           │
//! │                                                                         │
//! │  Shortage never blocks the distribution. It is booked as waste.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update Path
//! Growth must come out of the same source batch. Shrinking gives stock
//! back to it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::weight::Weight;

/// What one batch can still supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAvailability {
    pub loading_id: String,
    pub loading_date: DateTime<Utc>,
    pub remaining_quantity: i64,
    pub remaining_net_weight: Weight,
}

/// Outcome of planning a new distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationPlan {
    /// Chosen batch, `None` when nothing is eligible.
    pub source: Option<String>,
    pub allocated_quantity: i64,
    pub allocated_net_weight: Weight,
    pub total_available_quantity: i64,
    pub total_available_net_weight: Weight,
    pub shortage_quantity: i64,
    pub shortage_net_weight: Weight,
}

impl AllocationPlan {
    pub fn has_shortage(&self) -> bool {
        self.shortage_quantity > 0 || self.shortage_net_weight > Weight::zero()
    }
}

/// Plans a new distribution against the eligible batches.
///
/// Batches with `remaining_quantity <= 0` are ignored.
pub fn plan_allocation(
    batches: &[BatchAvailability],
    quantity: i64,
    net_weight: Weight,
) -> AllocationPlan {
    let eligible: Vec<&BatchAvailability> =
        batches.iter().filter(|b| b.remaining_quantity > 0).collect();

    let total_available_quantity: i64 = eligible.iter().map(|b| b.remaining_quantity).sum();
    let total_available_net_weight: Weight = eligible
        .iter()
        .map(|b| b.remaining_net_weight.floor_zero())
        .sum();

    let source = eligible.iter().copied().max_by(|a, b| {
        a.remaining_quantity
            .cmp(&b.remaining_quantity)
            // max_by keeps the last maximum, so reverse the tie-breaks
            .then_with(|| b.loading_date.cmp(&a.loading_date))
            .then_with(|| b.loading_id.cmp(&a.loading_id))
    });

    let (allocated_quantity, allocated_net_weight) = match source {
        Some(batch) => (
            quantity.min(batch.remaining_quantity.max(0)),
            net_weight.min(batch.remaining_net_weight.floor_zero()),
        ),
        None => (0, Weight::zero()),
    };

    AllocationPlan {
        source: source.map(|b| b.loading_id.clone()),
        allocated_quantity,
        allocated_net_weight,
        total_available_quantity,
        total_available_net_weight,
        shortage_quantity: (quantity - total_available_quantity).max(0),
        shortage_net_weight: (net_weight - total_available_net_weight).floor_zero(),
    }
}

// =============================================================================
// Reallocation
// =============================================================================

/// A distribution's current draw on its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAllocation {
    pub allocated_quantity: i64,
    pub allocated_net_weight: Weight,
    pub shortage_quantity: i64,
    pub shortage_net_weight: Weight,
}

/// The source batch's spare stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRemaining {
    pub quantity: i64,
    pub net_weight: Weight,
}

/// New draw of an updated distribution, and the change to apply to its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reallocation {
    pub allocated_quantity: i64,
    pub allocated_net_weight: Weight,
    pub shortage_quantity: i64,
    pub shortage_net_weight: Weight,
    pub delta_quantity: i64,
    pub delta_net_weight: Weight,
}

/// Re-plans a distribution whose quantity or weight changed.
///
/// ## Rules (per dimension)
/// - Shrinking releases stock back to the batch, allocation first.
/// - Growing draws the extra from the batch; the recorded shortage stays.
/// - Growing past `allocated + remaining` fails with
///   [`CoreError::InsufficientInventory`]. A distribution with no source
///   batch cannot grow.
pub fn plan_reallocation(
    loading_id: Option<&str>,
    current: CurrentAllocation,
    remaining: Option<BatchRemaining>,
    new_quantity: i64,
    new_net_weight: Weight,
) -> CoreResult<Reallocation> {
    let spare = remaining.unwrap_or(BatchRemaining {
        quantity: 0,
        net_weight: Weight::zero(),
    });
    let source = loading_id.unwrap_or("none");

    let (allocated_quantity, shortage_quantity) = reallocate(
        source,
        "quantity",
        current.allocated_quantity,
        current.shortage_quantity,
        spare.quantity.max(0),
        new_quantity,
    )?;
    let (allocated_grams, shortage_grams) = reallocate(
        source,
        "net weight",
        current.allocated_net_weight.grams(),
        current.shortage_net_weight.grams(),
        spare.net_weight.floor_zero().grams(),
        new_net_weight.grams(),
    )?;

    Ok(Reallocation {
        allocated_quantity,
        allocated_net_weight: Weight::from_grams(allocated_grams),
        shortage_quantity,
        shortage_net_weight: Weight::from_grams(shortage_grams),
        delta_quantity: allocated_quantity - current.allocated_quantity,
        delta_net_weight: Weight::from_grams(allocated_grams - current.allocated_net_weight.grams()),
    })
}

fn reallocate(
    loading_id: &str,
    dimension: &str,
    allocated: i64,
    shortage: i64,
    spare: i64,
    requested: i64,
) -> CoreResult<(i64, i64)> {
    let previous = allocated + shortage;
    if requested <= previous {
        let kept = allocated.min(requested);
        return Ok((kept, requested - kept));
    }

    let extra = requested - previous;
    if extra > spare {
        return Err(CoreError::InsufficientInventory {
            loading_id: loading_id.to_string(),
            dimension: dimension.to_string(),
            available: allocated + spare,
            requested: allocated + extra,
        });
    }
    Ok((allocated + extra, shortage))
}

// =============================================================================
// Batch Counters
// =============================================================================

/// Running counters of one loading batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchCounters {
    pub quantity: i64,
    pub net_weight: Weight,
    pub distributed_quantity: i64,
    pub distributed_net_weight: Weight,
}

impl BatchCounters {
    /// Fresh counters for a new intake.
    pub fn new(quantity: i64, net_weight: Weight) -> Self {
        BatchCounters {
            quantity,
            net_weight,
            distributed_quantity: 0,
            distributed_net_weight: Weight::zero(),
        }
    }

    pub fn remaining_quantity(&self) -> i64 {
        (self.quantity - self.distributed_quantity).max(0)
    }

    pub fn remaining_net_weight(&self) -> Weight {
        (self.net_weight - self.distributed_net_weight).floor_zero()
    }

    /// Applies a draw (positive) or a release (negative). Distributed
    /// counters floor at zero.
    pub fn consume(self, quantity: i64, net_weight: Weight) -> Self {
        BatchCounters {
            distributed_quantity: (self.distributed_quantity + quantity).max(0),
            distributed_net_weight: (self.distributed_net_weight + net_weight).floor_zero(),
            ..self
        }
    }

    /// Replaces the intake size, refusing to drop below what is already out.
    pub fn resize(self, quantity: i64, net_weight: Weight) -> CoreResult<Self> {
        if quantity < self.distributed_quantity {
            return Err(ValidationError::BelowDistributed {
                field: "quantity".to_string(),
                distributed: self.distributed_quantity,
            }
            .into());
        }
        if net_weight < self.distributed_net_weight {
            return Err(ValidationError::BelowDistributed {
                field: "net_weight".to_string(),
                distributed: self.distributed_net_weight.grams(),
            }
            .into());
        }
        Ok(BatchCounters {
            quantity,
            net_weight,
            ..self
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn batch(id: &str, day: u32, qty: i64, kg: i64) -> BatchAvailability {
        BatchAvailability {
            loading_id: id.to_string(),
            loading_date: Utc.with_ymd_and_hms(2026, 3, day, 6, 0, 0).unwrap(),
            remaining_quantity: qty,
            remaining_net_weight: Weight::from_kg(kg),
        }
    }

    #[test]
    fn test_picks_largest_remaining() {
        let batches = vec![batch("a", 1, 40, 200), batch("b", 2, 70, 440), batch("c", 3, 12, 60)];
        let plan = plan_allocation(&batches, 30, Weight::from_kg(60));

        assert_eq!(plan.source.as_deref(), Some("b"));
        assert_eq!(plan.allocated_quantity, 30);
        assert_eq!(plan.allocated_net_weight, Weight::from_kg(60));
        assert_eq!(plan.total_available_quantity, 122);
        assert!(!plan.has_shortage());
    }

    #[test]
    fn test_tie_breaks_on_earliest_date_then_id() {
        let batches = vec![batch("z", 3, 50, 100), batch("y", 1, 50, 100), batch("x", 1, 50, 100)];
        let plan = plan_allocation(&batches, 10, Weight::from_kg(10));
        assert_eq!(plan.source.as_deref(), Some("x"));
    }

    #[test]
    fn test_over_request_is_capped_and_short() {
        let batches = vec![batch("only", 1, 70, 440)];
        let plan = plan_allocation(&batches, 150, Weight::from_kg(600));

        assert_eq!(plan.allocated_quantity, 70);
        assert_eq!(plan.allocated_net_weight, Weight::from_kg(440));
        assert_eq!(plan.shortage_quantity, 80);
        assert_eq!(plan.shortage_net_weight, Weight::from_kg(160));
    }

    #[test]
    fn test_shortage_uses_all_eligible_batches() {
        let batches = vec![batch("a", 1, 70, 300), batch("b", 1, 50, 200)];
        let plan = plan_allocation(&batches, 150, Weight::from_kg(400));

        // allocation comes from one batch only
        assert_eq!(plan.source.as_deref(), Some("a"));
        assert_eq!(plan.allocated_quantity, 70);
        assert_eq!(plan.shortage_quantity, 30);
        assert_eq!(plan.shortage_net_weight, Weight::zero());
    }

    #[test]
    fn test_no_eligible_batch() {
        let batches = vec![batch("empty", 1, 0, 0)];
        let plan = plan_allocation(&batches, 5, Weight::from_kg(10));

        assert_eq!(plan.source, None);
        assert_eq!(plan.allocated_quantity, 0);
        assert_eq!(plan.shortage_quantity, 5);
        assert_eq!(plan.shortage_net_weight, Weight::from_kg(10));
    }

    #[test]
    fn test_replaying_draws_matches_counters() {
        let mut counters = BatchCounters::new(100, Weight::from_kg(500));
        let mut expected_drawn = 0;
        for requested in [30_i64, 25, 40, 20] {
            let available = counters.remaining_quantity();
            let batches = vec![BatchAvailability {
                loading_id: "b".into(),
                loading_date: Utc::now(),
                remaining_quantity: available,
                remaining_net_weight: counters.remaining_net_weight(),
            }];
            let plan = plan_allocation(&batches, requested, Weight::from_kg(requested * 2));
            counters = counters.consume(plan.allocated_quantity, plan.allocated_net_weight);
            expected_drawn += requested.min(available);
        }
        assert_eq!(counters.remaining_quantity(), 100 - expected_drawn);
        assert_eq!(counters.remaining_quantity(), 0);
    }

    #[test]
    fn test_reallocation_growth_within_headroom() {
        let current = CurrentAllocation {
            allocated_quantity: 30,
            allocated_net_weight: Weight::from_kg(60),
            shortage_quantity: 0,
            shortage_net_weight: Weight::zero(),
        };
        let spare = BatchRemaining {
            quantity: 70,
            net_weight: Weight::from_kg(440),
        };
        let r = plan_reallocation(Some("b"), current, Some(spare), 40, Weight::from_kg(80)).unwrap();
        assert_eq!(r.allocated_quantity, 40);
        assert_eq!(r.delta_quantity, 10);
        assert_eq!(r.delta_net_weight, Weight::from_kg(20));
    }

    #[test]
    fn test_reallocation_growth_past_headroom_fails() {
        let current = CurrentAllocation {
            allocated_quantity: 30,
            allocated_net_weight: Weight::from_kg(60),
            shortage_quantity: 0,
            shortage_net_weight: Weight::zero(),
        };
        let spare = BatchRemaining {
            quantity: 10,
            net_weight: Weight::from_kg(440),
        };
        let err = plan_reallocation(Some("b"), current, Some(spare), 50, Weight::from_kg(60)).unwrap_err();
        match err {
            CoreError::InsufficientInventory {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 40);
                assert_eq!(requested, 50);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reallocation_keeps_shortage_on_unchanged_request() {
        let current = CurrentAllocation {
            allocated_quantity: 70,
            allocated_net_weight: Weight::from_kg(440),
            shortage_quantity: 80,
            shortage_net_weight: Weight::from_kg(160),
        };
        let spare = BatchRemaining {
            quantity: 0,
            net_weight: Weight::zero(),
        };
        let r = plan_reallocation(Some("b"), current, Some(spare), 150, Weight::from_kg(600)).unwrap();
        assert_eq!(r.delta_quantity, 0);
        assert_eq!(r.shortage_quantity, 80);

        // shrinking releases allocation
        let r = plan_reallocation(Some("b"), current, Some(spare), 50, Weight::from_kg(100)).unwrap();
        assert_eq!(r.allocated_quantity, 50);
        assert_eq!(r.shortage_quantity, 0);
        assert_eq!(r.delta_quantity, -20);
        assert_eq!(r.delta_net_weight, Weight::from_kg(-340));
    }

    #[test]
    fn test_counters_floor_and_resize() {
        let counters = BatchCounters::new(100, Weight::from_kg(500)).consume(30, Weight::from_kg(60));
        assert_eq!(counters.remaining_quantity(), 70);
        assert_eq!(counters.remaining_net_weight(), Weight::from_kg(440));

        let released = counters.consume(-50, Weight::from_kg(-100));
        assert_eq!(released.distributed_quantity, 0);
        assert_eq!(released.distributed_net_weight, Weight::zero());

        let err = counters.resize(29, Weight::from_kg(500)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::BelowDistributed { distributed: 30, .. })
        ));
        assert_eq!(err.to_string(), "Validation error: quantity cannot drop below the 30 already distributed");

        let err = counters.resize(100, Weight::from_kg(59)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::BelowDistributed { distributed: 60_000, .. })
        ));
        let resized = counters.resize(40, Weight::from_kg(100)).unwrap();
        assert_eq!(resized.remaining_quantity(), 10);
    }
}
