//! # Customer & Cash Ledger Rules
//!
//! ## Payment Settlement
//! ```text
//! remaining = max(0, total_price − paid_amount − discount)
//! status    = remaining == 0 ? Completed : Partial
//! ```
//!
//! ## Debt Journal
//! Every write that moves a customer's balance appends one entry. The
//! cached `outstanding_debts` is the journal replayed from zero, floored at
//! zero after each step:
//!
//! ```text
//!   distribution create   Adjust(+total)
//!   distribution update   Adjust(new total − old total)
//!   distribution delete   Adjust(−total)
//!   payment create/update Restate(remaining)
//!   payment delete        Restate(previous payment's remaining, or 0)
//!
//!   D 1200 ── P rem 200 ── D 300 ── delete first D
//!   1200      200          500      0
//! ```
//!
//! ## Staff Cash
//! ```text
//! available = collected − expenses + transfers_in − transfers_out
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CashPosition, PaymentStatus};
use crate::validation::{validate_amount, validate_positive_amount};

/// Derived fields of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentSettlement {
    pub remaining: Money,
    pub status: PaymentStatus,
}

/// Settles a payment's remainder and status.
///
/// ```rust
/// use roost_core::ledger::settle_payment;
/// use roost_core::{Money, PaymentStatus};
///
/// let s = settle_payment(Money::from_cents(1200), Money::from_cents(1000), Money::zero()).unwrap();
/// assert_eq!(s.remaining.cents(), 200);
/// assert_eq!(s.status, PaymentStatus::Partial);
/// ```
pub fn settle_payment(
    total_price: Money,
    paid_amount: Money,
    discount: Money,
) -> CoreResult<PaymentSettlement> {
    validate_amount("total_price", total_price)?;
    validate_amount("paid_amount", paid_amount)?;
    validate_amount("discount", discount)?;

    let remaining = (total_price - paid_amount - discount).floor_zero();
    let status = if remaining.is_zero() {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Partial
    };

    Ok(PaymentSettlement { remaining, status })
}

/// One movement of a customer's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
#[ts(export)]
pub enum DebtEntry {
    /// Adds a signed amount.
    Adjust(Money),
    /// Replaces the balance outright.
    Restate(Money),
}

impl DebtEntry {
    /// Stored `kind` column value.
    pub fn kind(&self) -> &'static str {
        match self {
            DebtEntry::Adjust(_) => "adjust",
            DebtEntry::Restate(_) => "restate",
        }
    }

    pub fn amount(&self) -> Money {
        match self {
            DebtEntry::Adjust(amount) | DebtEntry::Restate(amount) => *amount,
        }
    }

    /// Rebuilds an entry from its stored columns.
    pub fn from_parts(kind: &str, amount: Money) -> CoreResult<Self> {
        match kind {
            "adjust" => Ok(DebtEntry::Adjust(amount)),
            "restate" => Ok(DebtEntry::Restate(amount)),
            other => Err(ValidationError::InvalidFormat {
                field: "kind".to_string(),
                reason: format!("unknown debt entry kind '{other}'"),
            }
            .into()),
        }
    }

    /// Applies this entry to a balance. The result is never negative.
    pub fn apply(self, balance: Money) -> Money {
        match self {
            DebtEntry::Adjust(delta) => (balance + delta).floor_zero(),
            DebtEntry::Restate(amount) => amount.floor_zero(),
        }
    }
}

/// Replays a customer's journal, oldest entry first.
pub fn replay_debt(entries: impl IntoIterator<Item = DebtEntry>) -> Money {
    entries
        .into_iter()
        .fold(Money::zero(), |balance, entry| entry.apply(balance))
}

/// Builds a staff member's cash position from its four totals.
pub fn cash_position(
    employee_id: impl Into<String>,
    collected: Money,
    expenses: Money,
    transfers_in: Money,
    transfers_out: Money,
) -> CashPosition {
    CashPosition {
        employee_id: employee_id.into(),
        collected,
        expenses,
        transfers_in,
        transfers_out,
        available: collected - expenses + transfers_in - transfers_out,
    }
}

/// Checks that a sender can hand over `amount`.
pub fn check_transfer(position: &CashPosition, amount: Money) -> CoreResult<()> {
    validate_positive_amount("amount", amount)?;
    if position.available < amount {
        return Err(CoreError::InsufficientFunds {
            employee_id: position.employee_id.clone(),
            available: position.available.cents(),
            requested: amount.cents(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_settle_partial_and_completed() {
        let s = settle_payment(m(1200), m(1000), m(0)).unwrap();
        assert_eq!(s.remaining, m(200));
        assert_eq!(s.status, PaymentStatus::Partial);

        let s = settle_payment(m(1200), m(1000), m(200)).unwrap();
        assert!(s.remaining.is_zero());
        assert_eq!(s.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_overpayment_clamps_to_zero() {
        let s = settle_payment(m(1000), m(1500), m(0)).unwrap();
        assert!(s.remaining.is_zero());
        assert_eq!(s.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_settle_rejects_negative() {
        assert!(settle_payment(m(-1), m(0), m(0)).is_err());
        assert!(settle_payment(m(10), m(-1), m(0)).is_err());
        assert!(settle_payment(m(10), m(0), m(-1)).is_err());
    }

    #[test]
    fn test_payment_restates_and_distributions_adjust() {
        use DebtEntry::*;

        assert_eq!(replay_debt(Vec::new()), Money::zero());
        assert_eq!(replay_debt([Adjust(m(1200))]), m(1200));
        assert_eq!(replay_debt([Adjust(m(1200)), Restate(m(200))]), m(200));
        assert_eq!(
            replay_debt([Adjust(m(1200)), Restate(m(200)), Adjust(m(300)), Adjust(m(150))]),
            m(650)
        );
    }

    #[test]
    fn test_deleting_the_only_payment_clears_the_balance() {
        use DebtEntry::*;
        // D 1200, P rem 200, P deleted with nothing left to fall back on
        assert_eq!(replay_debt([Adjust(m(1200)), Restate(m(200)), Restate(m(0))]), Money::zero());
    }

    #[test]
    fn test_reversal_before_last_payment_still_counts() {
        use DebtEntry::*;
        // D1 1200, P rem 200, D2 1200, delete D1, re-create D1
        let before = [Adjust(m(1200)), Restate(m(200)), Adjust(m(1200))];
        assert_eq!(replay_debt(before), m(1400));

        let deleted = [Adjust(m(1200)), Restate(m(200)), Adjust(m(1200)), Adjust(m(-1200))];
        assert_eq!(replay_debt(deleted), m(200));

        let recreated = [
            Adjust(m(1200)),
            Restate(m(200)),
            Adjust(m(1200)),
            Adjust(m(-1200)),
            Adjust(m(1200)),
        ];
        assert_eq!(replay_debt(recreated), m(1400));
    }

    #[test]
    fn test_balance_never_negative() {
        use DebtEntry::*;
        assert_eq!(Adjust(m(-500)).apply(m(200)), Money::zero());
        assert_eq!(Restate(m(-5)).apply(m(200)), Money::zero());
        assert_eq!(replay_debt([Adjust(m(-1)), Adjust(m(3))]), m(3));
    }

    #[test]
    fn test_entry_columns() {
        let entry = DebtEntry::Adjust(m(-1200));
        assert_eq!(entry.kind(), "adjust");
        assert_eq!(DebtEntry::from_parts(entry.kind(), entry.amount()).unwrap(), entry);
        assert_eq!(DebtEntry::from_parts("restate", m(7)).unwrap(), DebtEntry::Restate(m(7)));
        assert!(DebtEntry::from_parts("bogus", m(7)).is_err());
    }

    #[test]
    fn test_cash_check() {
        let position = cash_position("e-1", m(10_000), m(1_500), m(500), m(2_000));
        assert_eq!(position.available, m(7_000));

        assert!(check_transfer(&position, m(7_000)).is_ok());
        let err = check_transfer(&position, m(7_001)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientFunds { available: 7_000, .. }));
        assert!(check_transfer(&position, m(0)).is_err());
    }
}
