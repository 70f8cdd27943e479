//! # Daily Reporting Formulas
//!
//! ```text
//! stock result = (net loaded − net distributed) − admin adjustment
//!
//! profit = Σ distribution.total_amount
//!        − Σ loading.total_cost
//!        − Σ expense.value
//!        − Σ payment.discount
//!        − Σ waste.total_net_weight × chicken_type.price
//! ```
//! Every term is grouped by the UTC calendar day of its operational date.

use std::ops::Add;

use crate::money::Money;
use crate::types::{LoadingStats, ProfitBreakdown};
use crate::weight::Weight;

/// Stock result for a day.
pub fn stock_result(net_loading: Weight, net_distribution: Weight, admin_adjustment: Weight) -> Weight {
    (net_loading - net_distribution) - admin_adjustment
}

/// Prices waste rows at the current chicken type price.
///
/// Each item is `(total waste net weight, price per kg)`.
pub fn waste_cost(rows: impl IntoIterator<Item = (Weight, Money)>) -> Money {
    rows.into_iter()
        .map(|(weight, price)| price.for_weight(weight))
        .sum()
}

impl ProfitBreakdown {
    /// Assembles a breakdown and computes its profit.
    pub fn new(
        revenue: Money,
        loading_cost: Money,
        expenses: Money,
        discounts: Money,
        waste_cost: Money,
    ) -> Self {
        ProfitBreakdown {
            revenue,
            loading_cost,
            expenses,
            discounts,
            waste_cost,
            profit: revenue - loading_cost - expenses - discounts - waste_cost,
        }
    }
}

impl Add for ProfitBreakdown {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        ProfitBreakdown::new(
            self.revenue + other.revenue,
            self.loading_cost + other.loading_cost,
            self.expenses + other.expenses,
            self.discounts + other.discounts,
            self.waste_cost + other.waste_cost,
        )
    }
}

impl std::iter::Sum for ProfitBreakdown {
    fn sum<I: Iterator<Item = ProfitBreakdown>>(iter: I) -> Self {
        iter.fold(ProfitBreakdown::default(), |acc, b| acc + b)
    }
}

impl LoadingStats {
    /// Builds stats from raw sums. The average price truncates toward zero.
    pub fn from_totals(
        count: i64,
        total_quantity: i64,
        total_net_weight: Weight,
        total_cost: Money,
        sum_unit_price: Money,
    ) -> Self {
        let average_unit_price = if count > 0 {
            Money::from_cents(sum_unit_price.cents() / count)
        } else {
            Money::zero()
        };
        LoadingStats {
            count,
            total_quantity,
            total_net_weight,
            total_cost,
            average_unit_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_stock_result() {
        let r = stock_result(Weight::from_kg(500), Weight::from_kg(60), Weight::zero());
        assert_eq!(r, Weight::from_kg(440));

        let r = stock_result(Weight::from_kg(500), Weight::from_kg(60), Weight::from_kg(5));
        assert_eq!(r, Weight::from_kg(435));
    }

    #[test]
    fn test_profit_formula() {
        let b = ProfitBreakdown::new(m(1200), m(5000), m(300), m(50), m(100));
        assert_eq!(b.profit, m(1200 - 5000 - 300 - 50 - 100));
    }

    #[test]
    fn test_breakdowns_sum() {
        let a = ProfitBreakdown::new(m(1000), m(400), m(0), m(0), m(0));
        let b = ProfitBreakdown::new(m(500), m(100), m(50), m(10), m(40));
        let total: ProfitBreakdown = vec![a, b].into_iter().sum();
        assert_eq!(total.revenue, m(1500));
        assert_eq!(total.profit, a.profit + b.profit);
    }

    #[test]
    fn test_waste_cost() {
        let cost = waste_cost([(Weight::from_kg(160), m(25)), (Weight::from_grams(500), m(30))]);
        assert_eq!(cost, m(4000 + 15));
        assert!(waste_cost(Vec::<(Weight, Money)>::new()).is_zero());
    }

    #[test]
    fn test_loading_stats_average() {
        let stats = LoadingStats::from_totals(3, 300, Weight::from_kg(1500), m(15_000), m(31));
        assert_eq!(stats.average_unit_price, m(10));
        assert_eq!(LoadingStats::from_totals(0, 0, Weight::zero(), m(0), m(0)).average_unit_price, m(0));
    }
}
