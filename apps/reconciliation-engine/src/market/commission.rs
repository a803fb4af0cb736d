//! Commission bookkeeping approximations.
//!
//! Commissions are calculated by the venue; these figures only feed the
//! strategy-side trade bookkeeping, so approximate notional costs are
//! acceptable. Margin is venue-controlled and not modelled here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Approximate cost/value calculator attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionInfo {
    /// Contract multiplier (1 for stock-like instruments).
    pub multiplier: Decimal,
}

impl Default for CommissionInfo {
    fn default() -> Self {
        Self {
            multiplier: Decimal::ONE,
        }
    }
}

impl CommissionInfo {
    /// Create a commission info with a contract multiplier.
    #[must_use]
    pub const fn new(multiplier: Decimal) -> Self {
        Self { multiplier }
    }

    /// Cash needed for an operation of `size` at `price`.
    ///
    /// In real life the margin approaches the price; this is the same
    /// approximation for both directions.
    #[must_use]
    pub fn operation_cost(&self, size: Decimal, price: Decimal) -> Decimal {
        size.abs() * price * self.multiplier
    }

    /// Approximate value of a holding of `size` at `price`.
    #[must_use]
    pub fn value_size(&self, size: Decimal, price: Decimal) -> Decimal {
        size.abs() * price * self.multiplier
    }
}
