//! Position tracking with opened/closed fill decomposition.

use std::collections::HashMap;
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::InstrumentId;

/// Result of applying a fill to a position.
///
/// The opened/closed split is central to commission and P&L attribution:
/// `opened` is the portion of the fill that increased exposure, `closed` the
/// portion that reduced or reversed it. `opened + closed` equals the fill
/// size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate {
    /// Position size after the fill.
    pub size: Decimal,
    /// Position average price after the fill.
    pub price: Decimal,
    /// Signed quantity that opened exposure.
    pub opened: Decimal,
    /// Signed quantity that closed exposure.
    pub closed: Decimal,
}

/// A single instrument position: signed size and average entry price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Signed position size (positive long, negative short).
    pub size: Decimal,
    /// Average entry price of the open size.
    pub price: Decimal,
}

impl Position {
    /// Create a position with an explicit size and price.
    #[must_use]
    pub const fn new(size: Decimal, price: Decimal) -> Self {
        Self { size, price }
    }

    /// Apply a signed fill and decompose it into opened and closed portions.
    ///
    /// Cases: opening from flat, adding to an existing position (average
    /// price reweighted), reducing it (price unchanged), closing it out, and
    /// reversing through zero (remainder opens at the fill price). Short
    /// positions mirror the long cases.
    pub fn update(&mut self, size: Decimal, price: Decimal) -> PositionUpdate {
        if size.is_zero() {
            return PositionUpdate {
                size: self.size,
                price: self.price,
                opened: Decimal::ZERO,
                closed: Decimal::ZERO,
            };
        }

        let old_size = self.size;
        self.size += size;

        let (opened, closed) = if self.size.is_zero() {
            // Existing position fully closed
            self.price = Decimal::ZERO;
            (Decimal::ZERO, size)
        } else if old_size.is_zero() {
            // Opening from flat
            self.price = price;
            (size, Decimal::ZERO)
        } else if (old_size > Decimal::ZERO) == (size > Decimal::ZERO) {
            // Same direction: the whole fill opens, reweight the average
            self.price = (self.price * old_size + size * price) / self.size;
            (size, Decimal::ZERO)
        } else if (old_size > Decimal::ZERO) == (self.size > Decimal::ZERO) {
            // Opposite direction but position survives: the whole fill closes
            (Decimal::ZERO, size)
        } else {
            // Reversal through zero: old exposure closes, remainder opens
            self.price = price;
            (self.size, -old_size)
        };

        PositionUpdate {
            size: self.size,
            price: self.price,
            opened,
            closed,
        }
    }
}

/// Lock-guarded map of positions by instrument.
///
/// Owned by the host and mutated by the reconciler when a fill is joined
/// with its commission report.
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: Mutex<HashMap<InstrumentId, Position>>,
}

impl PositionBook {
    /// Create an empty position book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the position for an instrument (flat if untracked).
    #[must_use]
    pub fn get(&self, instrument: &InstrumentId) -> Position {
        self.positions
            .lock()
            .map(|p| p.get(instrument).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Apply a signed fill to an instrument's position.
    pub fn update(
        &self,
        instrument: &InstrumentId,
        size: Decimal,
        price: Decimal,
    ) -> PositionUpdate {
        let mut positions = match self.positions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        positions
            .entry(instrument.clone())
            .or_default()
            .update(size, price)
    }

    /// Seed a position, replacing any existing entry.
    pub fn set(&self, instrument: InstrumentId, position: Position) {
        if let Ok(mut positions) = self.positions.lock() {
            positions.insert(instrument, position);
        }
    }
}
