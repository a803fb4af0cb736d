//! Pending-Fill Ledger.
//!
//! A fill is reported through two independently-arriving streams: a status
//! update carrying the cumulative filled quantity, and later an execution
//! plus commission report. The ledger holds the status checkpoint until the
//! commission side arrives, keyed by (order id, cumulative filled quantity).

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use super::events::OrderStatusEvent;
use crate::domain::shared::OrderId;

/// Per-order map from cumulative-filled checkpoint to the status message
/// awaiting its commission report.
///
/// Entries are inserted by the status transition engine and removed exactly
/// once, by the reconciler. Lives inside the engine state, under the engine
/// lock.
#[derive(Debug, Default)]
pub struct PendingFillLedger {
    entries: HashMap<OrderId, BTreeMap<Decimal, OrderStatusEvent>>,
}

impl PendingFillLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the status checkpoint for an order at a
    /// cumulative filled quantity. A repeated status at the same checkpoint
    /// keeps only the most recent message.
    pub fn record(&mut self, order_id: OrderId, cum_filled: Decimal, event: OrderStatusEvent) {
        self.entries
            .entry(order_id)
            .or_default()
            .insert(cum_filled, event);
    }

    /// Remove and return the checkpoint, if present.
    pub fn take(&mut self, order_id: OrderId, cum_filled: Decimal) -> Option<OrderStatusEvent> {
        let per_order = self.entries.get_mut(&order_id)?;
        let event = per_order.remove(&cum_filled);
        if per_order.is_empty() {
            self.entries.remove(&order_id);
        }
        event
    }

    /// Drop every remaining checkpoint for an order. Called when the order
    /// completes and nothing is left to be reported.
    pub fn drop_order(&mut self, order_id: OrderId) {
        self.entries.remove(&order_id);
    }

    /// Number of outstanding checkpoints for an order.
    #[must_use]
    pub fn pending_for(&self, order_id: OrderId) -> usize {
        self.entries.get(&order_id).map_or(0, BTreeMap::len)
    }
}
