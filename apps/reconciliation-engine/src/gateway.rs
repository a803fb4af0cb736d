//! Gateway boundary.
//!
//! The gateway owns the connection to the brokerage: it assigns session
//! order ids, forwards order placements and cancellations, and delivers the
//! event callbacks consumed by the engine. The engine only sees this trait;
//! implementations are injected at construction.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::order::OrderRecord;
use crate::domain::shared::{InstrumentId, OrderId};

/// Errors from gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway is not connected to the venue.
    #[error("Gateway not connected")]
    NotConnected,

    /// The venue refused the request.
    #[error("Gateway refused request: {0}")]
    Refused(String),
}

/// Interface to the brokerage gateway.
pub trait GatewayClient: Send + Sync {
    /// Client identifier of this session.
    fn client_id(&self) -> i64;

    /// Allocate the next session-local order identifier.
    fn next_order_id(&self) -> OrderId;

    /// Forward an order to the venue.
    ///
    /// # Errors
    ///
    /// Returns error if the gateway cannot deliver the request.
    fn place_order(&self, order: &OrderRecord) -> Result<(), GatewayError>;

    /// Request cancellation of an order. Fire-and-forget: local state only
    /// changes when the venue confirms through a status or error event.
    ///
    /// # Errors
    ///
    /// Returns error if the gateway cannot deliver the request.
    fn cancel_order(&self, order_id: OrderId) -> Result<(), GatewayError>;

    /// Most recent close price for an instrument, used as the margin proxy
    /// when applying fills.
    fn last_close(&self, instrument: &InstrumentId) -> Decimal;
}

/// In-process gateway stub for testing.
///
/// Records placed and cancelled orders without venue connectivity. Order ids
/// are allocated sequentially starting from 1.
#[derive(Debug, Default)]
pub struct MockGateway {
    order_counter: AtomicI64,
    placed: Mutex<Vec<OrderId>>,
    cancelled: Mutex<Vec<OrderId>>,
    closes: Mutex<HashMap<InstrumentId, Decimal>>,
}

impl MockGateway {
    /// Create a new mock gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the close price reported for an instrument.
    pub fn set_close(&self, instrument: InstrumentId, price: Decimal) {
        if let Ok(mut closes) = self.closes.lock() {
            closes.insert(instrument, price);
        }
    }

    /// Order ids placed through this gateway, in order.
    #[must_use]
    pub fn placed(&self) -> Vec<OrderId> {
        self.placed.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Order ids with an outstanding cancel request, in order.
    #[must_use]
    pub fn cancelled(&self) -> Vec<OrderId> {
        self.cancelled.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl GatewayClient for MockGateway {
    fn client_id(&self) -> i64 {
        1
    }

    fn next_order_id(&self) -> OrderId {
        OrderId::new(self.order_counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn place_order(&self, order: &OrderRecord) -> Result<(), GatewayError> {
        if let Ok(mut placed) = self.placed.lock() {
            placed.push(order.id());
        }
        Ok(())
    }

    fn cancel_order(&self, order_id: OrderId) -> Result<(), GatewayError> {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push(order_id);
        }
        Ok(())
    }

    fn last_close(&self, instrument: &InstrumentId) -> Decimal {
        self.closes
            .lock()
            .map(|c| c.get(instrument).copied().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mock_allocates_sequential_ids() {
        let gateway = MockGateway::new();
        assert_eq!(gateway.next_order_id(), OrderId::new(1));
        assert_eq!(gateway.next_order_id(), OrderId::new(2));
    }

    #[test]
    fn mock_reports_configured_close() {
        let gateway = MockGateway::new();
        gateway.set_close(InstrumentId::new("AAPL"), dec!(187.50));
        assert_eq!(gateway.last_close(&InstrumentId::new("AAPL")), dec!(187.50));
        assert_eq!(gateway.last_close(&InstrumentId::new("MSFT")), dec!(0));
    }

    #[test]
    fn mock_records_cancel_requests() {
        let gateway = MockGateway::new();
        gateway.cancel_order(OrderId::new(9)).unwrap();
        assert_eq!(gateway.cancelled(), vec![OrderId::new(9)]);
    }
}
