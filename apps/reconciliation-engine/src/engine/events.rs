//! Inbound gateway event payloads.
//!
//! These are the callback payloads the gateway delivers from its own
//! threads. The feed is at-least-once: events may be duplicated and the
//! status and execution/commission streams arrive independently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::{OrderSide, OrderType};
use crate::domain::shared::{ExecId, InstrumentId, OrderId, PermId};

/// Status codes carried by order-status events, as named by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum StatusCode {
    /// Order is working at the venue.
    Submitted,
    /// Order (or a lot of it) filled.
    Filled,
    /// Order cancelled.
    Cancelled,
    /// Order inactive; in practice this precedes rejection.
    Inactive,
    /// Client-side pending submission; per the docs never carries fills,
    /// but the venue has been seen violating this.
    PendingSubmit,
    /// Cancellation requested, confirmation outstanding.
    PendingCancel,
    /// Accepted by the venue system, not yet at the exchange.
    PreSubmitted,
    /// Cancelled through the API.
    ApiCancelled,
    /// Any status string this engine does not recognize.
    #[serde(other)]
    Unknown,
}

/// Order-status event from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    /// Session-local order identifier.
    pub order_id: OrderId,
    /// Venue status code.
    pub status: StatusCode,
    /// Cumulative filled quantity at the time of the event.
    pub filled: Decimal,
    /// Remaining quantity.
    pub remaining: Decimal,
    /// Average fill price so far.
    pub avg_fill_price: Decimal,
}

/// Execution (fill) event from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// Unique execution identifier.
    pub exec_id: ExecId,
    /// Order this execution belongs to.
    pub order_id: OrderId,
    /// Side of the execution.
    pub side: OrderSide,
    /// Shares filled in this execution (positive).
    pub shares: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Cumulative filled quantity for the order after this execution.
    /// Join key against the status checkpoint recorded in the ledger.
    pub cum_qty: Decimal,
    /// Venue-reported time, either `"YYYYMMDD HH:MM:SS TZ"` or
    /// `"YYYYMMDD HH:MM:SS Weekday"`.
    pub time: String,
}

/// Commission report from the gateway, the last message of a fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionReport {
    /// Execution this commission belongs to.
    pub exec_id: ExecId,
    /// Commission charged by the venue.
    pub commission: Decimal,
    /// Realized profit and loss, authoritative when the fill closed
    /// position.
    pub realized_pnl: Decimal,
}

/// Open-order snapshot delivered at connection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrderSnapshot {
    /// Session-local order identifier.
    pub order_id: OrderId,
    /// Permanent identifier, stable across reconnects.
    pub perm_id: PermId,
    /// Client the order belongs to.
    pub client_id: i64,
    /// Instrument the order trades.
    pub instrument: InstrumentId,
    /// Order direction.
    pub side: OrderSide,
    /// Execution type.
    pub order_type: OrderType,
    /// Venue-reported order state.
    pub status: StatusCode,
}

/// Numbered error event referencing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderErrorEvent {
    /// Order the error refers to.
    pub order_id: OrderId,
    /// Venue error code.
    pub code: i32,
    /// Venue error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_code_wire_names() {
        let parsed: StatusCode = serde_json::from_str("\"ApiCancelled\"").unwrap();
        assert_eq!(parsed, StatusCode::ApiCancelled);

        let parsed: StatusCode = serde_json::from_str("\"PendingSubmit\"").unwrap();
        assert_eq!(parsed, StatusCode::PendingSubmit);
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        let parsed: StatusCode = serde_json::from_str("\"SomeNewStatus\"").unwrap();
        assert_eq!(parsed, StatusCode::Unknown);
    }

    #[test]
    fn order_status_event_round_trip() {
        let event = OrderStatusEvent {
            order_id: OrderId::new(7),
            status: StatusCode::Filled,
            filled: dec!(100),
            remaining: dec!(0),
            avg_fill_price: dec!(101.25),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: OrderStatusEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
