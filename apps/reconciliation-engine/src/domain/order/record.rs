//! Order Record aggregate.
//!
//! The mutable truth of one tracked order. Status transitions are guarded by
//! the lifecycle state machine; a transition method never notifies by itself,
//! so the caller can batch several internal updates before pushing one clone
//! to the notification sink.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{OrderSide, OrderStatus, OrderType};
use crate::domain::shared::{InstrumentId, OrderId, PermId, StrategyId};

/// Errors raised by the order aggregate.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A lifecycle transition was not permitted from the current status.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Status the order was in.
        from: OrderStatus,
        /// Status that was requested.
        to: OrderStatus,
    },

    /// Submission parameters were missing or inconsistent.
    #[error("Invalid order parameters: {field}: {message}")]
    InvalidParameters {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A fill would take the cumulative filled quantity past the request.
    #[error("Overfill: |filled| {filled} exceeds requested {requested}")]
    Overfill {
        /// Absolute cumulative filled size after the fill.
        filled: Decimal,
        /// Requested order quantity.
        requested: Decimal,
    },
}

/// Parameters for creating a new order at submission time.
#[derive(Debug, Clone)]
pub struct SubmitParams {
    /// Instrument the order trades.
    pub instrument: InstrumentId,
    /// Strategy that owns the order.
    pub strategy: StrategyId,
    /// Order direction.
    pub side: OrderSide,
    /// Requested quantity (positive).
    pub quantity: Decimal,
    /// Execution type.
    pub order_type: OrderType,
    /// Limit price, required for Limit/StopLimit.
    pub limit_price: Option<Decimal>,
    /// Stop price, required for Stop/StopLimit.
    pub stop_price: Option<Decimal>,
}

impl SubmitParams {
    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns error if required parameters are missing or invalid.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.quantity <= Decimal::ZERO {
            return Err(OrderError::InvalidParameters {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }

        if self.order_type.requires_limit_price() && self.limit_price.is_none() {
            return Err(OrderError::InvalidParameters {
                field: "limit_price".to_string(),
                message: "Limit price required for limit orders".to_string(),
            });
        }

        if self.order_type.requires_stop_price() && self.stop_price.is_none() {
            return Err(OrderError::InvalidParameters {
                field: "stop_price".to_string(),
                message: "Stop price required for stop orders".to_string(),
            });
        }

        Ok(())
    }
}

/// One reconciled fill with opened/closed attribution, as applied to an
/// order through [`OrderRecord::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Execution timestamp reported by the venue.
    pub executed_at: NaiveDateTime,
    /// Signed fill size (positive buys, negative sells).
    pub size: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Quantity that closed existing position.
    pub closed_qty: Decimal,
    /// Notional cost of the closed portion.
    pub closed_value: Decimal,
    /// Commission attributed to the closed portion.
    pub closed_commission: Decimal,
    /// Quantity that opened new position.
    pub opened_qty: Decimal,
    /// Notional cost of the opened portion.
    pub opened_value: Decimal,
    /// Commission attributed to the opened portion.
    pub opened_commission: Decimal,
    /// Margin proxy (current close price; margin is venue-controlled).
    pub margin: Decimal,
    /// Realized profit and loss reported by the venue.
    pub pnl: Decimal,
    /// Position size after this fill.
    pub position_size: Decimal,
    /// Position average price after this fill.
    pub position_price: Decimal,
}

/// Cumulative execution state of an order, folded from its fills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedState {
    /// Signed cumulative filled size.
    pub size: Decimal,
    /// Volume-weighted average fill price.
    pub avg_price: Decimal,
    /// Cumulative filled notional (|size| at avg price).
    pub value: Decimal,
    /// Remaining quantity still working.
    pub remaining: Decimal,
    /// Cumulative quantity that opened position.
    pub opened_qty: Decimal,
    /// Cumulative notional of opened portions.
    pub opened_value: Decimal,
    /// Cumulative commission on opened portions.
    pub opened_commission: Decimal,
    /// Cumulative quantity that closed position.
    pub closed_qty: Decimal,
    /// Cumulative notional of closed portions.
    pub closed_value: Decimal,
    /// Cumulative commission on closed portions.
    pub closed_commission: Decimal,
    /// Total commission across all fills.
    pub commission: Decimal,
    /// Cumulative realized profit and loss.
    pub pnl: Decimal,
    /// Margin proxy from the most recent fill.
    pub margin: Decimal,
    /// Position size after the most recent fill.
    pub position_size: Decimal,
    /// Position average price after the most recent fill.
    pub position_price: Decimal,
    /// Timestamp of the most recent fill.
    pub last_executed_at: Option<NaiveDateTime>,
}

/// Order Record aggregate.
///
/// Cloning produces a deep snapshot: a clone pushed to the notification sink
/// shares no mutable state with the live record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    id: OrderId,
    perm_id: Option<PermId>,
    instrument: InstrumentId,
    strategy: StrategyId,
    side: OrderSide,
    quantity: Decimal,
    order_type: OrderType,
    limit_price: Option<Decimal>,
    stop_price: Option<Decimal>,
    oca_group: String,
    status: OrderStatus,
    will_expire: bool,
    submitted_at: Option<DateTime<Utc>>,
    executed: ExecutedState,
}

impl OrderRecord {
    /// Create a new order in `Created` status.
    ///
    /// # Errors
    ///
    /// Returns error if parameter validation fails.
    pub fn new(id: OrderId, params: SubmitParams) -> Result<Self, OrderError> {
        params.validate()?;

        let executed = ExecutedState {
            remaining: params.quantity,
            ..ExecutedState::default()
        };

        Ok(Self {
            id,
            perm_id: None,
            instrument: params.instrument,
            strategy: params.strategy,
            side: params.side,
            quantity: params.quantity,
            order_type: params.order_type,
            limit_price: params.limit_price,
            stop_price: params.stop_price,
            oca_group: String::new(),
            status: OrderStatus::Created,
            will_expire: false,
            submitted_at: None,
            executed,
        })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the session-local order identifier.
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Get the permanent identifier, if known.
    #[must_use]
    pub const fn perm_id(&self) -> Option<PermId> {
        self.perm_id
    }

    /// Get the instrument reference.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Get the owning strategy reference.
    #[must_use]
    pub const fn strategy(&self) -> &StrategyId {
        &self.strategy
    }

    /// Get the order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Get the requested quantity.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Get the execution type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Get the limit price.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Decimal> {
        self.limit_price
    }

    /// Get the stop price.
    #[must_use]
    pub const fn stop_price(&self) -> Option<Decimal> {
        self.stop_price
    }

    /// Get the one-cancels-all group.
    #[must_use]
    pub fn oca_group(&self) -> &str {
        &self.oca_group
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns true if the order is still working at the venue.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.status.is_alive()
    }

    /// Returns true if an open-order snapshot implied an upcoming
    /// expiry-driven cancellation.
    #[must_use]
    pub const fn will_expire(&self) -> bool {
        self.will_expire
    }

    /// Get the submission time, if submitted.
    #[must_use]
    pub const fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Get the cumulative execution state.
    #[must_use]
    pub const fn executed(&self) -> &ExecutedState {
        &self.executed
    }

    // ========================================================================
    // Identity updates
    // ========================================================================

    /// Record the permanent identifier once a snapshot reveals it.
    pub const fn set_perm_id(&mut self, perm_id: PermId) {
        self.perm_id = Some(perm_id);
    }

    /// Assign the one-cancels-all group at submission.
    pub fn set_oca_group(&mut self, group: impl Into<String>) {
        self.oca_group = group.into();
    }

    /// Flag the order as expiring: the next cancellation event is an expiry,
    /// not a user cancel.
    pub const fn mark_will_expire(&mut self) {
        self.will_expire = true;
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// Created → Submitted; records the submission time.
    ///
    /// # Errors
    ///
    /// Returns error if the order was already submitted.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Submitted)?;
        self.submitted_at = Some(now);
        Ok(())
    }

    /// Mark the order accepted (working) at the venue.
    ///
    /// # Errors
    ///
    /// Returns error on an illegal transition.
    pub fn accept(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Accepted)
    }

    /// Mark the order cancelled by the user.
    ///
    /// # Errors
    ///
    /// Returns error on an illegal transition.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled)
    }

    /// Mark the order expired.
    ///
    /// # Errors
    ///
    /// Returns error on an illegal transition.
    pub fn expire(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Expired)
    }

    /// Mark the order rejected by the venue.
    ///
    /// # Errors
    ///
    /// Returns error on an illegal transition.
    pub fn reject(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Rejected)
    }

    /// Mark the order partially filled.
    ///
    /// # Errors
    ///
    /// Returns error on an illegal transition.
    pub fn partial(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Partial)
    }

    /// Mark the order completely filled.
    ///
    /// # Errors
    ///
    /// Returns error on an illegal transition.
    pub fn completed(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Completed)
    }

    fn transition(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        use OrderStatus as S;

        // Partial → Partial repeats across lots; fills may also land before
        // the acceptance status is seen, so Submitted can fill directly.
        let ok = matches!(
            (self.status, to),
            (S::Created, S::Submitted)
                | (S::Submitted | S::Accepted | S::Partial, S::Partial)
                | (S::Submitted | S::Accepted | S::Partial, S::Completed)
                | (S::Submitted, S::Accepted)
                | (
                    S::Submitted | S::Accepted | S::Partial,
                    S::Cancelled | S::Expired | S::Rejected
                )
        );

        if !ok {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        self.status = to;
        Ok(())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Fold one reconciled fill into the cumulative execution state.
    ///
    /// Does not change the lifecycle status; the caller decides between
    /// `partial()` and `completed()` based on the joined status checkpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the fill would exceed the requested quantity.
    pub fn execute(&mut self, fill: &Fill) -> Result<(), OrderError> {
        let new_size = self.executed.size + fill.size;
        if new_size.abs() > self.quantity {
            return Err(OrderError::Overfill {
                filled: new_size.abs(),
                requested: self.quantity,
            });
        }

        // VWAP over absolute filled size.
        let old_abs = self.executed.size.abs();
        let new_abs = new_size.abs();
        if new_abs > Decimal::ZERO {
            let old_value = self.executed.avg_price * old_abs;
            let fill_value = fill.price * fill.size.abs();
            self.executed.avg_price = (old_value + fill_value) / new_abs;
        }

        self.executed.size = new_size;
        self.executed.value = self.executed.avg_price * new_abs;
        self.executed.remaining = self.quantity - new_abs;

        self.executed.opened_qty += fill.opened_qty.abs();
        self.executed.opened_value += fill.opened_value;
        self.executed.opened_commission += fill.opened_commission;
        self.executed.closed_qty += fill.closed_qty.abs();
        self.executed.closed_value += fill.closed_value;
        self.executed.closed_commission += fill.closed_commission;
        self.executed.commission += fill.opened_commission + fill.closed_commission;
        self.executed.pnl += fill.pnl;

        self.executed.margin = fill.margin;
        self.executed.position_size = fill.position_size;
        self.executed.position_price = fill.position_price;
        self.executed.last_executed_at = Some(fill.executed_at);

        Ok(())
    }
}
