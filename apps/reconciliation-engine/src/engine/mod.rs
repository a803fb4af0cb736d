//! The reconciliation engine.
//!
//! Consumes the gateway's at-least-once, loosely-ordered event feed and
//! reconstructs a consistent local view of order state: deduplicated status
//! transitions, execution/commission joins with opened/closed attribution,
//! and ordered, boundary-marked notifications toward the strategy layer.
//!
//! All mutation of the order table, execution map, pending-fill ledger and
//! pending-notify list happens under one engine lock, taken by every
//! handler. Gateway and store collaborators are injected through the
//! constructor.

mod error;
mod events;
mod ledger;
mod notifications;
mod open_orders;
mod reconcile;
mod status;

pub use error::ReconcileError;
pub use events::{
    CommissionReport, ExecutionEvent, OpenOrderSnapshot, OrderErrorEvent, OrderStatusEvent,
    StatusCode,
};
pub use ledger::PendingFillLedger;
pub use notifications::{Notification, NotificationSink};
pub use reconcile::{parse_exec_time, split_commission};

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::order::{OrderRecord, OrderStatus, SubmitParams};
use crate::domain::shared::{ExecId, InstrumentId, OrderId};
use crate::gateway::GatewayClient;
use crate::market::{CommissionInfo, PositionBook};
use crate::store::OrderStore;

/// Venue error code confirming a cancellation.
const ERROR_CODE_CANCELLED: i32 = 202;
/// Venue error code for an order rejection.
const ERROR_CODE_REJECTED: i32 = 201;

/// Mutable engine state, guarded by a single lock.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    /// Tracked orders by session-local identifier. Historical orders remain
    /// resident for the life of the session.
    pub(crate) orders: HashMap<OrderId, OrderRecord>,
    /// Executions awaiting their commission report.
    pub(crate) executions: HashMap<ExecId, ExecutionEvent>,
    /// Status checkpoints awaiting their commission report.
    pub(crate) ledger: PendingFillLedger,
    /// Orders with reconciled fills awaiting the portfolio-consistency
    /// boundary before notification.
    pub(crate) to_notify: VecDeque<OrderId>,
    /// Open-order snapshots queued for the next cycle drain; `None` marks
    /// the end of a snapshot batch.
    pub(crate) open_orders: VecDeque<Option<OpenOrderSnapshot>>,
}

/// Order-lifecycle reconciliation engine.
pub struct ReconciliationEngine {
    pub(crate) state: Mutex<EngineState>,
    pub(crate) notifications: NotificationSink,
    pub(crate) positions: Arc<PositionBook>,
    pub(crate) gateway: Arc<dyn GatewayClient>,
    pub(crate) store: Arc<dyn OrderStore>,
    comm_info: Mutex<HashMap<InstrumentId, CommissionInfo>>,
}

impl ReconciliationEngine {
    /// Create an engine with injected collaborators.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn GatewayClient>,
        store: Arc<dyn OrderStore>,
        positions: Arc<PositionBook>,
    ) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            notifications: NotificationSink::new(),
            positions,
            gateway,
            store,
            comm_info: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a non-default commission info for an instrument.
    pub fn set_commission_info(&self, instrument: InstrumentId, info: CommissionInfo) {
        if let Ok(mut map) = self.comm_info.lock() {
            map.insert(instrument, info);
        }
    }

    pub(crate) fn commission_info(&self, instrument: &InstrumentId) -> CommissionInfo {
        self.comm_info
            .lock()
            .map(|m| m.get(instrument).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    // ========================================================================
    // Strategy-facing operations
    // ========================================================================

    /// Submit a new order: create the record, register it, forward it to
    /// the gateway, and notify the submission snapshot.
    ///
    /// `oco_with` links the order into an existing order's one-cancels-all
    /// group; otherwise a fresh group is generated.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid or the gateway refuses
    /// the placement.
    pub fn submit(
        &self,
        params: SubmitParams,
        oco_with: Option<OrderId>,
    ) -> Result<OrderId, ReconcileError> {
        let id = self.gateway.next_order_id();
        let mut order = OrderRecord::new(id, params)?;
        order.submit(Utc::now())?;

        let snapshot = {
            let mut state = self.lock_state();

            let group = oco_with
                .and_then(|sibling| state.orders.get(&sibling))
                .map(|sibling| sibling.oca_group().to_string())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            order.set_oca_group(group);

            let snapshot = order.clone();
            state.orders.insert(id, order);
            snapshot
        };

        self.gateway.place_order(&snapshot)?;
        self.notifications.push(&snapshot);

        debug!(order_id = %id, "order submitted");
        Ok(id)
    }

    /// Request cancellation of a tracked order.
    ///
    /// Fire-and-forget: no local state changes until the venue confirms
    /// through a status or error event. Unknown or already-cancelled orders
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the gateway cannot deliver the request.
    pub fn cancel(&self, order_id: OrderId) -> Result<(), ReconcileError> {
        {
            let state = self.lock_state();
            match state.orders.get(&order_id) {
                None => return Ok(()), // not found, not cancellable
                Some(order) if order.status() == OrderStatus::Cancelled => return Ok(()),
                Some(_) => {}
            }
        }

        self.gateway.cancel_order(order_id)?;
        Ok(())
    }

    /// Current status of a tracked order.
    #[must_use]
    pub fn order_status(&self, order_id: OrderId) -> Option<OrderStatus> {
        self.lock_state()
            .orders
            .get(&order_id)
            .map(OrderRecord::status)
    }

    /// Pop the next notification without blocking.
    #[must_use]
    pub fn poll_notification(&self) -> Option<Notification> {
        self.notifications.poll()
    }

    /// Run one processing cycle: drain any complete open-order snapshot
    /// batch, then mark the notification boundary.
    pub fn next_cycle(&self) {
        self.drain_open_orders();
        self.notifications.push_boundary();
    }

    // ========================================================================
    // Gateway callbacks
    // ========================================================================

    /// Handle a portfolio update tick.
    ///
    /// The venue intermixes portfolio updates with the lots of a split
    /// execution; one is taken as the signal that the fills of the current
    /// batch are consistent and their orders can be notified, each exactly
    /// once.
    pub fn on_portfolio_update(&self) {
        let snapshots = {
            let mut state = self.lock_state();
            let mut snapshots = Vec::with_capacity(state.to_notify.len());
            while let Some(order_id) = state.to_notify.pop_front() {
                if let Some(order) = state.orders.get(&order_id) {
                    snapshots.push(order.clone());
                }
            }
            snapshots
        };

        for snapshot in snapshots {
            self.notifications.push(&snapshot);
        }
    }

    /// Handle a numbered error event referencing an order.
    ///
    /// Code 202 confirms a cancellation; 201 is a rejection; anything else
    /// defaults to a rejection. Transitions that fail because the order is
    /// already terminal are duplicates and are dropped silently.
    pub fn on_order_error(&self, event: &OrderErrorEvent) {
        let snapshot = {
            let mut state = self.lock_state();
            let Some(order) = state.orders.get_mut(&event.order_id) else {
                debug!(order_id = %event.order_id, code = event.code, "error for untracked order");
                return;
            };

            let result = match event.code {
                ERROR_CODE_CANCELLED => {
                    if !order.is_alive() {
                        return;
                    }
                    order.cancel()
                }
                ERROR_CODE_REJECTED => {
                    if order.status() == OrderStatus::Rejected {
                        return;
                    }
                    order.reject()
                }
                _ => order.reject(),
            };

            match result {
                Ok(()) => order.clone(),
                Err(err) => {
                    debug!(
                        order_id = %event.order_id,
                        code = event.code,
                        error = %err,
                        "duplicate error event ignored"
                    );
                    return;
                }
            }
        };

        warn!(
            order_id = %event.order_id,
            code = event.code,
            message = %event.message,
            status = %snapshot.status(),
            "order terminated by venue error"
        );
        self.notifications.push(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderType};
    use crate::domain::shared::StrategyId;
    use crate::gateway::MockGateway;
    use crate::store::InMemoryOrderStore;
    use rust_decimal_macros::dec;

    pub(crate) fn make_engine() -> (Arc<MockGateway>, ReconciliationEngine) {
        let gateway = Arc::new(MockGateway::new());
        let engine = ReconciliationEngine::new(
            gateway.clone(),
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(PositionBook::new()),
        );
        (gateway, engine)
    }

    pub(crate) fn make_params(quantity: rust_decimal::Decimal) -> SubmitParams {
        SubmitParams {
            instrument: InstrumentId::new("AAPL"),
            strategy: StrategyId::new("momentum"),
            side: OrderSide::Buy,
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
            stop_price: None,
        }
    }

    #[test]
    fn submit_registers_places_and_notifies() {
        let (gateway, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();

        assert_eq!(engine.order_status(id), Some(OrderStatus::Submitted));
        assert_eq!(gateway.placed(), vec![id]);
        assert!(matches!(
            engine.poll_notification(),
            Some(Notification::Order(o)) if o.id() == id
        ));
    }

    #[test]
    fn submit_links_oco_group() {
        let (_, engine) = make_engine();
        let first = engine.submit(make_params(dec!(100)), None).unwrap();
        let second = engine.submit(make_params(dec!(50)), Some(first)).unwrap();

        let state = engine.lock_state();
        let group_a = state.orders[&first].oca_group().to_string();
        let group_b = state.orders[&second].oca_group().to_string();
        assert_eq!(group_a, group_b);
        assert!(!group_a.is_empty());
    }

    #[test]
    fn cancel_unknown_order_is_ignored() {
        let (gateway, engine) = make_engine();
        engine.cancel(OrderId::new(99)).unwrap();
        assert!(gateway.cancelled().is_empty());
    }

    #[test]
    fn cancel_forwards_without_local_mutation() {
        let (gateway, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();

        engine.cancel(id).unwrap();
        assert_eq!(gateway.cancelled(), vec![id]);
        // Optimistic local change is never applied before confirmation
        assert_eq!(engine.order_status(id), Some(OrderStatus::Submitted));
    }

    #[test]
    fn error_202_cancels_alive_order() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.on_order_error(&OrderErrorEvent {
            order_id: id,
            code: 202,
            message: "Order cancelled".to_string(),
        });

        assert_eq!(engine.order_status(id), Some(OrderStatus::Cancelled));
        assert!(matches!(
            engine.poll_notification(),
            Some(Notification::Order(o)) if o.status() == OrderStatus::Cancelled
        ));
    }

    #[test]
    fn error_202_on_dead_order_is_ignored() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        engine.on_order_error(&OrderErrorEvent {
            order_id: id,
            code: 202,
            message: String::new(),
        });
        while engine.poll_notification().is_some() {}

        engine.on_order_error(&OrderErrorEvent {
            order_id: id,
            code: 202,
            message: String::new(),
        });
        assert_eq!(engine.order_status(id), Some(OrderStatus::Cancelled));
        assert!(engine.poll_notification().is_none());
    }

    #[test]
    fn error_201_rejects_once() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.on_order_error(&OrderErrorEvent {
            order_id: id,
            code: 201,
            message: "margin".to_string(),
        });
        engine.on_order_error(&OrderErrorEvent {
            order_id: id,
            code: 201,
            message: "margin".to_string(),
        });

        assert_eq!(engine.order_status(id), Some(OrderStatus::Rejected));
        assert_eq!(engine.notifications.len(), 1);
    }

    #[test]
    fn unknown_error_code_defaults_to_reject() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();

        engine.on_order_error(&OrderErrorEvent {
            order_id: id,
            code: 399,
            message: "other".to_string(),
        });
        assert_eq!(engine.order_status(id), Some(OrderStatus::Rejected));
    }

    #[test]
    fn next_cycle_pushes_boundary() {
        let (_, engine) = make_engine();
        engine.next_cycle();
        assert!(matches!(
            engine.poll_notification(),
            Some(Notification::CycleEnd)
        ));
    }

    #[test]
    fn portfolio_update_drains_pending_notifies_once() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.lock_state().to_notify.push_back(id);
        engine.on_portfolio_update();
        assert_eq!(engine.notifications.len(), 1);

        engine.on_portfolio_update();
        assert_eq!(engine.notifications.len(), 1);
    }
}
