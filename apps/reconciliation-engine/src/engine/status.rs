//! Order-status transition handling.
//!
//! Status events are duplicated freely by the venue, so every transition is
//! guarded: an event that would repeat the order's current status is
//! dropped. Events that report fills never transition the order here; they
//! are checkpointed in the pending-fill ledger and resolved when the
//! matching commission report arrives.

use tracing::debug;

use super::events::{OrderStatusEvent, StatusCode};
use super::ReconciliationEngine;
use crate::domain::order::OrderStatus;
use rust_decimal::Decimal;

impl ReconciliationEngine {
    /// Handle an order-status event from the gateway.
    pub fn on_order_status(&self, event: &OrderStatusEvent) {
        let snapshot = {
            let mut state = self.lock_state();
            let Some(order) = state.orders.get_mut(&event.order_id) else {
                debug!(order_id = %event.order_id, "status for untracked order");
                return;
            };

            match (event.status, event.filled > Decimal::ZERO) {
                (StatusCode::Submitted, false) => {
                    if order.status() == OrderStatus::Accepted {
                        return; // duplicate acceptance
                    }
                    match order.accept() {
                        Ok(()) => order.clone(),
                        Err(err) => {
                            debug!(order_id = %event.order_id, error = %err, "acceptance dropped");
                            return;
                        }
                    }
                }

                (StatusCode::Cancelled | StatusCode::ApiCancelled, _) => {
                    if matches!(
                        order.status(),
                        OrderStatus::Cancelled | OrderStatus::Expired
                    ) {
                        return; // duplicate cancellation
                    }
                    // Outstanding pending-fill checkpoints survive the
                    // cancellation: a lot that filled at the venue before the
                    // cancel confirmation still gets its execution and
                    // commission messages afterwards, and the reconciler must
                    // be able to join them.
                    let result = if order.will_expire() {
                        order.expire()
                    } else {
                        order.cancel()
                    };
                    match result {
                        Ok(()) => order.clone(),
                        Err(err) => {
                            debug!(order_id = %event.order_id, error = %err, "cancellation dropped");
                            return;
                        }
                    }
                }

                // Cancellation requested; wait for the confirmation.
                (StatusCode::PendingCancel, _) => return,

                (StatusCode::Inactive, _) => {
                    if order.status() == OrderStatus::Rejected {
                        return; // duplicate rejection
                    }
                    match order.reject() {
                        Ok(()) => order.clone(),
                        Err(err) => {
                            debug!(order_id = %event.order_id, error = %err, "rejection dropped");
                            return;
                        }
                    }
                }

                // A status carrying a cumulative filled quantity is one half
                // of a fill. Checkpoint it and wait for the commission side;
                // PendingSubmit/PreSubmitted are documented as fill-free but
                // the venue has been seen attaching fills to them anyway.
                (
                    StatusCode::Submitted
                    | StatusCode::Filled
                    | StatusCode::PendingSubmit
                    | StatusCode::PreSubmitted,
                    true,
                ) => {
                    state
                        .ledger
                        .record(event.order_id, event.filled, event.clone());
                    return;
                }

                _ => return,
            }
        };

        self.notifications.push(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{make_engine, make_params};
    use super::*;
    use crate::engine::Notification;
    use rust_decimal_macros::dec;

    fn status_event(
        order_id: crate::domain::shared::OrderId,
        status: StatusCode,
        filled: Decimal,
    ) -> OrderStatusEvent {
        OrderStatusEvent {
            order_id,
            status,
            filled,
            remaining: dec!(100) - filled,
            avg_fill_price: dec!(10),
        }
    }

    #[test]
    fn submitted_without_fills_accepts_once() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.on_order_status(&status_event(id, StatusCode::Submitted, dec!(0)));
        assert_eq!(engine.order_status(id), Some(OrderStatus::Accepted));
        assert!(matches!(
            engine.poll_notification(),
            Some(Notification::Order(o)) if o.status() == OrderStatus::Accepted
        ));

        // Duplicate acceptance produces nothing
        engine.on_order_status(&status_event(id, StatusCode::Submitted, dec!(0)));
        assert!(engine.poll_notification().is_none());
    }

    #[test]
    fn submitted_with_fills_checkpoints_without_notifying() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        engine.on_order_status(&status_event(id, StatusCode::Submitted, dec!(0)));
        while engine.poll_notification().is_some() {}

        engine.on_order_status(&status_event(id, StatusCode::Submitted, dec!(40)));
        engine.on_order_status(&status_event(id, StatusCode::Filled, dec!(100)));

        let state = engine.lock_state();
        assert_eq!(state.ledger.pending_for(id), 2);
        assert_eq!(state.orders[&id].status(), OrderStatus::Accepted);
        drop(state);
        assert!(engine.poll_notification().is_none());
    }

    #[test]
    fn pending_submit_with_fills_is_checkpointed() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();

        engine.on_order_status(&status_event(id, StatusCode::PendingSubmit, dec!(25)));
        assert_eq!(engine.lock_state().ledger.pending_for(id), 1);
    }

    #[test]
    fn cancelled_transitions_and_notifies_once() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.on_order_status(&status_event(id, StatusCode::Cancelled, dec!(0)));
        engine.on_order_status(&status_event(id, StatusCode::ApiCancelled, dec!(0)));

        assert_eq!(engine.order_status(id), Some(OrderStatus::Cancelled));
        assert_eq!(engine.notifications.len(), 1);
    }

    #[test]
    fn cancelled_with_will_expire_becomes_expired() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        engine
            .lock_state()
            .orders
            .get_mut(&id)
            .unwrap()
            .mark_will_expire();

        engine.on_order_status(&status_event(id, StatusCode::Cancelled, dec!(0)));
        assert_eq!(engine.order_status(id), Some(OrderStatus::Expired));
    }

    #[test]
    fn pending_cancel_is_a_no_op() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.on_order_status(&status_event(id, StatusCode::PendingCancel, dec!(0)));
        assert_eq!(engine.order_status(id), Some(OrderStatus::Submitted));
        assert!(engine.poll_notification().is_none());
    }

    #[test]
    fn inactive_rejects_once() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.on_order_status(&status_event(id, StatusCode::Inactive, dec!(0)));
        engine.on_order_status(&status_event(id, StatusCode::Inactive, dec!(0)));

        assert_eq!(engine.order_status(id), Some(OrderStatus::Rejected));
        assert_eq!(engine.notifications.len(), 1);
    }

    #[test]
    fn untracked_order_is_ignored() {
        let (_, engine) = make_engine();
        engine.on_order_status(&status_event(
            crate::domain::shared::OrderId::new(404),
            StatusCode::Submitted,
            dec!(0),
        ));
        assert!(engine.poll_notification().is_none());
    }

    #[test]
    fn filled_without_fills_is_ignored() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        while engine.poll_notification().is_some() {}

        engine.on_order_status(&status_event(id, StatusCode::Filled, dec!(0)));
        assert_eq!(engine.order_status(id), Some(OrderStatus::Submitted));
        assert!(engine.poll_notification().is_none());
    }

    #[test]
    fn cancellation_keeps_outstanding_checkpoints() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();
        engine.on_order_status(&status_event(id, StatusCode::Submitted, dec!(40)));

        // The execution/commission pair for the 40 lot is still in flight;
        // its checkpoint must survive the cancel confirmation
        engine.on_order_status(&status_event(id, StatusCode::Cancelled, dec!(40)));
        assert_eq!(engine.lock_state().ledger.pending_for(id), 1);
    }
}
