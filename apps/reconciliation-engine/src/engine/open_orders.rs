//! Open-order snapshot handling.
//!
//! At connection time the gateway replays every order still working at the
//! venue, terminated by a sentinel. Snapshots for tracked orders refresh
//! local flags; snapshots for unknown orders are queued and rebuilt at the
//! next cycle from persisted metadata, keyed by the permanent identifier.

use chrono::Utc;
use tracing::{debug, warn};

use super::events::{OpenOrderSnapshot, StatusCode};
use super::{ReconcileError, ReconciliationEngine};
use crate::domain::order::{OrderRecord, SubmitParams};
use crate::store::PersistedOrder;

impl ReconciliationEngine {
    /// Handle one open-order snapshot; `None` is the end-of-batch sentinel.
    pub fn on_open_order(&self, snapshot: Option<OpenOrderSnapshot>) {
        let mut state = self.lock_state();

        let Some(snapshot) = snapshot else {
            state.open_orders.push_back(None);
            return;
        };

        if let Some(order) = state.orders.get_mut(&snapshot.order_id) {
            // Tracked order: the snapshot can only refresh metadata.
            if matches!(
                snapshot.status,
                StatusCode::PendingCancel | StatusCode::Cancelled
            ) {
                order.mark_will_expire();
            }

            if order.perm_id().is_none() {
                order.set_perm_id(snapshot.perm_id);
                let persisted = PersistedOrder {
                    order_id: order.id(),
                    instrument: order.instrument().clone(),
                    strategy: order.strategy().clone(),
                    size: order.side().signed(order.quantity()),
                    price: order.stop_price(),
                    price_limit: order.limit_price(),
                };
                if let Err(err) = self.store.save(snapshot.perm_id, &persisted) {
                    warn!(perm_id = %snapshot.perm_id, error = %err, "order persistence failed");
                }
            }
            return;
        }

        state.open_orders.push_back(Some(snapshot));
    }

    /// Drain a complete snapshot batch from the open-order queue, rebuilding
    /// an order record for every snapshot that belongs to this client.
    ///
    /// An incomplete batch (no sentinel yet) is left queued for the next
    /// cycle.
    pub(crate) fn drain_open_orders(&self) {
        let snapshots = {
            let mut state = self.lock_state();
            if !state.open_orders.contains(&None) {
                return;
            }
            let mut snapshots = Vec::new();
            while let Some(entry) = state.open_orders.pop_front() {
                match entry {
                    Some(snapshot) => snapshots.push(snapshot),
                    None => break,
                }
            }
            snapshots
        };

        for snapshot in snapshots {
            match self.rebuild_from_snapshot(&snapshot) {
                Ok(order) => self.notifications.push(&order),
                Err(err) => {
                    warn!(
                        order_id = %snapshot.order_id,
                        perm_id = %snapshot.perm_id,
                        error = %err,
                        "open order could not be rebuilt"
                    );
                }
            }
        }
    }

    fn rebuild_from_snapshot(
        &self,
        snapshot: &OpenOrderSnapshot,
    ) -> Result<OrderRecord, ReconcileError> {
        let session = self.gateway.client_id();
        if snapshot.client_id != session {
            debug!(
                order_id = %snapshot.order_id,
                client_id = snapshot.client_id,
                "open order belongs to another client"
            );
            return Err(ReconcileError::ClientIdMismatch {
                snapshot: snapshot.client_id,
                session,
            });
        }

        let stored =
            self.store
                .load(snapshot.perm_id)?
                .ok_or(ReconcileError::PersistenceMiss {
                    perm_id: snapshot.perm_id,
                })?;

        if stored.order_id != snapshot.order_id {
            return Err(ReconcileError::OrderIdMismatch {
                stored: stored.order_id,
                snapshot: snapshot.order_id,
            });
        }

        let mut order = OrderRecord::new(
            snapshot.order_id,
            SubmitParams {
                instrument: stored.instrument,
                strategy: stored.strategy,
                side: snapshot.side,
                quantity: stored.size.abs(),
                order_type: snapshot.order_type,
                limit_price: stored.price_limit,
                stop_price: stored.price,
            },
        )?;
        order.submit(Utc::now())?;
        order.set_perm_id(snapshot.perm_id);
        if snapshot.status == StatusCode::Submitted {
            order.accept()?;
        }
        if matches!(
            snapshot.status,
            StatusCode::PendingCancel | StatusCode::Cancelled
        ) {
            order.mark_will_expire();
        }

        let clone = order.clone();
        self.lock_state().orders.insert(snapshot.order_id, order);
        Ok(clone)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{make_engine, make_params};
    use super::*;
    use crate::domain::order::{OrderSide, OrderStatus, OrderType};
    use crate::domain::shared::{InstrumentId, OrderId, PermId, StrategyId};
    use crate::engine::Notification;
    use rust_decimal_macros::dec;

    fn snapshot(order_id: OrderId, perm_id: PermId, status: StatusCode) -> OpenOrderSnapshot {
        OpenOrderSnapshot {
            order_id,
            perm_id,
            client_id: 1,
            instrument: InstrumentId::new("AAPL"),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            status,
        }
    }

    fn persist(engine: &crate::engine::ReconciliationEngine, order_id: OrderId, perm_id: PermId) {
        engine
            .store
            .save(
                perm_id,
                &PersistedOrder {
                    order_id,
                    instrument: InstrumentId::new("AAPL"),
                    strategy: StrategyId::new("momentum"),
                    size: dec!(100),
                    price: None,
                    price_limit: Some(dec!(150.00)),
                },
            )
            .unwrap();
    }

    #[test]
    fn tracked_order_learns_perm_id_and_is_persisted() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();

        engine.on_open_order(Some(snapshot(id, PermId::new(900_001), StatusCode::Submitted)));

        let state = engine.lock_state();
        assert_eq!(state.orders[&id].perm_id(), Some(PermId::new(900_001)));
        assert!(state.open_orders.is_empty());
        drop(state);

        let stored = engine.store.load(PermId::new(900_001)).unwrap().unwrap();
        assert_eq!(stored.order_id, id);
        assert_eq!(stored.size, dec!(100));
    }

    #[test]
    fn tracked_order_pending_cancel_marks_will_expire() {
        let (_, engine) = make_engine();
        let id = engine.submit(make_params(dec!(100)), None).unwrap();

        engine.on_open_order(Some(snapshot(
            id,
            PermId::new(900_001),
            StatusCode::PendingCancel,
        )));

        assert!(engine.lock_state().orders[&id].will_expire());
    }

    #[test]
    fn unknown_order_is_rebuilt_at_next_cycle() {
        let (_, engine) = make_engine();
        let order_id = OrderId::new(77);
        let perm_id = PermId::new(900_002);
        persist(&engine, order_id, perm_id);

        engine.on_open_order(Some(snapshot(order_id, perm_id, StatusCode::Submitted)));
        engine.on_open_order(None);
        engine.next_cycle();

        assert_eq!(engine.order_status(order_id), Some(OrderStatus::Accepted));
        assert!(matches!(
            engine.poll_notification(),
            Some(Notification::Order(o))
                if o.id() == order_id && o.perm_id() == Some(perm_id)
        ));
        assert!(matches!(
            engine.poll_notification(),
            Some(Notification::CycleEnd)
        ));
    }

    #[test]
    fn incomplete_batch_waits_for_sentinel() {
        let (_, engine) = make_engine();
        let order_id = OrderId::new(77);
        let perm_id = PermId::new(900_002);
        persist(&engine, order_id, perm_id);

        engine.on_open_order(Some(snapshot(order_id, perm_id, StatusCode::Submitted)));
        engine.next_cycle();

        assert_eq!(engine.order_status(order_id), None);
        assert_eq!(engine.lock_state().open_orders.len(), 1);

        engine.on_open_order(None);
        engine.next_cycle();
        assert_eq!(engine.order_status(order_id), Some(OrderStatus::Accepted));
    }

    #[test]
    fn other_clients_orders_are_skipped() {
        let (_, engine) = make_engine();
        let order_id = OrderId::new(77);
        let perm_id = PermId::new(900_002);
        persist(&engine, order_id, perm_id);

        let mut foreign = snapshot(order_id, perm_id, StatusCode::Submitted);
        foreign.client_id = 42;
        engine.on_open_order(Some(foreign));
        engine.on_open_order(None);
        engine.next_cycle();

        assert_eq!(engine.order_status(order_id), None);
    }

    #[test]
    fn unpersisted_order_is_dropped() {
        let (_, engine) = make_engine();
        engine.on_open_order(Some(snapshot(
            OrderId::new(77),
            PermId::new(1),
            StatusCode::Submitted,
        )));
        engine.on_open_order(None);
        engine.next_cycle();

        assert_eq!(engine.order_status(OrderId::new(77)), None);
        assert!(matches!(
            engine.poll_notification(),
            Some(Notification::CycleEnd)
        ));
    }

    #[test]
    fn mismatched_persisted_order_id_is_dropped() {
        let (_, engine) = make_engine();
        let perm_id = PermId::new(900_002);
        persist(&engine, OrderId::new(12), perm_id);

        engine.on_open_order(Some(snapshot(OrderId::new(77), perm_id, StatusCode::Submitted)));
        engine.on_open_order(None);
        engine.next_cycle();

        assert_eq!(engine.order_status(OrderId::new(77)), None);
        assert_eq!(engine.order_status(OrderId::new(12)), None);
    }

    #[test]
    fn rebuilt_pending_cancel_order_will_expire() {
        let (_, engine) = make_engine();
        let order_id = OrderId::new(77);
        let perm_id = PermId::new(900_002);
        persist(&engine, order_id, perm_id);

        engine.on_open_order(Some(snapshot(order_id, perm_id, StatusCode::PendingCancel)));
        engine.on_open_order(None);
        engine.next_cycle();

        assert!(engine.lock_state().orders[&order_id].will_expire());
    }
}
