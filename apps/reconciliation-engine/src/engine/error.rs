//! Reconciliation error taxonomy.
//!
//! Every failure is contained at the event-handler boundary: the handler
//! logs it and drops the event without retry. A dropped event leaves a
//! stuck order, recovered by the gateway's open-order snapshot replay.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::order::OrderError;
use crate::domain::shared::{ExecId, OrderId, PermId};
use crate::gateway::GatewayError;
use crate::store::StoreError;

/// Errors produced while reconciling gateway events.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Event references an order identifier this engine does not track.
    #[error("Unknown order {order_id}")]
    UnknownOrder {
        /// The untracked order identifier.
        order_id: OrderId,
    },

    /// Commission report with no matching execution record.
    #[error("Unknown execution {exec_id}")]
    UnknownExecution {
        /// The unmatched execution identifier.
        exec_id: ExecId,
    },

    /// Commission report whose order/quantity key has no ledger entry.
    /// A commission report must never precede its status checkpoint.
    #[error("No pending status checkpoint for order {order_id} at filled={cum_qty}")]
    LedgerJoinMiss {
        /// Order the report referred to.
        order_id: OrderId,
        /// Cumulative filled quantity used as the join key.
        cum_qty: Decimal,
    },

    /// Open-order snapshot whose permanent identifier is not in the store.
    #[error("No persisted metadata for permanent id {perm_id}")]
    PersistenceMiss {
        /// The unresolvable permanent identifier.
        perm_id: PermId,
    },

    /// Open-order snapshot owned by a different gateway client.
    #[error("Snapshot client id {snapshot} does not match session client id {session}")]
    ClientIdMismatch {
        /// Client id carried by the snapshot.
        snapshot: i64,
        /// Client id of this gateway session.
        session: i64,
    },

    /// Persisted metadata disagrees with the snapshot's order identifier.
    #[error("Persisted order id {stored} does not match snapshot order id {snapshot}")]
    OrderIdMismatch {
        /// Order id from the store.
        stored: OrderId,
        /// Order id from the snapshot.
        snapshot: OrderId,
    },

    /// Execution timestamp could not be parsed in either venue format.
    #[error("Unparseable execution time {raw:?}")]
    BadExecTime {
        /// The raw timestamp string.
        raw: String,
    },

    /// Fill with zero size: the commission split is undefined.
    #[error("Zero-size fill for order {order_id}")]
    ZeroSizeFill {
        /// Order the fill referred to.
        order_id: OrderId,
    },

    /// The order aggregate refused a transition or fill.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The order store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The gateway failed to deliver a request.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
