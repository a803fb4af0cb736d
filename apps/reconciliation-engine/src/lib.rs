// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Reconciliation Engine
//!
//! Reconstructs a consistent local view of order state from a live
//! brokerage gateway's event feed. The feed is at-least-once and loosely
//! ordered: status updates repeat, executions and commission reports arrive
//! on their own schedule, and orders placed in previous sessions surface as
//! open-order snapshots at connection time.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: the order aggregate, its guarded lifecycle state machine,
//!   and shared identifier types
//! - **Market**: position tracking with opened/closed fill decomposition
//!   and commission bookkeeping
//! - **Engine**: event handlers, the pending-fill ledger joining the status
//!   and commission streams, the open-order reconciler, and the
//!   notification sink toward the strategy layer
//! - **Boundaries**: the gateway client and order store traits, injected at
//!   construction

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Configuration loading.
pub mod config;

/// Domain layer - order aggregate and shared identifiers.
pub mod domain;

/// Engine layer - event reconciliation.
pub mod engine;

/// Gateway boundary.
pub mod gateway;

/// Market layer - positions and commission bookkeeping.
pub mod market;

/// Structured logging setup.
pub mod observability;

/// Order store boundary.
pub mod store;

pub use config::{Config, ConfigError, load_config};
pub use domain::order::{
    Fill, OrderError, OrderRecord, OrderSide, OrderStatus, OrderType, SubmitParams,
};
pub use domain::shared::{ExecId, InstrumentId, OrderId, PermId, StrategyId};
pub use engine::{
    CommissionReport, ExecutionEvent, Notification, OpenOrderSnapshot, OrderErrorEvent,
    OrderStatusEvent, ReconcileError, ReconciliationEngine, StatusCode,
};
pub use gateway::{GatewayClient, GatewayError, MockGateway};
pub use market::{CommissionInfo, Position, PositionBook, PositionUpdate};
pub use store::{FileOrderStore, InMemoryOrderStore, OrderStore, PersistedOrder, StoreError};
