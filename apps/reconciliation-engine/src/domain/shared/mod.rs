//! Shared domain primitives used across the order and engine modules.

mod identifiers;

pub use identifiers::{ExecId, InstrumentId, OrderId, PermId, StrategyId};
