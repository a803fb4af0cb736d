//! The order lifecycle model.
//!
//! An [`OrderRecord`] is the mutable truth of a single tracked order. Its
//! status moves through a guarded state machine; fills are folded into the
//! record through [`OrderRecord::execute`] with full opened/closed
//! attribution.

mod order_type;
mod record;
mod side;
mod status;

pub use order_type::OrderType;
pub use record::{ExecutedState, Fill, OrderError, OrderRecord, SubmitParams};
pub use side::OrderSide;
pub use status::OrderStatus;
