//! Market-side collaborators: position tracking and commission bookkeeping.

mod commission;
mod position;

pub use commission::CommissionInfo;
pub use position::{Position, PositionBook, PositionUpdate};
