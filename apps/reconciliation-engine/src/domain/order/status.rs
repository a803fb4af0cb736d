//! Order status in the lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a tracked order.
///
/// Lifecycle: `Created` → `Submitted` → `Accepted` → (`Partial`)* →
/// one of the terminal states. Terminal states are never left; a duplicate
/// event that would re-enter one is discarded by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created locally, not yet sent to the gateway.
    Created,
    /// Order sent to the gateway, awaiting acknowledgment.
    Submitted,
    /// Order acknowledged as working by the venue.
    Accepted,
    /// Order partially filled, remainder still working.
    Partial,
    /// Order completely filled.
    Completed,
    /// Order cancelled by the user.
    Cancelled,
    /// Order cancelled by the venue due to expiry.
    Expired,
    /// Order rejected by the venue.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Expired | Self::Rejected
        )
    }

    /// Returns true if the order is still working at the venue.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Submitted | Self::Accepted | Self::Partial
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}
