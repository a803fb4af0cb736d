//! Notification sink toward the strategy layer.
//!
//! An ordered queue of order snapshots interspersed with cycle-boundary
//! markers. Snapshots are cloned at notify-time so later mutation of the
//! live record cannot alter a queued notification. Retrieval never blocks.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::order::OrderRecord;

/// One notification delivered to the strategy layer.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A snapshot of an order after a state change.
    Order(OrderRecord),
    /// Boundary marker: no more order updates in this processing cycle.
    CycleEnd,
}

/// Ordered, boundary-marked delivery channel drained by the strategy.
#[derive(Debug, Default)]
pub struct NotificationSink {
    queue: Mutex<VecDeque<Notification>>,
}

impl NotificationSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot of an order.
    pub fn push(&self, order: &OrderRecord) {
        self.lock().push_back(Notification::Order(order.clone()));
    }

    /// Queue a cycle-boundary marker.
    pub fn push_boundary(&self) {
        self.lock().push_back(Notification::CycleEnd);
    }

    /// Pop the next notification without blocking.
    #[must_use]
    pub fn poll(&self) -> Option<Notification> {
        self.lock().pop_front()
    }

    /// Number of queued notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
