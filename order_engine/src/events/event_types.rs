use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// Published once, after the `pending -> paid` transition has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published once, after the `pending -> failed` transition has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub order: Order,
    /// What the provider reported, e.g. `expired`.
    pub reason: String,
}

impl PaymentFailedEvent {
    pub fn new<S: Into<String>>(order: Order, reason: S) -> Self {
        Self { order, reason: reason.into() }
    }
}
