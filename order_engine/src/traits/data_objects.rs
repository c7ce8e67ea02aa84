use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, ProductId};

/// The outcome of the atomic confirm transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmResult {
    /// This call moved the order from `pending` to `paid` and took the stock.
    Confirmed(Order),
    /// The order was already paid. Nothing was written.
    AlreadyPaid(Order),
    /// At least one product did not have enough stock. Nothing was written and the order is still pending.
    InsufficientStock { order_id: OrderId, product_id: ProductId, requested: i64 },
}

/// The outcome of the `pending -> failed` transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailResult {
    Failed(Order),
    /// The order had already left `pending` (either paid or failed). Nothing was written.
    Unchanged(Order),
}
