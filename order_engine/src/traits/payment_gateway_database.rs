use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId},
    traits::{ConfirmResult, FailResult, InventoryManagement, OrderManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the order engine.
///
/// This behaviour includes:
/// * Storing new orders together with their line item snapshots
/// * Recording the payment session reference for an order
/// * The atomic `pending -> paid` transition with its stock decrements
/// * The `pending -> failed` transition
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement + InventoryManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores the order and its line items in a single atomic transaction. The order is created in `pending`.
    ///
    /// A line item's product link is kept only if the product exists in the inventory at this moment. Otherwise the
    /// link is dropped, but the name and price snapshot are stored regardless.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    /// Records the payment session reference for the order, unless one is already set. Returns the order as stored.
    async fn attach_session(&self, id: OrderId, session_id: &str) -> Result<Order, PaymentGatewayError>;

    /// The confirm transition. In a single atomic unit of work:
    /// 1. claim the order if it is `pending`, setting it to `paid` (and recording `session_id` if none is set);
    /// 2. if it was not pending, report it as already paid (or fail if it is `failed` or missing);
    /// 3. decrement the stock of every line item that has a product link, each only if enough is available;
    /// 4. commit, or roll everything back if any decrement was refused.
    async fn confirm_payment(&self, id: OrderId, session_id: Option<&str>) -> Result<ConfirmResult, PaymentGatewayError>;

    /// Moves a `pending` order to `failed`. Stock is never touched.
    async fn mark_payment_failed(&self, id: OrderId) -> Result<FailResult, PaymentGatewayError>;

    /// Closes the database connection(s)
    async fn close(&mut self) -> Result<(), PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine error. {0}")]
    DatabaseError(String),
    #[error("The order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The order {id} is {status} and cannot be {action}")]
    InvalidTransition { id: OrderId, status: crate::db_types::OrderStatusType, action: &'static str },
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
