use crate::{
    db_types::{Order, OrderId},
    traits::PaymentGatewayError,
};

/// Read access to orders. Orders always come with their full, ordered list of line items.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches the order that the payment session `session_id` was attached to.
    async fn fetch_order_by_session(&self, session_id: &str) -> Result<Option<Order>, PaymentGatewayError>;

    /// All orders, newest first.
    async fn fetch_orders(&self) -> Result<Vec<Order>, PaymentGatewayError>;
}
