use std::fmt::Debug;

use crate::{
    db_types::{Order, OrderId},
    traits::OrderManagement,
    OrderFlowError,
};

/// Read access to orders. Every order comes with its line items.
pub struct OrdersApi<B> {
    db: B,
}

impl<B> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi")
    }
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.db.fetch_order_by_id(id).await?)
    }

    pub async fn order_by_session(&self, session_id: &str) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.db.fetch_order_by_session(session_id).await?)
    }

    /// All orders, newest first.
    pub async fn orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders().await?)
    }
}
