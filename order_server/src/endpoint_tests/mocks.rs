use mockall::mock;
use order_engine::{
    db_types::{InventoryRecord, Order, OrderId, ProductId},
    traits::{InventoryManagement, OrderManagement, PaymentGatewayError},
};

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_order_by_session(&self, session_id: &str) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_orders(&self) -> Result<Vec<Order>, PaymentGatewayError>;
    }
}

mock! {
    pub InventoryManager {}
    impl InventoryManagement for InventoryManager {
        async fn fetch_stock(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, PaymentGatewayError>;
        async fn try_decrement(&self, product_id: ProductId, quantity: i64) -> Result<bool, PaymentGatewayError>;
        async fn restock(&self, product_id: ProductId, quantity: i64) -> Result<InventoryRecord, PaymentGatewayError>;
    }
}
