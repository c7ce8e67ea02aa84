use crate::{
    db_types::{InventoryRecord, ProductId},
    traits::PaymentGatewayError,
};

#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    async fn fetch_stock(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, PaymentGatewayError>;

    /// Takes `quantity` units of the product if, and only if, at least that many are available. Returns whether the
    /// units were taken. This is its own unit of work; the confirm transition uses the same primitive inside its
    /// transaction.
    async fn try_decrement(&self, product_id: ProductId, quantity: i64) -> Result<bool, PaymentGatewayError>;

    /// Operator seeding of stock. Adds `quantity` units, creating the record if necessary.
    async fn restock(&self, product_id: ProductId, quantity: i64) -> Result<InventoryRecord, PaymentGatewayError>;
}
