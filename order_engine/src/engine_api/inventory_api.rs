use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{InventoryRecord, ProductId},
    traits::InventoryManagement,
    OrderFlowError,
};

pub struct InventoryApi<B> {
    db: B,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi")
    }
}

impl<B> InventoryApi<B>
where B: InventoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn stock_for(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, OrderFlowError> {
        Ok(self.db.fetch_stock(product_id).await?)
    }

    /// Adds stock for a product. Only whole, non-negative amounts are accepted.
    pub async fn restock(&self, product_id: ProductId, quantity: i64) -> Result<InventoryRecord, OrderFlowError> {
        if quantity < 0 {
            return Err(OrderFlowError::Validation(format!("Cannot restock a negative amount ({quantity})")));
        }
        let record = self.db.restock(product_id, quantity).await?;
        info!("🗃️ Product {product_id} now has {} units available", record.quantity);
        Ok(record)
    }
}
