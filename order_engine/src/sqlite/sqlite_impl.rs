//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{db_url, inventory, line_items, new_pool, orders};
use crate::{
    db_types::{InventoryRecord, NewOrder, Order, OrderId, OrderRow, OrderStatusType, ProductId},
    traits::{
        ConfirmResult,
        FailResult,
        InventoryManagement,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
    },
};

const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SHOP_DATABASE_URL`, or the default.
    pub async fn new() -> Result<Self, PaymentGatewayError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), PaymentGatewayError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentGatewayError::DatabaseError(format!("Migration failed. {e}")))?;
        debug!("🗃️ Database migrations are up to date");
        Ok(())
    }

    async fn with_items(row: OrderRow, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
        let items = line_items::fetch_line_items(row.id, conn).await?;
        Ok(row.with_items(items))
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        match orders::fetch_order_row(id, &mut conn).await? {
            Some(row) => Ok(Some(Self::with_items(row, &mut conn).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_order_by_session(&self, session_id: &str) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        match orders::fetch_order_row_by_session(session_id, &mut conn).await? {
            Some(row) => Ok(Some(Self::with_items(row, &mut conn).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, PaymentGatewayError> {
        // One read transaction, so every order and its items come from the same snapshot
        let mut tx = self.pool.begin().await?;
        let rows = orders::fetch_all_order_rows(&mut tx).await?;
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(Self::with_items(row, &mut tx).await?);
        }
        tx.commit().await?;
        Ok(result)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn fetch_stock(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let record = inventory::fetch_stock(product_id, &mut conn).await?;
        Ok(record)
    }

    async fn try_decrement(&self, product_id: ProductId, quantity: i64) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let record = inventory::try_decrement(product_id, quantity, &mut conn).await?;
        Ok(record.is_some())
    }

    async fn restock(&self, product_id: ProductId, quantity: i64) -> Result<InventoryRecord, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let record = inventory::restock(product_id, quantity, &mut conn).await?;
        debug!("🗃️ Product {product_id} restocked by {quantity}. {} available", record.quantity);
        Ok(record)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // Write first, so the transaction holds the write lock before it reads anything
        let row = orders::insert_order(&order, &mut tx).await?;
        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            let mut item = item;
            if let Some(pid) = item.product_id {
                if !inventory::product_exists(pid, &mut tx).await? {
                    debug!("🗃️ Product {pid} is not in the inventory. Dropping the link for '{}'", item.name);
                    item.product_id = None;
                }
            }
            let saved = line_items::insert_line_item(row.id, &item, &mut tx).await?;
            items.push(saved);
        }
        tx.commit().await?;
        debug!("🗃️ Order {} saved with {} line items", row.id, items.len());
        Ok(row.with_items(items))
    }

    async fn attach_session(&self, id: OrderId, session_id: &str) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let row = orders::attach_session(id, session_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderNotFound(id))?;
        let order = Self::with_items(row, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Order {id} is linked to payment session {:?}", order.session_id);
        Ok(order)
    }

    async fn confirm_payment(&self, id: OrderId, session_id: Option<&str>) -> Result<ConfirmResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let row = match orders::claim_pending(id, session_id, &mut tx).await? {
            Some(row) => row,
            None => {
                // Nothing was written. Find out why.
                let existing = orders::fetch_order_row(id, &mut tx).await?;
                let result = match existing {
                    None => Err(PaymentGatewayError::OrderNotFound(id)),
                    Some(row) if row.status == OrderStatusType::Paid => {
                        let order = Self::with_items(row, &mut tx).await?;
                        Ok(ConfirmResult::AlreadyPaid(order))
                    },
                    Some(row) => {
                        Err(PaymentGatewayError::InvalidTransition { id, status: row.status, action: "confirmed" })
                    },
                };
                tx.rollback().await?;
                return result;
            },
        };
        let items = line_items::fetch_line_items(id, &mut tx).await?;
        for item in &items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            if inventory::try_decrement(product_id, item.quantity, &mut tx).await?.is_none() {
                tx.rollback().await?;
                warn!(
                    "🗃️ Order {id} cannot be confirmed. Product {product_id} has fewer than {} units available. All \
                     changes were rolled back.",
                    item.quantity
                );
                return Ok(ConfirmResult::InsufficientStock { order_id: id, product_id, requested: item.quantity });
            }
        }
        tx.commit().await?;
        info!("🗃️ Order {id} is paid. Stock taken for {} line items.", items.len());
        Ok(ConfirmResult::Confirmed(row.with_items(items)))
    }

    async fn mark_payment_failed(&self, id: OrderId) -> Result<FailResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::mark_failed(id, &mut tx).await? {
            Some(row) => FailResult::Failed(Self::with_items(row, &mut tx).await?),
            None => {
                let row = orders::fetch_order_row(id, &mut tx).await?.ok_or(PaymentGatewayError::OrderNotFound(id))?;
                FailResult::Unchanged(Self::with_items(row, &mut tx).await?)
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
