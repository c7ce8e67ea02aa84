use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{InventoryRecord, ProductId};

/// Conditional decrement. A single statement, so the check and the write see the same committed quantity.
/// Returns the new record if `quantity` units were taken, or `None` if there was not enough stock (or no such
/// product), in which case nothing changed.
pub async fn try_decrement(
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<InventoryRecord>, sqlx::Error> {
    let record: Option<InventoryRecord> = sqlx::query_as(
        r#"
            UPDATE inventory SET quantity = quantity - $2, updated_at = $3
            WHERE product_id = $1 AND quantity >= $2
            RETURNING *;
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Decrement of product {product_id} by {quantity}: {}", if record.is_some() { "ok" } else { "refused" });
    Ok(record)
}

pub async fn fetch_stock(
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<InventoryRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM inventory WHERE product_id = $1").bind(product_id).fetch_optional(conn).await
}

pub async fn product_exists(product_id: ProductId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Adds `quantity` units to a product's stock, creating the inventory record if needed.
pub async fn restock(
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<InventoryRecord, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO inventory (product_id, quantity, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT (product_id) DO UPDATE
                SET quantity = inventory.quantity + excluded.quantity, updated_at = excluded.updated_at
            RETURNING *;
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}
