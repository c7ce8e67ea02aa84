use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{LineItem, NewLineItem, OrderId};

pub async fn insert_line_item(
    order_id: OrderId,
    item: &NewLineItem,
    conn: &mut SqliteConnection,
) -> Result<LineItem, sqlx::Error> {
    let item: LineItem = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, name, unit_price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(&item.name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Line item {} ({} x {}) saved for order {order_id}", item.id, item.quantity, item.name);
    Ok(item)
}

/// The line items of an order, in the order they were placed.
pub async fn fetch_line_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}
