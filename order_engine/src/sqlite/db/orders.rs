use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, OrderId, OrderRow},
    traits::PaymentGatewayError,
};

/// Inserts the order row (without its line items) using the given connection. This is not atomic. Embed the call
/// inside a transaction together with the line item inserts, and pass `&mut *tx` as the connection argument.
pub(crate) async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<OrderRow, PaymentGatewayError> {
    let now = Utc::now();
    let row: OrderRow = sqlx::query_as(
        r#"
            INSERT INTO orders (
                total,
                currency,
                customer_email,
                customer_name,
                customer_phone,
                address,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $7)
            RETURNING *;
        "#,
    )
    .bind(order.total())
    .bind(&order.currency)
    .bind(&order.customer.customer_email)
    .bind(&order.customer.customer_name)
    .bind(&order.customer.customer_phone)
    .bind(&order.customer.address)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted with total {}", row.id, row.total);
    Ok(row)
}

pub(crate) async fn fetch_order_row(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Returns the oldest order carrying the given payment session reference.
pub(crate) async fn fetch_order_row_by_session(
    session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE session_id = $1 ORDER BY id LIMIT 1")
        .bind(session_id)
        .fetch_optional(conn)
        .await
}

/// All orders, newest first.
pub(crate) async fn fetch_all_order_rows(conn: &mut SqliteConnection) -> Result<Vec<OrderRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC, id DESC").fetch_all(conn).await
}

/// Sets the session reference if, and only if, none has been recorded yet. Returns the row as it is after the call,
/// or `None` if the order does not exist.
pub(crate) async fn attach_session(
    id: OrderId,
    session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, sqlx::Error> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"
            UPDATE orders SET session_id = COALESCE(session_id, $2), updated_at = $3
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(session_id)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    if let Some(r) = &row {
        if r.session_id.as_deref() != Some(session_id) {
            debug!("🗃️ Order {id} already has session {:?}. Keeping it.", r.session_id);
        }
    }
    Ok(row)
}

/// The conditional status claim for the confirm transition: `pending -> paid`, recording the session reference if
/// none is set. Returns `None` if the order is missing or not pending, in which case nothing was written.
///
/// Being a write, this takes the database write lock, so it should be the first statement of the transaction.
pub(crate) async fn claim_pending(
    id: OrderId,
    session_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, sqlx::Error> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'paid', session_id = COALESCE(session_id, $2), updated_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(session_id)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Claim on pending order {id}: {}", if row.is_some() { "won" } else { "not pending" });
    Ok(row)
}

/// `pending -> failed`. Returns `None` if the order is missing or not pending.
pub(crate) async fn mark_failed(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET status = 'failed', updated_at = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}
