//! Order rows. Status changes are compare-and-swap updates guarded on `status = 'pending'`; a `None` result means the
//! order was missing or no longer pending, and the caller decides which.
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order},
    traits::LedgerError,
};

pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let row = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (request_id, from_cabinet, to_cabinet, type, amount_usdt, amount_local, card_number, \
         iban, tax_number, cvu, full_name, note) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(order.request_id)
    .bind(&order.from_cabinet)
    .bind(&order.to_cabinet)
    .bind(&order.order_type)
    .bind(order.amount_usdt)
    .bind(order.amount_local)
    .bind(&order.card_number)
    .bind(&order.iban)
    .bind(&order.tax_number)
    .bind(&order.cvu)
    .bind(&order.full_name)
    .bind(&order.note)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(row)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, LedgerError> {
    let row = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?").bind(id).fetch_optional(conn).await?;
    Ok(row)
}

/// `pending -> completed`, storing the receipts as a JSON array.
pub async fn mark_completed(
    id: i64,
    receipts: &[String],
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let receipts = serde_json::to_string(receipts).map_err(|e| LedgerError::ValidationError(e.to_string()))?;
    let row = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = 'completed', receipts = ? WHERE id = ? AND status = 'pending' RETURNING *",
    )
    .bind(receipts)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(row)
}

/// `pending -> cancelled`
pub async fn mark_cancelled(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, LedgerError> {
    let row = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = 'cancelled' WHERE id = ? AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(row)
}

pub async fn orders_for_cabinet(cabinet: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, LedgerError> {
    let rows = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE (from_cabinet = ? OR to_cabinet = ?) AND id NOT IN (SELECT order_id FROM \
         hidden_orders WHERE cabinet = ?) ORDER BY created_at DESC, id DESC",
    )
    .bind(cabinet)
    .bind(cabinet)
    .bind(cabinet)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn completed_orders(cabinet: Option<&str>, conn: &mut SqliteConnection) -> Result<Vec<Order>, LedgerError> {
    let rows = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE status = 'completed' AND (? IS NULL OR from_cabinet = ? OR to_cabinet = ?) ORDER \
         BY created_at DESC, id DESC",
    )
    .bind(cabinet)
    .bind(cabinet)
    .bind(cabinet)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
