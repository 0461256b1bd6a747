use sqlx::SqliteConnection;

use crate::{
    db_types::{Amount, NewOrderRequest, OrderRequest},
    traits::LedgerError,
};

pub async fn insert_order_request(
    request: &NewOrderRequest,
    conn: &mut SqliteConnection,
) -> Result<OrderRequest, LedgerError> {
    let row = sqlx::query_as::<_, OrderRequest>(
        "INSERT INTO order_requests (from_cabinet, to_cabinet, amount, type, remaining_amount) VALUES (?, ?, ?, ?, ?) \
         RETURNING *",
    )
    .bind(&request.from_cabinet)
    .bind(&request.to_cabinet)
    .bind(request.amount)
    .bind(&request.request_type)
    .bind(request.amount)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(row)
}

/// Adds `delta` to the remaining amount. Returns `None` if the request no longer exists.
pub async fn adjust_remaining(
    id: i64,
    delta: Amount,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRequest>, LedgerError> {
    let row = sqlx::query_as::<_, OrderRequest>(
        "UPDATE order_requests SET remaining_amount = remaining_amount + ? WHERE id = ? RETURNING *",
    )
    .bind(delta)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(row)
}

pub async fn delete_order_request(id: i64, conn: &mut SqliteConnection) -> Result<u64, LedgerError> {
    let result = sqlx::query("DELETE FROM order_requests WHERE id = ?").bind(id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn active_order_requests(conn: &mut SqliteConnection) -> Result<Vec<OrderRequest>, LedgerError> {
    let rows = sqlx::query_as::<_, OrderRequest>(
        "SELECT * FROM order_requests WHERE remaining_amount > 0 ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
