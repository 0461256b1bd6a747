//! Per-cabinet hidden markers. They only filter listings and never touch the underlying rows.
use sqlx::SqliteConnection;

use crate::traits::LedgerError;

pub async fn hide_order(cabinet: &str, order_id: i64, conn: &mut SqliteConnection) -> Result<bool, LedgerError> {
    let result = sqlx::query("INSERT INTO hidden_orders (cabinet, order_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
        .bind(cabinet)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn hide_withdrawal(
    cabinet: &str,
    withdrawal_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, LedgerError> {
    let result =
        sqlx::query("INSERT INTO hidden_withdrawals (cabinet, withdrawal_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
            .bind(cabinet)
            .bind(withdrawal_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}
