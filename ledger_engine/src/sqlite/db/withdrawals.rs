use sqlx::SqliteConnection;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::LedgerError,
};

pub async fn insert_withdrawal(
    withdrawal: &NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, LedgerError> {
    let row = sqlx::query_as::<_, Withdrawal>(
        "INSERT INTO withdrawals (from_cabinet, to_cabinet, amount, address) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(&withdrawal.from_cabinet)
    .bind(&withdrawal.to_cabinet)
    .bind(withdrawal.amount)
    .bind(&withdrawal.address)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(row)
}

pub async fn fetch_withdrawal(id: i64, conn: &mut SqliteConnection) -> Result<Option<Withdrawal>, LedgerError> {
    let row =
        sqlx::query_as::<_, Withdrawal>("SELECT * FROM withdrawals WHERE id = ?").bind(id).fetch_optional(conn).await?;
    Ok(row)
}

/// `pending -> completed`. Returns `None` if the withdrawal is missing or already completed.
pub async fn mark_completed(
    id: i64,
    txid: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Withdrawal>, LedgerError> {
    let row = sqlx::query_as::<_, Withdrawal>(
        "UPDATE withdrawals SET status = 'completed', txid = ? WHERE id = ? AND status = 'pending' RETURNING *",
    )
    .bind(txid)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(row)
}

pub async fn delete_withdrawal(id: i64, conn: &mut SqliteConnection) -> Result<Option<Withdrawal>, LedgerError> {
    let row = sqlx::query_as::<_, Withdrawal>("DELETE FROM withdrawals WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_all(conn)
        .await?
        .pop();
    Ok(row)
}

pub async fn withdrawals_for_cabinet(
    cabinet: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, LedgerError> {
    let rows = sqlx::query_as::<_, Withdrawal>(
        "SELECT * FROM withdrawals WHERE (from_cabinet = ? OR to_cabinet = ?) AND id NOT IN (SELECT withdrawal_id \
         FROM hidden_withdrawals WHERE cabinet = ?) ORDER BY created_at DESC, id DESC",
    )
    .bind(cabinet)
    .bind(cabinet)
    .bind(cabinet)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn completed_withdrawals(
    cabinet: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, LedgerError> {
    let rows = sqlx::query_as::<_, Withdrawal>(
        "SELECT * FROM withdrawals WHERE status = 'completed' AND (? IS NULL OR from_cabinet = ? OR to_cabinet = ?) \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(cabinet)
    .bind(cabinet)
    .bind(cabinet)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
