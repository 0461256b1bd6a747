use sqlx::SqliteConnection;

use crate::{
    db_types::{AdminLogEntry, Balance, BALANCE_UPDATE_ACTION},
    traits::LedgerError,
};

/// Appends a `balance_update` entry describing the change from `before` to `after`.
pub async fn insert_balance_update(
    admin_name: &str,
    before: &Balance,
    after: &Balance,
    comment: &str,
    conn: &mut SqliteConnection,
) -> Result<AdminLogEntry, LedgerError> {
    let entry = sqlx::query_as::<_, AdminLogEntry>(
        "INSERT INTO admin_logs (admin_name, action_type, cabinet_from, cabinet_to, amount_old, amount_new, comment) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(admin_name)
    .bind(BALANCE_UPDATE_ACTION)
    .bind(&after.cabinet_from)
    .bind(&after.cabinet_to)
    .bind(before.amount)
    .bind(after.amount)
    .bind(comment)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(entry)
}

/// Balance updates touching `cabinet` (or all of them), newest first.
pub async fn balance_updates(
    cabinet: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Vec<AdminLogEntry>, LedgerError> {
    let entries = sqlx::query_as::<_, AdminLogEntry>(
        "SELECT * FROM admin_logs WHERE action_type = ? AND (? IS NULL OR cabinet_from = ? OR cabinet_to = ?) ORDER \
         BY created_at DESC, id DESC",
    )
    .bind(BALANCE_UPDATE_ACTION)
    .bind(cabinet)
    .bind(cabinet)
    .bind(cabinet)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}
