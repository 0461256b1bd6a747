use sqlx::SqliteConnection;

use crate::{
    db_types::{LoginLogEntry, LoginStatus},
    traits::AuthApiError,
};

pub async fn insert_login_log(
    cabinet: &str,
    ip_address: &str,
    user_agent: &str,
    status: LoginStatus,
    conn: &mut SqliteConnection,
) -> Result<LoginLogEntry, AuthApiError> {
    let row = sqlx::query_as::<_, LoginLogEntry>(
        "INSERT INTO login_logs (cabinet, ip_address, user_agent, status) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(cabinet)
    .bind(ip_address)
    .bind(user_agent)
    .bind(status)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(row)
}

/// The IP address of the cabinet's most recent successful login.
pub async fn last_success_ip(cabinet: &str, conn: &mut SqliteConnection) -> Result<Option<String>, AuthApiError> {
    let ip = sqlx::query_scalar::<_, String>(
        "SELECT ip_address FROM login_logs WHERE cabinet = ? AND status = 'success' ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(cabinet)
    .fetch_optional(conn)
    .await?;
    Ok(ip)
}

pub async fn recent_login_logs(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<LoginLogEntry>, AuthApiError> {
    let rows = sqlx::query_as::<_, LoginLogEntry>("SELECT * FROM login_logs ORDER BY created_at DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}
