use std::time::Duration;

use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::Session, traits::AuthApiError};

/// Opens a session for the cabinet. Returns `None` if the cabinet already has one, which the unique index on
/// `sessions.cabinet` guarantees even under concurrent logins.
pub async fn insert_session(
    cabinet: &str,
    session_id: &str,
    ip_address: &str,
    user_agent: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Session>, AuthApiError> {
    let result = sqlx::query_as::<_, Session>(
        "INSERT INTO sessions (cabinet, session_id, ip_address, user_agent) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(cabinet)
    .bind(session_id)
    .bind(ip_address)
    .bind(user_agent)
    .fetch_all(conn)
    .await;
    match result {
        Ok(mut sessions) => Ok(sessions.pop()),
        Err(sqlx::Error::Database(de)) if de.is_unique_violation() => {
            trace!("🗃️ {cabinet} already has a session. {de}");
            Ok(None)
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_session(session_id: &str, conn: &mut SqliteConnection) -> Result<Option<Session>, AuthApiError> {
    let row = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn touch_session(session_id: &str, conn: &mut SqliteConnection) -> Result<bool, AuthApiError> {
    let q = format!("UPDATE sessions SET last_activity = {} WHERE session_id = ?", super::NOW);
    let result = sqlx::query(&q).bind(session_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_session(session_id: &str, conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?").bind(session_id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn delete_sessions_for_cabinet(cabinet: &str, conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    let result = sqlx::query("DELETE FROM sessions WHERE cabinet = ?").bind(cabinet).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn delete_idle_sessions(idle: Duration, conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    let modifier = format!("-{} seconds", idle.as_secs());
    let result =
        sqlx::query("DELETE FROM sessions WHERE last_activity < strftime('%Y-%m-%d %H:%M:%f', 'now', ?)")
            .bind(modifier)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}
