//! Sqlite database operations for access keys.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AccessManagement`] trait methods
//! that are implemented on the [`SqliteDatabase`] struct instead.
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccessKey, NewAccessKey},
    traits::AuthApiError,
};

/// Looks up an active key and stamps `last_used` in one statement. Inactive and unknown keys both return `None`.
pub async fn use_active_key(key: &str, conn: &mut SqliteConnection) -> Result<Option<AccessKey>, AuthApiError> {
    let q = format!(
        "UPDATE access_keys SET last_used = {} WHERE access_key = ? AND is_active = 1 RETURNING *",
        super::NOW
    );
    let row = sqlx::query_as::<_, AccessKey>(&q).bind(key).fetch_all(conn).await?.pop();
    Ok(row)
}

pub async fn all_access_keys(conn: &mut SqliteConnection) -> Result<Vec<AccessKey>, AuthApiError> {
    let rows = sqlx::query_as::<_, AccessKey>("SELECT * FROM access_keys ORDER BY cabinet, id").fetch_all(conn).await?;
    Ok(rows)
}

pub async fn insert_access_key(key: &NewAccessKey, conn: &mut SqliteConnection) -> Result<AccessKey, AuthApiError> {
    sqlx::query_as::<_, AccessKey>(
        "INSERT INTO access_keys (access_key, cabinet, description) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(&key.access_key)
    .bind(&key.cabinet)
    .bind(&key.description)
    .fetch_all(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(de) if de.is_unique_violation() => AuthApiError::DuplicateKey,
        e => AuthApiError::from(e),
    })?
    .pop()
    .ok_or_else(|| AuthApiError::from(sqlx::Error::RowNotFound))
}

pub async fn set_active(id: i64, active: bool, conn: &mut SqliteConnection) -> Result<AccessKey, AuthApiError> {
    sqlx::query_as::<_, AccessKey>("UPDATE access_keys SET is_active = ? WHERE id = ? RETURNING *")
        .bind(active)
        .bind(id)
        .fetch_all(conn)
        .await?
        .pop()
        .ok_or(AuthApiError::KeyNotFound(id))
}

pub async fn delete_access_key(id: i64, conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    let result = sqlx::query("DELETE FROM access_keys WHERE id = ?").bind(id).execute(conn).await?;
    Ok(result.rows_affected())
}
