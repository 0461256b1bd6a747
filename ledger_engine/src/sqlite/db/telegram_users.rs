use sqlx::SqliteConnection;

use crate::{
    db_types::{TelegramProfile, TelegramUser},
    traits::TelegramApiError,
};

pub async fn upsert_user(
    profile: &TelegramProfile,
    conn: &mut SqliteConnection,
) -> Result<TelegramUser, TelegramApiError> {
    let q = format!(
        "INSERT INTO telegram_users (telegram_id, username, first_name, last_name, photo_url) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT (telegram_id) DO UPDATE SET username = excluded.username, first_name = excluded.first_name, \
         last_name = excluded.last_name, photo_url = excluded.photo_url, updated_at = {} RETURNING *",
        super::NOW
    );
    let row = sqlx::query_as::<_, TelegramUser>(&q)
        .bind(profile.telegram_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.photo_url)
        .fetch_all(conn)
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(row)
}

pub async fn users_for_cabinet(
    cabinet: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<TelegramUser>, TelegramApiError> {
    let rows = sqlx::query_as::<_, TelegramUser>("SELECT * FROM telegram_users WHERE cabinet = ?")
        .bind(cabinet)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn set_cabinet(
    telegram_id: i64,
    cabinet: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<TelegramUser>, TelegramApiError> {
    let q =
        format!("UPDATE telegram_users SET cabinet = ?, updated_at = {} WHERE telegram_id = ? RETURNING *", super::NOW);
    let row = sqlx::query_as::<_, TelegramUser>(&q).bind(cabinet).bind(telegram_id).fetch_all(conn).await?.pop();
    Ok(row)
}

pub async fn all_users(conn: &mut SqliteConnection) -> Result<Vec<TelegramUser>, TelegramApiError> {
    let rows = sqlx::query_as::<_, TelegramUser>("SELECT * FROM telegram_users ORDER BY created_at DESC, id DESC")
        .fetch_all(conn)
        .await?;
    Ok(rows)
}
