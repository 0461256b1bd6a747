//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Amounts are stored as whole cents. Timestamps are stored as UTC text with millisecond precision
//! (`YYYY-MM-DD HH:MM:SS.sss`), which sorts correctly as a string.
//!
//! Writes with a `RETURNING` clause are read with `fetch_all`. SQLite only finishes an autocommit write once the
//! statement has been stepped to the end, and `fetch_one`/`fetch_optional` stop after the first row. The connection
//! would go back to the pool with the write still open, and readers on other connections would not see it.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod access_keys;
pub mod admin_logs;
pub mod balances;
pub mod hidden;
pub mod login_logs;
pub mod order_requests;
pub mod orders;
pub mod sessions;
pub mod telegram_users;
pub mod withdrawals;

const SQLITE_DB_URL: &str = "sqlite://data/cabinet_ledger.db";
const BUSY_TIMEOUT_SECS: u64 = 30;

/// SQL expression for "now", in the same format the schema defaults use.
pub(crate) const NOW: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

pub fn db_url() -> String {
    let result = env::var("CLS_DATABASE_URL").unwrap_or_else(|_| {
        info!("CLS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    // Writers queue on the busy timeout instead of failing with SQLITE_BUSY.
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
