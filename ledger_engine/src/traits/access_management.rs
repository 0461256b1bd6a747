use std::time::Duration;

use thiserror::Error;

use crate::{
    db_types::{AccessKey, LoginAttempt, LoginLogEntry, NewAccessKey, Session},
    traits::LoginOutcome,
};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Access key already exists")]
    DuplicateKey,
    #[error("Access key {0} does not exist")]
    KeyNotFound(i64),
    #[error("{0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Access keys, sessions and the login audit log.
///
/// A cabinet may hold at most one session at a time. A login for a cabinet with a live session is rejected, never
/// replaces the existing session, and is recorded in the login log either way.
#[allow(async_fn_in_trait)]
pub trait AccessManagement {
    /// Checks the key, enforces the single-session rule, opens a session and writes the login log entry.
    ///
    /// An unknown or inactive key is not an error: it is reported as [`LoginOutcome::InvalidKey`] and logged against
    /// the `unknown` cabinet.
    async fn login(&self, attempt: LoginAttempt) -> Result<LoginOutcome, AuthApiError>;

    /// Refreshes the session's last activity time. Returns `false` if the session does not exist.
    async fn touch_session(&self, session_id: &str) -> Result<bool, AuthApiError>;

    async fn fetch_session(&self, session_id: &str) -> Result<Option<Session>, AuthApiError>;

    /// Returns the number of sessions removed.
    async fn delete_session(&self, session_id: &str) -> Result<u64, AuthApiError>;

    /// Returns the number of sessions removed.
    async fn delete_sessions_for_cabinet(&self, cabinet: &str) -> Result<u64, AuthApiError>;

    /// Removes sessions that have been idle for longer than `idle`. Returns the number removed.
    async fn delete_idle_sessions(&self, idle: Duration) -> Result<u64, AuthApiError>;

    async fn fetch_access_keys(&self) -> Result<Vec<AccessKey>, AuthApiError>;

    /// Fails with `DuplicateKey` if the key string is already in use.
    async fn insert_access_key(&self, key: NewAccessKey) -> Result<AccessKey, AuthApiError>;

    async fn set_access_key_active(&self, id: i64, active: bool) -> Result<AccessKey, AuthApiError>;

    /// Returns the number of keys removed.
    async fn delete_access_key(&self, id: i64) -> Result<u64, AuthApiError>;

    /// The most recent `limit` login attempts, newest first.
    async fn fetch_login_logs(&self, limit: i64) -> Result<Vec<LoginLogEntry>, AuthApiError>;
}
