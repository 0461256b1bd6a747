use thiserror::Error;

use crate::db_types::{TelegramProfile, TelegramUser};

#[derive(Debug, Clone, Error)]
pub enum TelegramApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cabinet {0} is already bound to another Telegram account")]
    CabinetAlreadyBound(String),
    #[error("Telegram user {0} is not registered")]
    UserNotFound(i64),
    #[error("{0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for TelegramApiError {
    fn from(e: sqlx::Error) -> Self {
        TelegramApiError::DatabaseError(e.to_string())
    }
}

/// Storage for Telegram identities. Signature checks happen before these methods are called.
#[allow(async_fn_in_trait)]
pub trait TelegramManagement {
    /// Inserts the user, or refreshes the profile fields of an existing one. The cabinet binding is left untouched.
    async fn upsert_telegram_user(&self, profile: TelegramProfile) -> Result<TelegramUser, TelegramApiError>;

    /// Binds `cabinet` to the Telegram user. Fails if another Telegram user holds the cabinet.
    async fn bind_cabinet(&self, telegram_id: i64, cabinet: &str) -> Result<TelegramUser, TelegramApiError>;

    /// All users, newest first.
    async fn fetch_telegram_users(&self) -> Result<Vec<TelegramUser>, TelegramApiError>;
}
