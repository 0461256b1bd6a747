//! Telegram identities.
//!
//! The signature on a Telegram login is checked before anything reaches this API. Here a verified login is recorded
//! (creating or refreshing the user), and admins bind users to cabinets. A cabinet is bound to at most one user.
use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{TelegramProfile, TelegramUser},
    traits::{TelegramApiError, TelegramManagement},
};

/// The result of a verified Telegram login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramLogin {
    pub user: TelegramUser,
    pub has_cabinet: bool,
}

pub struct TelegramApi<B> {
    db: B,
}

impl<B: Debug> Debug for TelegramApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TelegramApi ({:?})", self.db)
    }
}

impl<B> TelegramApi<B>
where B: TelegramManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn login(&self, profile: TelegramProfile) -> Result<TelegramLogin, TelegramApiError> {
        let user = self.db.upsert_telegram_user(profile).await?;
        let has_cabinet = user.cabinet.is_some();
        debug!("✈️ Telegram user {} logged in. Bound cabinet: {:?}", user.telegram_id, user.cabinet);
        Ok(TelegramLogin { user, has_cabinet })
    }

    pub async fn bind_cabinet(&self, telegram_id: i64, cabinet: &str) -> Result<TelegramUser, TelegramApiError> {
        let cabinet = cabinet.trim();
        if cabinet.is_empty() {
            return Err(TelegramApiError::ValidationError("A cabinet is required".to_string()));
        }
        let user = self.db.bind_cabinet(telegram_id, cabinet).await?;
        info!("✈️ Telegram user {telegram_id} is now bound to {cabinet}");
        Ok(user)
    }

    pub async fn users(&self) -> Result<Vec<TelegramUser>, TelegramApiError> {
        self.db.fetch_telegram_users().await
    }
}
