//! Request bodies, query strings and response shapes for the HTTP API.
//!
//! Field names follow the browser client, which is why a few of them are camelCase.
use ledger_common::Amount;
use ledger_engine::{db_types::TelegramUser, LoginOutcome, TelegramLogin};
use serde::{Deserialize, Serialize};

pub const INVALID_KEY_MESSAGE: &str = "Невірний ключ доступу";
pub const SESSION_EXISTS_MESSAGE: &str = "Цей кабінет вже використовується іншим користувачем";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayOrderRequest {
    #[serde(default)]
    pub receipts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HideRequest {
    pub cabinet: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmWithdrawalRequest {
    #[serde(default)]
    pub txid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceUpdateRequest {
    pub amount: Amount,
    #[serde(default)]
    pub admin_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindCabinetRequest {
    pub telegram_id: i64,
    pub cabinet: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginLogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub cabinet: Option<String>,
}

/// `{"success": true}`, for mutations that have nothing else to say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSuccess {
    pub success: bool,
}

impl JsonSuccess {
    pub fn new() -> Self {
        Self { success: true }
    }
}

impl Default for JsonSuccess {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub valid: bool,
}

/// The login reply. A bad key or a busy cabinet is still a 200 response, with `success: false` and an error message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabinet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResponse {
    pub fn failure(message: &str) -> Self {
        Self { success: false, error: Some(message.to_string()), ..Default::default() }
    }
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        match outcome {
            LoginOutcome::Success(grant) => {
                let ip_changed = grant.ip_changed();
                Self {
                    success: true,
                    cabinet: Some(grant.cabinet),
                    session_id: Some(grant.session_id),
                    ip_changed: Some(ip_changed),
                    error: None,
                }
            },
            LoginOutcome::SessionExists { .. } => Self::failure(SESSION_EXISTS_MESSAGE),
            LoginOutcome::InvalidKey => Self::failure(INVALID_KEY_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUserSummary {
    pub telegram_id: i64,
    pub cabinet: Option<String>,
    pub first_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub has_cabinet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramLoginResponse {
    pub success: bool,
    pub user: TelegramUserSummary,
}

impl From<TelegramLogin> for TelegramLoginResponse {
    fn from(login: TelegramLogin) -> Self {
        let TelegramLogin { user, has_cabinet } = login;
        let TelegramUser { telegram_id, cabinet, first_name, username, photo_url, .. } = user;
        Self {
            success: true,
            user: TelegramUserSummary { telegram_id, cabinet, first_name, username, photo_url, has_cabinet },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindCabinetResponse {
    pub success: bool,
    pub cabinet: Option<String>,
}
