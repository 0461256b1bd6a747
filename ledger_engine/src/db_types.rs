use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use ledger_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

//--------------------------------------       Balance       ---------------------------------------------------------
/// A directed balance row. `amount` is what `cabinet_from` sees toward `cabinet_to`; `cabinet_to` sees the negation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Balance {
    pub id: i64,
    pub cabinet_from: String,
    pub cabinet_to: String,
    pub amount: Amount,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// The amount as seen by `cabinet`, or `None` if the cabinet is not a party to this row.
    pub fn amount_for(&self, cabinet: &str) -> Option<Amount> {
        if self.cabinet_from == cabinet {
            Some(self.amount)
        } else if self.cabinet_to == cabinet {
            Some(-self.amount)
        } else {
            None
        }
    }

    /// The other party of this row, from the point of view of `cabinet`.
    pub fn counterparty(&self, cabinet: &str) -> Option<&str> {
        if self.cabinet_from == cabinet {
            Some(self.cabinet_to.as_str())
        } else if self.cabinet_to == cabinet {
            Some(self.cabinet_from.as_str())
        } else {
            None
        }
    }
}

/// An administrative overwrite of a balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceOverride {
    pub balance_id: i64,
    pub amount: Amount,
    pub admin_name: String,
    pub comment: String,
}

//--------------------------------------     AdminLogEntry     -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub id: i64,
    pub admin_name: String,
    pub action_type: String,
    pub cabinet_from: String,
    pub cabinet_to: String,
    pub amount_old: Amount,
    pub amount_new: Amount,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

pub const BALANCE_UPDATE_ACTION: &str = "balance_update";

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Waiting to be paid
    Pending,
    /// Paid. The balance between the two cabinets has been adjusted.
    Completed,
    /// Withdrawn before payment.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub request_id: Option<i64>,
    pub from_cabinet: String,
    pub to_cabinet: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub amount_usdt: Amount,
    pub amount_local: Option<Amount>,
    pub card_number: Option<String>,
    pub iban: Option<String>,
    pub tax_number: Option<String>,
    pub cvu: Option<String>,
    pub full_name: Option<String>,
    pub note: Option<String>,
    pub status: OrderStatusType,
    pub receipts: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

// Receipts are kept as a JSON array in a text column, so `FromRow` can't be derived.
impl<'r> FromRow<'r, SqliteRow> for Order {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let receipts = row
            .try_get::<Option<String>, _>("receipts")?
            .map(|s| serde_json::from_str::<Vec<String>>(&s))
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "receipts".into(), source: Box::new(e) })?;
        Ok(Self {
            id: row.try_get("id")?,
            request_id: row.try_get("request_id")?,
            from_cabinet: row.try_get("from_cabinet")?,
            to_cabinet: row.try_get("to_cabinet")?,
            order_type: row.try_get("type")?,
            amount_usdt: row.try_get("amount_usdt")?,
            amount_local: row.try_get("amount_local")?,
            card_number: row.try_get("card_number")?,
            iban: row.try_get("iban")?,
            tax_number: row.try_get("tax_number")?,
            cvu: row.try_get("cvu")?,
            full_name: row.try_get("full_name")?,
            note: row.try_get("note")?,
            status: row.try_get("status")?,
            receipts,
            created_at: row.try_get("created_at")?,
        })
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// The order request this order fills, if any
    #[serde(default)]
    pub request_id: Option<i64>,
    pub from_cabinet: String,
    pub to_cabinet: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub amount_usdt: Amount,
    #[serde(default)]
    pub amount_local: Option<Amount>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub cvu: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(from: S, to: S, order_type: S, amount_usdt: Amount) -> Self {
        Self {
            from_cabinet: from.into(),
            to_cabinet: to.into(),
            order_type: order_type.into(),
            amount_usdt,
            ..Default::default()
        }
    }

    pub fn with_request_id(mut self, request_id: i64) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }
}

//--------------------------------------     OrderRequest      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: i64,
    pub from_cabinet: String,
    pub to_cabinet: String,
    pub amount: Amount,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub request_type: String,
    pub remaining_amount: Amount,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub from_cabinet: String,
    pub to_cabinet: String,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub request_type: String,
}

impl NewOrderRequest {
    pub fn new<S: Into<String>>(from: S, to: S, request_type: S, amount: Amount) -> Self {
        Self { from_cabinet: from.into(), to_cabinet: to.into(), amount, request_type: request_type.into() }
    }
}

//--------------------------------------  WithdrawalStatusType  -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatusType {
    Pending,
    Completed,
}

impl Display for WithdrawalStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WithdrawalStatusType::Pending => write!(f, "pending"),
            WithdrawalStatusType::Completed => write!(f, "completed"),
        }
    }
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub from_cabinet: String,
    pub to_cabinet: String,
    pub amount: Amount,
    pub address: String,
    pub status: WithdrawalStatusType,
    pub txid: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWithdrawal {
    pub from_cabinet: String,
    pub to_cabinet: String,
    pub amount: Amount,
    pub address: String,
}

impl NewWithdrawal {
    pub fn new<S: Into<String>>(from: S, to: S, amount: Amount, address: S) -> Self {
        Self { from_cabinet: from.into(), to_cabinet: to.into(), amount, address: address.into() }
    }
}

//--------------------------------------       AccessKey       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AccessKey {
    pub id: i64,
    pub access_key: String,
    pub cabinet: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccessKey {
    pub access_key: String,
    pub cabinet: String,
    #[serde(default)]
    pub description: Option<String>,
}

//--------------------------------------        Session        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub cabinet: String,
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

//--------------------------------------       LoginStatus       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Success,
    RejectedSessionExists,
    InvalidKey,
}

impl Display for LoginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginStatus::Success => write!(f, "success"),
            LoginStatus::RejectedSessionExists => write!(f, "rejected_session_exists"),
            LoginStatus::InvalidKey => write!(f, "invalid_key"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LoginLogEntry {
    pub id: i64,
    pub cabinet: String,
    pub ip_address: String,
    pub user_agent: String,
    pub status: LoginStatus,
    pub created_at: DateTime<Utc>,
}

/// Cabinet name recorded against login attempts that used an unknown or inactive key.
pub const UNKNOWN_CABINET: &str = "unknown";

/// The facts about a login attempt that are known before the key has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub access_key: String,
    pub ip_address: String,
    pub user_agent: String,
}

impl LoginAttempt {
    pub fn new<S: Into<String>>(access_key: S, ip_address: S, user_agent: S) -> Self {
        Self { access_key: access_key.into(), ip_address: ip_address.into(), user_agent: user_agent.into() }
    }
}

//--------------------------------------     TelegramUser      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub telegram_id: i64,
    pub cabinet: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields supplied by a verified Telegram login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
}
