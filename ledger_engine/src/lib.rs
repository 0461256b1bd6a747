//! Cabinet Ledger Engine
//!
//! The engine holds the business rules of the cabinet ledger: a set of exchange cabinets that owe each other money.
//! Every pair of cabinets shares one balance row. Orders and withdrawals move money along those rows when they are
//! settled, and administrators can overwrite a row directly, which is always audited.
//!
//! The library is divided into three main sections:
//! 1. The storage traits ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). You
//!    should not need to call the backend directly. The data types used by the backend live in [`mod@db_types`] and
//!    are public.
//! 2. The public API. [`BalanceApi`], [`OrderFlowApi`], [`WithdrawalApi`], [`HistoryApi`], [`AccessApi`] and
//!    [`TelegramApi`] wrap any backend implementing the matching trait and add validation and logging.
//! 3. Events ([`mod@events`]). A successful login from a new IP address emits a [`events::NewIpLoginEvent`] that
//!    hooks can subscribe to.
pub mod db_types;
pub mod events;
pub mod helpers;
mod ledger_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use ledger_api::{
    access_api::{AccessApi, DEFAULT_LOGIN_LOG_LIMIT},
    balance_api::{perspective, BalanceApi},
    history_api::HistoryApi,
    history_objects::{merge_history, HistoryEntry},
    order_flow_api::OrderFlowApi,
    telegram_api::{TelegramApi, TelegramLogin},
    withdrawal_api::WithdrawalApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    AccessManagement,
    AuthApiError,
    HistoryManagement,
    LedgerError,
    LedgerManagement,
    LoginOutcome,
    OrderManagement,
    SessionGrant,
    TelegramApiError,
    TelegramManagement,
    WithdrawalManagement,
};
