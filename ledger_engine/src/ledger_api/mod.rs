//! # Cabinet ledger public API
//!
//! The `ledger_api` module exposes the programmatic API of the ledger. Each API object wraps a backend that implements
//! the matching trait from [`crate::traits`], so callers (and tests) can plug in any backend, including mocks.
//!
//! * [`balance_api`] reads balances from a cabinet's point of view and applies admin overrides.
//! * [`order_flow_api`] creates, settles and cancels orders and order requests.
//! * [`withdrawal_api`] creates, confirms and deletes withdrawals.
//! * [`history_api`] merges the completed orders, completed withdrawals and admin adjustments into one feed.
//! * [`access_api`] handles logins, sessions and access keys.
//! * [`telegram_api`] handles Telegram identities.
//!
//! # API usage
//!
//! ```rust,ignore
//! use ledger_engine::{BalanceApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/cabinet_ledger.db", 5).await?;
//! let api = BalanceApi::new(db);
//! let view = api.balances_for_cabinet("Кабінет 1 UA").await?;
//! ```
pub mod access_api;
pub mod balance_api;
pub mod history_api;
pub mod history_objects;
pub mod order_flow_api;
pub mod telegram_api;
pub mod withdrawal_api;

use ledger_common::helpers::non_empty;

use crate::traits::LedgerError;

/// Returns the trimmed field, or a validation error naming it.
pub(crate) fn required(value: &str, field: &str) -> Result<String, LedgerError> {
    non_empty(Some(value)).map(String::from).ok_or_else(|| LedgerError::ValidationError(format!("{field} is required")))
}
