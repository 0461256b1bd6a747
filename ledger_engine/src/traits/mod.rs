//! #  Backend contracts.
//!
//! This module defines the behaviour a storage backend must expose to act as a cabinet ledger store.
//!
//! ## Ledger
//! Every pair of cabinets shares exactly one directed balance row. Settling an order or confirming a withdrawal moves
//! value along that row; an administrator may also overwrite it, which leaves an entry in the admin log.
//!
//! ## Traits
//! * [`LedgerManagement`] reads and overrides balance rows.
//! * [`OrderManagement`] runs the order and order-request lifecycles, including settlement.
//! * [`WithdrawalManagement`] runs the withdrawal lifecycle, including confirmation.
//! * [`HistoryManagement`] provides the raw feeds that make up a cabinet's history.
//! * [`AccessManagement`] handles access keys, sessions and the login log.
//! * [`TelegramManagement`] stores Telegram identities and their cabinet bindings.
mod access_management;
mod data_objects;
mod history_management;
mod ledger_management;
mod order_management;
mod telegram_management;
mod withdrawal_management;

pub use access_management::{AccessManagement, AuthApiError};
pub use data_objects::{LoginOutcome, SessionGrant};
pub use history_management::HistoryManagement;
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::OrderManagement;
pub use telegram_management::{TelegramApiError, TelegramManagement};
pub use withdrawal_management::WithdrawalManagement;
