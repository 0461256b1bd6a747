use thiserror::Error;

use crate::db_types::{AdminLogEntry, Balance, BalanceOverride};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order request {0} does not exist")]
    OrderRequestNotFound(i64),
    #[error("Withdrawal {0} does not exist")]
    WithdrawalNotFound(i64),
    #[error("Balance {0} does not exist")]
    BalanceNotFound(i64),
    #[error("{0} has already been settled")]
    AlreadySettled(String),
    #[error("Cannot move {entity} from {from} to {to}")]
    InvalidTransition { entity: String, from: String, to: String },
    #[error("Ledger invariant violated. {0}")]
    InvariantViolation(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The `LedgerManagement` trait covers direct access to the balance rows.
///
/// Settlement-driven balance changes are not part of this trait. They happen inside the order and withdrawal
/// backends so that the status change and the balance change share a transaction.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// All balance rows in which `cabinet` is either party.
    async fn fetch_balances_for_cabinet(&self, cabinet: &str) -> Result<Vec<Balance>, LedgerError>;

    /// Every balance row, ordered by `cabinet_from`, then `cabinet_to`.
    async fn fetch_all_balances(&self) -> Result<Vec<Balance>, LedgerError>;

    /// Overwrites a balance row and appends an admin log entry in the same transaction.
    ///
    /// The caller is responsible for validating the actor name and comment; backends only trim and store them.
    async fn override_balance(&self, update: BalanceOverride) -> Result<(Balance, AdminLogEntry), LedgerError>;

    /// Creates a zero balance row for every unordered pair in `cabinets` that does not have one yet.
    /// Returns the number of rows created.
    async fn initialise_balances(&self, cabinets: &[String]) -> Result<u64, LedgerError>;
}
