use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    traits::LedgerError,
};

/// The withdrawal lifecycle. Withdrawals move `pending -> completed` exactly once.
#[allow(async_fn_in_trait)]
pub trait WithdrawalManagement {
    /// Stores a pending withdrawal. The current balance between the parties is not consulted.
    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;

    /// Marks a pending withdrawal as completed, with the transaction id if there is one, and applies the balance
    /// effect atomically. Fails with `AlreadySettled` if it was already completed.
    async fn confirm_withdrawal(&self, id: i64, txid: Option<String>) -> Result<Withdrawal, LedgerError>;

    /// Deletes a withdrawal at any status, returning the deleted row if there was one.
    /// Deleting a completed withdrawal does not reverse its balance effect.
    async fn delete_withdrawal(&self, id: i64) -> Result<Option<Withdrawal>, LedgerError>;

    /// Withdrawals where `cabinet` is either party, excluding those it has hidden, newest first.
    async fn fetch_withdrawals_for_cabinet(&self, cabinet: &str) -> Result<Vec<Withdrawal>, LedgerError>;

    /// Hides the withdrawal from `cabinet`'s listings. Idempotent.
    async fn hide_withdrawal(&self, cabinet: &str, withdrawal_id: i64) -> Result<(), LedgerError>;
}
