//! Withdrawals from one cabinet to another.
//!
//! A pending withdrawal has no effect on balances. Confirming it (usually with a transaction id) moves the amount from
//! `from_cabinet` to `to_cabinet`, exactly like paying an order.
use std::fmt::Debug;

use ledger_common::helpers::non_empty;
use log::*;

use crate::{
    db_types::{NewWithdrawal, Withdrawal},
    ledger_api::required,
    traits::{LedgerError, WithdrawalManagement},
};

pub struct WithdrawalApi<B> {
    db: B,
}

impl<B: Debug> Debug for WithdrawalApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi ({:?})", self.db)
    }
}

impl<B> WithdrawalApi<B>
where B: WithdrawalManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_withdrawal(&self, mut withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        withdrawal.from_cabinet = required(&withdrawal.from_cabinet, "from_cabinet")?;
        withdrawal.to_cabinet = required(&withdrawal.to_cabinet, "to_cabinet")?;
        withdrawal.address = required(&withdrawal.address, "address")?;
        if !withdrawal.amount.is_positive() {
            return Err(LedgerError::ValidationError("amount must be positive".to_string()));
        }
        self.db.insert_withdrawal(withdrawal).await
    }

    /// Blank transaction ids are stored as `NULL`.
    pub async fn confirm_withdrawal(&self, id: i64, txid: Option<&str>) -> Result<Withdrawal, LedgerError> {
        let txid = non_empty(txid).map(String::from);
        let withdrawal = self.db.confirm_withdrawal(id, txid).await?;
        match &withdrawal.txid {
            Some(txid) => info!("💸️ Withdrawal #{id} confirmed with txid {txid}"),
            None => info!("💸️ Withdrawal #{id} confirmed without a txid"),
        }
        Ok(withdrawal)
    }

    /// Deletes the withdrawal. Deleting a confirmed withdrawal does not reverse its balance movement.
    pub async fn delete_withdrawal(&self, id: i64) -> Result<Option<Withdrawal>, LedgerError> {
        self.db.delete_withdrawal(id).await
    }

    pub async fn withdrawals_for_cabinet(&self, cabinet: &str) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals_for_cabinet(cabinet).await
    }

    pub async fn hide_withdrawal(&self, cabinet: &str, withdrawal_id: i64) -> Result<(), LedgerError> {
        let cabinet = required(cabinet, "cabinet")?;
        self.db.hide_withdrawal(&cabinet, withdrawal_id).await
    }
}
