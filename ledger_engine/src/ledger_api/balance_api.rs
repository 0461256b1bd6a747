//! Balances, as cabinets and administrators see them.
use std::{collections::BTreeMap, fmt::Debug};

use ledger_common::helpers::non_empty;
use log::*;

use crate::{
    db_types::{AdminLogEntry, Amount, Balance, BalanceOverride},
    helpers::known_cabinets,
    ledger_api::required,
    traits::{LedgerError, LedgerManagement},
};

pub struct BalanceApi<B> {
    db: B,
}

impl<B: Debug> Debug for BalanceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BalanceApi ({:?})", self.db)
    }
}

impl<B> BalanceApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// What `cabinet` holds toward every other cabinet. Positive means the counterparty owes `cabinet`.
    ///
    /// Every known cabinet other than `cabinet` appears in the result, with zero if no row exists yet.
    pub async fn balances_for_cabinet(&self, cabinet: &str) -> Result<BTreeMap<String, Amount>, LedgerError> {
        let rows = self.db.fetch_balances_for_cabinet(cabinet).await?;
        trace!("💰️ {} balance rows for {cabinet}", rows.len());
        Ok(perspective(cabinet, &rows, &known_cabinets()))
    }

    pub async fn all_balances(&self) -> Result<Vec<Balance>, LedgerError> {
        self.db.fetch_all_balances().await
    }

    /// Overwrites a balance row on behalf of an administrator. Both the admin name and a comment are mandatory.
    pub async fn set_balance(
        &self,
        balance_id: i64,
        amount: Amount,
        admin_name: Option<&str>,
        comment: Option<&str>,
    ) -> Result<(Balance, AdminLogEntry), LedgerError> {
        let admin_name = non_empty(admin_name)
            .ok_or_else(|| LedgerError::ValidationError("An admin name is required".to_string()))?;
        let comment = required(comment.unwrap_or_default(), "A comment")?;
        let update = BalanceOverride { balance_id, amount, admin_name: admin_name.to_string(), comment };
        self.db.override_balance(update).await
    }

    /// Creates the zero rows for every pair of `cabinets` that doesn't have one yet.
    pub async fn initialise_balances(&self, cabinets: &[String]) -> Result<u64, LedgerError> {
        let created = self.db.initialise_balances(cabinets).await?;
        info!("💰️ {created} new balance rows created");
        Ok(created)
    }
}

/// Folds the balance rows touching `cabinet` into a map keyed by counterparty, zero-filled for the `known` cabinets.
pub fn perspective(cabinet: &str, rows: &[Balance], known: &[String]) -> BTreeMap<String, Amount> {
    let mut result = known
        .iter()
        .filter(|c| c.as_str() != cabinet)
        .map(|c| (c.clone(), Amount::ZERO))
        .collect::<BTreeMap<_, _>>();
    for row in rows {
        if let (Some(other), Some(amount)) = (row.counterparty(cabinet), row.amount_for(cabinet)) {
            result.insert(other.to_string(), amount);
        }
    }
    result
}
