//! The merged transaction history.
use std::fmt::Debug;

use futures_util::try_join;

use crate::{
    ledger_api::history_objects::{merge_history, HistoryEntry},
    traits::{HistoryManagement, LedgerError},
};

pub struct HistoryApi<B> {
    db: B,
}

impl<B: Debug> Debug for HistoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HistoryApi ({:?})", self.db)
    }
}

impl<B> HistoryApi<B>
where B: HistoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Completed orders, completed withdrawals and balance adjustments involving `cabinet`, newest first.
    ///
    /// `None` returns the history of every cabinet. A cabinet name is matched literally; use
    /// [`crate::helpers::cabinet_filter`] to treat `all` or a blank name as `None`.
    pub async fn history(&self, cabinet: Option<&str>) -> Result<Vec<HistoryEntry>, LedgerError> {
        let (orders, withdrawals, adjustments) = try_join!(
            self.db.fetch_completed_orders(cabinet),
            self.db.fetch_completed_withdrawals(cabinet),
            self.db.fetch_balance_adjustments(cabinet)
        )?;
        Ok(merge_history(orders, withdrawals, adjustments))
    }
}
