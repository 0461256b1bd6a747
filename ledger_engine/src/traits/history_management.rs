use crate::{
    db_types::{AdminLogEntry, Order, Withdrawal},
    traits::LedgerError,
};

/// Raw history feeds. Each method filters on `cabinet` (either party) when one is given and returns rows newest first.
#[allow(async_fn_in_trait)]
pub trait HistoryManagement {
    async fn fetch_completed_orders(&self, cabinet: Option<&str>) -> Result<Vec<Order>, LedgerError>;

    async fn fetch_completed_withdrawals(&self, cabinet: Option<&str>) -> Result<Vec<Withdrawal>, LedgerError>;

    async fn fetch_balance_adjustments(&self, cabinet: Option<&str>) -> Result<Vec<AdminLogEntry>, LedgerError>;
}
