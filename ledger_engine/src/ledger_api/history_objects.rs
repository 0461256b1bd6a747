use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{AdminLogEntry, Order, Withdrawal};

/// One line of the transaction history. Serialises flat, with an `operation_type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation_type", rename_all = "snake_case")]
pub enum HistoryEntry {
    Order(Order),
    Withdrawal(Withdrawal),
    BalanceAdjustment(AdminLogEntry),
}

impl HistoryEntry {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            HistoryEntry::Order(o) => o.created_at,
            HistoryEntry::Withdrawal(w) => w.created_at,
            HistoryEntry::BalanceAdjustment(a) => a.created_at,
        }
    }
}

/// Merges the three sources into one list, newest first.
///
/// Entries with equal timestamps keep their source order: orders, then withdrawals, then adjustments.
pub fn merge_history(
    orders: Vec<Order>,
    withdrawals: Vec<Withdrawal>,
    adjustments: Vec<AdminLogEntry>,
) -> Vec<HistoryEntry> {
    let mut entries = orders
        .into_iter()
        .map(HistoryEntry::Order)
        .chain(withdrawals.into_iter().map(HistoryEntry::Withdrawal))
        .chain(adjustments.into_iter().map(HistoryEntry::BalanceAdjustment))
        .collect::<Vec<_>>();
    // sort_by is stable
    entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    entries
}
