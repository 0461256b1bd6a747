//! Balance rows. There is one directed row per unordered pair of cabinets, so every lookup by pair has to check both
//! orderings.
use log::{trace, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Amount, Balance},
    traits::LedgerError,
};

pub async fn balances_for_cabinet(cabinet: &str, conn: &mut SqliteConnection) -> Result<Vec<Balance>, LedgerError> {
    let rows = sqlx::query_as::<_, Balance>(
        "SELECT * FROM balances WHERE cabinet_from = ? OR cabinet_to = ? ORDER BY cabinet_from, cabinet_to",
    )
    .bind(cabinet)
    .bind(cabinet)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn all_balances(conn: &mut SqliteConnection) -> Result<Vec<Balance>, LedgerError> {
    let rows = sqlx::query_as::<_, Balance>("SELECT * FROM balances ORDER BY cabinet_from, cabinet_to")
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Returns the current row after a no-op write, so the caller's transaction holds the write lock from here on.
pub async fn lock_balance(id: i64, conn: &mut SqliteConnection) -> Result<Option<Balance>, LedgerError> {
    let row = sqlx::query_as::<_, Balance>("UPDATE balances SET amount = amount WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_all(conn)
        .await?
        .pop();
    Ok(row)
}

/// All rows for the unordered pair `{a, b}`. A healthy ledger returns zero or one row.
pub async fn balances_for_pair(a: &str, b: &str, conn: &mut SqliteConnection) -> Result<Vec<Balance>, LedgerError> {
    let rows = sqlx::query_as::<_, Balance>(
        "SELECT * FROM balances WHERE (cabinet_from = ? AND cabinet_to = ?) OR (cabinet_from = ? AND cabinet_to = ?)",
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Adds `delta` to the row in a single statement, so concurrent adjustments never overwrite each other.
pub async fn add_to_balance(id: i64, delta: Amount, conn: &mut SqliteConnection) -> Result<Balance, LedgerError> {
    let q = format!("UPDATE balances SET amount = amount + ?, updated_at = {} WHERE id = ? RETURNING *", super::NOW);
    let row = sqlx::query_as::<_, Balance>(&q)
        .bind(delta)
        .bind(id)
        .fetch_all(conn)
        .await?
        .pop()
        .ok_or(LedgerError::BalanceNotFound(id))?;
    Ok(row)
}

pub async fn set_balance(id: i64, amount: Amount, conn: &mut SqliteConnection) -> Result<Option<Balance>, LedgerError> {
    let q = format!("UPDATE balances SET amount = ?, updated_at = {} WHERE id = ? RETURNING *", super::NOW);
    let row = sqlx::query_as::<_, Balance>(&q).bind(amount).bind(id).fetch_all(conn).await?.pop();
    Ok(row)
}

/// Creates a zero row for `(a, b)` unless the pair already has a row in either ordering.
pub async fn insert_pair_if_missing(a: &str, b: &str, conn: &mut SqliteConnection) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        "INSERT INTO balances (cabinet_from, cabinet_to, amount) SELECT ?, ?, 0 WHERE NOT EXISTS (SELECT 1 FROM \
         balances WHERE (cabinet_from = ? AND cabinet_to = ?) OR (cabinet_from = ? AND cabinet_to = ?))",
    )
    .bind(a)
    .bind(b)
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Applies the balance effect of `payer` settling `amount` with `payee`.
///
/// On the pair's row, the amount goes down by `amount` when the payer is `cabinet_from`, and up by `amount`
/// otherwise. If the pair has no row the adjustment is skipped and `None` is returned. If both orderings exist the
/// ledger is corrupt and the call fails, which rolls back the caller's transaction.
pub async fn apply_settlement(
    payer: &str,
    payee: &str,
    amount: Amount,
    conn: &mut SqliteConnection,
) -> Result<Option<Balance>, LedgerError> {
    let rows = balances_for_pair(payer, payee, conn).await?;
    match rows.as_slice() {
        [] => {
            warn!("🗃️ No balance row exists between {payer} and {payee}. The {amount} settlement was not recorded.");
            Ok(None)
        },
        [row] => {
            let delta = if row.cabinet_from == payer { -amount } else { amount };
            let updated = add_to_balance(row.id, delta, conn).await?;
            trace!("🗃️ Balance #{} ({payer} pays {payee}) moved by {delta} to {}", row.id, updated.amount);
            Ok(Some(updated))
        },
        rows => {
            let ids = rows.iter().map(|r| r.id.to_string()).collect::<Vec<_>>().join(", ");
            Err(LedgerError::InvariantViolation(format!(
                "Found {} balance rows ({ids}) between {payer} and {payee}. Only one is allowed.",
                rows.len()
            )))
        },
    }
}
