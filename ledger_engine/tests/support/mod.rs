#![allow(dead_code)]
pub mod prepare_env;

use ledger_engine::{db_types::Amount, helpers::known_cabinets, BalanceApi, SqliteDatabase};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const UA1: &str = "Кабінет 1 UA";
pub const UA2: &str = "Кабінет 2 UA";
pub const UA3: &str = "Кабінет 3 UA";

/// A fresh, migrated database with zero balances between all the known cabinets.
pub async fn setup() -> SqliteDatabase {
    let url = prepare_env::random_db_path();
    prepare_env::prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    BalanceApi::new(db.clone()).initialise_balances(&known_cabinets()).await.expect("Error initialising balances");
    db
}

pub async fn tear_down(mut db: SqliteDatabase) {
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    let _ = Sqlite::drop_database(db.url()).await;
}

/// Makes `a` hold `amount` toward `b`, as an admin would.
pub async fn set_pair_balance(db: &SqliteDatabase, a: &str, b: &str, amount: Amount) {
    let api = BalanceApi::new(db.clone());
    let row = api
        .all_balances()
        .await
        .unwrap()
        .into_iter()
        .find(|r| (r.cabinet_from == a && r.cabinet_to == b) || (r.cabinet_from == b && r.cabinet_to == a))
        .expect("balance row");
    let amount = if row.cabinet_from == a { amount } else { -amount };
    api.set_balance(row.id, amount, Some("ADMIN 1"), Some("test setup")).await.unwrap();
}

/// The balance `a` holds toward `b`.
pub async fn balance(db: &SqliteDatabase, a: &str, b: &str) -> Amount {
    let view = BalanceApi::new(db.clone()).balances_for_cabinet(a).await.unwrap();
    view[b]
}
