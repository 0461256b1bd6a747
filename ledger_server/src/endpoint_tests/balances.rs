use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use ledger_common::Amount;
use ledger_engine::{
    db_types::{AdminLogEntry, Balance},
    traits::LedgerError,
    BalanceApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, patch_request},
    mocks::MockLedgerManager,
};
use crate::routes::{AllBalancesRoute, BalancesRoute, UpdateBalanceRoute};

fn configure(manager: MockLedgerManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(AllBalancesRoute::<MockLedgerManager>::new())
            .service(UpdateBalanceRoute::<MockLedgerManager>::new())
            .service(BalancesRoute::<MockLedgerManager>::new())
            .app_data(web::Data::new(BalanceApi::new(manager)));
    }
}

fn row(id: i64, from: &str, to: &str, cents: i64) -> Balance {
    Balance {
        id,
        cabinet_from: from.into(),
        cabinet_to: to.into(),
        amount: Amount::from_cents(cents),
        updated_at: Utc.with_ymd_and_hms(2024, 11, 3, 10, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn balances_from_one_cabinets_point_of_view() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockLedgerManager::new();
    manager
        .expect_fetch_balances_for_cabinet()
        .withf(|c| c == "Кабінет 1 UA")
        .returning(|_| {
            Ok(vec![row(1, "Кабінет 1 UA", "Кабінет 2 UA", 7_000), row(2, "Кабінет 3 UA", "Кабінет 1 UA", 1_050)])
        });
    let path = "/balances/%D0%9A%D0%B0%D0%B1%D1%96%D0%BD%D0%B5%D1%82%201%20UA";
    let (status, body) = get_request(path, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({
            "Кабінет 2 UA": 70.0,
            "Кабінет 3 UA": -10.5,
            "Кабінет 4 UA": 0.0,
            "Кабінет 1 ARS": 0.0,
            "Кабінет 2 ARS": 0.0,
        })
    );
}

#[actix_web::test]
async fn all_balances() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockLedgerManager::new();
    manager.expect_fetch_all_balances().returning(|| Ok(vec![row(1, "Кабінет 1 UA", "Кабінет 2 UA", 7_000)]));
    let (status, body) = get_request("/admin/balances/all", configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<Balance> = serde_json::from_str(&body).unwrap();
    assert_eq!(rows, vec![row(1, "Кабінет 1 UA", "Кабінет 2 UA", 7_000)]);
}

#[actix_web::test]
async fn admin_override() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockLedgerManager::new();
    manager
        .expect_override_balance()
        .withf(|u| {
            u.balance_id == 4
                && u.amount == Amount::from_cents(-2550)
                && u.admin_name == "ADMIN 1"
                && u.comment == "Reconciled with bank statement"
        })
        .times(1)
        .returning(|u| {
            let entry = AdminLogEntry {
                id: 1,
                admin_name: u.admin_name.clone(),
                action_type: "balance_update".into(),
                cabinet_from: "Кабінет 1 UA".into(),
                cabinet_to: "Кабінет 4 UA".into(),
                amount_old: Amount::ZERO,
                amount_new: u.amount,
                comment: u.comment.clone(),
                created_at: Utc::now(),
            };
            Ok((row(4, "Кабінет 1 UA", "Кабінет 4 UA", u.amount.cents()), entry))
        });
    let body = json!({"amount": "-25.50", "admin_name": "ADMIN 1", "comment": " Reconciled with bank statement "});
    let (status, body) = patch_request("/admin/balances/4", Some(body), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}

#[actix_web::test]
async fn admin_override_needs_an_actor_and_a_comment() {
    let _ = env_logger::try_init().ok();
    // The backend must not be reached
    let body = json!({"amount": 10, "comment": "no admin"});
    let (status, body) = patch_request("/admin/balances/4", Some(body), configure(MockLedgerManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"An admin name is required"}"#);

    let body = json!({"amount": 10, "admin_name": "ADMIN 1", "comment": "   "});
    let (status, body) = patch_request("/admin/balances/4", Some(body), configure(MockLedgerManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"A comment is required"}"#);
}

#[actix_web::test]
async fn admin_override_of_a_missing_row() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockLedgerManager::new();
    manager.expect_override_balance().returning(|u| Err(LedgerError::BalanceNotFound(u.balance_id)));
    let body = json!({"amount": 10, "admin_name": "ADMIN 1", "comment": "typo"});
    let (status, body) = patch_request("/admin/balances/404", Some(body), configure(manager)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Balance 404 does not exist"}"#);
}

#[actix_web::test]
async fn store_failures_are_opaque() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockLedgerManager::new();
    manager.expect_fetch_all_balances().returning(|| Err(LedgerError::DatabaseError("no such table: balances".into())));
    let (status, body) = get_request("/admin/balances/all", configure(manager)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Internal server error"}"#);
}
