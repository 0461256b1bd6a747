use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use ledger_common::Amount;
use ledger_engine::{
    db_types::{Withdrawal, WithdrawalStatusType},
    traits::LedgerError,
    WithdrawalApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{delete_request, get_request, patch_request, post_request},
    mocks::MockWithdrawalManager,
};
use crate::routes::{
    ConfirmWithdrawalRoute,
    CreateWithdrawalRoute,
    DeleteWithdrawalRoute,
    HideWithdrawalRoute,
    WithdrawalsRoute,
};

fn configure(manager: MockWithdrawalManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(WithdrawalsRoute::<MockWithdrawalManager>::new())
            .service(CreateWithdrawalRoute::<MockWithdrawalManager>::new())
            .service(ConfirmWithdrawalRoute::<MockWithdrawalManager>::new())
            .service(DeleteWithdrawalRoute::<MockWithdrawalManager>::new())
            .service(HideWithdrawalRoute::<MockWithdrawalManager>::new())
            .app_data(web::Data::new(WithdrawalApi::new(manager)));
    }
}

fn withdrawal(id: i64, status: WithdrawalStatusType, txid: Option<&str>) -> Withdrawal {
    Withdrawal {
        id,
        from_cabinet: "Кабінет 1 UA".into(),
        to_cabinet: "Кабінет 2 UA".into(),
        amount: Amount::from_units(10),
        address: "TQ5NmYxQpZ3yXK1vEJ5fGZ9wZ6r2h8Z5Xb".into(),
        status,
        txid: txid.map(String::from),
        created_at: Utc.with_ymd_and_hms(2024, 11, 5, 14, 0, 0).unwrap(),
    }
}

fn txid(txid: &str) -> Value {
    json!({ "txid": txid })
}

#[actix_web::test]
async fn withdrawals_for_a_cabinet() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockWithdrawalManager::new();
    manager.expect_fetch_withdrawals_for_cabinet().returning(|_| {
        Ok(vec![
            withdrawal(2, WithdrawalStatusType::Pending, None),
            withdrawal(1, WithdrawalStatusType::Completed, Some("abc")),
        ])
    });
    let path = "/withdrawals/%D0%9A%D0%B0%D0%B1%D1%96%D0%BD%D0%B5%D1%82%201%20UA";
    let (status, body) = get_request(path, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body[0]["status"], "pending");
    assert_eq!(body[0]["txid"], Value::Null);
    assert_eq!(body[1]["txid"], "abc");
}

#[actix_web::test]
async fn create_withdrawal() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockWithdrawalManager::new();
    manager
        .expect_insert_withdrawal()
        .withf(|w| w.amount == Amount::from_units(10) && w.address == "TQ5NmYxQpZ3yXK1vEJ5fGZ9wZ6r2h8Z5Xb")
        .times(1)
        .returning(|_| Ok(withdrawal(3, WithdrawalStatusType::Pending, None)));
    let body = json!({
        "from_cabinet": "Кабінет 1 UA",
        "to_cabinet": "Кабінет 2 UA",
        "amount": 10,
        "address": " TQ5NmYxQpZ3yXK1vEJ5fGZ9wZ6r2h8Z5Xb "
    });
    let (status, body) = post_request("/withdrawals", body, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let created: Withdrawal = serde_json::from_str(&body).unwrap();
    assert_eq!(created.id, 3);

    let body = json!({"from_cabinet": "Кабінет 1 UA", "to_cabinet": "Кабінет 2 UA", "amount": -1, "address": "T"});
    let (status, body) = post_request("/withdrawals", body, configure(MockWithdrawalManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"amount must be positive"}"#);
}

#[actix_web::test]
async fn confirm_withdrawal() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockWithdrawalManager::new();
    manager
        .expect_confirm_withdrawal()
        .withf(|id, txid| *id == 3 && txid.as_deref() == Some("0xfeed"))
        .times(1)
        .returning(|id, txid| Ok(withdrawal(id, WithdrawalStatusType::Completed, txid.as_deref())));
    let (status, body) = patch_request("/withdrawals/3/confirm", Some(txid("0xfeed")), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}

#[actix_web::test]
async fn confirm_withdrawal_without_txid() {
    let _ = env_logger::try_init().ok();
    let manager = || {
        let mut manager = MockWithdrawalManager::new();
        manager
            .expect_confirm_withdrawal()
            .withf(|id, txid| *id == 4 && txid.is_none())
            .times(1)
            .returning(|id, _| Ok(withdrawal(id, WithdrawalStatusType::Completed, None)));
        configure(manager)
    };
    let (status, body) = patch_request("/withdrawals/4/confirm", Some(txid("  ")), manager()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
    let (status, _) = patch_request("/withdrawals/4/confirm", Some(json!({})), manager()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = patch_request("/withdrawals/4/confirm", None, manager()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn confirm_withdrawal_failures() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockWithdrawalManager::new();
    manager.expect_confirm_withdrawal().returning(|id, _| Err(LedgerError::AlreadySettled(format!("Withdrawal {id}"))));
    let (status, body) = patch_request("/withdrawals/3/confirm", Some(txid("0xfeed")), configure(manager)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Withdrawal 3 has already been settled"}"#);

    let mut manager = MockWithdrawalManager::new();
    manager.expect_confirm_withdrawal().returning(|id, _| Err(LedgerError::WithdrawalNotFound(id)));
    let (status, _) = patch_request("/withdrawals/33/confirm", Some(txid("0xfeed")), configure(manager)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_and_hide() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockWithdrawalManager::new();
    manager.expect_delete_withdrawal().withf(|id| *id == 3).times(1).returning(|_| Ok(None));
    let (status, body) = delete_request("/withdrawals/3", configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);

    let mut manager = MockWithdrawalManager::new();
    manager
        .expect_hide_withdrawal()
        .withf(|cabinet, id| cabinet == "Кабінет 2 UA" && *id == 3)
        .times(1)
        .returning(|_, _| Ok(()));
    let (status, _) = post_request("/withdrawals/3/hide", json!({"cabinet": "Кабінет 2 UA"}), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);

    let cfg = configure(MockWithdrawalManager::new());
    let (status, _) = post_request("/withdrawals/3/hide", json!({"cabinet": ""}), cfg).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
