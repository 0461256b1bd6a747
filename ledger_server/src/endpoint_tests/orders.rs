use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use ledger_common::Amount;
use ledger_engine::{
    db_types::{Order, OrderRequest, OrderStatusType},
    traits::LedgerError,
    OrderFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{delete_request, get_request, patch_request, post_request},
    mocks::MockOrderManager,
};
use crate::routes::{
    CancelOrderRoute,
    CreateOrderRequestRoute,
    CreateOrderRoute,
    DeleteOrderRequestRoute,
    HideOrderRoute,
    OrderRequestsRoute,
    OrdersRoute,
    PayOrderRoute,
};

fn configure(manager: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(OrdersRoute::<MockOrderManager>::new())
            .service(CreateOrderRoute::<MockOrderManager>::new())
            .service(PayOrderRoute::<MockOrderManager>::new())
            .service(CancelOrderRoute::<MockOrderManager>::new())
            .service(HideOrderRoute::<MockOrderManager>::new())
            .service(OrderRequestsRoute::<MockOrderManager>::new())
            .service(CreateOrderRequestRoute::<MockOrderManager>::new())
            .service(DeleteOrderRequestRoute::<MockOrderManager>::new())
            .app_data(web::Data::new(OrderFlowApi::new(manager)));
    }
}

fn order(id: i64, status: OrderStatusType) -> Order {
    Order {
        id,
        request_id: None,
        from_cabinet: "Кабінет 1 UA".into(),
        to_cabinet: "Кабінет 2 UA".into(),
        order_type: "card".into(),
        amount_usdt: Amount::from_units(30),
        amount_local: Some(Amount::from_units(1230)),
        card_number: Some("4111111111111111".into()),
        iban: None,
        tax_number: None,
        cvu: None,
        full_name: Some("Ivan Petrenko".into()),
        note: None,
        status,
        receipts: None,
        created_at: Utc.with_ymd_and_hms(2024, 11, 4, 9, 15, 0).unwrap(),
    }
}

#[actix_web::test]
async fn orders_for_a_cabinet() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager
        .expect_fetch_orders_for_cabinet()
        .withf(|c| c == "Кабінет 2 UA")
        .returning(|_| Ok(vec![order(2, OrderStatusType::Pending), order(1, OrderStatusType::Completed)]));
    let path = "/orders/%D0%9A%D0%B0%D0%B1%D1%96%D0%BD%D0%B5%D1%82%202%20UA";
    let (status, body) = get_request(path, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body[0]["id"], 2);
    assert_eq!(body[0]["type"], "card");
    assert_eq!(body[0]["amount_usdt"], 30.0);
    assert_eq!(body[0]["status"], "pending");
    assert_eq!(body[1]["status"], "completed");
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager
        .expect_insert_order()
        .withf(|o| {
            o.from_cabinet == "Кабінет 1 UA" && o.amount_usdt == Amount::from_units(30) && o.request_id == Some(3)
        })
        .times(1)
        .returning(|o| Ok(Order { request_id: o.request_id, ..order(5, OrderStatusType::Pending) }));
    let body = json!({
        "request_id": 3,
        "from_cabinet": "Кабінет 1 UA",
        "to_cabinet": "Кабінет 2 UA",
        "type": "card",
        "amount_usdt": 30,
        "amount_local": "1230.00",
        "card_number": "4111111111111111",
        "full_name": "Ivan Petrenko"
    });
    let (status, body) = post_request("/orders", body, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let created: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(created.id, 5);
    assert_eq!(created.request_id, Some(3));
    assert_eq!(created.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn create_order_validation() {
    let _ = env_logger::try_init().ok();
    let body = json!({"from_cabinet": "Кабінет 1 UA", "to_cabinet": "Кабінет 2 UA", "type": "card", "amount_usdt": 0});
    let (status, body) = post_request("/orders", body, configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"amount_usdt must be positive"}"#);

    let body = json!({"from_cabinet": " ", "to_cabinet": "Кабінет 2 UA", "type": "card", "amount_usdt": 5});
    let (status, body) = post_request("/orders", body, configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"from_cabinet is required"}"#);

    // Not even JSON the server understands
    let body = json!({"from_cabinet": "Кабінет 1 UA", "amount_usdt": "lots"});
    let (status, _) = post_request("/orders", body, configure(MockOrderManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn pay_order() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager
        .expect_settle_order()
        .withf(|id, receipts| *id == 7 && receipts == &vec!["/uploads/receipt-7.jpg".to_string()])
        .times(1)
        .returning(|id, receipts| Ok(Order { receipts: Some(receipts), ..order(id, OrderStatusType::Completed) }));
    let body = json!({"receipts": ["/uploads/receipt-7.jpg", "  "]});
    let (status, body) = patch_request("/orders/7/pay", Some(body), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}

#[actix_web::test]
async fn pay_order_without_receipts() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager
        .expect_settle_order()
        .withf(|id, receipts| *id == 8 && receipts.is_empty())
        .times(1)
        .returning(|id, _| Ok(order(id, OrderStatusType::Completed)));
    let (status, _) = patch_request("/orders/8/pay", None, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn an_order_is_paid_once() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager.expect_settle_order().returning(|id, _| Err(LedgerError::AlreadySettled(format!("Order {id}"))));
    let (status, body) = patch_request("/orders/7/pay", Some(json!({"receipts": []})), configure(manager)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Order 7 has already been settled"}"#);

    let mut manager = MockOrderManager::new();
    manager.expect_settle_order().returning(|id, _| Err(LedgerError::OrderNotFound(id)));
    let (status, body) = patch_request("/orders/70/pay", Some(json!({"receipts": []})), configure(manager)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order 70 does not exist"}"#);
}

#[actix_web::test]
async fn cancel_order() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager
        .expect_cancel_order()
        .withf(|id| *id == 9)
        .times(1)
        .returning(|id| Ok(order(id, OrderStatusType::Cancelled)));
    let (status, body) = patch_request("/orders/9/cancel", None, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);

    let mut manager = MockOrderManager::new();
    manager.expect_cancel_order().returning(|_| {
        Err(LedgerError::InvalidTransition {
            entity: "Order 9".into(),
            from: "cancelled".into(),
            to: "cancelled".into(),
        })
    });
    let (status, body) = patch_request("/orders/9/cancel", None, configure(manager)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Cannot move Order 9 from cancelled to cancelled"}"#);
}

#[actix_web::test]
async fn hide_order() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager
        .expect_hide_order()
        .withf(|cabinet, id| cabinet == "Кабінет 1 UA" && *id == 4)
        .times(1)
        .returning(|_, _| Ok(()));
    let (status, body) = post_request("/orders/4/hide", json!({"cabinet": "Кабінет 1 UA"}), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}

fn request(id: i64, remaining_cents: i64) -> OrderRequest {
    OrderRequest {
        id,
        from_cabinet: "Кабінет 2 UA".into(),
        to_cabinet: "Кабінет 1 UA".into(),
        amount: Amount::from_units(50),
        request_type: "card".into(),
        remaining_amount: Amount::from_cents(remaining_cents),
        created_at: Utc.with_ymd_and_hms(2024, 11, 4, 8, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn order_requests() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockOrderManager::new();
    manager.expect_fetch_active_order_requests().returning(|| Ok(vec![request(2, 3_000)]));
    let (status, body) = get_request("/order-requests", configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body[0]["remaining_amount"], 30.0);
    assert_eq!(body[0]["type"], "card");

    let mut manager = MockOrderManager::new();
    manager
        .expect_insert_order_request()
        .withf(|r| r.amount == Amount::from_units(50) && r.request_type == "card")
        .returning(|_| Ok(request(3, 5_000)));
    let body = json!({"from_cabinet": "Кабінет 2 UA", "to_cabinet": "Кабінет 1 UA", "amount": 50, "type": "card"});
    let (status, body) = post_request("/order-requests", body, configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let created: OrderRequest = serde_json::from_str(&body).unwrap();
    assert_eq!(created, request(3, 5_000));

    let mut manager = MockOrderManager::new();
    manager.expect_delete_order_request().withf(|id| *id == 3).times(1).returning(|_| Ok(1));
    let (status, body) = delete_request("/order-requests/3", configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}
