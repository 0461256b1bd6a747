use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use ledger_engine::{
    db_types::{AccessKey, LoginLogEntry, LoginStatus},
    events::EventProducers,
    traits::{AuthApiError, LoginOutcome, SessionGrant},
    AccessApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{delete_request, get_request, patch_request, post_request, send_request},
    mocks::MockAccessManager,
};
use crate::{
    config::ServerOptions,
    routes::{
        AccessKeysRoute,
        ActivateAccessKeyRoute,
        CreateAccessKeyRoute,
        DeleteAccessKeyRoute,
        ForceLogoutRoute,
        HeartbeatRoute,
        LoginLogsRoute,
        LoginRoute,
        LogoutRoute,
    },
};

const SESSION_ID: &str = "5f1c0e7a2b9d4c3e8a6f1b2d3c4e5f60718293a4b5c6d7e8f9a0b1c2d3e4f506";

fn configure(manager: MockAccessManager, options: ServerOptions) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = AccessApi::new(manager, EventProducers::default());
        cfg.service(LoginRoute::<MockAccessManager>::new())
            .service(LogoutRoute::<MockAccessManager>::new())
            .service(HeartbeatRoute::<MockAccessManager>::new())
            .service(ForceLogoutRoute::<MockAccessManager>::new())
            .service(AccessKeysRoute::<MockAccessManager>::new())
            .service(CreateAccessKeyRoute::<MockAccessManager>::new())
            .service(ActivateAccessKeyRoute::<MockAccessManager>::new())
            .service(DeleteAccessKeyRoute::<MockAccessManager>::new())
            .service(LoginLogsRoute::<MockAccessManager>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(options));
    }
}

fn grant(previous_ip: Option<&str>) -> LoginOutcome {
    LoginOutcome::Success(SessionGrant {
        cabinet: "Кабінет 2 UA".into(),
        session_id: SESSION_ID.into(),
        ip_address: "10.0.0.7".into(),
        user_agent: "Mozilla/5.0".into(),
        previous_ip: previous_ip.map(String::from),
    })
}

#[actix_web::test]
async fn login_opens_a_session() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager
        .expect_login()
        .withf(|a| a.access_key == "key-2" && a.ip_address == "10.0.0.7" && a.user_agent == "Mozilla/5.0")
        .times(1)
        .returning(|_| Ok(grant(Some("10.0.0.7"))));
    let req = TestRequest::post()
        .uri("/auth/login")
        .peer_addr("10.0.0.7:50123".parse().unwrap())
        .insert_header(("User-Agent", "Mozilla/5.0"))
        .set_json(json!({"key": "key-2"}));
    let (status, body) = send_request(req, configure(manager, ServerOptions::default())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"success": true, "cabinet": "Кабінет 2 UA", "sessionId": SESSION_ID, "ipChanged": false}));
}

#[actix_web::test]
async fn login_reports_an_ip_change() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager.expect_login().returning(|_| Ok(grant(Some("192.168.1.1"))));
    let cfg = configure(manager, Default::default());
    let (status, body) = post_request("/auth/login", json!({"key": "key-2"}), cfg).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["ipChanged"], true);
}

#[actix_web::test]
async fn forwarded_for_header_is_used_when_enabled() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager
        .expect_login()
        .withf(|a| a.ip_address == "203.0.113.9")
        .times(1)
        .returning(|_| Ok(LoginOutcome::InvalidKey));
    let options = ServerOptions { use_x_forwarded_for: true, use_forwarded: false };
    let req = TestRequest::post()
        .uri("/auth/login")
        .peer_addr("10.0.0.1:443".parse().unwrap())
        .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
        .set_json(json!({"key": "nope"}));
    let (status, _) = send_request(req, configure(manager, options)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn forwarded_for_header_is_ignored_by_default() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager.expect_login().withf(|a| a.ip_address == "10.0.0.1").times(1).returning(|_| Ok(LoginOutcome::InvalidKey));
    let req = TestRequest::post()
        .uri("/auth/login")
        .peer_addr("10.0.0.1:443".parse().unwrap())
        .insert_header(("X-Forwarded-For", "203.0.113.9"))
        .set_json(json!({"key": "nope"}));
    let (status, _) = send_request(req, configure(manager, ServerOptions::default())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn bad_key_and_busy_cabinet_are_not_http_errors() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager.expect_login().times(1).returning(|_| Ok(LoginOutcome::InvalidKey));
    let cfg = configure(manager, Default::default());
    let (status, body) = post_request("/auth/login", json!({"key": "nope"}), cfg).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"error":"Невірний ключ доступу"}"#);

    let mut manager = MockAccessManager::new();
    manager.expect_login().returning(|_| Ok(LoginOutcome::SessionExists { cabinet: "Кабінет 2 UA".into() }));
    let cfg = configure(manager, Default::default());
    let (status, body) = post_request("/auth/login", json!({"key": "key-2"}), cfg).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"error":"Цей кабінет вже використовується іншим користувачем"}"#);
}

#[actix_web::test]
async fn heartbeat() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager.expect_touch_session().withf(|id| id == SESSION_ID).returning(|_| Ok(true));
    let cfg = configure(manager, Default::default());
    let (status, body) = post_request("/auth/heartbeat", json!({"sessionId": SESSION_ID}), cfg).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"valid":true}"#);

    let mut manager = MockAccessManager::new();
    manager.expect_touch_session().returning(|_| Ok(false));
    let cfg = configure(manager, Default::default());
    let (_, body) = post_request("/auth/heartbeat", json!({"sessionId": "gone"}), cfg).await;
    assert_eq!(body, r#"{"valid":false}"#);
}

#[actix_web::test]
async fn heartbeat_hides_backend_failures() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager.expect_touch_session().returning(|_| Err(AuthApiError::DatabaseError("database is locked".into())));
    let cfg = configure(manager, Default::default());
    let (status, body) = post_request("/auth/heartbeat", json!({"sessionId": SESSION_ID}), cfg).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"valid":false}"#);
}

#[actix_web::test]
async fn logout_and_force_logout() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager.expect_delete_session().withf(|id| id == SESSION_ID).times(1).returning(|_| Ok(1));
    let cfg = configure(manager, Default::default());
    let (status, body) = post_request("/auth/logout", json!({"sessionId": SESSION_ID}), cfg).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);

    let mut manager = MockAccessManager::new();
    manager.expect_delete_sessions_for_cabinet().withf(|c| c == "Кабінет 1 ARS").times(1).returning(|_| Ok(0));
    let cfg = configure(manager, Default::default());
    let path = "/admin/force-logout/%D0%9A%D0%B0%D0%B1%D1%96%D0%BD%D0%B5%D1%82%201%20ARS";
    let (status, body) = post_request(path, json!({}), cfg).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}

fn key(id: i64, active: bool) -> AccessKey {
    AccessKey {
        id,
        access_key: format!("key-{id}"),
        cabinet: "Кабінет 3 UA".into(),
        description: None,
        is_active: active,
        created_at: Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap(),
        last_used: None,
    }
}

#[actix_web::test]
async fn access_key_admin() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager.expect_fetch_access_keys().returning(|| Ok(vec![key(1, true), key(2, false)]));
    let (status, body) = get_request("/auth/keys", configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<AccessKey> = serde_json::from_str(&body).unwrap();
    assert_eq!(keys.len(), 2);
    assert!(!keys[1].is_active);

    let mut manager = MockAccessManager::new();
    manager.expect_set_access_key_active().withf(|id, active| *id == 2 && *active).returning(|_, _| Ok(key(2, true)));
    let (status, body) = patch_request("/auth/keys/2/activate", None, configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);

    let mut manager = MockAccessManager::new();
    manager.expect_set_access_key_active().returning(|id, _| Err(AuthApiError::KeyNotFound(id)));
    let (status, body) = patch_request("/auth/keys/99/activate", None, configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Access key 99 does not exist"}"#);

    let mut manager = MockAccessManager::new();
    manager.expect_delete_access_key().withf(|id| *id == 2).returning(|_| Ok(1));
    let (status, _) = delete_request("/auth/keys/2", configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn create_access_key() {
    let _ = env_logger::try_init().ok();
    let mut manager = MockAccessManager::new();
    manager
        .expect_insert_access_key()
        .withf(|k| k.access_key == "key-7" && k.cabinet == "Кабінет 3 UA" && k.description.is_none())
        .returning(|_| Ok(key(7, true)));
    let body = json!({"access_key": " key-7 ", "cabinet": "Кабінет 3 UA", "description": "  "});
    let (status, body) = post_request("/auth/keys", body, configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::OK);
    let created: AccessKey = serde_json::from_str(&body).unwrap();
    assert_eq!(created.id, 7);

    let mut manager = MockAccessManager::new();
    manager.expect_insert_access_key().returning(|_| Err(AuthApiError::DuplicateKey));
    let body = json!({"access_key": "key-7", "cabinet": "Кабінет 3 UA"});
    let (status, body) = post_request("/auth/keys", body, configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Access key already exists"}"#);

    // Rejected before the backend is asked
    let manager = MockAccessManager::new();
    let body = json!({"access_key": "", "cabinet": "Кабінет 3 UA"});
    let (status, _) = post_request("/auth/keys", body, configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_logs_use_the_default_limit() {
    let _ = env_logger::try_init().ok();
    let entry = LoginLogEntry {
        id: 1,
        cabinet: "unknown".into(),
        ip_address: "10.0.0.3".into(),
        user_agent: String::new(),
        status: LoginStatus::InvalidKey,
        created_at: Utc.with_ymd_and_hms(2024, 11, 2, 8, 0, 0).unwrap(),
    };
    let mut manager = MockAccessManager::new();
    manager.expect_fetch_login_logs().withf(|limit| *limit == 100).times(1).returning(move |_| Ok(vec![entry.clone()]));
    let (status, body) = get_request("/auth/login-logs", configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body[0]["status"], "invalid_key");

    let mut manager = MockAccessManager::new();
    manager.expect_fetch_login_logs().withf(|limit| *limit == 5).times(1).returning(|_| Ok(vec![]));
    let (status, body) = get_request("/auth/login-logs?limit=5", configure(manager, Default::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}
