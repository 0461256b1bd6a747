//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here is async and only awaits on the database, so
//! workers keep serving other requests while a query runs.
//!
//! Every route except `/health` is mounted under `/api` by the server.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use ledger_engine::{
    db_types::{LoginAttempt, NewAccessKey, NewOrder, NewOrderRequest, NewWithdrawal, TelegramProfile},
    helpers::cabinet_filter,
    AccessApi,
    AccessManagement,
    BalanceApi,
    HistoryApi,
    HistoryManagement,
    LedgerManagement,
    OrderFlowApi,
    OrderManagement,
    TelegramApi,
    TelegramManagement,
    WithdrawalApi,
    WithdrawalManagement,
};
use log::*;
use serde_json::{Map, Value};

use crate::{
    config::ServerOptions,
    data_objects::{
        BalanceUpdateRequest,
        BindCabinetRequest,
        BindCabinetResponse,
        ConfirmWithdrawalRequest,
        HeartbeatResponse,
        HideRequest,
        HistoryQuery,
        JsonSuccess,
        LoginLogsQuery,
        LoginRequest,
        LoginResponse,
        PayOrderRequest,
        SessionRequest,
        TelegramLoginResponse,
    },
    errors::ServerError,
    helpers::{client_ip, user_agent},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(login => Post "/auth/login" impl AccessManagement);
/// Route handler for the login endpoint
///
/// Exchanges an access key for a session. A cabinet can only hold one session at a time, so a second login for the
/// same cabinet is refused until the first one logs out or is swept.
///
/// A wrong key or a busy cabinet is not an HTTP error. The response is a 200 with `success: false` and a message.
pub async fn login<B: AccessManagement>(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    api: web::Data<AccessApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let ip = client_ip(&req, options.as_ref());
    debug!("💻️ POST login from {ip}");
    let attempt = LoginAttempt::new(body.into_inner().key, ip, user_agent(&req));
    let outcome = api.login(attempt).await?;
    Ok(HttpResponse::Ok().json(LoginResponse::from(outcome)))
}

route!(logout => Post "/auth/logout" impl AccessManagement);
pub async fn logout<B: AccessManagement>(
    body: web::Json<SessionRequest>,
    api: web::Data<AccessApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST logout");
    api.logout(&body.session_id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(heartbeat => Post "/auth/heartbeat" impl AccessManagement);
/// Keeps a session alive. Responds with `{"valid": false}` for unknown or swept sessions; the client should return to
/// the login screen when it sees that.
pub async fn heartbeat<B: AccessManagement>(
    body: web::Json<SessionRequest>,
    api: web::Data<AccessApi<B>>,
) -> impl Responder {
    trace!("💻️ POST heartbeat");
    let valid = api.heartbeat(&body.session_id).await;
    HttpResponse::Ok().json(HeartbeatResponse { valid })
}

route!(force_logout => Post "/admin/force-logout/{cabinet}" impl AccessManagement);
pub async fn force_logout<B: AccessManagement>(
    path: web::Path<String>,
    api: web::Data<AccessApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cabinet = path.into_inner();
    info!("💻️ POST force logout for {cabinet}");
    api.force_logout(&cabinet).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(access_keys => Get "/auth/keys" impl AccessManagement);
pub async fn access_keys<B: AccessManagement>(api: web::Data<AccessApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET access keys");
    let keys = api.access_keys().await?;
    Ok(HttpResponse::Ok().json(keys))
}

route!(create_access_key => Post "/auth/keys" impl AccessManagement);
pub async fn create_access_key<B: AccessManagement>(
    body: web::Json<NewAccessKey>,
    api: web::Data<AccessApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new access key for {}", body.cabinet);
    let key = api.create_access_key(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(key))
}

route!(activate_access_key => Patch "/auth/keys/{id}/activate" impl AccessManagement);
pub async fn activate_access_key<B: AccessManagement>(
    path: web::Path<i64>,
    api: web::Data<AccessApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH activate access key #{id}");
    api.activate_access_key(id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(deactivate_access_key => Patch "/auth/keys/{id}/deactivate" impl AccessManagement);
pub async fn deactivate_access_key<B: AccessManagement>(
    path: web::Path<i64>,
    api: web::Data<AccessApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH deactivate access key #{id}");
    api.deactivate_access_key(id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(delete_access_key => Delete "/auth/keys/{id}" impl AccessManagement);
pub async fn delete_access_key<B: AccessManagement>(
    path: web::Path<i64>,
    api: web::Data<AccessApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE access key #{id}");
    api.delete_access_key(id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(login_logs => Get "/auth/login-logs" impl AccessManagement);
pub async fn login_logs<B: AccessManagement>(
    query: web::Query<LoginLogsQuery>,
    api: web::Data<AccessApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET login logs (limit {:?})", query.limit);
    let logs = api.login_logs(query.limit).await?;
    Ok(HttpResponse::Ok().json(logs))
}

//----------------------------------------------   Balances  ----------------------------------------------------
route!(balances => Get "/balances/{cabinet}" impl LedgerManagement);
/// Route handler for the balances endpoint
///
/// Returns what every other cabinet owes `cabinet`, as a map of cabinet name to amount. Positive values mean the
/// other cabinet owes `cabinet`. Cabinets with no balance row yet are reported as zero.
pub async fn balances<B: LedgerManagement>(
    path: web::Path<String>,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cabinet = path.into_inner();
    debug!("💻️ GET balances for {cabinet}");
    let balances = api.balances_for_cabinet(&cabinet).await?;
    Ok(HttpResponse::Ok().json(balances))
}

route!(all_balances => Get "/admin/balances/all" impl LedgerManagement);
pub async fn all_balances<B: LedgerManagement>(api: web::Data<BalanceApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all balances");
    let balances = api.all_balances().await?;
    Ok(HttpResponse::Ok().json(balances))
}

route!(update_balance => Patch "/admin/balances/{id}" impl LedgerManagement);
/// Route handler for the admin balance override
///
/// Overwrites a balance row. Both `admin_name` and `comment` are required; the change is written to the admin log
/// along with the old and new amounts.
pub async fn update_balance<B: LedgerManagement>(
    path: web::Path<i64>,
    body: web::Json<BalanceUpdateRequest>,
    api: web::Data<BalanceApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let BalanceUpdateRequest { amount, admin_name, comment } = body.into_inner();
    info!("💻️ PATCH balance #{id} to {amount} by {}", admin_name.as_deref().unwrap_or("<nobody>"));
    api.set_balance(id, amount, admin_name.as_deref(), comment.as_deref()).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders => Get "/orders/{cabinet}" impl OrderManagement);
/// Orders in which `cabinet` is either party, newest first, minus the ones `cabinet` has hidden.
pub async fn orders<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cabinet = path.into_inner();
    debug!("💻️ GET orders for {cabinet}");
    let orders = api.orders_for_cabinet(&cabinet).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(create_order => Post "/orders" impl OrderManagement);
pub async fn create_order<B: OrderManagement>(
    body: web::Json<NewOrder>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new order from {} to {}", body.from_cabinet, body.to_cabinet);
    let order = api.create_order(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(pay_order => Patch "/orders/{id}/pay" impl OrderManagement);
/// Marks a pending order as paid and moves its amount along the balance row between the two cabinets.
/// An order can only be paid once.
pub async fn pay_order<B: OrderManagement>(
    path: web::Path<i64>,
    body: Option<web::Json<PayOrderRequest>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let receipts = body.map(|b| b.into_inner().receipts).unwrap_or_default();
    info!("💻️ PATCH pay order #{id} with {} receipts", receipts.len());
    api.settle_order(id, receipts).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(cancel_order => Patch "/orders/{id}/cancel" impl OrderManagement);
pub async fn cancel_order<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ PATCH cancel order #{id}");
    api.cancel_order(id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(hide_order => Post "/orders/{id}/hide" impl OrderManagement);
pub async fn hide_order<B: OrderManagement>(
    path: web::Path<i64>,
    body: web::Json<HideRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST hide order #{id} for {}", body.cabinet);
    api.hide_order(&body.cabinet, id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

//----------------------------------------------   Order requests  ----------------------------------------------------
route!(order_requests => Get "/order-requests" impl OrderManagement);
/// Order requests that still have an amount left to fill, newest first.
pub async fn order_requests<B: OrderManagement>(
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET active order requests");
    let requests = api.active_order_requests().await?;
    Ok(HttpResponse::Ok().json(requests))
}

route!(create_order_request => Post "/order-requests" impl OrderManagement);
pub async fn create_order_request<B: OrderManagement>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new order request from {} to {}", body.from_cabinet, body.to_cabinet);
    let request = api.create_order_request(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

route!(delete_order_request => Delete "/order-requests/{id}" impl OrderManagement);
pub async fn delete_order_request<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE order request #{id}");
    api.delete_order_request(id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

//----------------------------------------------   Withdrawals  ----------------------------------------------------
route!(withdrawals => Get "/withdrawals/{cabinet}" impl WithdrawalManagement);
pub async fn withdrawals<B: WithdrawalManagement>(
    path: web::Path<String>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cabinet = path.into_inner();
    debug!("💻️ GET withdrawals for {cabinet}");
    let withdrawals = api.withdrawals_for_cabinet(&cabinet).await?;
    Ok(HttpResponse::Ok().json(withdrawals))
}

route!(create_withdrawal => Post "/withdrawals" impl WithdrawalManagement);
pub async fn create_withdrawal<B: WithdrawalManagement>(
    body: web::Json<NewWithdrawal>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new withdrawal from {} to {}", body.from_cabinet, body.to_cabinet);
    let withdrawal = api.create_withdrawal(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

route!(confirm_withdrawal => Patch "/withdrawals/{id}/confirm" impl WithdrawalManagement);
/// Confirms a pending withdrawal with the transaction id of the transfer. The amount comes off the debt that the
/// receiving cabinet owes the sender. A withdrawal can only be confirmed once.
pub async fn confirm_withdrawal<B: WithdrawalManagement>(
    path: web::Path<i64>,
    body: Option<web::Json<ConfirmWithdrawalRequest>>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ PATCH confirm withdrawal #{id}");
    let txid = body.and_then(|b| b.into_inner().txid);
    api.confirm_withdrawal(id, txid.as_deref()).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(delete_withdrawal => Delete "/withdrawals/{id}" impl WithdrawalManagement);
pub async fn delete_withdrawal<B: WithdrawalManagement>(
    path: web::Path<i64>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE withdrawal #{id}");
    api.delete_withdrawal(id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

route!(hide_withdrawal => Post "/withdrawals/{id}/hide" impl WithdrawalManagement);
pub async fn hide_withdrawal<B: WithdrawalManagement>(
    path: web::Path<i64>,
    body: web::Json<HideRequest>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST hide withdrawal #{id} for {}", body.cabinet);
    api.hide_withdrawal(&body.cabinet, id).await?;
    Ok(HttpResponse::Ok().json(JsonSuccess::new()))
}

//----------------------------------------------   History  ----------------------------------------------------
route!(history => Get "/history/{cabinet}" impl HistoryManagement);
/// Completed orders, confirmed withdrawals and balance adjustments touching `cabinet`, merged and newest first.
pub async fn history<B: HistoryManagement>(
    path: web::Path<String>,
    api: web::Data<HistoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cabinet = path.into_inner();
    debug!("💻️ GET history for {cabinet}");
    let history = api.history(Some(&cabinet)).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(admin_history => Get "/admin/history" impl HistoryManagement);
/// The history across every cabinet, or for one cabinet if `?cabinet=` is given. `cabinet=all` is the same as
/// leaving it out.
pub async fn admin_history<B: HistoryManagement>(
    query: web::Query<HistoryQuery>,
    api: web::Data<HistoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET admin history for {:?}", query.cabinet);
    let history = api.history(cabinet_filter(query.cabinet.as_deref())).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------   Telegram  ----------------------------------------------------
/// Route handler for Telegram logins
///
/// This handler trusts its input. It must only be mounted behind
/// [`TelegramAuthMiddlewareFactory`](crate::middleware::TelegramAuthMiddlewareFactory), which checks the signature
/// Telegram attaches to the login data.
pub async fn telegram_login<B: TelegramManagement>(
    body: web::Json<Map<String, Value>>,
    api: web::Data<TelegramApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let profile = telegram_profile(&body)?;
    debug!("💻️ POST Telegram login for {}", profile.telegram_id);
    let login = api.login(profile).await?;
    Ok(HttpResponse::Ok().json(TelegramLoginResponse::from(login)))
}

fn telegram_profile(data: &Map<String, Value>) -> Result<TelegramProfile, ServerError> {
    let telegram_id = match data.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ServerError::ValidationError("A numeric Telegram id is required".to_string()))?;
    let text = |key: &str| data.get(key).and_then(Value::as_str).map(String::from);
    Ok(TelegramProfile {
        telegram_id,
        username: text("username"),
        first_name: text("first_name"),
        last_name: text("last_name"),
        photo_url: text("photo_url"),
    })
}

route!(bind_cabinet => Post "/telegram/bind-cabinet" impl TelegramManagement);
pub async fn bind_cabinet<B: TelegramManagement>(
    body: web::Json<BindCabinetRequest>,
    api: web::Data<TelegramApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let BindCabinetRequest { telegram_id, cabinet } = body.into_inner();
    info!("💻️ POST bind Telegram user {telegram_id} to {cabinet}");
    let user = api.bind_cabinet(telegram_id, &cabinet).await?;
    Ok(HttpResponse::Ok().json(BindCabinetResponse { success: true, cabinet: user.cabinet }))
}

route!(telegram_users => Get "/telegram/users" impl TelegramManagement);
pub async fn telegram_users<B: TelegramManagement>(
    api: web::Data<TelegramApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET Telegram users");
    let users = api.users().await?;
    Ok(HttpResponse::Ok().json(users))
}
