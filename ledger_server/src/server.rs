use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use ledger_common::Secret;
use ledger_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    helpers::known_cabinets,
    AccessApi,
    BalanceApi,
    HistoryApi,
    OrderFlowApi,
    SqliteDatabase,
    TelegramApi,
    WithdrawalApi,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::TelegramAuthMiddlewareFactory,
    notifier::TelegramNotifier,
    routes::{
        health,
        telegram_login,
        AccessKeysRoute,
        ActivateAccessKeyRoute,
        AdminHistoryRoute,
        AllBalancesRoute,
        BalancesRoute,
        BindCabinetRoute,
        CancelOrderRoute,
        ConfirmWithdrawalRoute,
        CreateAccessKeyRoute,
        CreateOrderRequestRoute,
        CreateOrderRoute,
        CreateWithdrawalRoute,
        DeactivateAccessKeyRoute,
        DeleteAccessKeyRoute,
        DeleteOrderRequestRoute,
        DeleteWithdrawalRoute,
        ForceLogoutRoute,
        HeartbeatRoute,
        HideOrderRoute,
        HideWithdrawalRoute,
        HistoryRoute,
        LoginLogsRoute,
        LoginRoute,
        LogoutRoute,
        OrderRequestsRoute,
        OrdersRoute,
        PayOrderRoute,
        TelegramUsersRoute,
        UpdateBalanceRoute,
        WithdrawalsRoute,
    },
    session_sweeper::start_session_sweeper,
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let created = BalanceApi::new(db.clone())
        .initialise_balances(&known_cabinets())
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if created > 0 {
        info!("🚀️ Created {created} empty balance rows");
    }
    let hooks = create_event_hooks(&config)?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _sweeper = start_session_sweeper(db.clone(), config.session_idle_timeout, config.session_sweep_interval);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

fn create_event_hooks(config: &ServerConfig) -> Result<EventHooks, ServerError> {
    let notifier =
        TelegramNotifier::new(config.telegram.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if !notifier.is_enabled() {
        warn!("🚀️ Telegram notifications are disabled. Set CLS_TELEGRAM_BOT_TOKEN and CLS_TELEGRAM_CHANNEL_ID.");
    }
    let mut hooks = EventHooks::default();
    hooks.on_new_ip_login(move |ev| {
        let notifier = notifier.clone();
        Box::pin(async move { notifier.notify_new_ip_login(&ev).await })
    });
    Ok(hooks)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let bot_token: Secret<String> = config.telegram.bot_token.clone();
    if bot_token.is_empty() {
        warn!("🚀️ CLS_TELEGRAM_BOT_TOKEN is not set. Every Telegram login will be rejected.");
    }
    let srv = HttpServer::new(move || {
        let balance_api = BalanceApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone());
        let withdrawal_api = WithdrawalApi::new(db.clone());
        let history_api = HistoryApi::new(db.clone());
        let access_api = AccessApi::new(db.clone(), producers.clone());
        let telegram_api = TelegramApi::new(db.clone());
        let telegram_login_route = web::resource("/telegram/login")
            .name("telegram_login")
            .wrap(TelegramAuthMiddlewareFactory::new(bot_token.clone()))
            .route(web::post().to(telegram_login::<SqliteDatabase>));
        let api_scope = web::scope("/api")
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(LogoutRoute::<SqliteDatabase>::new())
            .service(HeartbeatRoute::<SqliteDatabase>::new())
            .service(AccessKeysRoute::<SqliteDatabase>::new())
            .service(CreateAccessKeyRoute::<SqliteDatabase>::new())
            .service(ActivateAccessKeyRoute::<SqliteDatabase>::new())
            .service(DeactivateAccessKeyRoute::<SqliteDatabase>::new())
            .service(DeleteAccessKeyRoute::<SqliteDatabase>::new())
            .service(LoginLogsRoute::<SqliteDatabase>::new())
            .service(ForceLogoutRoute::<SqliteDatabase>::new())
            .service(AllBalancesRoute::<SqliteDatabase>::new())
            .service(UpdateBalanceRoute::<SqliteDatabase>::new())
            .service(BalancesRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(PayOrderRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(HideOrderRoute::<SqliteDatabase>::new())
            .service(OrderRequestsRoute::<SqliteDatabase>::new())
            .service(CreateOrderRequestRoute::<SqliteDatabase>::new())
            .service(DeleteOrderRequestRoute::<SqliteDatabase>::new())
            .service(WithdrawalsRoute::<SqliteDatabase>::new())
            .service(CreateWithdrawalRoute::<SqliteDatabase>::new())
            .service(ConfirmWithdrawalRoute::<SqliteDatabase>::new())
            .service(DeleteWithdrawalRoute::<SqliteDatabase>::new())
            .service(HideWithdrawalRoute::<SqliteDatabase>::new())
            .service(HistoryRoute::<SqliteDatabase>::new())
            .service(AdminHistoryRoute::<SqliteDatabase>::new())
            .service(telegram_login_route)
            .service(BindCabinetRoute::<SqliteDatabase>::new())
            .service(TelegramUsersRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cls::access_log"))
            .app_data(web::Data::new(balance_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(withdrawal_api))
            .app_data(web::Data::new(history_api))
            .app_data(web::Data::new(access_api))
            .app_data(web::Data::new(telegram_api))
            .app_data(web::Data::new(options))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
