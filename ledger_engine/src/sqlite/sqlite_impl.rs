//! `SqliteDatabase` is the concrete cabinet ledger backend.
//!
//! It uses SQLite as the store and implements all the traits defined in the [`traits`] module.
//!
//! Every settlement runs in a single transaction whose first statement is a write (the status compare-and-swap or the
//! balance update). SQLite takes the write lock at that point and holds it until commit, so settlements touching the
//! same rows are serialised and the balance arithmetic, which happens in SQL, can't lose an update.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::SqlitePool;

use super::db::{
    access_keys,
    admin_logs,
    balances,
    db_url,
    hidden,
    login_logs,
    new_pool,
    order_requests,
    orders,
    sessions,
    telegram_users,
    withdrawals,
};
use crate::{
    db_types::{
        AccessKey,
        AdminLogEntry,
        Balance,
        BalanceOverride,
        LoginAttempt,
        LoginLogEntry,
        LoginStatus,
        NewAccessKey,
        NewOrder,
        NewOrderRequest,
        NewWithdrawal,
        Order,
        OrderRequest,
        OrderStatusType,
        Session,
        TelegramProfile,
        TelegramUser,
        Withdrawal,
        WithdrawalStatusType,
        UNKNOWN_CABINET,
    },
    helpers::new_session_token,
    traits::{
        AccessManagement,
        AuthApiError,
        HistoryManagement,
        LedgerError,
        LedgerManagement,
        LoginOutcome,
        OrderManagement,
        SessionGrant,
        TelegramApiError,
        TelegramManagement,
        WithdrawalManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CLS_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Deletes every order, request, withdrawal and balance row and restarts their id counters. Access keys, sessions,
    /// Telegram users and the audit and login logs are kept.
    pub async fn clear_ledger_data(&self) -> Result<(), sqlx::Error> {
        const TABLES: [&str; 6] =
            ["hidden_withdrawals", "hidden_orders", "withdrawals", "order_requests", "orders", "balances"];
        let mut tx = self.pool.begin().await?;
        for table in TABLES {
            let deleted = sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?.rows_affected();
            debug!("🗃️ Cleared {deleted} rows from {table}");
        }
        let placeholders = TABLES.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("DELETE FROM sqlite_sequence WHERE name IN ({placeholders})");
        let reset = TABLES.iter().fold(sqlx::query(&sql), |q, t| q.bind(*t));
        reset.execute(&mut *tx).await?;
        tx.commit().await?;
        info!("🗃️ Ledger data cleared");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_balances_for_cabinet(&self, cabinet: &str) -> Result<Vec<Balance>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        balances::balances_for_cabinet(cabinet, &mut conn).await
    }

    async fn fetch_all_balances(&self) -> Result<Vec<Balance>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        balances::all_balances(&mut conn).await
    }

    async fn override_balance(&self, update: BalanceOverride) -> Result<(Balance, AdminLogEntry), LedgerError> {
        let BalanceOverride { balance_id, amount, admin_name, comment } = update;
        let mut tx = self.pool.begin().await?;
        let before =
            balances::lock_balance(balance_id, &mut tx).await?.ok_or(LedgerError::BalanceNotFound(balance_id))?;
        let after =
            balances::set_balance(balance_id, amount, &mut tx).await?.ok_or(LedgerError::BalanceNotFound(balance_id))?;
        let entry =
            admin_logs::insert_balance_update(admin_name.trim(), &before, &after, comment.trim(), &mut tx).await?;
        tx.commit().await?;
        info!(
            "🗃️ {} set balance #{balance_id} ({} -> {}) from {} to {}",
            entry.admin_name, after.cabinet_from, after.cabinet_to, before.amount, after.amount
        );
        Ok((after, entry))
    }

    async fn initialise_balances(&self, cabinets: &[String]) -> Result<u64, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;
        for (i, a) in cabinets.iter().enumerate() {
            for b in cabinets.iter().skip(i + 1) {
                if balances::insert_pair_if_missing(a, b, &mut tx).await? {
                    trace!("🗃️ Created balance row {a} -> {b}");
                    created += 1;
                }
            }
        }
        tx.commit().await?;
        debug!("🗃️ {created} balance rows initialised for {} cabinets", cabinets.len());
        Ok(created)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let new_order = orders::insert_order(&order, &mut tx).await?;
        debug!("🗃️ Order #{} for {} saved", new_order.id, order.amount_usdt);
        if let Some(request_id) = order.request_id {
            match order_requests::adjust_remaining(request_id, -order.amount_usdt, &mut tx).await? {
                Some(request) => {
                    trace!("🗃️ Order request #{request_id} has {} remaining", request.remaining_amount)
                },
                None => warn!("🗃️ Order #{} refers to order request #{request_id}, which does not exist", new_order.id),
            }
        }
        tx.commit().await?;
        Ok(new_order)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn settle_order(&self, id: i64, receipts: Vec<String>) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::mark_completed(id, &receipts, &mut tx).await? {
            Some(order) => order,
            None => {
                let existing = orders::fetch_order(id, &mut tx).await?;
                tx.rollback().await?;
                return Err(rejected_order_transition(id, existing, OrderStatusType::Completed));
            },
        };
        balances::apply_settlement(&order.from_cabinet, &order.to_cabinet, order.amount_usdt, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{id} settled. {} paid {} to {}", order.from_cabinet, order.amount_usdt, order.to_cabinet);
        Ok(order)
    }

    async fn cancel_order(&self, id: i64) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::mark_cancelled(id, &mut tx).await? {
            Some(order) => order,
            None => {
                let existing = orders::fetch_order(id, &mut tx).await?;
                tx.rollback().await?;
                return Err(rejected_order_transition(id, existing, OrderStatusType::Cancelled));
            },
        };
        if let Some(request_id) = order.request_id {
            match order_requests::adjust_remaining(request_id, order.amount_usdt, &mut tx).await? {
                Some(request) => {
                    trace!("🗃️ Order request #{request_id} restored to {}", request.remaining_amount)
                },
                None => debug!("🗃️ Order request #{request_id} for cancelled order #{id} no longer exists"),
            }
        }
        tx.commit().await?;
        debug!("🗃️ Order #{id} cancelled");
        Ok(order)
    }

    async fn fetch_orders_for_cabinet(&self, cabinet: &str) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::orders_for_cabinet(cabinet, &mut conn).await
    }

    async fn hide_order(&self, cabinet: &str, order_id: i64) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        if hidden::hide_order(cabinet, order_id, &mut conn).await? {
            trace!("🗃️ Order #{order_id} hidden for {cabinet}");
        }
        Ok(())
    }

    async fn insert_order_request(&self, request: NewOrderRequest) -> Result<OrderRequest, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let request = order_requests::insert_order_request(&request, &mut conn).await?;
        debug!("🗃️ Order request #{} for {} saved", request.id, request.amount);
        Ok(request)
    }

    async fn delete_order_request(&self, id: i64) -> Result<u64, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        order_requests::delete_order_request(id, &mut conn).await
    }

    async fn fetch_active_order_requests(&self) -> Result<Vec<OrderRequest>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        order_requests::active_order_requests(&mut conn).await
    }
}

/// Works out why a compare-and-swap on an order's status matched nothing.
fn rejected_order_transition(id: i64, existing: Option<Order>, target: OrderStatusType) -> LedgerError {
    match existing {
        None => LedgerError::OrderNotFound(id),
        Some(order) if order.status == OrderStatusType::Completed => {
            LedgerError::AlreadySettled(format!("Order {id}"))
        },
        Some(order) => LedgerError::InvalidTransition {
            entity: format!("order {id}"),
            from: order.status.to_string(),
            to: target.to_string(),
        },
    }
}

impl WithdrawalManagement for SqliteDatabase {
    async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawal = withdrawals::insert_withdrawal(&withdrawal, &mut conn).await?;
        debug!("🗃️ Withdrawal #{} of {} saved", withdrawal.id, withdrawal.amount);
        Ok(withdrawal)
    }

    async fn confirm_withdrawal(&self, id: i64, txid: Option<String>) -> Result<Withdrawal, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal = match withdrawals::mark_completed(id, txid.as_deref(), &mut tx).await? {
            Some(w) => w,
            None => {
                let existing = withdrawals::fetch_withdrawal(id, &mut tx).await?;
                tx.rollback().await?;
                return Err(match existing {
                    None => LedgerError::WithdrawalNotFound(id),
                    Some(_) => LedgerError::AlreadySettled(format!("Withdrawal {id}")),
                });
            },
        };
        balances::apply_settlement(&withdrawal.from_cabinet, &withdrawal.to_cabinet, withdrawal.amount, &mut tx)
            .await?;
        tx.commit().await?;
        debug!("🗃️ Withdrawal #{id} confirmed. txid: {}", txid.as_deref().unwrap_or("none"));
        Ok(withdrawal)
    }

    async fn delete_withdrawal(&self, id: i64) -> Result<Option<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = withdrawals::delete_withdrawal(id, &mut conn).await?;
        if let Some(w) = &deleted {
            if w.status == WithdrawalStatusType::Completed {
                warn!(
                    "🗃️ Completed withdrawal #{id} was deleted. Its {} effect on the {} / {} balance remains.",
                    w.amount, w.from_cabinet, w.to_cabinet
                );
            }
        }
        Ok(deleted)
    }

    async fn fetch_withdrawals_for_cabinet(&self, cabinet: &str) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::withdrawals_for_cabinet(cabinet, &mut conn).await
    }

    async fn hide_withdrawal(&self, cabinet: &str, withdrawal_id: i64) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        if hidden::hide_withdrawal(cabinet, withdrawal_id, &mut conn).await? {
            trace!("🗃️ Withdrawal #{withdrawal_id} hidden for {cabinet}");
        }
        Ok(())
    }
}

impl HistoryManagement for SqliteDatabase {
    async fn fetch_completed_orders(&self, cabinet: Option<&str>) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::completed_orders(cabinet, &mut conn).await
    }

    async fn fetch_completed_withdrawals(&self, cabinet: Option<&str>) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::completed_withdrawals(cabinet, &mut conn).await
    }

    async fn fetch_balance_adjustments(&self, cabinet: Option<&str>) -> Result<Vec<AdminLogEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        admin_logs::balance_updates(cabinet, &mut conn).await
    }
}

impl AccessManagement for SqliteDatabase {
    async fn login(&self, attempt: LoginAttempt) -> Result<LoginOutcome, AuthApiError> {
        let LoginAttempt { access_key, ip_address, user_agent } = attempt;
        let mut conn = self.pool.acquire().await?;
        let key = match access_keys::use_active_key(&access_key, &mut conn).await? {
            Some(key) => key,
            None => {
                let status = LoginStatus::InvalidKey;
                login_logs::insert_login_log(UNKNOWN_CABINET, &ip_address, &user_agent, status, &mut conn).await?;
                debug!("🗃️ Login with an invalid key from {ip_address}");
                return Ok(LoginOutcome::InvalidKey);
            },
        };
        let cabinet = key.cabinet;
        drop(conn);
        let session_id = new_session_token();
        let mut tx = self.pool.begin().await?;
        if sessions::insert_session(&cabinet, &session_id, &ip_address, &user_agent, &mut tx).await?.is_none() {
            tx.rollback().await?;
            let mut conn = self.pool.acquire().await?;
            let status = LoginStatus::RejectedSessionExists;
            login_logs::insert_login_log(&cabinet, &ip_address, &user_agent, status, &mut conn).await?;
            debug!("🗃️ Login for {cabinet} from {ip_address} rejected. A session is already open.");
            return Ok(LoginOutcome::SessionExists { cabinet });
        }
        let previous_ip = login_logs::last_success_ip(&cabinet, &mut tx).await?;
        login_logs::insert_login_log(&cabinet, &ip_address, &user_agent, LoginStatus::Success, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Session opened for {cabinet} from {ip_address}");
        Ok(LoginOutcome::Success(SessionGrant { cabinet, session_id, ip_address, user_agent, previous_ip }))
    }

    async fn touch_session(&self, session_id: &str) -> Result<bool, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::touch_session(session_id, &mut conn).await
    }

    async fn fetch_session(&self, session_id: &str) -> Result<Option<Session>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::fetch_session(session_id, &mut conn).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::delete_session(session_id, &mut conn).await
    }

    async fn delete_sessions_for_cabinet(&self, cabinet: &str) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::delete_sessions_for_cabinet(cabinet, &mut conn).await
    }

    async fn delete_idle_sessions(&self, idle: Duration) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::delete_idle_sessions(idle, &mut conn).await
    }

    async fn fetch_access_keys(&self) -> Result<Vec<AccessKey>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        access_keys::all_access_keys(&mut conn).await
    }

    async fn insert_access_key(&self, key: NewAccessKey) -> Result<AccessKey, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let key = access_keys::insert_access_key(&key, &mut conn).await?;
        info!("🗃️ Access key #{} created for {}", key.id, key.cabinet);
        Ok(key)
    }

    async fn set_access_key_active(&self, id: i64, active: bool) -> Result<AccessKey, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        access_keys::set_active(id, active, &mut conn).await
    }

    async fn delete_access_key(&self, id: i64) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        access_keys::delete_access_key(id, &mut conn).await
    }

    async fn fetch_login_logs(&self, limit: i64) -> Result<Vec<LoginLogEntry>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        login_logs::recent_login_logs(limit, &mut conn).await
    }
}

impl TelegramManagement for SqliteDatabase {
    async fn upsert_telegram_user(&self, profile: TelegramProfile) -> Result<TelegramUser, TelegramApiError> {
        let mut conn = self.pool.acquire().await?;
        telegram_users::upsert_user(&profile, &mut conn).await
    }

    async fn bind_cabinet(&self, telegram_id: i64, cabinet: &str) -> Result<TelegramUser, TelegramApiError> {
        let mut tx = self.pool.begin().await?;
        // Bind first so the write lock is held while the existing holder is checked.
        let user = telegram_users::set_cabinet(telegram_id, cabinet, &mut tx)
            .await?
            .ok_or(TelegramApiError::UserNotFound(telegram_id))?;
        let holders = telegram_users::users_for_cabinet(cabinet, &mut tx).await?;
        if holders.iter().any(|u| u.telegram_id != telegram_id) {
            tx.rollback().await?;
            return Err(TelegramApiError::CabinetAlreadyBound(cabinet.to_string()));
        }
        tx.commit().await?;
        debug!("🗃️ Telegram user {telegram_id} bound to {cabinet}");
        Ok(user)
    }

    async fn fetch_telegram_users(&self) -> Result<Vec<TelegramUser>, TelegramApiError> {
        let mut conn = self.pool.acquire().await?;
        telegram_users::all_users(&mut conn).await
    }
}
