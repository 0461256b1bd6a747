use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use ledger_engine::{
    db_types::{
        AccessKey,
        AdminLogEntry,
        Balance,
        BalanceOverride,
        LoginAttempt,
        LoginLogEntry,
        NewAccessKey,
        NewOrder,
        NewOrderRequest,
        NewWithdrawal,
        Order,
        OrderRequest,
        Session,
        TelegramProfile,
        TelegramUser,
        Withdrawal,
    },
    traits::{
        AccessManagement,
        AuthApiError,
        HistoryManagement,
        LedgerError,
        LedgerManagement,
        LoginOutcome,
        OrderManagement,
        TelegramApiError,
        TelegramManagement,
        WithdrawalManagement,
    },
};
use mockall::mock;

mock! {
    pub LedgerManager {}
    impl LedgerManagement for LedgerManager {
        async fn fetch_balances_for_cabinet(&self, cabinet: &str) -> Result<Vec<Balance>, LedgerError>;
        async fn fetch_all_balances(&self) -> Result<Vec<Balance>, LedgerError>;
        async fn override_balance(&self, update: BalanceOverride) -> Result<(Balance, AdminLogEntry), LedgerError>;
        async fn initialise_balances(&self, cabinets: &[String]) -> Result<u64, LedgerError>;
    }
}

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError>;
        async fn fetch_order(&self, id: i64) -> Result<Option<Order>, LedgerError>;
        async fn settle_order(&self, id: i64, receipts: Vec<String>) -> Result<Order, LedgerError>;
        async fn cancel_order(&self, id: i64) -> Result<Order, LedgerError>;
        async fn fetch_orders_for_cabinet(&self, cabinet: &str) -> Result<Vec<Order>, LedgerError>;
        async fn hide_order(&self, cabinet: &str, order_id: i64) -> Result<(), LedgerError>;
        async fn insert_order_request(&self, request: NewOrderRequest) -> Result<OrderRequest, LedgerError>;
        async fn delete_order_request(&self, id: i64) -> Result<u64, LedgerError>;
        async fn fetch_active_order_requests(&self) -> Result<Vec<OrderRequest>, LedgerError>;
    }
}

mock! {
    pub WithdrawalManager {}
    impl WithdrawalManagement for WithdrawalManager {
        async fn insert_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;
        async fn confirm_withdrawal(&self, id: i64, txid: Option<String>) -> Result<Withdrawal, LedgerError>;
        async fn delete_withdrawal(&self, id: i64) -> Result<Option<Withdrawal>, LedgerError>;
        async fn fetch_withdrawals_for_cabinet(&self, cabinet: &str) -> Result<Vec<Withdrawal>, LedgerError>;
        async fn hide_withdrawal(&self, cabinet: &str, withdrawal_id: i64) -> Result<(), LedgerError>;
    }
}

// `Option<&str>` arguments don't sit well with mockall, so history gets a small hand-written stand-in that records
// the filter it was called with.
#[derive(Default)]
pub struct StubHistory {
    pub orders: Vec<Order>,
    pub withdrawals: Vec<Withdrawal>,
    pub adjustments: Vec<AdminLogEntry>,
    pub filters: Arc<Mutex<Vec<Option<String>>>>,
}

impl StubHistory {
    fn record(&self, cabinet: Option<&str>) {
        self.filters.lock().unwrap().push(cabinet.map(String::from));
    }
}

impl HistoryManagement for StubHistory {
    async fn fetch_completed_orders(&self, cabinet: Option<&str>) -> Result<Vec<Order>, LedgerError> {
        self.record(cabinet);
        Ok(self.orders.clone())
    }

    async fn fetch_completed_withdrawals(&self, cabinet: Option<&str>) -> Result<Vec<Withdrawal>, LedgerError> {
        self.record(cabinet);
        Ok(self.withdrawals.clone())
    }

    async fn fetch_balance_adjustments(&self, cabinet: Option<&str>) -> Result<Vec<AdminLogEntry>, LedgerError> {
        self.record(cabinet);
        Ok(self.adjustments.clone())
    }
}

mock! {
    pub AccessManager {}
    impl AccessManagement for AccessManager {
        async fn login(&self, attempt: LoginAttempt) -> Result<LoginOutcome, AuthApiError>;
        async fn touch_session(&self, session_id: &str) -> Result<bool, AuthApiError>;
        async fn fetch_session(&self, session_id: &str) -> Result<Option<Session>, AuthApiError>;
        async fn delete_session(&self, session_id: &str) -> Result<u64, AuthApiError>;
        async fn delete_sessions_for_cabinet(&self, cabinet: &str) -> Result<u64, AuthApiError>;
        async fn delete_idle_sessions(&self, idle: Duration) -> Result<u64, AuthApiError>;
        async fn fetch_access_keys(&self) -> Result<Vec<AccessKey>, AuthApiError>;
        async fn insert_access_key(&self, key: NewAccessKey) -> Result<AccessKey, AuthApiError>;
        async fn set_access_key_active(&self, id: i64, active: bool) -> Result<AccessKey, AuthApiError>;
        async fn delete_access_key(&self, id: i64) -> Result<u64, AuthApiError>;
        async fn fetch_login_logs(&self, limit: i64) -> Result<Vec<LoginLogEntry>, AuthApiError>;
    }
}

mock! {
    pub TelegramManager {}
    impl TelegramManagement for TelegramManager {
        async fn upsert_telegram_user(&self, profile: TelegramProfile) -> Result<TelegramUser, TelegramApiError>;
        async fn bind_cabinet(&self, telegram_id: i64, cabinet: &str) -> Result<TelegramUser, TelegramApiError>;
        async fn fetch_telegram_users(&self) -> Result<Vec<TelegramUser>, TelegramApiError>;
    }
}
