use crate::{
    db_types::{NewOrder, NewOrderRequest, Order, OrderRequest},
    traits::LedgerError,
};

/// The order and order-request lifecycles.
///
/// Orders move `pending -> completed` or `pending -> cancelled`. Both targets are terminal. Every transition is a
/// compare-and-swap on the status column, so two racing callers can never both succeed.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new pending order. If the order references a request, the request's remaining amount is reduced by
    /// `amount_usdt` in the same transaction. No floor is applied; the remaining amount can go negative.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError>;

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, LedgerError>;

    /// Marks a pending order as completed, stores its receipts and applies the balance effect, atomically.
    ///
    /// Fails with `AlreadySettled` if the order is completed, `InvalidTransition` if it was cancelled, and
    /// `OrderNotFound` if it does not exist.
    async fn settle_order(&self, id: i64, receipts: Vec<String>) -> Result<Order, LedgerError>;

    /// Marks a pending order as cancelled and gives its amount back to the linked request, if any.
    async fn cancel_order(&self, id: i64) -> Result<Order, LedgerError>;

    /// Orders where `cabinet` is either party, excluding those it has hidden, newest first.
    async fn fetch_orders_for_cabinet(&self, cabinet: &str) -> Result<Vec<Order>, LedgerError>;

    /// Hides the order from `cabinet`'s listings. Idempotent.
    async fn hide_order(&self, cabinet: &str, order_id: i64) -> Result<(), LedgerError>;

    async fn insert_order_request(&self, request: NewOrderRequest) -> Result<OrderRequest, LedgerError>;

    /// Deletes the order request outright. Returns the number of rows removed (0 or 1).
    async fn delete_order_request(&self, id: i64) -> Result<u64, LedgerError>;

    /// Order requests with a positive remaining amount, newest first.
    async fn fetch_active_order_requests(&self) -> Result<Vec<OrderRequest>, LedgerError>;
}
