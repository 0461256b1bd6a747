//! Orders and order requests.
//!
//! An order moves `amount_usdt` between two cabinets once it is paid. Creating an order doesn't touch balances; paying
//! it (settling) does. An order request is an open invitation to fill; orders that reference it draw down its
//! remaining amount, and cancelling such an order gives the amount back.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, NewOrderRequest, Order, OrderRequest},
    ledger_api::required,
    traits::{LedgerError, OrderManagement},
};

pub struct OrderFlowApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_order(&self, mut order: NewOrder) -> Result<Order, LedgerError> {
        order.from_cabinet = required(&order.from_cabinet, "from_cabinet")?;
        order.to_cabinet = required(&order.to_cabinet, "to_cabinet")?;
        order.order_type = required(&order.order_type, "type")?;
        if !order.amount_usdt.is_positive() {
            return Err(LedgerError::ValidationError("amount_usdt must be positive".to_string()));
        }
        let order = self.db.insert_order(order).await?;
        let Order { id, from_cabinet, to_cabinet, amount_usdt, .. } = &order;
        debug!("🧾️ Order #{id} created: {from_cabinet} → {to_cabinet} for {amount_usdt}");
        Ok(order)
    }

    pub async fn fetch_order(&self, id: i64) -> Result<Option<Order>, LedgerError> {
        self.db.fetch_order(id).await
    }

    /// Marks the order as paid and moves its amount between the two cabinets.
    pub async fn settle_order(&self, id: i64, receipts: Vec<String>) -> Result<Order, LedgerError> {
        let receipts = receipts.into_iter().map(|r| r.trim().to_string()).filter(|r| !r.is_empty()).collect();
        self.db.settle_order(id, receipts).await
    }

    pub async fn cancel_order(&self, id: i64) -> Result<Order, LedgerError> {
        self.db.cancel_order(id).await
    }

    /// The orders where `cabinet` is either party, newest first, without the ones it has hidden.
    pub async fn orders_for_cabinet(&self, cabinet: &str) -> Result<Vec<Order>, LedgerError> {
        self.db.fetch_orders_for_cabinet(cabinet).await
    }

    pub async fn hide_order(&self, cabinet: &str, order_id: i64) -> Result<(), LedgerError> {
        let cabinet = required(cabinet, "cabinet")?;
        self.db.hide_order(&cabinet, order_id).await
    }

    pub async fn create_order_request(&self, mut request: NewOrderRequest) -> Result<OrderRequest, LedgerError> {
        request.from_cabinet = required(&request.from_cabinet, "from_cabinet")?;
        request.to_cabinet = required(&request.to_cabinet, "to_cabinet")?;
        request.request_type = required(&request.request_type, "type")?;
        if !request.amount.is_positive() {
            return Err(LedgerError::ValidationError("amount must be positive".to_string()));
        }
        self.db.insert_order_request(request).await
    }

    /// Removes an order request. Orders already filled against it keep their `request_id`.
    pub async fn delete_order_request(&self, id: i64) -> Result<u64, LedgerError> {
        let n = self.db.delete_order_request(id).await?;
        if n == 0 {
            debug!("🧾️ Order request #{id} was already gone");
        }
        Ok(n)
    }

    pub async fn active_order_requests(&self) -> Result<Vec<OrderRequest>, LedgerError> {
        self.db.fetch_active_order_requests().await
    }
}
