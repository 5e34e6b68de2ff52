//! Order engine
//!
//! Creation (pricing + numbering), status transitions, cancellation,
//! payment status updates and statistics. Every call is request-scoped;
//! the only shared state lives behind [`OrderStore`].

use std::sync::Arc;

use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::models::{
    CustomerInfo, MenuItem, Order, OrderCreate, OrderLine, OrderLineRequest, OrderStats,
    OrderStatus, OrderType, PaymentMethod, PaymentStatus,
};
use validator::Validate;

use super::money::{OrderTotals, checked_add, line_total, to_f64};
use super::number::{counter_key, format_order_number};
use super::policy::StatusPolicy;
use super::stats::summarize;
use super::traits::{
    CatalogLookup, Clock, OrderError, OrderFilter, OrderQuery, OrderResult, OrderStore,
};
use crate::db::repository::RepoError;
use crate::utils::time::{day_end_millis, day_start_millis, local_date};

/// Fresh numbers tried when the assigned one is already taken
const MAX_NUMBER_ATTEMPTS: u32 = 3;
use crate::utils::validation::{normalize_email, optional_text};

pub struct OrderEngine {
    catalog: Arc<dyn CatalogLookup>,
    store: Arc<dyn OrderStore>,
    clock: Arc<dyn Clock>,
    tz: Tz,
    policy: StatusPolicy,
}

impl OrderEngine {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        store: Arc<dyn OrderStore>,
        clock: Arc<dyn Clock>,
        tz: Tz,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            tz,
            policy: StatusPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    // ========== Creation ==========

    /// Validate, price, number and persist a new order
    ///
    /// Nothing is written unless every line resolves to an available item.
    pub async fn create_order(&self, req: OrderCreate) -> OrderResult<Order> {
        let draft = Draft::parse(req)?;

        let mut lines = Vec::with_capacity(draft.items.len());
        let mut raw_subtotal = Decimal::ZERO;
        let mut prep_time: Option<u32> = None;

        for line_req in draft.items {
            let item = self.resolve_item(&line_req).await?;
            if !item.is_available {
                return Err(OrderError::ItemUnavailable(item.name));
            }

            raw_subtotal = checked_add(
                raw_subtotal,
                line_total(item.price, line_req.quantity, &line_req.customization)?,
            )?;
            prep_time = prep_time.max(Some(item.preparation_time));

            lines.push(OrderLine {
                menu_item: item.id,
                name: item.name,
                quantity: line_req.quantity,
                price: item.price,
                special_instructions: optional_text(line_req.special_instructions),
                customization: line_req.customization,
            });
        }

        let totals = OrderTotals::compute(raw_subtotal, draft.order_type)?;
        let now = self.clock.now_millis();

        let mut order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: String::new(),
            customer: draft.customer,
            items: lines,
            status: OrderStatus::Pending,
            order_type: draft.order_type,
            subtotal: to_f64(totals.subtotal)?,
            tax: to_f64(totals.tax)?,
            delivery_fee: to_f64(totals.delivery_fee)?,
            total: to_f64(totals.total)?,
            payment_method: draft.payment_method,
            payment_status: PaymentStatus::Pending,
            estimated_preparation_time: prep_time,
            special_requests: draft.special_requests,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        self.insert_numbered(&mut order).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            items = order.item_count(),
            total = order.total,
            "Order created"
        );
        Ok(order)
    }

    async fn resolve_item(&self, line: &OrderLineRequest) -> OrderResult<MenuItem> {
        match (line.menu_item.as_deref(), line.name.as_deref()) {
            (Some(id), _) => self
                .catalog
                .find_item_by_id(id)
                .await?
                .ok_or_else(|| OrderError::ItemNotFound(id.to_string())),
            (None, Some(name)) => self
                .catalog
                .find_item_by_name(name)
                .await?
                .ok_or_else(|| OrderError::ItemNotFound(name.to_string())),
            (None, None) => Err(OrderError::Validation(
                "Each item must reference a menu item id or name".to_string(),
            )),
        }
    }

    /// Number and persist `order`, drawing a fresh number while the
    /// assigned one collides with an existing order
    async fn insert_numbered(&self, order: &mut Order) -> OrderResult<()> {
        let mut attempt = 0;
        loop {
            order.order_number = self.assign_order_number(order.created_at).await?;
            match self.store.create(order).await {
                Ok(()) => return Ok(()),
                Err(RepoError::Duplicate(msg)) if attempt + 1 < MAX_NUMBER_ATTEMPTS => {
                    tracing::warn!(
                        order_number = %order.order_number,
                        attempt = attempt + 1,
                        error = %msg,
                        "Order number taken, drawing another"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Daily sequence from the atomic counter, seeded with the number of
    /// orders already created today
    async fn assign_order_number(&self, now: i64) -> OrderResult<String> {
        let today = local_date(now, self.tz);
        let existing = self
            .store
            .count_created_between(day_start_millis(today, self.tz), day_end_millis(today, self.tz))
            .await?;
        let seq = self
            .store
            .next_daily_sequence(&counter_key(today), existing)
            .await?;
        Ok(format_order_number(today, seq))
    }

    // ========== Lifecycle ==========

    pub async fn get(&self, id: &str) -> OrderResult<Order> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))
    }

    /// Set a new status, subject to the configured policy
    ///
    /// Completing an order whose payment is still pending marks it paid.
    pub async fn transition(&self, id: &str, new_status: OrderStatus) -> OrderResult<Order> {
        let mut order = self.get(id).await?;
        let from = order.status;

        if !self.policy.allows(from, new_status) {
            return Err(OrderError::InvalidStateTransition {
                from,
                to: new_status,
            });
        }

        order.status = new_status;
        if new_status == OrderStatus::Completed && order.payment_status == PaymentStatus::Pending {
            order.payment_status = PaymentStatus::Paid;
        }
        order.updated_at = self.clock.now_millis();
        self.store.save(&order).await?;

        tracing::info!(
            order_id = %order.id,
            from = %from,
            to = %new_status,
            policy = %self.policy,
            "Order status updated"
        );
        Ok(order)
    }

    /// Cancel a pending or confirmed order; payment status is left alone
    pub async fn cancel(&self, id: &str) -> OrderResult<Order> {
        let mut order = self.get(id).await?;
        if !order.status.is_cancellable() {
            return Err(OrderError::InvalidStateTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = self.clock.now_millis();
        self.store.save(&order).await?;

        tracing::info!(order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    /// Unconditional payment status write
    pub async fn set_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
    ) -> OrderResult<Order> {
        let mut order = self.get(id).await?;
        let from = order.payment_status;

        order.payment_status = payment_status;
        order.updated_at = self.clock.now_millis();
        self.store.save(&order).await?;

        tracing::info!(
            order_id = %order.id,
            from = %from,
            to = %payment_status,
            "Payment status updated"
        );
        Ok(order)
    }

    // ========== Queries ==========

    pub async fn list(&self, query: &OrderQuery) -> OrderResult<(Vec<Order>, u64)> {
        Ok(self.store.find_many(query).await?)
    }

    /// Statistics over orders with `start <= createdAt < end`
    pub async fn statistics(&self, start: Option<i64>, end: Option<i64>) -> OrderResult<OrderStats> {
        let filter = OrderFilter {
            created_from: start,
            created_to: end,
            ..Default::default()
        };
        let groups = self.store.totals_by_status(&filter).await?;
        summarize(&groups)
    }
}

// =============================================================================
// Request parsing
// =============================================================================

/// A creation request with every field checked and normalised
struct Draft {
    customer: CustomerInfo,
    items: Vec<OrderLineRequest>,
    order_type: OrderType,
    payment_method: PaymentMethod,
    special_requests: Option<String>,
    notes: Option<String>,
}

impl Draft {
    fn parse(req: OrderCreate) -> OrderResult<Self> {
        req.validate()
            .map_err(|e| OrderError::Validation(e.to_string().replace('\n', "; ")))?;

        let order_type = req.order_type.parse().map_err(OrderError::Validation)?;
        let payment_method = req.payment_method.parse().map_err(OrderError::Validation)?;

        let customer = CustomerInfo {
            name: req.customer.name.trim().to_string(),
            email: normalize_email(&req.customer.email),
            phone: req.customer.phone.trim().to_string(),
        };
        if customer.name.is_empty() {
            return Err(OrderError::Validation("Customer name is required".to_string()));
        }
        if customer.phone.is_empty() {
            return Err(OrderError::Validation("Customer phone is required".to_string()));
        }

        for line in &req.items {
            let has_id = line.menu_item.as_deref().is_some_and(|id| !id.trim().is_empty());
            let has_name = line.name.as_deref().is_some_and(|n| !n.trim().is_empty());
            if !has_id && !has_name {
                return Err(OrderError::Validation(
                    "Each item must reference a menu item id or name".to_string(),
                ));
            }
        }

        Ok(Self {
            customer,
            items: req.items,
            order_type,
            payment_method,
            special_requests: optional_text(req.special_requests),
            notes: optional_text(req.notes),
        })
    }
}
