//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::Paginated;
use shared::models::{
    Order, OrderCreate, OrderStats, OrderStatus, OrderStatusUpdate, OrderType, PaymentStatus,
    PaymentStatusUpdate,
};

use crate::api::pagination::{DEFAULT_PAGE_SIZE, PageWindow, parse_descending, parse_optional};
use crate::auth::CurrentUser;
use crate::auth::permissions::ORDERS_MANAGE;
use crate::core::ServerState;
use crate::orders::{OrderFilter, OrderQuery, OrderSortField};
use crate::security_log;
use crate::utils::time::date_range_millis;
use crate::utils::validation::normalize_email;
use crate::utils::{ApiResponse, AppError, AppResult};

const CUSTOMER_PAGE_SIZE: u32 = 10;

/// Query params for listing orders
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub order_type: Option<String>,
    pub payment_status: Option<String>,
    /// YYYY-MM-DD, business time zone
    pub start_date: Option<String>,
    /// YYYY-MM-DD inclusive
    pub end_date: Option<String>,
    /// Case-insensitive substring
    pub customer_email: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn build_list_query(
    params: ListQuery,
    tz: chrono_tz::Tz,
) -> AppResult<(PageWindow, OrderQuery)> {
    let window = PageWindow::parse(params.page, params.limit, DEFAULT_PAGE_SIZE)?;
    let (created_from, created_to) =
        date_range_millis(params.start_date.as_deref(), params.end_date.as_deref(), tz)?;

    let filter = OrderFilter {
        status: parse_optional::<OrderStatus>(params.status.as_deref())?,
        order_type: parse_optional::<OrderType>(params.order_type.as_deref())?,
        payment_status: parse_optional::<PaymentStatus>(params.payment_status.as_deref())?,
        created_from,
        created_to,
        customer_email: None,
        customer_email_contains: params
            .customer_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
    };

    let query = OrderQuery {
        filter,
        sort: parse_optional::<OrderSortField>(params.sort_by.as_deref())?.unwrap_or_default(),
        descending: parse_descending(params.sort_order.as_deref(), true)?,
        offset: window.offset(),
        limit: Some(window.limit),
    };
    Ok((window, query))
}

/// Order owner (by customer email) or staff with `orders:manage`
fn ensure_owner_or_manager(user: &CurrentUser, customer_email: &str) -> AppResult<()> {
    if user.email == customer_email || user.has_permission(ORDERS_MANAGE) {
        return Ok(());
    }
    security_log!(
        "WARN",
        "order_access_denied",
        user_id = user.id.clone(),
        customer_email = customer_email.to_string()
    );
    Err(AppError::forbidden("You can only access your own orders"))
}

/// POST /api/orders
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let order = state.orders.create_order(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Order created successfully",
            order,
        )),
    ))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.get(&id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Order>>>> {
    let (window, query) = build_list_query(params, state.config.timezone)?;
    let (orders, total) = state.orders.list(&query).await?;
    Ok(Json(ApiResponse::success(Paginated::new(
        orders,
        window.page,
        window.limit,
        total,
    ))))
}

/// GET /api/orders/customer/{email}
///
/// Newest first, 10 per page by default.
pub async fn list_by_customer(
    State(state): State<ServerState>,
    Path(email): Path<String>,
    Query(params): Query<PageQuery>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Paginated<Order>>>> {
    let email = normalize_email(&email);
    ensure_owner_or_manager(&user, &email)?;

    let window = PageWindow::parse(params.page, params.limit, CUSTOMER_PAGE_SIZE)?;
    let query = OrderQuery {
        filter: OrderFilter {
            customer_email: Some(email),
            ..Default::default()
        },
        offset: window.offset(),
        limit: Some(window.limit),
        ..Default::default()
    };

    let (orders, total) = state.orders.list(&query).await?;
    Ok(Json(ApiResponse::success(Paginated::new(
        orders,
        window.page,
        window.limit,
        total,
    ))))
}

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let status: OrderStatus = payload.status.parse().map_err(AppError::validation)?;
    let order = state.orders.transition(&id, status).await?;

    tracing::info!(order_id = %order.id, status = %status, by = %user.email, "Order status changed");
    Ok(Json(ApiResponse::success_with_message(
        "Order status updated successfully",
        order,
    )))
}

/// PATCH /api/orders/{id}/payment
pub async fn update_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let payment_status: PaymentStatus = payload
        .payment_status
        .parse()
        .map_err(AppError::validation)?;
    let order = state.orders.set_payment_status(&id, payment_status).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Payment status updated successfully",
        order,
    )))
}

/// DELETE /api/orders/{id}
///
/// Cancels the order; it stays on record with status `cancelled`.
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Order>>> {
    let existing = state.orders.get(&id).await?;
    ensure_owner_or_manager(&user, &existing.customer.email)?;

    let order = state.orders.cancel(&id).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Order cancelled successfully",
        order,
    )))
}

/// GET /api/orders/stats/summary
pub async fn statistics(
    State(state): State<ServerState>,
    Query(params): Query<StatsQuery>,
) -> AppResult<Json<ApiResponse<OrderStats>>> {
    let (start, end) = date_range_millis(
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        state.config.timezone,
    )?;
    let stats = state.orders.statistics(start, end).await?;
    Ok(Json(ApiResponse::success(stats)))
}
