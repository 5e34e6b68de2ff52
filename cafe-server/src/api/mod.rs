//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`menu`] - 菜单查询和管理
//! - [`orders`] - 下单、订单查询、状态流转和统计
//! - [`users`] - 注册登录、个人资料、用户管理
//! - [`middleware`] - 请求日志

pub mod health;
pub mod menu;
pub mod middleware;
pub mod orders;
pub mod pagination;
pub mod users;

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use http::HeaderName;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

pub use crate::utils::{ApiResponse, AppResult};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        // Menu API - reads public, writes need menu:manage
        .merge(menu::router())
        // Orders API - guest checkout public, management needs orders:manage
        .merge(orders::router())
        // Users API - register/login public, the rest authenticated
        .merge(users::router())
}

/// Build the fully configured application with all middleware and state
///
/// Used by the HTTP server and by integration tests (`oneshot`).
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    build_router()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        // ========== Application Middleware ==========
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // JWT authentication - injects CurrentUser for protected routes
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .with_state(state)
}
