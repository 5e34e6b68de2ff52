//! Order API 模块
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/orders | POST | 公开 (游客下单) |
//! | /api/orders/{id} | GET | 公开 |
//! | /api/orders/{id} | DELETE | 下单人或 orders:manage (取消) |
//! | /api/orders/customer/{email} | GET | 本人或 orders:manage |
//! | /api/orders | GET | orders:manage |
//! | /api/orders/{id}/status | PATCH | orders:manage |
//! | /api/orders/{id}/payment | PATCH | orders:manage |
//! | /api/orders/stats/summary | GET | reports:view |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::permissions::{ORDERS_MANAGE, REPORTS_VIEW};
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let customer_routes = Router::new().nest("/api/orders", orders_customer_routes());

    let manage_routes = Router::new()
        .nest("/api/orders", orders_manage_routes())
        .layer(middleware::from_fn(require_permission(ORDERS_MANAGE)));

    let report_routes = Router::new()
        .route("/api/orders/stats/summary", get(handler::statistics))
        .layer(middleware::from_fn(require_permission(REPORTS_VIEW)));

    customer_routes.merge(manage_routes).merge(report_routes)
}

/// 公开或由处理器自行校验归属的路由
fn orders_customer_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id).delete(handler::cancel))
        .route("/customer/{email}", get(handler::list_by_customer))
}

fn orders_manage_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/payment", patch(handler::update_payment))
}
