//! Menu API 模块
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/menu | GET | 公开 |
//! | /api/menu/categories | GET | 公开 |
//! | /api/menu/featured | GET | 公开 |
//! | /api/menu/{id} | GET | 公开 |
//! | /api/menu | POST | menu:manage |
//! | /api/menu/{id} | PUT / DELETE | menu:manage |
//! | /api/menu/{id}/availability | PATCH | menu:manage |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::permissions::MENU_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let read_routes = Router::new().nest("/api/menu", menu_read_routes());

    let write_routes = Router::new()
        .nest("/api/menu", menu_write_routes())
        .layer(middleware::from_fn(require_permission(MENU_MANAGE)));

    read_routes.merge(write_routes)
}

fn menu_read_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/categories", get(handler::categories))
        .route("/featured", get(handler::featured))
        .route("/{id}", get(handler::get_by_id))
}

fn menu_write_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/availability", patch(handler::toggle_availability))
}
