//! Users API 模块
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/users/register | POST | 公开 |
//! | /api/users/login | POST | 公开 |
//! | /api/users/profile | GET / PUT | 已登录 |
//! | /api/users/password | PUT | 已登录 |
//! | /api/users | GET | users:manage |
//! | /api/users/{id}/status | PATCH | users:manage |
//! | /api/users/stats/summary | GET | users:manage |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::permissions::USERS_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    let account_routes = Router::new().nest("/api/users", users_account_routes());

    let admin_routes = Router::new()
        .nest("/api/users", users_admin_routes())
        .layer(middleware::from_fn(require_permission(USERS_MANAGE)));

    account_routes.merge(admin_routes)
}

fn users_account_routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route(
            "/profile",
            get(handler::get_profile).put(handler::update_profile),
        )
        .route("/password", put(handler::change_password))
}

fn users_admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}/status", patch(handler::toggle_status))
        .route("/stats/summary", get(handler::statistics))
}
