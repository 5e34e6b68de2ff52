//! 请求日志中间件
//!
//! 记录每个 HTTP 请求的方法、路径、状态码、延迟和认证用户

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::CurrentUser;

/// 请求日志中间件
///
/// 4xx / 5xx 以 warn 级别记录，其余 info。
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let user = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| format!("{}({})", u.email, u.role));

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status();

    if status.is_server_error() || status.is_client_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms = %latency_ms,
            user = ?user,
            "Request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms = %latency_ms,
            user = ?user,
            "Request completed"
        );
    }

    response
}
