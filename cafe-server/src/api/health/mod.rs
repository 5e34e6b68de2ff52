//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /health | GET | 服务状态、运行时间、数据库检查 | 无 |
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "environment": "development",
//!   "uptime_seconds": 42,
//!   "database": { "status": "ok", "latency_ms": 0 }
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::{Instant, SystemTime};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    environment: String,
    uptime_seconds: u64,
    database: CheckResult,
}

/// 单项检查结果
#[derive(Debug, Serialize)]
pub struct CheckResult {
    /// ok | error
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl CheckResult {
    fn ok_with_latency(latency_ms: u64) -> Self {
        Self {
            status: "ok",
            latency_ms: Some(latency_ms),
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            latency_ms: None,
            message: Some(message.into()),
        }
    }
}

// 服务器启动时间 (首次访问时记录)
static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

/// Record the start instant; called once at startup
pub fn mark_started() {
    START_TIME.get_or_init(SystemTime::now);
}

fn uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// GET /health
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let started = Instant::now();
    let database = match state.get_db().health().await {
        Ok(()) => CheckResult::ok_with_latency(started.elapsed().as_millis() as u64),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            CheckResult::error(e.to_string())
        }
    };

    Json(HealthResponse {
        status: if database.status == "ok" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_seconds: uptime_seconds(),
        database,
    })
}
