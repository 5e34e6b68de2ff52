//! Cafe Server - 咖啡店点单后端
//!
//! # 架构概述
//!
//! - **订单引擎** (`orders`): 下单计价、订单号分配、状态流转、统计
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储 (菜单、订单、用户)
//! - **认证** (`auth`): JWT + Argon2 认证体系，基于角色的权限
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! cafe-server/src/
//! ├── core/          # 配置、状态、错误、HTTP 服务器
//! ├── auth/          # JWT 认证、权限
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单引擎
//! ├── db/            # 数据库层、演示数据
//! └── utils/         # 日志、时间、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderEngine, StatusPolicy};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境
///
/// 1. 加载 `.env` (不存在时忽略)
/// 2. 按 `LOG_LEVEL` / `LOG_JSON` / `LOG_DIR` 初始化日志
pub fn setup_environment() {
    if let Err(e) = dotenv::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {e}");
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_json = std::env::var("LOG_JSON").ok().and_then(|v| v.parse().ok());
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_json, log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
   ______        ____
  / ____/____ _ / __/___
 / /    / __ `// /_ / _ \
/ /___ / /_/ // __//  __/
\____/ \__,_//_/   \___/
    "#
    );
}
