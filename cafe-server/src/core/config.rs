use chrono_tz::Tz;

use crate::auth::JwtConfig;
use crate::core::ServerError;
use crate::orders::StatusPolicy;

/// 数据库位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// 进程内内存库，重启即丢失
    Memory,
    /// SurrealKV 目录
    Path(String),
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DATABASE_PATH | {WORK_DIR}/cafe.db | 数据库目录，`memory` 为内存库 |
/// | TIMEZONE | Asia/Kolkata | 业务时区 (订单号日期、统计日期) |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | ORDER_STATUS_POLICY | permissive | 订单状态流转策略 (`permissive` / `strict`) |
/// | SEED_DEMO_DATA | true | 菜单为空时写入演示菜单 |
/// | SEED_ADMIN_PASSWORD | - | 设置后创建 admin@cafe.com 管理员 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_JSON | false | JSON 日志 |
/// | LOG_DIR | - | 日志文件目录 (按天滚动) |
///
/// JWT 相关见 [`JwtConfig::from_env`]。
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub database: DatabaseLocation,
    pub timezone: Tz,
    pub request_timeout_ms: u64,
    pub order_status_policy: StatusPolicy,
    pub seed_demo_data: bool,
    pub seed_admin_password: Option<String>,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub jwt: JwtConfig,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的项使用默认值；无法解析的时区或状态策略直接报错。
    pub fn from_env() -> Result<Self, ServerError> {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());

        let database = match std::env::var("DATABASE_PATH") {
            Ok(path) if path.eq_ignore_ascii_case("memory") => DatabaseLocation::Memory,
            Ok(path) => DatabaseLocation::Path(path),
            Err(_) => DatabaseLocation::Path(format!("{}/cafe.db", work_dir.trim_end_matches('/'))),
        };

        let timezone = match std::env::var("TIMEZONE") {
            Ok(tz) => tz
                .parse::<Tz>()
                .map_err(|_| ServerError::Config(format!("Unknown TIMEZONE: {tz}")))?,
            Err(_) => chrono_tz::Asia::Kolkata,
        };

        let order_status_policy = match std::env::var("ORDER_STATUS_POLICY") {
            Ok(policy) => policy.parse().map_err(ServerError::Config)?,
            Err(_) => StatusPolicy::default(),
        };

        Ok(Self {
            work_dir,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            database,
            timezone,
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            order_status_policy,
            seed_demo_data: std::env::var("SEED_DEMO_DATA")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            seed_admin_password: std::env::var("SEED_ADMIN_PASSWORD")
                .ok()
                .filter(|p| !p.is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            jwt: JwtConfig::from_env()?,
        })
    }

    /// 内存库 + 固定密钥，不读环境变量 (测试用)
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            work_dir: ".".to_string(),
            http_port: 0,
            environment: "test".to_string(),
            database: DatabaseLocation::Memory,
            timezone: chrono_tz::Asia::Kolkata,
            request_timeout_ms: 30000,
            order_status_policy: StatusPolicy::default(),
            seed_demo_data: false,
            seed_admin_password: None,
            log_level: "info".to_string(),
            log_json: false,
            log_dir: None,
            jwt: JwtConfig::with_secret(jwt_secret),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
