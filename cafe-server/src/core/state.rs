use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::{Config, DatabaseLocation, Result};
use crate::db::DbService;
use crate::db::repository::{MenuItemRepository, OrderRepository, UserRepository};
use crate::db::seed::seed_demo_data;
use crate::orders::{OrderEngine, SystemClock};

/// 服务器状态 - 所有请求共享 (克隆开销低)
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,
    pub orders: Arc<OrderEngine>,
    pub menu: MenuItemRepository,
    pub users: UserRepository,
}

impl ServerState {
    /// 基于已打开的数据库组装状态
    pub fn new(config: Config, db: Surreal<Db>) -> Self {
        let menu = MenuItemRepository::new(db.clone());
        let orders = OrderEngine::new(
            Arc::new(menu.clone()),
            Arc::new(OrderRepository::new(db.clone())),
            Arc::new(SystemClock),
            config.timezone,
        )
        .with_policy(config.order_status_policy);
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            users: UserRepository::new(db.clone()),
            menu,
            orders: Arc::new(orders),
            jwt_service,
            db,
            config,
        }
    }

    /// 打开数据库、写入演示数据并组装状态
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db_service = match &config.database {
            DatabaseLocation::Memory => DbService::memory().await?,
            DatabaseLocation::Path(path) => {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
                DbService::new(path).await?
            }
        };

        if config.seed_demo_data {
            let (items, admin) =
                seed_demo_data(&db_service.db, config.seed_admin_password.as_deref())
                    .await
                    .map_err(|e| crate::core::ServerError::Database(e.to_string()))?;
            tracing::info!(menu_items = items, admin_created = admin, "Demo data checked");
        }

        tracing::info!(
            timezone = %config.timezone,
            order_status_policy = %config.order_status_policy,
            "Order engine configured"
        );

        Ok(Self::new(config.clone(), db_service.db))
    }

    pub fn get_db(&self) -> &Surreal<Db> {
        &self.db
    }

    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}
