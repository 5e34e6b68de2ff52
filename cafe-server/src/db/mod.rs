//! Database Module
//!
//! 嵌入式 SurrealDB：磁盘 (SurrealKV) 或内存 (测试 / 临时运行)

pub mod repository;
pub mod seed;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, SurrealKv};

use crate::utils::AppError;

const NAMESPACE: &str = "cafe";
const DATABASE: &str = "cafe";

/// 表与索引定义 (幂等)
const SCHEMA: &str = "\
    DEFINE TABLE IF NOT EXISTS orders SCHEMALESS;\
    DEFINE TABLE IF NOT EXISTS order_counter SCHEMALESS;\
    DEFINE INDEX IF NOT EXISTS orders_number_unique ON TABLE orders FIELDS orderNumber UNIQUE;\
    DEFINE INDEX IF NOT EXISTS orders_created_at ON TABLE orders FIELDS createdAt;\
    DEFINE INDEX IF NOT EXISTS users_email_unique ON TABLE users FIELDS email UNIQUE;\
    DEFINE INDEX IF NOT EXISTS menu_item_category ON TABLE menu_item FIELDS category;";

/// Database service owning the SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database at `db_path`
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<SurrealKv>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
        tracing::info!(path = %db_path, "Database connection established (SurrealKV)");
        Self::prepare(db).await
    }

    /// Fresh in-memory database
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;
        tracing::debug!("In-memory database opened");
        Self::prepare(db).await
    }

    async fn prepare(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .and_then(|response| response.check())
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;
        tracing::info!("Database schema applied");

        Ok(Self { db })
    }
}
