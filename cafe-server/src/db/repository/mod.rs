//! Repository Module
//!
//! SurrealDB access for menu items, orders and users.

pub mod menu_item;
pub mod order;
pub mod user;

pub use menu_item::{MenuItemQuery, MenuItemRepository, MenuSortField};
pub use order::OrderRepository;
pub use user::{UserQuery, UserRecord, UserRepository, UserSortField};

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Optimistic transaction lost a race with a concurrent writer
    #[error("Transaction conflict: {0}")]
    Retryable(String),
}

impl RepoError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepoError::Retryable(_))
    }
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // UNIQUE 索引冲突
        if msg.contains("already contains") {
            RepoError::Duplicate(msg)
        } else if msg.contains("can be retried") {
            // 乐观事务读写冲突
            RepoError::Retryable(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

impl From<RepoError> for shared::error::AppError {
    fn from(err: RepoError) -> Self {
        use shared::error::{AppError, ErrorCode};
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Database(msg) | RepoError::Retryable(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Maximum attempts for a write that keeps losing transaction races
const MAX_RETRY_ATTEMPTS: u32 = 8;
const RETRY_BASE_DELAY_MS: u64 = 2;

/// Run `op` again with exponential backoff while it fails with
/// [`RepoError::Retryable`]; any other outcome is returned as is
pub(crate) async fn with_retry<T, F, Fut>(label: &str, mut op: F) -> RepoResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RepoResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt + 1 < MAX_RETRY_ATTEMPTS => {
                let delay_ms = RETRY_BASE_DELAY_MS * 2u64.pow(attempt);
                tracing::warn!(
                    op = label,
                    attempt = attempt + 1,
                    delay_ms = delay_ms,
                    error = %e,
                    "Transaction conflict, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

// =============================================================================
// ID Convention
// =============================================================================
//
// 记录 key 为 uuid 字符串，对外只暴露纯 key：
//   - 写入: type::thing($table, $id)，CONTENT 中不含 id
//   - 读取: SELECT *, record::id(id) AS id
//   - Rust 模型中 id 一律为 String

/// Serialize an entity for `CONTENT`, dropping its `id`
pub(crate) fn content_without_id<T: Serialize>(entity: &T) -> RepoResult<serde_json::Value> {
    let mut value = serde_json::to_value(entity)
        .map_err(|e| RepoError::Database(format!("Failed to serialize record: {e}")))?;
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    Ok(value)
}

/// Row shape of `SELECT count() AS count ... GROUP ALL`
#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub count: u64,
}

/// `GROUP ALL` yields no row at all when nothing matches
pub(crate) fn first_count(rows: Vec<CountRow>) -> u64 {
    rows.into_iter().next().map_or(0, |row| row.count)
}

/// WHERE clause builder; values are always bound, never interpolated
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    bindings: Vec<(String, serde_json::Value)>,
}

impl Conditions {
    pub fn push(&mut self, clause: impl Into<String>, name: &str, value: impl Serialize) {
        self.clauses.push(clause.into());
        self.bindings.push((
            name.to_string(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        ));
    }

    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn bindings(&self) -> impl Iterator<Item = (String, serde_json::Value)> + '_ {
        self.bindings.iter().cloned()
    }
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }

    /// Run a filtered page query and its count in one round trip
    pub(crate) async fn find_page<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        conditions: &Conditions,
        order_by: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> RepoResult<(Vec<T>, u64)> {
        let where_clause = conditions.where_clause();
        let paging = match limit {
            Some(_) => " LIMIT $limit START $start",
            None => "",
        };
        let sql = format!(
            "SELECT *, record::id(id) AS id FROM {table}{where_clause} ORDER BY {order_by}{paging};\
             SELECT count() AS count FROM {table}{where_clause} GROUP ALL;"
        );

        let mut query = self.db.query(sql);
        for (name, value) in conditions.bindings() {
            query = query.bind((name, value));
        }
        if let Some(limit) = limit {
            query = query.bind(("limit", limit)).bind(("start", offset));
        }

        let mut result = query.await?;
        let rows: Vec<T> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        Ok((rows, first_count(counts)))
    }
}
