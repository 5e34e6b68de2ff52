//! Order Repository
//!
//! Orders are written whole (`CONTENT`) on create and on every state change;
//! lines are never edited in place.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use shared::models::Order;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::Mutex;

use super::{
    BaseRepository, Conditions, CountRow, RepoError, RepoResult, content_without_id, first_count,
    with_retry,
};
use crate::orders::traits::{OrderFilter, OrderQuery, OrderStore, StatusTotals};

const TABLE: &str = "orders";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
    /// 同进程内串行化计数器写入，避免事务冲突
    sequence_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Deserialize)]
struct SequenceRow {
    seq: u64,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
            sequence_lock: Arc::new(Mutex::new(())),
        }
    }

    fn conditions(filter: &OrderFilter) -> Conditions {
        let mut conditions = Conditions::default();
        if let Some(status) = filter.status {
            conditions.push("status = $status", "status", status);
        }
        if let Some(order_type) = filter.order_type {
            conditions.push("orderType = $order_type", "order_type", order_type);
        }
        if let Some(payment_status) = filter.payment_status {
            conditions.push(
                "paymentStatus = $payment_status",
                "payment_status",
                payment_status,
            );
        }
        if let Some(from) = filter.created_from {
            conditions.push("createdAt >= $created_from", "created_from", from);
        }
        if let Some(to) = filter.created_to {
            conditions.push("createdAt < $created_to", "created_to", to);
        }
        if let Some(email) = &filter.customer_email {
            conditions.push("customer.email = $customer_email", "customer_email", email);
        }
        if let Some(needle) = &filter.customer_email_contains {
            conditions.push(
                "string::contains(string::lowercase(customer.email), $email_needle)",
                "email_needle",
                needle.to_lowercase(),
            );
        }
        conditions
    }

    async fn insert(&self, content: &serde_json::Value, id: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("CREATE type::thing($table, $id) CONTENT $data RETURN NONE")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .bind(("data", content.clone()))
            .await?
            .check()?;
        Ok(())
    }

    async fn bump_sequence(&self, day: &str, floor: u64) -> RepoResult<u64> {
        // 单条 UPSERT 语句内读改写
        let mut result = self
            .base
            .db()
            .query(
                "UPSERT type::thing('order_counter', $day) \
                 SET seq = math::max([(seq ?? 0), $floor]) + 1 \
                 RETURN seq",
            )
            .bind(("day", day.to_string()))
            .bind(("floor", floor))
            .await?;
        let rows: Vec<SequenceRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.seq)
            .ok_or_else(|| RepoError::Database("Order counter returned no row".into()))
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn create(&self, order: &Order) -> RepoResult<()> {
        let content = content_without_id(order)?;
        let id = order.id.as_str();
        let content = &content;
        with_retry("order_create", move || self.insert(content, id)).await
    }

    async fn save(&self, order: &Order) -> RepoResult<()> {
        let content = content_without_id(order)?;
        self.base
            .db()
            .query("UPDATE type::thing($table, $id) CONTENT $data RETURN NONE")
            .bind(("table", TABLE))
            .bind(("id", order.id.clone()))
            .bind(("data", content))
            .await?
            .check()?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM type::thing($table, $id)")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    async fn count_created_between(&self, start: i64, end: i64) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS count FROM orders \
                 WHERE createdAt >= $start AND createdAt < $end GROUP ALL",
            )
            .bind(("start", start))
            .bind(("end", end))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(first_count(rows))
    }

    async fn next_daily_sequence(&self, day: &str, floor: u64) -> RepoResult<u64> {
        let _guard = self.sequence_lock.lock().await;
        with_retry("order_sequence", move || self.bump_sequence(day, floor)).await
    }

    async fn find_many(&self, query: &OrderQuery) -> RepoResult<(Vec<Order>, u64)> {
        let order_by = format!(
            "{} {}",
            query.sort.column(),
            if query.descending { "DESC" } else { "ASC" }
        );
        self.base
            .find_page(
                TABLE,
                &Self::conditions(&query.filter),
                &order_by,
                query.limit,
                query.offset,
            )
            .await
    }

    async fn totals_by_status(&self, filter: &OrderFilter) -> RepoResult<Vec<StatusTotals>> {
        let conditions = Self::conditions(filter);
        let sql = format!(
            "SELECT status, count() AS count, math::sum(total) AS revenue \
             FROM {TABLE}{} GROUP BY status",
            conditions.where_clause()
        );
        let mut query = self.base.db().query(sql);
        for (name, value) in conditions.bindings() {
            query = query.bind((name, value));
        }
        let rows: Vec<StatusTotals> = query.await?.take(0)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::orders::OrderEngine;
    use crate::orders::tests::{MemoryCatalog, create_request, line_by_id, menu_item, sample_order};
    use crate::orders::traits::{OrderSortField, SystemClock};
    use shared::models::OrderStatus;
    use std::collections::HashSet;

    async fn repo() -> OrderRepository {
        let db = DbService::memory().await.unwrap();
        OrderRepository::new(db.db)
    }

    #[tokio::test]
    async fn test_create_and_reload() {
        let repo = repo().await;
        let order = sample_order("a1", 7.35);
        repo.create(&order).await.unwrap();

        let loaded = repo.find_by_id("a1").await.unwrap().unwrap();
        assert_eq!(loaded, order);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rejected() {
        let repo = repo().await;
        let first = sample_order("a1", 1.0);
        let mut second = sample_order("a2", 2.0);
        second.order_number = first.order_number.clone();

        repo.create(&first).await.unwrap();
        let err = repo.create(&second).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_save_replaces_status() {
        let repo = repo().await;
        let mut order = sample_order("a1", 1.0);
        repo.create(&order).await.unwrap();

        order.status = OrderStatus::Ready;
        repo.save(&order).await.unwrap();
        let loaded = repo.find_by_id("a1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Ready);
    }

    #[tokio::test]
    async fn test_daily_sequence_respects_floor() {
        let repo = repo().await;
        assert_eq!(repo.next_daily_sequence("20240615", 6).await.unwrap(), 7);
        assert_eq!(repo.next_daily_sequence("20240615", 6).await.unwrap(), 8);
        assert_eq!(repo.next_daily_sequence("20240615", 0).await.unwrap(), 9);
        assert_eq!(repo.next_daily_sequence("20240616", 0).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sequence_is_gapless() {
        let repo = repo().await;
        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.next_daily_sequence("20240615", 0).await })
            })
            .collect();

        let mut seen = HashSet::new();
        for task in tasks {
            let seq = task.await.unwrap().unwrap();
            assert!(seen.insert(seq), "sequence {seq} handed out twice");
        }
        assert_eq!(seen, (1..=64).collect::<HashSet<u64>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_get_distinct_numbers() {
        let repo = Arc::new(repo().await);
        let catalog = Arc::new(MemoryCatalog::with_items(vec![menu_item(
            "espresso", "Espresso", 3.50, 3,
        )]));
        let engine = Arc::new(OrderEngine::new(
            catalog,
            repo.clone(),
            Arc::new(SystemClock),
            chrono_tz::UTC,
        ));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .create_order(create_request(vec![line_by_id("espresso", 1)], "takeaway"))
                        .await
                })
            })
            .collect();

        let mut numbers = HashSet::new();
        for task in tasks {
            let order = task.await.unwrap().unwrap();
            assert!(numbers.insert(order.order_number));
        }
        assert_eq!(numbers.len(), 32);

        let (_, total) = repo.find_many(&OrderQuery::default()).await.unwrap();
        assert_eq!(total, 32);
    }

    #[tokio::test]
    async fn test_totals_by_status() {
        let repo = repo().await;
        for (id, total, status) in [
            ("a", 7.35, OrderStatus::Completed),
            ("b", 9.35, OrderStatus::Pending),
            ("c", 2.65, OrderStatus::Completed),
        ] {
            let mut order = sample_order(id, total);
            order.status = status;
            repo.create(&order).await.unwrap();
        }

        let mut rows = repo.totals_by_status(&OrderFilter::default()).await.unwrap();
        rows.sort_by_key(|row| row.status.as_str());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, OrderStatus::Completed);
        assert_eq!(rows[0].count, 2);
        assert!((rows[0].revenue - 10.0).abs() < 1e-9);
        assert_eq!(rows[1].count, 1);

        let filter = OrderFilter {
            created_from: Some(0),
            created_to: Some(1),
            ..Default::default()
        };
        assert!(repo.totals_by_status(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_and_filtered_page() {
        let repo = repo().await;
        for (i, total) in [3.0, 9.0, 5.0].into_iter().enumerate() {
            let mut order = sample_order(&format!("o{i}"), total);
            order.created_at += i as i64;
            if i == 2 {
                order.status = OrderStatus::Completed;
                order.customer.email = "bob@example.com".to_string();
            }
            repo.create(&order).await.unwrap();
        }

        let created = sample_order("x", 0.0).created_at;
        assert_eq!(
            repo.count_created_between(created, created + 2).await.unwrap(),
            2
        );

        let query = OrderQuery {
            sort: OrderSortField::Total,
            limit: Some(2),
            ..Default::default()
        };
        let (page, total) = repo.find_many(&query).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.iter().map(|o| o.total).collect::<Vec<_>>(), vec![9.0, 5.0]);

        let query = OrderQuery {
            filter: OrderFilter {
                customer_email_contains: Some("BOB".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let (page, total) = repo.find_many(&query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].status, OrderStatus::Completed);
    }
}
