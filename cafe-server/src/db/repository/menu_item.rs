//! Menu Item Repository

use async_trait::async_trait;
use shared::models::{MenuCategory, MenuItem, MenuItemCreate, MenuItemUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{
    BaseRepository, Conditions, CountRow, RepoError, RepoResult, content_without_id, first_count,
};
use crate::orders::money::round_price;
use crate::orders::traits::CatalogLookup;
use crate::utils::time::now_millis;

const TABLE: &str = "menu_item";

/// Featured list size
pub const FEATURED_LIMIT: u32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuSortField {
    #[default]
    Name,
    Price,
    Category,
    CreatedAt,
    PreparationTime,
}

impl MenuSortField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Category => "category",
            Self::CreatedAt => "createdAt",
            Self::PreparationTime => "preparationTime",
        }
    }
}

impl std::str::FromStr for MenuSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "category" => Ok(Self::Category),
            "createdAt" => Ok(Self::CreatedAt),
            "preparationTime" => Ok(Self::PreparationTime),
            _ => Err(
                "sortBy must be one of: name, price, category, createdAt, preparationTime"
                    .to_string(),
            ),
        }
    }
}

/// Menu listing filters
#[derive(Debug, Clone, Default)]
pub struct MenuItemQuery {
    pub category: Option<MenuCategory>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub sort: MenuSortField,
    pub descending: bool,
    pub offset: u32,
    pub limit: Option<u32>,
}

fn catalog_price(price: f64) -> RepoResult<f64> {
    round_price(price).map_err(|e| RepoError::Validation(e.to_string()))
}

#[derive(Clone)]
pub struct MenuItemRepository {
    base: BaseRepository,
}

impl MenuItemRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Filtered, sorted page plus the total match count
    pub async fn find_all(&self, query: &MenuItemQuery) -> RepoResult<(Vec<MenuItem>, u64)> {
        let mut conditions = Conditions::default();
        if let Some(category) = query.category {
            conditions.push("category = $category", "category", category);
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push(
                "(string::contains(string::lowercase(name), $search) \
                 OR string::contains(string::lowercase(description), $search))",
                "search",
                search.to_lowercase(),
            );
        }
        if let Some(min) = query.min_price {
            conditions.push("price >= $min_price", "min_price", min);
        }
        if let Some(max) = query.max_price {
            conditions.push("price <= $max_price", "max_price", max);
        }
        if let Some(available) = query.available {
            conditions.push("isAvailable = $available", "available", available);
        }
        if let Some(featured) = query.featured {
            conditions.push("featured = $featured", "featured", featured);
        }

        let order_by = format!(
            "{} {}",
            query.sort.column(),
            if query.descending { "DESC" } else { "ASC" }
        );
        self.base
            .find_page(TABLE, &conditions, &order_by, query.limit, query.offset)
            .await
    }

    /// Distinct categories in use, in menu order
    pub async fn categories(&self) -> RepoResult<Vec<MenuCategory>> {
        let used: Vec<MenuCategory> = self
            .base
            .db()
            .query("SELECT VALUE category FROM menu_item")
            .await?
            .take(0)?;
        Ok(MenuCategory::ALL
            .into_iter()
            .filter(|c| used.contains(c))
            .collect())
    }

    /// Featured and available, newest first
    pub async fn featured(&self) -> RepoResult<Vec<MenuItem>> {
        let items: Vec<MenuItem> = self
            .base
            .db()
            .query(
                "SELECT *, record::id(id) AS id FROM menu_item \
                 WHERE featured = true AND isAvailable = true \
                 ORDER BY createdAt DESC LIMIT $limit",
            )
            .bind(("limit", FEATURED_LIMIT))
            .await?
            .take(0)?;
        Ok(items)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<MenuItem>> {
        let items: Vec<MenuItem> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM type::thing($table, $id)")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        Ok(items.into_iter().next())
    }

    /// Exact, case-sensitive name match
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<MenuItem>> {
        let items: Vec<MenuItem> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM menu_item WHERE name = $name LIMIT 1")
            .bind(("name", name.to_string()))
            .await?
            .take(0)?;
        Ok(items.into_iter().next())
    }

    pub async fn create(&self, data: MenuItemCreate) -> RepoResult<MenuItem> {
        let now = now_millis();
        let item = MenuItem {
            id: uuid::Uuid::new_v4().to_string(),
            name: data.name.trim().to_string(),
            description: data.description.trim().to_string(),
            price: catalog_price(data.price)?,
            image: data.image,
            category: data.category,
            is_available: data.is_available,
            preparation_time: data.preparation_time,
            allergens: data.allergens,
            nutritional_info: data.nutritional_info,
            tags: data.tags,
            featured: data.featured,
            created_at: now,
            updated_at: now,
        };
        self.write("CREATE", &item).await?;
        Ok(item)
    }

    /// Partial update; absent fields are left as they are
    pub async fn update(&self, id: &str, data: MenuItemUpdate) -> RepoResult<MenuItem> {
        let mut item = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Menu item {} not found", id)))?;

        if let Some(name) = data.name {
            item.name = name.trim().to_string();
        }
        if let Some(description) = data.description {
            item.description = description.trim().to_string();
        }
        if let Some(price) = data.price {
            item.price = catalog_price(price)?;
        }
        if let Some(image) = data.image {
            item.image = image;
        }
        if let Some(category) = data.category {
            item.category = category;
        }
        if let Some(is_available) = data.is_available {
            item.is_available = is_available;
        }
        if let Some(preparation_time) = data.preparation_time {
            item.preparation_time = preparation_time;
        }
        if let Some(allergens) = data.allergens {
            item.allergens = allergens;
        }
        if data.nutritional_info.is_some() {
            item.nutritional_info = data.nutritional_info;
        }
        if let Some(tags) = data.tags {
            item.tags = tags;
        }
        if let Some(featured) = data.featured {
            item.featured = featured;
        }
        item.updated_at = now_millis();

        self.write("UPDATE", &item).await?;
        Ok(item)
    }

    /// Hard delete; returns false when nothing matched
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.base
            .db()
            .query("DELETE type::thing($table, $id)")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .check()?;
        Ok(true)
    }

    pub async fn toggle_availability(&self, id: &str) -> RepoResult<MenuItem> {
        let mut item = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Menu item {} not found", id)))?;
        item.is_available = !item.is_available;
        item.updated_at = now_millis();
        self.write("UPDATE", &item).await?;
        Ok(item)
    }

    pub async fn count(&self) -> RepoResult<u64> {
        let rows: Vec<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM menu_item GROUP ALL")
            .await?
            .take(0)?;
        Ok(first_count(rows))
    }

    async fn write(&self, verb: &str, item: &MenuItem) -> RepoResult<()> {
        let content = content_without_id(item)?;
        self.base
            .db()
            .query(format!(
                "{verb} type::thing($table, $id) CONTENT $data RETURN NONE"
            ))
            .bind(("table", TABLE))
            .bind(("id", item.id.clone()))
            .bind(("data", content))
            .await?
            .check()?;
        Ok(())
    }
}

#[async_trait]
impl CatalogLookup for MenuItemRepository {
    async fn find_item_by_id(&self, id: &str) -> RepoResult<Option<MenuItem>> {
        self.find_by_id(id).await
    }

    async fn find_item_by_name(&self, name: &str) -> RepoResult<Option<MenuItem>> {
        self.find_by_name(name).await
    }
}
