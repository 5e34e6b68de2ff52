//! 演示数据
//!
//! 菜单为空时写入默认菜单；提供管理员密码时创建管理员账号。

use shared::models::{
    Address, Allergen, DietaryRestriction, MenuCategory, MenuItemCreate, NutritionalInfo,
    Preferences, SpiceLevel, UserProfile, UserRole,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::repository::{MenuItemRepository, RepoError, RepoResult, UserRecord, UserRepository};

pub const ADMIN_EMAIL: &str = "admin@cafe.com";

struct SeedItem {
    name: &'static str,
    description: &'static str,
    price: f64,
    image: &'static str,
    category: MenuCategory,
    preparation_time: u32,
    allergens: &'static [Allergen],
    /// calories, protein, carbs, fat
    nutrition: [f64; 4],
    tags: &'static [&'static str],
    featured: bool,
}

const UNSPLASH: &str = "?ixlib=rb-4.0.3&auto=format&fit=crop&w=687&q=80";

fn menu() -> Vec<SeedItem> {
    use Allergen::*;
    use MenuCategory::*;

    vec![
        SeedItem {
            name: "Classic Espresso",
            description: "Rich and bold espresso shot with perfect crema",
            price: 3.50,
            image: "https://images.unsplash.com/photo-1514432324607-a09d9b4aefdd",
            category: Coffee,
            preparation_time: 3,
            allergens: &[],
            nutrition: [5.0, 0.5, 0.5, 0.1],
            tags: &["espresso", "strong", "classic"],
            featured: true,
        },
        SeedItem {
            name: "Cappuccino",
            description: "Espresso with steamed milk and foam art",
            price: 4.25,
            image: "https://images.unsplash.com/photo-1578314675249-a6910f80cc4e",
            category: Coffee,
            preparation_time: 5,
            allergens: &[Dairy],
            nutrition: [120.0, 8.0, 12.0, 6.0],
            tags: &["cappuccino", "milk", "foam"],
            featured: true,
        },
        SeedItem {
            name: "Caramel Macchiato",
            description: "Sweet caramel with espresso and steamed milk",
            price: 5.00,
            image: "https://images.unsplash.com/photo-1541167760496-1628856ab772",
            category: Coffee,
            preparation_time: 6,
            allergens: &[Dairy],
            nutrition: [180.0, 8.0, 25.0, 6.0],
            tags: &["caramel", "sweet", "macchiato"],
            featured: false,
        },
        SeedItem {
            name: "Chocolate Croissant",
            description: "Buttery croissant filled with rich chocolate",
            price: 3.75,
            image: "https://images.unsplash.com/photo-1509440159596-0249088772ff",
            category: Pastry,
            preparation_time: 2,
            allergens: &[Gluten, Dairy, Eggs],
            nutrition: [280.0, 6.0, 32.0, 16.0],
            tags: &["croissant", "chocolate", "buttery"],
            featured: true,
        },
        SeedItem {
            name: "Blueberry Muffin",
            description: "Fresh baked muffin bursting with blueberries",
            price: 2.95,
            image: "https://thebusybaker.ca/wp-content/uploads/2020/07/blueberry-muffins-3.jpg",
            category: Pastry,
            preparation_time: 2,
            allergens: &[Gluten, Dairy, Eggs],
            nutrition: [320.0, 5.0, 45.0, 12.0],
            tags: &["muffin", "blueberry", "fresh"],
            featured: false,
        },
        SeedItem {
            name: "Avocado Toast",
            description: "Smashed avocado on artisan sourdough bread",
            price: 7.50,
            image: "https://www.spendwithpennies.com/wp-content/uploads/2025/03/1200-Avocado-Toast-2-SpendWithPennies-1-800x1200.jpg",
            category: Food,
            preparation_time: 8,
            allergens: &[Gluten],
            nutrition: [320.0, 8.0, 28.0, 22.0],
            tags: &["avocado", "toast", "healthy"],
            featured: true,
        },
        SeedItem {
            name: "Iced Vanilla Latte",
            description: "Cold brew with vanilla syrup and milk",
            price: 4.50,
            image: "https://images.unsplash.com/photo-1461023058943-07fcbe16d735",
            category: ColdDrinks,
            preparation_time: 4,
            allergens: &[Dairy],
            nutrition: [140.0, 6.0, 18.0, 5.0],
            tags: &["iced", "vanilla", "latte"],
            featured: false,
        },
        SeedItem {
            name: "Green Tea",
            description: "Premium organic green tea leaves",
            price: 2.75,
            image: "https://images.unsplash.com/photo-1556679343-c7306c1976bc",
            category: Tea,
            preparation_time: 3,
            allergens: &[],
            nutrition: [2.0, 0.0, 0.0, 0.0],
            tags: &["green tea", "organic", "healthy"],
            featured: false,
        },
        SeedItem {
            name: "Chai Latte",
            description: "Spiced Indian tea with steamed milk",
            price: 4.00,
            image: "https://images.unsplash.com/photo-1544787219-7f47ccb765ce",
            category: HotDrinks,
            preparation_time: 5,
            allergens: &[Dairy],
            nutrition: [110.0, 6.0, 12.0, 5.0],
            tags: &["chai", "spiced", "indian"],
            featured: true,
        },
        SeedItem {
            name: "Chocolate Chip Cookie",
            description: "Warm chocolate chip cookie with gooey center",
            price: 2.50,
            image: "https://images.unsplash.com/photo-1499636136210-6f4ee915583e",
            category: Pastry,
            preparation_time: 2,
            allergens: &[Gluten, Dairy, Eggs],
            nutrition: [180.0, 2.0, 22.0, 10.0],
            tags: &["cookie", "chocolate", "warm"],
            featured: false,
        },
    ]
}

impl SeedItem {
    fn into_create(self) -> MenuItemCreate {
        let [calories, protein, carbs, fat] = self.nutrition;
        let image = if self.image.starts_with("https://images.unsplash.com/") {
            format!("{}{}", self.image, UNSPLASH)
        } else {
            self.image.to_string()
        };
        MenuItemCreate {
            name: self.name.to_string(),
            description: self.description.to_string(),
            price: self.price,
            image,
            category: self.category,
            is_available: true,
            preparation_time: self.preparation_time,
            allergens: self.allergens.to_vec(),
            nutritional_info: Some(NutritionalInfo {
                calories: Some(calories),
                protein: Some(protein),
                carbs: Some(carbs),
                fat: Some(fat),
            }),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            featured: self.featured,
        }
    }
}

fn admin_profile() -> UserProfile {
    UserProfile {
        avatar: None,
        address: Address {
            street: Some("123 Cafe Street".to_string()),
            city: Some("Mumbai".to_string()),
            state: Some("Maharashtra".to_string()),
            zip_code: Some("400001".to_string()),
            country: Some("India".to_string()),
        },
        preferences: Preferences {
            dietary_restrictions: vec![DietaryRestriction::None],
            favorite_categories: vec!["Coffee".to_string(), "Pastry".to_string()],
            spice_level: SpiceLevel::Medium,
        },
        loyalty_points: 0,
    }
}

/// 写入演示数据，返回 (新增菜单数, 是否新建管理员)
pub async fn seed_demo_data(
    db: &Surreal<Db>,
    admin_password: Option<&str>,
) -> RepoResult<(usize, bool)> {
    let menu_repo = MenuItemRepository::new(db.clone());
    let mut seeded_items = 0;
    if menu_repo.count().await? == 0 {
        for item in menu() {
            menu_repo.create(item.into_create()).await?;
            seeded_items += 1;
        }
        tracing::info!(count = seeded_items, "Seeded menu items");
    }

    let mut seeded_admin = false;
    if let Some(password) = admin_password {
        let user_repo = UserRepository::new(db.clone());
        if user_repo.find_by_email(ADMIN_EMAIL).await?.is_none() {
            let mut admin = UserRecord::new(
                "Admin User".to_string(),
                ADMIN_EMAIL.to_string(),
                password,
                "+91-9876543210".to_string(),
                UserRole::Admin,
            )
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;
            admin.profile = admin_profile();
            admin.email_verified = true;
            admin.phone_verified = true;
            user_repo.create(&admin).await?;
            seeded_admin = true;
            tracing::info!(email = ADMIN_EMAIL, "Seeded admin user");
        }
    }

    Ok((seeded_items, seeded_admin))
}
