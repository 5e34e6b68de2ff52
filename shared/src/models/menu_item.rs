//! Menu Item Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Menu category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuCategory {
    Coffee,
    Tea,
    Pastry,
    Food,
    #[serde(rename = "Cold Drinks")]
    ColdDrinks,
    #[serde(rename = "Hot Drinks")]
    HotDrinks,
    Snacks,
}

impl MenuCategory {
    pub const ALL: [MenuCategory; 7] = [
        MenuCategory::Coffee,
        MenuCategory::Tea,
        MenuCategory::Pastry,
        MenuCategory::Food,
        MenuCategory::ColdDrinks,
        MenuCategory::HotDrinks,
        MenuCategory::Snacks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coffee => "Coffee",
            Self::Tea => "Tea",
            Self::Pastry => "Pastry",
            Self::Food => "Food",
            Self::ColdDrinks => "Cold Drinks",
            Self::HotDrinks => "Hot Drinks",
            Self::Snacks => "Snacks",
        }
    }
}

impl fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Category must be one of: {}",
                    Self::ALL.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allergen {
    Dairy,
    Nuts,
    Gluten,
    Eggs,
    Soy,
    Fish,
    Shellfish,
}

/// Nutrition facts per serving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NutritionalInfo {
    #[validate(range(min = 0.0))]
    pub calories: Option<f64>,
    #[validate(range(min = 0.0))]
    pub protein: Option<f64>,
    #[validate(range(min = 0.0))]
    pub carbs: Option<f64>,
    #[validate(range(min = 0.0))]
    pub fat: Option<f64>,
}

/// Menu item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub category: MenuCategory,
    pub is_available: bool,
    /// Minutes
    pub preparation_time: u32,
    #[serde(default)]
    pub allergens: Vec<Allergen>,
    #[serde(default)]
    pub nutritional_info: Option<NutritionalInfo>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub featured: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

fn default_preparation_time() -> u32 {
    5
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemCreate {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: String,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 500, message = "Description cannot exceed 500 characters")
    )]
    pub description: String,
    #[validate(range(min = 0.0, max = 10000.0, message = "Price must be between 0 and 10000"))]
    pub price: f64,
    #[validate(custom(function = "validate_image_url"))]
    pub image: String,
    pub category: MenuCategory,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default = "default_preparation_time")]
    #[validate(range(min = 1, message = "Preparation time must be at least 1 minute"))]
    pub preparation_time: u32,
    #[serde(default)]
    pub allergens: Vec<Allergen>,
    #[validate(nested)]
    pub nutritional_info: Option<NutritionalInfo>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update payload; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: Option<String>,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 500, message = "Description cannot exceed 500 characters")
    )]
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 10000.0, message = "Price must be between 0 and 10000"))]
    pub price: Option<f64>,
    #[validate(custom(function = "validate_image_url"))]
    pub image: Option<String>,
    pub category: Option<MenuCategory>,
    pub is_available: Option<bool>,
    #[validate(range(min = 1, message = "Preparation time must be at least 1 minute"))]
    pub preparation_time: Option<u32>,
    pub allergens: Option<Vec<Allergen>>,
    #[validate(nested)]
    pub nutritional_info: Option<NutritionalInfo>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
}

/// Upper bound for any catalog or add-on price
pub const MAX_PRICE: f64 = 10_000.0;

pub fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        Err(validator::ValidationError::new("required")
            .with_message("This field is required".into()))
    } else {
        Ok(())
    }
}

/// Image must be an absolute http(s) URL with something after the scheme
pub fn validate_image_url(image: &str) -> Result<(), validator::ValidationError> {
    let rest = image
        .strip_prefix("https://")
        .or_else(|| image.strip_prefix("http://"));
    match rest {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(validator::ValidationError::new("image_url")
            .with_message("Please provide a valid image URL".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_payload() -> MenuItemCreate {
        serde_json::from_value(serde_json::json!({
            "name": "Cappuccino",
            "description": "Espresso with steamed milk foam",
            "price": 4.25,
            "image": "https://example.com/cappuccino.jpg",
            "category": "Coffee"
        }))
        .unwrap()
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&MenuCategory::ColdDrinks).unwrap(),
            "\"Cold Drinks\""
        );
        let parsed: MenuCategory = "Hot Drinks".parse().unwrap();
        assert_eq!(parsed, MenuCategory::HotDrinks);
        assert!("Beer".parse::<MenuCategory>().is_err());
    }

    #[test]
    fn test_create_defaults() {
        let payload = create_payload();
        assert!(payload.is_available);
        assert_eq!(payload.preparation_time, 5);
        assert!(!payload.featured);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_image_url_rules() {
        assert!(validate_image_url("http://a.b/c.png").is_ok());
        assert!(validate_image_url("https://a").is_ok());
        assert!(validate_image_url("https://").is_err());
        assert!(validate_image_url("ftp://a.b/c.png").is_err());
        assert!(validate_image_url("/images/c.png").is_err());

        let mut payload = create_payload();
        payload.image = "not a url".to_string();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut payload = create_payload();
        payload.price = -1.0;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_price_upper_bound() {
        let mut payload = create_payload();
        payload.price = MAX_PRICE;
        assert!(payload.validate().is_ok());

        payload.price = 1e29;
        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("Price must be between 0 and 10000"));
    }

    #[test]
    fn test_blank_name_reports_required() {
        let mut payload = create_payload();
        payload.name = "   ".to_string();
        let err = payload.validate().unwrap_err().to_string();
        assert!(err.contains("This field is required"));
        assert!(!err.contains("cannot exceed"));
    }

    #[test]
    fn test_nested_nutrition_validated() {
        let mut payload = create_payload();
        payload.nutritional_info = Some(NutritionalInfo {
            calories: Some(-5.0),
            ..Default::default()
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_update_partial_validation() {
        let update = MenuItemUpdate {
            price: Some(3.0),
            ..Default::default()
        };
        assert!(update.validate().is_ok());

        let update = MenuItemUpdate {
            preparation_time: Some(0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
