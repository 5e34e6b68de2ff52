//! User Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Customer,
    Staff,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err("Role must be one of: customer, staff, admin".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpiceLevel {
    Mild,
    #[default]
    Medium,
    Hot,
    #[serde(rename = "Extra Hot")]
    ExtraHot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    #[serde(rename = "Gluten-Free")]
    GlutenFree,
    #[serde(rename = "Dairy-Free")]
    DairyFree,
    #[serde(rename = "Nut-Free")]
    NutFree,
    None,
}

fn default_country() -> Option<String> {
    Some("India".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(max = 200))]
    pub street: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
    #[serde(default = "default_country")]
    #[validate(length(max = 100))]
    pub country: Option<String>,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: None,
            city: None,
            state: None,
            zip_code: None,
            country: default_country(),
        }
    }
}

impl Address {
    /// Non-empty parts joined with ", "
    pub fn full_address(&self) -> String {
        [
            &self.street,
            &self.city,
            &self.state,
            &self.zip_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub dietary_restrictions: Vec<DietaryRestriction>,
    #[serde(default)]
    pub favorite_categories: Vec<String>,
    #[serde(default)]
    pub spice_level: SpiceLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub avatar: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub address: Address,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub loyalty_points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoyaltyTier {
    Gold,
    Silver,
    Bronze,
    New,
}

impl LoyaltyTier {
    pub fn from_points(points: u32) -> Self {
        match points {
            1000.. => Self::Gold,
            500.. => Self::Silver,
            100.. => Self::Bronze,
            _ => Self::New,
        }
    }
}

/// Public user view (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub profile: UserProfile,
    pub loyalty_tier: LoyaltyTier,
    pub full_address: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Self-service profile update
///
/// Only these fields are writable by the account owner; email, role,
/// password, activation and lockout state go through dedicated flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "Name cannot exceed 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub phone: Option<String>,
    #[validate(nested)]
    pub profile: Option<UserProfile>,
}

/// User counts by role and activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
    pub inactive_users: u64,
    pub customers: u64,
    pub staff: u64,
    pub admins: u64,
}
