//! User Repository
//!
//! [`UserRecord`] is the stored shape (password hash and lockout counters
//! included); everything leaving the server goes through [`UserRecord::to_user`].

use serde::{Deserialize, Serialize};
use shared::models::{LoyaltyTier, User, UserProfile, UserRole, UserStats};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{
    BaseRepository, Conditions, CountRow, RepoError, RepoResult, content_without_id, first_count,
};
use crate::utils::time::now_millis;

const TABLE: &str = "users";

/// 连续失败次数上限
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// 锁定时长 (2 小时)
pub const LOCK_DURATION_MS: i64 = 2 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: UserRole,
    #[serde(default)]
    pub profile: UserProfile,
    pub is_active: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub last_login: Option<i64>,
    #[serde(default)]
    pub login_attempts: u32,
    #[serde(default)]
    pub lock_until: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRecord {
    /// New active account with a freshly hashed password
    pub fn new(
        name: String,
        email: String,
        password: &str,
        phone: String,
        role: UserRole,
    ) -> Result<Self, argon2::password_hash::Error> {
        let now = now_millis();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            password_hash: Self::hash_password(password)?,
            phone,
            role,
            profile: UserProfile::default(),
            is_active: true,
            email_verified: false,
            phone_verified: false,
            last_login: None,
            login_attempts: 0,
            lock_until: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.password_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    /// 锁定未过期
    pub fn is_locked(&self, now: i64) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// 登录失败计数
    ///
    /// 锁定已过期时从 1 重新计数；达到上限时锁定 2 小时。
    pub fn register_failed_login(&mut self, now: i64) {
        if self.lock_until.is_some_and(|until| until <= now) {
            self.lock_until = None;
            self.login_attempts = 1;
        } else {
            self.login_attempts += 1;
            if self.login_attempts >= MAX_LOGIN_ATTEMPTS && !self.is_locked(now) {
                self.lock_until = Some(now + LOCK_DURATION_MS);
            }
        }
        self.updated_at = now;
    }

    /// 登录成功：清零计数、解除锁定、记录登录时间
    pub fn register_successful_login(&mut self, now: i64) {
        self.login_attempts = 0;
        self.lock_until = None;
        self.last_login = Some(now);
        self.updated_at = now;
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            loyalty_tier: LoyaltyTier::from_points(self.profile.loyalty_points),
            full_address: self.profile.address.full_address(),
            profile: self.profile.clone(),
            is_active: self.is_active,
            email_verified: self.email_verified,
            phone_verified: self.phone_verified,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserSortField {
    #[default]
    CreatedAt,
    Name,
    Email,
    Role,
    LastLogin,
}

impl UserSortField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Name => "name",
            Self::Email => "email",
            Self::Role => "role",
            Self::LastLogin => "lastLogin",
        }
    }
}

impl std::str::FromStr for UserSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "role" => Ok(Self::Role),
            "lastLogin" => Ok(Self::LastLogin),
            _ => Err("sortBy must be one of: createdAt, name, email, role, lastLogin".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring of name, email or phone
    pub search: Option<String>,
    pub sort: UserSortField,
    pub descending: bool,
    pub offset: u32,
    pub limit: Option<u32>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            role: None,
            is_active: None,
            search: None,
            sort: UserSortField::CreatedAt,
            descending: true,
            offset: 0,
            limit: None,
        }
    }
}

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<UserRecord>> {
        let users: Vec<UserRecord> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM type::thing($table, $id)")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    /// Lookup by (already normalised) email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let users: Vec<UserRecord> = self
            .base
            .db()
            .query("SELECT *, record::id(id) AS id FROM users WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn create(&self, record: &UserRecord) -> RepoResult<()> {
        if self.find_by_email(&record.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "User with email '{}' already exists",
                record.email
            )));
        }
        self.write("CREATE", record).await
    }

    /// Replace the stored record
    pub async fn save(&self, record: &UserRecord) -> RepoResult<()> {
        self.write("UPDATE", record).await
    }

    pub async fn find_all(&self, query: &UserQuery) -> RepoResult<(Vec<UserRecord>, u64)> {
        let mut conditions = Conditions::default();
        if let Some(role) = query.role {
            conditions.push("role = $role", "role", role);
        }
        if let Some(is_active) = query.is_active {
            conditions.push("isActive = $is_active", "is_active", is_active);
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push(
                "(string::contains(string::lowercase(name), $search) \
                 OR string::contains(string::lowercase(email), $search) \
                 OR string::contains(string::lowercase(phone), $search))",
                "search",
                search.to_lowercase(),
            );
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

    /// Flip `isActive`
    pub async fn toggle_status(&self, id: &str) -> RepoResult<UserRecord> {
        let mut record = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))?;
        record.is_active = !record.is_active;
        record.updated_at = now_millis();
        self.save(&record).await?;
        Ok(record)
    }

    pub async fn stats(&self) -> RepoResult<UserStats> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS count FROM users GROUP ALL;\
                 SELECT count() AS count FROM users WHERE isActive = true GROUP ALL;\
                 SELECT count() AS count FROM users WHERE role = 'customer' GROUP ALL;\
                 SELECT count() AS count FROM users WHERE role = 'staff' GROUP ALL;\
                 SELECT count() AS count FROM users WHERE role = 'admin' GROUP ALL;",
            )
            .await?;

        let mut counts = [0u64; 5];
        for (index, slot) in counts.iter_mut().enumerate() {
            let rows: Vec<CountRow> = result.take(index)?;
            *slot = first_count(rows);
        }
        let [total_users, active_users, customers, staff, admins] = counts;

        Ok(UserStats {
            total_users,
            active_users,
            inactive_users: total_users.saturating_sub(active_users),
            customers,
            staff,
            admins,
        })
    }

    async fn write(&self, verb: &str, record: &UserRecord) -> RepoResult<()> {
        let content = content_without_id(record)?;
        self.base
            .db()
            .query(format!(
                "{verb} type::thing($table, $id) CONTENT $data RETURN NONE"
            ))
            .bind(("table", TABLE))
            .bind(("id", record.id.clone()))
            .bind(("data", content))
            .await?
            .check()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn record(email: &str, role: UserRole) -> UserRecord {
        UserRecord::new(
            "Ana".to_string(),
            email.to_string(),
            "secret123",
            "555-0100".to_string(),
            role,
        )
        .unwrap()
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let user = record("ana@example.com", UserRole::Customer);
        assert_ne!(user.password_hash, "secret123");
        assert!(user.verify_password("secret123").unwrap());
        assert!(!user.verify_password("wrong").unwrap());
    }

    #[test]
    fn test_lock_after_five_failures() {
        let mut user = record("ana@example.com", UserRole::Customer);
        let now = 1_000_000;
        for _ in 0..4 {
            user.register_failed_login(now);
            assert!(!user.is_locked(now));
        }
        user.register_failed_login(now);
        assert_eq!(user.login_attempts, 5);
        assert!(user.is_locked(now));
        assert_eq!(user.lock_until, Some(now + LOCK_DURATION_MS));
        assert!(!user.is_locked(now + LOCK_DURATION_MS));
    }

    #[test]
    fn test_failure_after_expired_lock_restarts_count() {
        let mut user = record("ana@example.com", UserRole::Customer);
        user.login_attempts = 5;
        user.lock_until = Some(10);

        user.register_failed_login(20);
        assert_eq!(user.login_attempts, 1);
        assert_eq!(user.lock_until, None);
    }

    #[test]
    fn test_success_resets_counters() {
        let mut user = record("ana@example.com", UserRole::Customer);
        user.login_attempts = 3;
        user.register_successful_login(42);
        assert_eq!(user.login_attempts, 0);
        assert_eq!(user.lock_until, None);
        assert_eq!(user.last_login, Some(42));
    }

    #[test]
    fn test_public_view_has_no_hash() {
        let user = record("ana@example.com", UserRole::Staff);
        let json = serde_json::to_value(user.to_user()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "staff");
        assert_eq!(json["loyaltyTier"], "New");
        assert_eq!(json["fullAddress"], "India");
    }

    #[tokio::test]
    async fn test_repository_roundtrip_and_stats() {
        let db = DbService::memory().await.unwrap();
        let repo = UserRepository::new(db.db);

        let ana = record("ana@example.com", UserRole::Customer);
        repo.create(&ana).await.unwrap();
        repo.create(&record("sam@example.com", UserRole::Staff))
            .await
            .unwrap();
        assert!(matches!(
            repo.create(&record("ana@example.com", UserRole::Customer))
                .await,
            Err(RepoError::Duplicate(_))
        ));

        let loaded = repo.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(loaded, ana);

        let toggled = repo.toggle_status(&ana.id).await.unwrap();
        assert!(!toggled.is_active);

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 1);
        assert_eq!(stats.inactive_users, 1);
        assert_eq!(stats.customers, 1);
        assert_eq!(stats.staff, 1);
        assert_eq!(stats.admins, 0);

        let (users, total) = repo
            .find_all(&UserQuery {
                search: Some("SAM@".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(users[0].role, UserRole::Staff);
    }
}
