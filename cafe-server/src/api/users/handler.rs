//! Users API Handlers
//!
//! 注册、登录 (失败计数与锁定)、个人资料和管理员用户管理。

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::Paginated;
use shared::client::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest};
use shared::models::{User, UserProfileUpdate, UserRole, UserStats};

use crate::api::pagination::{DEFAULT_PAGE_SIZE, PageWindow, parse_descending, parse_optional};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, UserQuery, UserRecord, UserSortField};
use crate::security_log;
use crate::utils::time::now_millis;
use crate::utils::validation::{normalize_email, require_text, validate_payload};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

/// Query params for the admin user list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn user_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::UserNotFound, msg),
        other => other.into(),
    }
}

fn hashing_error(err: argon2::password_hash::Error) -> AppError {
    AppError::internal(format!("Password hashing failed: {err}"))
}

fn issue_token(state: &ServerState, record: &UserRecord) -> AppResult<String> {
    state
        .get_jwt_service()
        .generate_token(&record.id, &record.email, record.role)
        .map_err(|e| AppError::internal(e.to_string()))
}

async fn load_current(state: &ServerState, user: &CurrentUser) -> AppResult<UserRecord> {
    state
        .users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::user_not_found(&user.id))
}

// =============================================================================
// Authentication
// =============================================================================

/// POST /api/users/register
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    validate_payload(&payload)?;
    let email = normalize_email(&payload.email);
    let name = require_text(&payload.name, "name")?;
    let phone = require_text(&payload.phone, "phone")?;

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::email_exists(email));
    }

    let record = UserRecord::new(name, email, &payload.password, phone, UserRole::Customer)
        .map_err(hashing_error)?;
    state.users.create(&record).await.map_err(|e| match e {
        RepoError::Duplicate(_) => AppError::email_exists(&record.email),
        other => other.into(),
    })?;

    let token = issue_token(&state, &record)?;
    tracing::info!(user_id = %record.id, email = %record.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "User registered successfully",
            AuthResponse {
                token,
                user: record.to_user(),
            },
        )),
    ))
}

/// POST /api/users/login
///
/// Unknown email and wrong password share one message. Five consecutive
/// failures lock the account for two hours.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    validate_payload(&payload)?;
    let email = normalize_email(&payload.email);
    let now = now_millis();

    let Some(mut record) = state.users.find_by_email(&email).await? else {
        security_log!("WARN", "login_failed", email = email.clone(), reason = "unknown_email");
        return Err(AppError::invalid_credentials());
    };

    if record.is_locked(now) {
        security_log!("WARN", "login_locked", user_id = record.id.clone());
        return Err(AppError::account_locked(record.lock_until.unwrap_or(now)));
    }

    if !record.is_active {
        security_log!("WARN", "login_disabled", user_id = record.id.clone());
        return Err(AppError::account_disabled());
    }

    if !record.verify_password(&payload.password).map_err(hashing_error)? {
        record.register_failed_login(now);
        state.users.save(&record).await?;
        security_log!(
            "WARN",
            "login_failed",
            user_id = record.id.clone(),
            attempts = record.login_attempts,
            locked = record.is_locked(now)
        );
        return Err(AppError::invalid_credentials());
    }

    record.register_successful_login(now);
    state.users.save(&record).await?;

    let token = issue_token(&state, &record)?;
    security_log!("INFO", "login_success", user_id = record.id.clone(), role = record.role.as_str());

    Ok(Json(ApiResponse::success_with_message(
        "Login successful",
        AuthResponse {
            token,
            user: record.to_user(),
        },
    )))
}

// =============================================================================
// Own account
// =============================================================================

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let record = load_current(&state, &user).await?;
    Ok(Json(ApiResponse::success(record.to_user())))
}

/// PUT /api/users/profile
///
/// Only name, phone and profile are writable here.
pub async fn update_profile(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<UserProfileUpdate>,
) -> AppResult<Json<ApiResponse<User>>> {
    validate_payload(&payload)?;
    let mut record = load_current(&state, &user).await?;

    if let Some(name) = payload.name.as_deref() {
        record.name = require_text(name, "name")?;
    }
    if let Some(phone) = payload.phone.as_deref() {
        record.phone = require_text(phone, "phone")?;
    }
    if let Some(profile) = payload.profile {
        record.profile = profile;
    }
    record.updated_at = now_millis();
    state.users.save(&record).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Profile updated successfully",
        record.to_user(),
    )))
}

/// PUT /api/users/password
pub async fn change_password(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    validate_payload(&payload)?;
    let mut record = load_current(&state, &user).await?;

    if !record
        .verify_password(&payload.current_password)
        .map_err(hashing_error)?
    {
        security_log!("WARN", "password_change_rejected", user_id = record.id.clone());
        return Err(AppError::password_mismatch());
    }

    record.password_hash = UserRecord::hash_password(&payload.new_password).map_err(hashing_error)?;
    record.updated_at = now_millis();
    state.users.save(&record).await?;

    security_log!("INFO", "password_changed", user_id = record.id.clone());
    Ok(Json(ApiResponse {
        message: "Password changed successfully".to_string(),
        ..ApiResponse::ok()
    }))
}

// =============================================================================
// Administration
// =============================================================================

/// GET /api/users
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Paginated<User>>>> {
    let window = PageWindow::parse(params.page, params.limit, DEFAULT_PAGE_SIZE)?;
    let query = UserQuery {
        role: parse_optional::<UserRole>(params.role.as_deref())?,
        is_active: params.is_active,
        search: params.search,
        sort: parse_optional::<UserSortField>(params.sort_by.as_deref())?.unwrap_or_default(),
        descending: parse_descending(params.sort_order.as_deref(), true)?,
        offset: window.offset(),
        limit: Some(window.limit),
    };

    let (records, total) = state.users.find_all(&query).await?;
    let users = records.iter().map(UserRecord::to_user).collect();
    Ok(Json(ApiResponse::success(Paginated::new(
        users,
        window.page,
        window.limit,
        total,
    ))))
}

/// PATCH /api/users/{id}/status
pub async fn toggle_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    admin: CurrentUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let record = state.users.toggle_status(&id).await.map_err(user_error)?;

    security_log!(
        "INFO",
        "user_status_changed",
        user_id = record.id.clone(),
        is_active = record.is_active,
        by = admin.id.clone()
    );
    let message = format!(
        "User {} successfully",
        if record.is_active { "activated" } else { "deactivated" }
    );
    Ok(Json(ApiResponse::success_with_message(message, record.to_user())))
}

/// GET /api/users/stats/summary
pub async fn statistics(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    let stats = state.users.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}
