//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{MenuCategory, MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::Paginated;

use crate::api::pagination::{DEFAULT_PAGE_SIZE, PageWindow, parse_descending, parse_optional};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{MenuItemQuery, MenuSortField, RepoError};
use crate::utils::validation::validate_payload;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

/// Query params for listing menu items
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListQuery {
    fn into_query(self) -> AppResult<(PageWindow, MenuItemQuery)> {
        let window = PageWindow::parse(self.page, self.limit, DEFAULT_PAGE_SIZE)?;

        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::validation("minPrice must not exceed maxPrice"));
        }

        let query = MenuItemQuery {
            category: parse_optional::<MenuCategory>(self.category.as_deref())?,
            search: self.search,
            min_price: self.min_price,
            max_price: self.max_price,
            available: self.available,
            featured: self.featured,
            sort: parse_optional::<MenuSortField>(self.sort_by.as_deref())?.unwrap_or_default(),
            descending: parse_descending(self.sort_order.as_deref(), false)?,
            offset: window.offset(),
            limit: Some(window.limit),
        };
        Ok((window, query))
    }
}

/// Missing menu items report `MenuItemNotFound` rather than the generic code
fn menu_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::MenuItemNotFound, msg),
        other => other.into(),
    }
}

/// GET /api/menu
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Paginated<MenuItem>>>> {
    let (window, query) = params.into_query()?;
    let (items, total) = state.menu.find_all(&query).await?;
    Ok(Json(ApiResponse::success(Paginated::new(
        items,
        window.page,
        window.limit,
        total,
    ))))
}

/// GET /api/menu/categories
pub async fn categories(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<MenuCategory>>>> {
    let categories = state.menu.categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// GET /api/menu/featured
pub async fn featured(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<MenuItem>>>> {
    let items = state.menu.featured().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// GET /api/menu/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = state
        .menu
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::menu_item_not_found(&id))?;
    Ok(Json(ApiResponse::success(item)))
}

/// POST /api/menu
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<MenuItem>>)> {
    validate_payload(&payload)?;
    let item = state.menu.create(payload).await.map_err(menu_error)?;

    tracing::info!(item_id = %item.id, name = %item.name, by = %user.email, "Menu item created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Menu item created successfully",
            item,
        )),
    ))
}

/// PUT /api/menu/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    validate_payload(&payload)?;
    let item = state.menu.update(&id, payload).await.map_err(menu_error)?;

    tracing::info!(item_id = %item.id, by = %user.email, "Menu item updated");
    Ok(Json(ApiResponse::success_with_message(
        "Menu item updated successfully",
        item,
    )))
}

/// DELETE /api/menu/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    if !state.menu.delete(&id).await.map_err(menu_error)? {
        return Err(AppError::menu_item_not_found(id));
    }

    tracing::info!(item_id = %id, by = %user.email, "Menu item deleted");
    Ok(Json(ApiResponse {
        message: "Menu item deleted successfully".to_string(),
        ..ApiResponse::ok()
    }))
}

/// PATCH /api/menu/{id}/availability
pub async fn toggle_availability(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = state
        .menu
        .toggle_availability(&id)
        .await
        .map_err(menu_error)?;

    let message = format!(
        "Menu item {} successfully",
        if item.is_available { "enabled" } else { "disabled" }
    );
    Ok(Json(ApiResponse::success_with_message(message, item)))
}
