use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::auth::{CurrentUser, require_permission};
use super::{
    ApiError, AppState, CategoryCreateRequest, CategoryDto, CategoryUpdateRequest, MessageResponse,
};
use crate::models::permission::Permission;

/// GET /ukm/categories — public.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryDto>>, ApiError> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories.into_iter().map(CategoryDto::from).collect()))
}

/// POST /ukm/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(body): Json<CategoryCreateRequest>,
) -> Result<(StatusCode, Json<CategoryDto>), ApiError> {
    require_permission(&caller, Permission::ManageCategories)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Category name is required"));
    }

    if state.store.get_category_by_name(name).await?.is_some() {
        return Err(ApiError::validation("Category name already in use"));
    }

    let category = state
        .store
        .create_category(name, body.description, body.icon)
        .await?;

    info!(category_id = category.id, name = %category.name, "Category created");

    Ok((StatusCode::CREATED, Json(CategoryDto::from(category))))
}

/// PUT /ukm/categories/{id}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<CategoryUpdateRequest>,
) -> Result<Json<CategoryDto>, ApiError> {
    require_permission(&caller, Permission::ManageCategories)?;

    if let Some(name) = &body.name
        && let Some(existing) = state.store.get_category_by_name(name).await?
        && existing.id != id
    {
        return Err(ApiError::validation("Category name already in use"));
    }

    let category = state
        .store
        .update_category(id, body.name, body.description, body.icon)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;

    Ok(Json(CategoryDto::from(category)))
}

/// DELETE /ukm/categories/{id} — refused while UKMs still reference the
/// category.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_permission(&caller, Permission::ManageCategories)?;

    if state.store.get_category(id).await?.is_none() {
        return Err(ApiError::not_found("Category", id));
    }

    let in_use = state.store.category_ukm_count(id).await?;
    if in_use > 0 {
        return Err(ApiError::validation(format!(
            "Category is still referenced by {in_use} UKM(s)"
        )));
    }

    state.store.delete_category(id).await?;

    info!(category_id = id, deleted_by = caller.id, "Category deleted");

    Ok(Json(MessageResponse::new("Category deleted")))
}
