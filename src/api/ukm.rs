use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::auth::{CurrentUser, require_permission};
use super::{ApiError, AppState, MessageResponse, UkmCreateRequest, UkmDto, UkmUpdateRequest};
use crate::db::{UkmInput, UkmUpdate};
use crate::models::permission::Permission;

fn can_see_inactive(caller: Option<&CurrentUser>) -> bool {
    caller.is_some_and(|CurrentUser(user)| user.is_admin())
}

/// GET /ukm/ — public; administrators also see soft-deleted entries.
pub async fn list_ukms(
    State(state): State<Arc<AppState>>,
    caller: Option<CurrentUser>,
) -> Result<Json<Vec<UkmDto>>, ApiError> {
    let ukms = state.store.list_ukms(can_see_inactive(caller.as_ref())).await?;
    Ok(Json(ukms.into_iter().map(UkmDto::from).collect()))
}

/// GET /ukm/{id}
pub async fn get_ukm(
    State(state): State<Arc<AppState>>,
    caller: Option<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<UkmDto>, ApiError> {
    let ukm = state
        .store
        .get_ukm(id, can_see_inactive(caller.as_ref()))
        .await?
        .ok_or_else(|| ApiError::not_found("UKM", id))?;
    Ok(Json(UkmDto::from(ukm)))
}

/// POST /ukm/
pub async fn create_ukm(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(body): Json<UkmCreateRequest>,
) -> Result<(StatusCode, Json<UkmDto>), ApiError> {
    require_permission(&caller, Permission::ManageUkm)?;

    if body.nama.trim().is_empty() {
        return Err(ApiError::validation("UKM name is required"));
    }

    // Reject a dangling reference before touching the table.
    if !state.store.category_exists(body.category_id).await? {
        return Err(ApiError::validation(format!(
            "Category {} does not exist",
            body.category_id
        )));
    }

    let ukm = state
        .store
        .create_ukm(UkmInput {
            nama: body.nama,
            deskripsi: body.deskripsi,
            category_id: body.category_id,
            logo_url: body.logo_url,
            contact_person: body.contact_person,
            contact_email: body.contact_email,
            contact_phone: body.contact_phone,
            prestasi: body.prestasi,
            kegiatan_rutin: body.kegiatan_rutin,
        })
        .await?;

    info!(ukm_id = ukm.id, nama = %ukm.nama, created_by = caller.id, "UKM created");

    Ok((StatusCode::CREATED, Json(UkmDto::from(ukm))))
}

/// PUT /ukm/{id}
pub async fn update_ukm(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<UkmUpdateRequest>,
) -> Result<Json<UkmDto>, ApiError> {
    require_permission(&caller, Permission::ManageUkm)?;

    if let Some(category_id) = body.category_id
        && !state.store.category_exists(category_id).await?
    {
        return Err(ApiError::validation(format!(
            "Category {category_id} does not exist"
        )));
    }

    let ukm = state
        .store
        .update_ukm(
            id,
            UkmUpdate {
                nama: body.nama,
                deskripsi: body.deskripsi,
                category_id: body.category_id,
                logo_url: body.logo_url,
                contact_person: body.contact_person,
                contact_email: body.contact_email,
                contact_phone: body.contact_phone,
                prestasi: body.prestasi,
                kegiatan_rutin: body.kegiatan_rutin,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("UKM", id))?;

    Ok(Json(UkmDto::from(ukm)))
}

/// DELETE /ukm/{id} — soft delete; the row stays and is hidden from
/// non-administrative listings.
pub async fn delete_ukm(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_permission(&caller, Permission::ManageUkm)?;

    if !state.store.soft_delete_ukm(id).await? {
        return Err(ApiError::not_found("UKM", id));
    }

    info!(ukm_id = id, deleted_by = caller.id, "UKM deactivated");

    Ok(Json(MessageResponse::new("UKM deleted")))
}
