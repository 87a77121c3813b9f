use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, header},
};
use std::sync::Arc;
use tracing::info;

use super::auth::CurrentUser;
use super::{
    ApiError, AppState, AvatarUpdateRequest, AvatarUploadResponse, MessageResponse, ProfileDto,
    ProfileUpdateRequest,
};
use crate::db::ProfileUpdate;

fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

/// GET /profile/
pub async fn get_profile(CurrentUser(user): CurrentUser, headers: HeaderMap) -> Json<ProfileDto> {
    Json(ProfileDto::from_user(&user, request_host(&headers)))
}

/// PUT /profile/
///
/// Partial update; only supplied fields change. An `avatar_url` value is
/// routed through avatar resolution rather than written directly, so data
/// URIs get rasterized and a previously stored file gets cleaned up.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(body): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileDto>, ApiError> {
    if let Some(email) = &body.email
        && state.store.email_taken(email, Some(user.id)).await?
    {
        return Err(ApiError::validation("Email already registered"));
    }

    // Avatar resolution goes first: it is the only part that can reject the
    // request after validation, and a rejected update must leave the whole
    // profile untouched.
    if let Some(avatar_url) = &body.avatar_url {
        if avatar_url.is_empty() {
            state.avatar_service.remove(&user).await?;
        } else {
            state.avatar_service.set_from_url(&user, avatar_url).await?;
        }
    }

    let update = ProfileUpdate {
        full_name: body.full_name,
        email: body.email,
        bio: body.bio,
        phone: body.phone,
        address: body.address,
        date_of_birth: body.date_of_birth,
        gender: body.gender,
        student_id: body.student_id,
        faculty: body.faculty,
        major: body.major,
    };
    state.store.update_user_profile(user.id, update).await?;

    let user = state
        .store
        .get_user(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user.id))?;

    Ok(Json(ProfileDto::from_user(&user, request_host(&headers))))
}

/// PUT /profile/password
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<super::PasswordUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state
        .store
        .verify_user_password(user.id, &body.current_password)
        .await?
    {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    if body.new_password != body.confirm_password {
        return Err(ApiError::validation("Password confirmation does not match"));
    }

    if body.new_password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    state
        .store
        .update_user_password(user.id, &body.new_password, &state.config.security)
        .await?;

    info!(user_id = user.id, "Password changed");

    Ok(Json(MessageResponse::new("Password updated")))
}

/// PUT /profile/avatar — set from a URL or base64 data URI.
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(body): Json<AvatarUpdateRequest>,
) -> Result<Json<ProfileDto>, ApiError> {
    if body.avatar_url.is_empty() {
        state.avatar_service.remove(&user).await?;
    } else {
        state
            .avatar_service
            .set_from_url(&user, &body.avatar_url)
            .await?;
    }

    let user = state
        .store
        .get_user(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user.id))?;

    Ok(Json(ProfileDto::from_user(&user, request_host(&headers))))
}

/// POST /profile/avatar/upload — multipart form with an `avatar` file
/// field.
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AvatarUploadResponse>, ApiError> {
    let mut payload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("avatar") {
            let filename = field
                .file_name()
                .map(ToString::to_string)
                .ok_or_else(|| ApiError::validation("Avatar field has no filename"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
            payload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) =
        payload.ok_or_else(|| ApiError::validation("No 'avatar' file in request"))?;

    if bytes.is_empty() {
        return Err(ApiError::validation("Uploaded file is empty"));
    }

    let avatar = state
        .avatar_service
        .set_from_upload(&user, &bytes, &filename)
        .await?;

    let stored = avatar
        .local_filename()
        .unwrap_or_default()
        .to_string();

    Ok(Json(AvatarUploadResponse {
        message: "Avatar uploaded".to_string(),
        filename: stored,
        avatar_url: avatar.display_url(request_host(&headers)),
    }))
}

/// DELETE /profile/avatar/remove — idempotent; succeeds when no avatar is
/// set.
pub async fn remove_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.avatar_service.remove(&user).await?;
    Ok(Json(MessageResponse::new("Avatar removed")))
}
