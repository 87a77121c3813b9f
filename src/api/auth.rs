use axum::{
    Json,
    extract::{FromRequestParts, OptionalFromRequestParts, Path, State},
    http::{StatusCode, header, request::Parts},
};
use std::sync::Arc;
use tracing::info;

use super::{
    AccountUpdateRequest, ApiError, AppState, CreateUserRequest, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, RoleDto, RoleUpdateRequest, UserDto,
};
use crate::db::ProfileUpdate;
use crate::models::permission::{Permission, ROLE_USER};
use crate::models::user::User;

const MIN_PASSWORD_LENGTH: usize = 6;

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header. Extracting it rejects the request with 401 when the token is
/// missing, invalid, expired, or belongs to a deactivated account.
pub struct CurrentUser(pub User);

async fn resolve_bearer(parts: &Parts, state: &Arc<AppState>) -> Result<Option<User>, ApiError> {
    let Some(token) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return Ok(None);
    };

    let Ok(user_id) = state.token_service.verify(token.trim()) else {
        return Ok(None);
    };

    match state.store.get_user(user_id).await? {
        Some(user) if user.is_active => Ok(Some(user)),
        _ => Ok(None),
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve_bearer(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// Optional variant for endpoints that are public but behave differently
/// for authenticated callers. A missing or invalid token degrades to
/// anonymous instead of failing.
impl OptionalFromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(resolve_bearer(parts, state).await?.map(CurrentUser))
    }
}

/// Gate an already-authenticated caller on a single permission.
pub fn require_permission(user: &User, permission: Permission) -> Result<(), ApiError> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Permission '{}' required",
            permission.as_str()
        )))
    }
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
///
/// The same message is returned for an unknown username, a wrong password
/// and a deactivated account, so callers cannot probe which usernames
/// exist.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let rejection = || ApiError::Unauthenticated("Invalid username or password".to_string());

    let user = state
        .store
        .get_user_by_username(&body.username)
        .await?
        .ok_or_else(rejection)?;

    if !user.is_active {
        return Err(rejection());
    }

    if !state.store.verify_user_password(user.id, &body.password).await? {
        return Err(rejection());
    }

    let access_token = state.token_service.issue(user.id)?;

    info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        user: UserDto::from_user(&user, true),
    }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let username = body.username.trim();
    let email = body.email.trim();

    if username.is_empty() || email.is_empty() {
        return Err(ApiError::validation("Username and email are required"));
    }
    validate_password(&body.password)?;

    if state.store.username_taken(username).await? {
        return Err(ApiError::validation("Username already taken"));
    }
    if state.store.email_taken(email, None).await? {
        return Err(ApiError::validation("Email already registered"));
    }

    let role = state
        .store
        .get_role_by_name(ROLE_USER)
        .await?
        .ok_or_else(|| ApiError::database("Default role missing"))?;

    let user = state
        .store
        .create_user(
            username,
            email,
            &body.password,
            body.full_name,
            role.id,
            &state.config.security,
        )
        .await?;

    info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(UserDto::from_user(&user, false))))
}

/// GET /auth/profile
pub async fn get_account(CurrentUser(user): CurrentUser) -> Json<UserDto> {
    Json(UserDto::from_user(&user, true))
}

/// PUT /auth/profile — the basic account fields only; the richer profile
/// namespace handles everything else.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AccountUpdateRequest>,
) -> Result<Json<UserDto>, ApiError> {
    if let Some(email) = &body.email
        && state.store.email_taken(email, Some(user.id)).await?
    {
        return Err(ApiError::validation("Email already registered"));
    }

    let update = ProfileUpdate {
        full_name: body.full_name,
        email: body.email,
        ..ProfileUpdate::default()
    };
    state.store.update_user_profile(user.id, update).await?;

    let user = state
        .store
        .get_user(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user.id))?;

    Ok(Json(UserDto::from_user(&user, true)))
}

// ============================================================================
// User administration
// ============================================================================

/// GET /auth/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    require_permission(&caller, Permission::ManageUsers)?;

    let users = state.store.list_users().await?;
    Ok(Json(
        users.iter().map(|u| UserDto::from_user(u, false)).collect(),
    ))
}

/// POST /auth/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    require_permission(&caller, Permission::ManageUsers)?;

    let username = body.username.trim();
    let email = body.email.trim();

    if username.is_empty() || email.is_empty() {
        return Err(ApiError::validation("Username and email are required"));
    }
    validate_password(&body.password)?;

    if state.store.username_taken(username).await? {
        return Err(ApiError::validation("Username already taken"));
    }
    if state.store.email_taken(email, None).await? {
        return Err(ApiError::validation("Email already registered"));
    }

    let role_name = body.role_name.as_deref().unwrap_or(ROLE_USER);
    let role = state
        .store
        .get_role_by_name(role_name)
        .await?
        .ok_or_else(|| ApiError::validation(format!("Unknown role '{role_name}'")))?;

    let user = state
        .store
        .create_user(
            username,
            email,
            &body.password,
            body.full_name,
            role.id,
            &state.config.security,
        )
        .await?;

    info!(
        user_id = user.id,
        username = %user.username,
        created_by = caller.id,
        "User created by administrator"
    );

    Ok((StatusCode::CREATED, Json(UserDto::from_user(&user, false))))
}

/// DELETE /auth/users/{id}
///
/// The primordial administrator (id 1) can never be deleted.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_permission(&caller, Permission::ManageUsers)?;

    if user_id == 1 {
        return Err(ApiError::forbidden(
            "The primary administrator cannot be deleted",
        ));
    }

    if !state.store.delete_user(user_id).await? {
        return Err(ApiError::not_found("User", user_id));
    }

    info!(user_id, deleted_by = caller.id, "User deleted");

    Ok(Json(MessageResponse::new("User deleted")))
}

/// PUT /auth/users/{id}/role
pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<i32>,
    Json(body): Json<RoleUpdateRequest>,
) -> Result<Json<UserDto>, ApiError> {
    require_permission(&caller, Permission::ManageUsers)?;

    if state.store.get_user(user_id).await?.is_none() {
        return Err(ApiError::not_found("User", user_id));
    }

    if !state.store.assign_user_role(user_id, &body.role_name).await? {
        return Err(ApiError::validation(format!(
            "Unknown role '{}'",
            body.role_name
        )));
    }

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))?;

    info!(user_id, role = %body.role_name, changed_by = caller.id, "Role assigned");

    Ok(Json(UserDto::from_user(&user, false)))
}

/// GET /auth/roles
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<RoleDto>>, ApiError> {
    require_permission(&caller, Permission::ManageUsers)?;

    let roles = state.store.list_roles().await?;
    Ok(Json(roles.into_iter().map(RoleDto::from).collect()))
}
