use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::models::avatar::AVATAR_ROUTE;
use crate::services::{AvatarService, TokenService};

pub mod auth;
mod categories;
mod error;
mod profile;
mod types;
mod ukm;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub avatar_service: Arc<AvatarService>,

    pub token_service: TokenService,
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    create_app_state(config, store)
}

pub fn create_app_state(config: Config, store: Store) -> anyhow::Result<Arc<AppState>> {
    let avatar_service = Arc::new(AvatarService::new(store.clone(), &config));

    let token_service = TokenService::new(
        config.security.jwt_secret.clone(),
        config.security.token_ttl_minutes,
    );

    Ok(Arc::new(AppState {
        config,
        store,
        avatar_service,
        token_service,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let uploads_path = state.config.general.uploads_path.clone();
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    // Uploads stay well under this, but multipart framing adds overhead on
    // top of the file itself.
    let body_limit = state.config.uploads.max_upload_bytes + 64 * 1024;

    let api_router = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route(
            "/auth/profile",
            get(auth::get_account).put(auth::update_account),
        )
        .route(
            "/auth/users",
            get(auth::list_users).post(auth::create_user),
        )
        .route("/auth/users/{id}", delete(auth::delete_user))
        .route("/auth/users/{id}/role", put(auth::update_user_role))
        .route("/auth/roles", get(auth::list_roles))
        .route(
            "/profile/",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/profile/password", put(profile::update_password))
        .route("/profile/avatar", put(profile::update_avatar))
        .route("/profile/avatar/upload", post(profile::upload_avatar))
        .route("/profile/avatar/remove", delete(profile::remove_avatar))
        .route("/ukm/", get(ukm::list_ukms).post(ukm::create_ukm))
        .route(
            "/ukm/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/ukm/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/ukm/{id}",
            get(ukm::get_ukm)
                .put(ukm::update_ukm)
                .delete(ukm::delete_ukm),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service(
            AVATAR_ROUTE,
            tower_http::services::ServeDir::new(uploads_path),
        )
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
