use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::PathBuf;
use tower::ServiceExt;
use ukmdir::config::Config;

async fn spawn_app() -> (Router, Config) {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let tmp = std::env::temp_dir();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}/ukmdir_avatar_{id}.db", tmp.display());
    config.general.uploads_path = format!("{}/ukmdir_avatars_{id}", tmp.display());
    config.security.jwt_secret = "test-secret".to_string();

    let state = ukmdir::api::create_app_state_from_config(config.clone())
        .await
        .expect("Failed to create app state");
    ukmdir::db::bootstrap::run(&state.store, &config)
        .await
        .expect("Failed to bootstrap");

    (ukmdir::api::router(state), config)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login_admin(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"username": "admin", "password": "password123"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn get_profile(app: &Router, token: &str) -> Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/profile/")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn put_avatar(app: &Router, token: &str, avatar_url: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/profile/avatar")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(json!({"avatar_url": avatar_url}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 90, 160, 255]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn multipart_body(filename: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "------------------------ukmdirtest";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"avatar\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn upload(app: &Router, token: &str, filename: &str, data: &[u8]) -> axum::response::Response {
    let (content_type, body) = multipart_body(filename, data);
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/avatar/upload")
                .header("content-type", content_type)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn stored_path(config: &Config, filename: &str) -> PathBuf {
    PathBuf::from(&config.general.uploads_path).join(filename)
}

#[tokio::test]
async fn external_url_is_stored_verbatim() {
    let (app, _config) = spawn_app().await;
    let token = login_admin(&app).await;

    let response = put_avatar(&app, &token, "https://example.com/pic.png").await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = get_profile(&app, &token).await;
    assert_eq!(profile["avatar_type"], "url");
    assert_eq!(profile["avatar_url"], "https://example.com/pic.png");
    assert!(profile["avatar_filename"].is_null());
}

#[tokio::test]
async fn data_uri_is_rasterized_into_a_local_file() {
    let (app, config) = spawn_app().await;
    let token = login_admin(&app).await;

    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(600, 400));
    let response = put_avatar(&app, &token, &format!("data:image/png;base64,{encoded}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = get_profile(&app, &token).await;
    assert_eq!(profile["avatar_type"], "local");
    let filename = profile["avatar_filename"].as_str().unwrap();
    assert!(filename.starts_with("avatar_1_"));
    assert!(filename.ends_with(".jpg"));
    assert!(
        profile["avatar_url"]
            .as_str()
            .unwrap()
            .ends_with(&format!("/static/uploads/avatars/{filename}"))
    );

    // On disk: a 300x300 opaque JPEG.
    let bytes = std::fs::read(stored_path(&config, filename)).unwrap();
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 300));
}

#[tokio::test]
async fn malformed_data_uri_is_rejected() {
    let (app, _config) = spawn_app().await;
    let token = login_admin(&app).await;

    let response = put_avatar(&app, &token, "data:image/png;base64,!!!not-base64!!!").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let encoded = base64::engine::general_purpose::STANDARD.encode(b"not an image");
    let response = put_avatar(&app, &token, &format!("data:image/png;base64,{encoded}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The failed update left the previous state alone.
    let profile = get_profile(&app, &token).await;
    assert!(profile["avatar_url"].is_null());
}

#[tokio::test]
async fn rejected_avatar_leaves_other_profile_fields_untouched() {
    let (app, _config) = spawn_app().await;
    let token = login_admin(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/profile/")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    json!({
                        "bio": "should not persist",
                        "avatar_url": "data:image/png;base64,!!!not-base64!!!",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The whole update was rolled back, not just the avatar part.
    let profile = get_profile(&app, &token).await;
    assert!(profile["bio"].is_null());
    assert!(profile["avatar_url"].is_null());
}

#[tokio::test]
async fn cleanup_uses_committed_state_not_caller_snapshot() {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let tmp = std::env::temp_dir();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}/ukmdir_avatar_{id}.db", tmp.display());
    config.general.uploads_path = format!("{}/ukmdir_avatars_{id}", tmp.display());
    config.security.jwt_secret = "test-secret".to_string();

    let state = ukmdir::api::create_app_state_from_config(config.clone())
        .await
        .unwrap();
    ukmdir::db::bootstrap::run(&state.store, &config).await.unwrap();

    // Snapshot taken before any avatar exists; both updates reuse it.
    let stale = state.store.get_user(1).await.unwrap().unwrap();
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(64, 64));
    let data_uri = format!("data:image/png;base64,{encoded}");

    state.avatar_service.set_from_url(&stale, &data_uri).await.unwrap();
    let first = state
        .store
        .get_user(1)
        .await
        .unwrap()
        .unwrap()
        .avatar
        .local_filename()
        .unwrap()
        .to_string();
    assert!(stored_path(&config, &first).exists());

    state.avatar_service.set_from_url(&stale, &data_uri).await.unwrap();
    let second = state
        .store
        .get_user(1)
        .await
        .unwrap()
        .unwrap()
        .avatar
        .local_filename()
        .unwrap()
        .to_string();

    // The first file is cleaned up even though the caller's snapshot never
    // pointed at it.
    assert_ne!(first, second);
    assert!(!stored_path(&config, &first).exists());
    assert!(stored_path(&config, &second).exists());
}

#[tokio::test]
async fn replacing_an_avatar_removes_the_old_file() {
    let (app, config) = spawn_app().await;
    let token = login_admin(&app).await;

    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(64, 64));
    let data_uri = format!("data:image/png;base64,{encoded}");

    assert_eq!(put_avatar(&app, &token, &data_uri).await.status(), StatusCode::OK);
    let first = get_profile(&app, &token).await["avatar_filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(stored_path(&config, &first).exists());

    assert_eq!(put_avatar(&app, &token, &data_uri).await.status(), StatusCode::OK);
    let second = get_profile(&app, &token).await["avatar_filename"]
        .as_str()
        .unwrap()
        .to_string();

    assert_ne!(first, second);
    assert!(!stored_path(&config, &first).exists());
    assert!(stored_path(&config, &second).exists());
}

#[tokio::test]
async fn switching_to_a_url_cleans_up_the_local_file() {
    let (app, config) = spawn_app().await;
    let token = login_admin(&app).await;

    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(64, 64));
    put_avatar(&app, &token, &format!("data:image/png;base64,{encoded}")).await;
    let filename = get_profile(&app, &token).await["avatar_filename"]
        .as_str()
        .unwrap()
        .to_string();

    assert_eq!(
        put_avatar(&app, &token, "https://example.com/new.png").await.status(),
        StatusCode::OK
    );
    assert!(!stored_path(&config, &filename).exists());

    let profile = get_profile(&app, &token).await;
    assert_eq!(profile["avatar_type"], "url");
}

#[tokio::test]
async fn remove_is_idempotent() {
    let (app, config) = spawn_app().await;
    let token = login_admin(&app).await;

    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(32, 32));
    put_avatar(&app, &token, &format!("data:image/png;base64,{encoded}")).await;
    let filename = get_profile(&app, &token).await["avatar_filename"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/profile/avatar/remove")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert!(!stored_path(&config, &filename).exists());
    let profile = get_profile(&app, &token).await;
    assert!(profile["avatar_url"].is_null());
    assert_eq!(profile["avatar_type"], "url");
}

#[tokio::test]
async fn upload_is_validated_and_normalized() {
    let (app, config) = spawn_app().await;
    let token = login_admin(&app).await;

    // Disallowed extension is rejected before the bytes are inspected.
    let response = upload(&app, &token, "avatar.bmp", &png_bytes(64, 64)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid extension with garbage content fails decoding.
    let response = upload(&app, &token, "avatar.png", b"garbage").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload(&app, &token, "photo.png", &png_bytes(800, 600)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with(".jpg"));

    let bytes = std::fs::read(stored_path(&config, filename)).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 300));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let tmp = std::env::temp_dir();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}/ukmdir_avatar_{id}.db", tmp.display());
    config.general.uploads_path = format!("{}/ukmdir_avatars_{id}", tmp.display());
    config.security.jwt_secret = "test-secret".to_string();
    config.uploads.max_upload_bytes = 1024;

    let state = ukmdir::api::create_app_state_from_config(config.clone())
        .await
        .unwrap();
    ukmdir::db::bootstrap::run(&state.store, &config).await.unwrap();
    let app = ukmdir::api::router(state);

    let token = login_admin(&app).await;
    let response = upload(&app, &token, "big.png", &vec![0u8; 4096]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
