//! Avatar resolution: normalizes URL, file-upload and base64 data-URI
//! inputs into the user's stored avatar state.
//!
//! Every accepted image goes through the same pipeline (flatten
//! transparency onto white, fit within 300x300, letterbox onto a white
//! square, JPEG quality 85) so a stored local avatar is always exactly
//! 300x300 opaque JPEG.
//!
//! Ordering invariant: the new file is written and the database state
//! committed before the previous file is deleted. A failed commit removes
//! the fresh file, so the row never points at a file that does not exist
//! and at most one stored file belongs to a user.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::Store;
use crate::models::avatar::{Avatar, DATA_URI_PREFIX};
use crate::models::user::User;

const AVATAR_EDGE: u32 = 300;
const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("File type not allowed")]
    UnsupportedFileType,

    #[error("File exceeds the {0} byte upload limit")]
    PayloadTooLarge(usize),

    #[error("Failed to decode image data")]
    CorruptImage,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Database(anyhow::Error),
}

pub struct AvatarService {
    store: Store,
    uploads_dir: PathBuf,
    max_upload_bytes: usize,
    allowed_extensions: Vec<String>,
    /// Per-user mutexes so two concurrent avatar mutations for the same
    /// user cannot interleave their write/delete steps. Entries are tiny
    /// and bounded by the number of users seen since startup.
    locks: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl AvatarService {
    #[must_use]
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            uploads_dir: PathBuf::from(&config.general.uploads_path),
            max_upload_bytes: config.uploads.max_upload_bytes,
            allowed_extensions: config.uploads.allowed_extensions.clone(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    async fn user_lock(&self, user_id: i32) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(user_id).or_default().clone()
    }

    /// Set the avatar from an arbitrary client string: data URIs are
    /// rasterized into a locally stored JPEG, anything else is kept
    /// verbatim as an external URL.
    pub async fn set_from_url(&self, user: &User, input: &str) -> Result<Avatar, AvatarError> {
        let lock = self.user_lock(user.id).await;
        let _guard = lock.lock().await;

        if input.starts_with(DATA_URI_PREFIX) {
            let payload = input
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or(AvatarError::CorruptImage)?;
            let bytes = general_purpose::STANDARD
                .decode(payload)
                .map_err(|_| AvatarError::CorruptImage)?;

            let jpeg = normalize_image(&bytes)?;
            return self.store_local(user, &jpeg).await;
        }

        let avatar = Avatar::from_input(input);
        self.commit(user, avatar).await
    }

    /// Validate, normalize and store an uploaded file.
    pub async fn set_from_upload(
        &self,
        user: &User,
        bytes: &[u8],
        declared_filename: &str,
    ) -> Result<Avatar, AvatarError> {
        if !extension_allowed(declared_filename, &self.allowed_extensions) {
            return Err(AvatarError::UnsupportedFileType);
        }

        if bytes.len() > self.max_upload_bytes {
            return Err(AvatarError::PayloadTooLarge(self.max_upload_bytes));
        }

        let jpeg = normalize_image(bytes)?;

        let lock = self.user_lock(user.id).await;
        let _guard = lock.lock().await;

        self.store_local(user, &jpeg).await
    }

    /// Clear the avatar back to the empty state. A no-op success when no
    /// avatar is set.
    pub async fn remove(&self, user: &User) -> Result<(), AvatarError> {
        let lock = self.user_lock(user.id).await;
        let _guard = lock.lock().await;

        let previous = self
            .store
            .set_user_avatar(user.id, &Avatar::None)
            .await
            .map_err(AvatarError::Database)?;

        if let Some(filename) = previous.local_filename() {
            self.delete_file(filename).await;
        }

        Ok(())
    }

    /// Write the normalized JPEG, commit the database state, then drop the
    /// previous file. Caller holds the per-user lock.
    ///
    /// The file to delete comes from the committed transaction, not from the
    /// caller's `User` snapshot: that snapshot predates the lock and may no
    /// longer name the file the row actually points at.
    async fn store_local(&self, user: &User, jpeg: &[u8]) -> Result<Avatar, AvatarError> {
        fs::create_dir_all(&self.uploads_dir).await?;

        let filename = generate_filename(user.id);
        let path = self.uploads_dir.join(&filename);

        fs::write(&path, jpeg).await?;

        let avatar = Avatar::Local(filename.clone());
        let previous = match self.store.set_user_avatar(user.id, &avatar).await {
            Ok(previous) => previous,
            Err(e) => {
                // Do not leave an orphan behind when the commit failed.
                fs::remove_file(&path).await.ok();
                return Err(AvatarError::Database(e));
            }
        };

        if let Some(old) = previous.local_filename()
            && old != filename
        {
            self.delete_file(old).await;
        }

        info!(user_id = user.id, filename = %filename, "Stored avatar");
        Ok(avatar)
    }

    /// Commit a non-local avatar state and drop a previous local file.
    async fn commit(&self, user: &User, avatar: Avatar) -> Result<Avatar, AvatarError> {
        let previous = self
            .store
            .set_user_avatar(user.id, &avatar)
            .await
            .map_err(AvatarError::Database)?;

        if let Some(old) = previous.local_filename() {
            self.delete_file(old).await;
        }

        Ok(avatar)
    }

    /// Best-effort removal of a stored file. The database no longer
    /// references it, so a failure only leaks a file and is logged.
    async fn delete_file(&self, filename: &str) {
        let path = self.uploads_dir.join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), "Failed to delete old avatar: {e}"),
        }
    }
}

/// Decode arbitrary image bytes and produce the canonical 300x300 opaque
/// JPEG representation.
pub fn normalize_image(bytes: &[u8]) -> Result<Vec<u8>, AvatarError> {
    let img = image::load_from_memory(bytes).map_err(|_| AvatarError::CorruptImage)?;

    // Fit within the square without enlarging small images.
    let img = if img.width() > AVATAR_EDGE || img.height() > AVATAR_EDGE {
        img.resize(AVATAR_EDGE, AVATAR_EDGE, FilterType::Lanczos3)
    } else {
        img
    };

    // Letterbox onto an opaque white canvas; overlay alpha-blends, which
    // flattens any transparency in the source.
    let mut canvas = RgbaImage::from_pixel(AVATAR_EDGE, AVATAR_EDGE, Rgba([255, 255, 255, 255]));
    let x = i64::from((AVATAR_EDGE - img.width()) / 2);
    let y = i64::from((AVATAR_EDGE - img.height()) / 2);
    image::imageops::overlay(&mut canvas, &img.to_rgba8(), x, y);

    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|_| AvatarError::CorruptImage)?;

    Ok(buf.into_inner())
}

/// Collision-resistant name of the form
/// `avatar_{userId}_{timestamp}_{suffix}.jpg`, stripped of anything
/// path-unsafe.
#[must_use]
pub fn generate_filename(user_id: i32) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    sanitize_filename(&format!(
        "avatar_{user_id}_{timestamp}_{}.jpg",
        &suffix[..8]
    ))
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

#[must_use]
pub fn extension_allowed(filename: &str, allowed: &[String]) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}
