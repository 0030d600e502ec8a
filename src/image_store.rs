//! # Image Store Module
//!
//! Keeps uploaded product photos as flat files named by a random identifier
//! plus extension. Names are unique per save, so concurrent saves never
//! collide, and deletes of missing files are harmless no-ops.

use anyhow::{Context, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default directory for stored images
pub const DEFAULT_IMAGES_DIR: &str = "images";
/// Extension used when the format of an upload cannot be determined
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Flat-directory blob store for product images
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGES_DIR)
    }
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under a freshly generated identifier and returns the identifier.
    ///
    /// The directory is created if it does not exist yet.
    pub async fn save(&self, bytes: &[u8], extension: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create image directory {}", self.root.display()))?;

        let image_id = Uuid::new_v4().to_string();
        let path = self.path_for(&image_id, extension);

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write image {path}"))?;

        debug!(image_id = %image_id, path = %path, size = bytes.len(), "Image saved");
        Ok(image_id)
    }

    /// Path of the blob for `image_id`, without touching the filesystem
    pub fn path_for(&self, image_id: &str, extension: &str) -> String {
        let file_name = format!("{}{}", image_id, normalize_extension(extension));
        self.root.join(file_name).to_string_lossy().to_string()
    }

    /// Removes the blob at `path`.
    ///
    /// Returns `false` if the path is empty, the file is missing, or removal fails.
    pub async fn delete(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path, "Image deleted");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to delete image");
                false
            }
        }
    }

    /// Whether a stored blob exists at `path`
    pub async fn exists(&self, path: &str) -> bool {
        !path.is_empty() && tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

/// Ensures the extension starts with a dot; an empty extension stays empty
fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

/// Picks a file extension for uploaded image bytes
pub fn detect_extension(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => ".png",
        Ok(ImageFormat::Jpeg) => ".jpg",
        Ok(ImageFormat::WebP) => ".webp",
        Ok(ImageFormat::Gif) => ".gif",
        Ok(ImageFormat::Bmp) => ".bmp",
        _ => DEFAULT_EXTENSION,
    }
}
