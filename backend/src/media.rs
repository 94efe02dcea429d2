//! Storage for uploaded images (post covers and profile pictures).

use crate::config::MediaConfig;
use axum::body::Bytes;
use image::ImageReader;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

pub const POST_COVERS_DIR: &str = "post_covers";
pub const PROFILE_PICS_DIR: &str = "profile_pics";
pub const DEFAULT_PICTURE: &str = "default.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    /// Formats accepted for covers and profile pictures.
    pub fn from_decoder(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::Webp),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }
}

/// A file part taken from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    /// Browsers send an empty part when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.bytes.is_empty()
    }
}

/// Upload whose content has been recognised as an image.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub format: ImageFormat,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Accepts the upload only if it decodes completely as a supported format.
    pub fn from_upload(upload: &Upload) -> Option<Self> {
        let reader = ImageReader::new(Cursor::new(&upload.bytes[..]))
            .with_guessed_format()
            .ok()?;
        let format = reader.format().and_then(ImageFormat::from_decoder)?;

        if let Err(e) = reader.decode() {
            debug!(file = %upload.file_name, "Rejecting undecodable image: {}", e);
            return None;
        }

        Some(Self {
            format,
            bytes: upload.bytes.clone(),
        })
    }
}

/// Encodes a small solid image, for tests that need real image bytes.
#[cfg(test)]
pub(crate) fn sample_image(format: image::ImageFormat) -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 40]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode sample image");
    bytes
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url: String,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            url: config.url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL prefix without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Writes the image under `dir` with a fresh name and returns its reference.
    pub async fn save(&self, dir: &str, image: &ImageUpload) -> std::io::Result<String> {
        let reference = format!("{}/{}.{}", dir, Uuid::new_v4(), image.format.extension());
        let path = self.root.join(&reference);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &image.bytes).await?;
        debug!("Stored upload at {}", path.display());
        Ok(reference)
    }

    /// Deletes a stored file. Failures are logged and otherwise ignored.
    pub async fn remove(&self, reference: &str) {
        if reference == DEFAULT_PICTURE || !is_plain_relative(reference) {
            return;
        }
        let path = self.root.join(reference);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Removed upload {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
        }
    }
}

fn is_plain_relative(reference: &str) -> bool {
    Path::new(reference)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}
