//! Site images: the uploaded photo and the generated "after" vision

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;
use tracing::debug;

/// Mime types the AI service accepts as image input
const SUPPORTED_MIME_TYPES: [&str; 5] = ["image/png", "image/jpeg", "image/webp", "image/heic", "image/heif"];

/// Errors loading or decoding an image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image type: {0}")]
    Unsupported(String),

    #[error("Image is empty")]
    Empty,

    #[error("Invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to fetch image: {0}")]
    Fetch(String),
}

/// Raw image bytes with their mime type
#[derive(Clone, PartialEq, Eq)]
pub struct SiteImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

// Bytes are elided: images are megabytes and end up in debug logs.
impl std::fmt::Debug for SiteImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SiteImage {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ImageError> {
        let mime_type = mime_type.into().to_lowercase();
        if !SUPPORTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ImageError::Unsupported(mime_type));
        }
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(Self { mime_type, bytes })
    }

    /// Load an image file, guessing the mime type from its extension
    pub fn from_path(path: &Path) -> Result<Self, ImageError> {
        debug!(?path, "SiteImage::from_path: called");
        let mime = guess_mime(path).ok_or_else(|| ImageError::Unsupported(path.display().to_string()))?;
        let bytes = fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(mime, bytes)
    }

    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self, ImageError> {
        let bytes = BASE64.decode(data.trim())?;
        Self::from_bytes(mime_type, bytes)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Download an image over HTTP
    ///
    /// The mime type comes from `Content-Type`, falling back to the URL's
    /// extension.
    pub async fn fetch(http: &reqwest::Client, url: &str) -> Result<Self, ImageError> {
        debug!(%url, "SiteImage::fetch: called");
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ImageError::Fetch(format!("HTTP {} from {}", response.status(), url)));
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_lowercase())
            .filter(|m| m.starts_with("image/"));
        let mime = match header_mime {
            Some(m) => m,
            None => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                guess_mime(Path::new(path)).unwrap_or("image/jpeg").to_string()
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;
        Self::from_bytes(mime, bytes.to_vec())
    }

    /// File extension matching the mime type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/heic" => "heic",
            "image/heif" => "heif",
            _ => "jpg",
        }
    }

    /// Human-readable size, e.g. "1.4 MB"
    pub fn size_label(&self) -> String {
        let len = self.bytes.len() as f64;
        if len >= 1024.0 * 1024.0 {
            format!("{:.1} MB", len / (1024.0 * 1024.0))
        } else {
            format!("{:.0} KB", (len / 1024.0).ceil())
        }
    }
}

/// Guess an image mime type from a file extension
pub fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
