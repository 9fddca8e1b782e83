//! Getting a generated image out of the session
//!
//! Decodes the result data URI back into bytes, saves it as a timestamped
//! file, and hands it to a clipboard sink.

pub mod clipboard;
pub mod mock;

pub use clipboard::CommandClipboard;
pub use mock::MockClipboard;

use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for image bytes tagged with their media type.
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_image(&self, mime_type: &str, bytes: &[u8]) -> Result<()>;
}

/// Decode a `data:<mime>;base64,<payload>` URI. Returns `None` for anything else.
pub fn parse_data_uri(uri: &str) -> Option<GeneratedImage> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .ok()?;
    Some(GeneratedImage::new(mime_type, bytes))
}

/// `swap-meme-<epoch-millis>.png`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("swap-meme-{}.png", now.timestamp_millis())
}

/// Write the image bytes to `dir`, creating it if needed.
pub fn save_image(dir: &Path, image: &GeneratedImage, now: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(now));
    fs::write(&path, &image.bytes)?;
    tracing::info!(
        "Saved {} ({} bytes) to {}",
        image.mime_type,
        image.bytes.len(),
        path.display()
    );
    Ok(path)
}
