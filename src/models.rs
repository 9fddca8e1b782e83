//! Data models and structures
//!
//! Defines the generated meme payload and the runtime configuration read
//! from the environment.

use base64::Engine as _;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_IMAGE_MIME: &str = "image/png";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Decoded inline image returned by the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Ready-to-render `data:<mime>;base64,<payload>` URI.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// One successful generation: the image plus the optional caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMeme {
    pub image: GeneratedImage,
    pub text: Option<String>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Overrides the stored credential when set.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
    /// Directory holding the local key-value store; `None` means the platform default.
    pub config_dir: Option<PathBuf>,
    pub clipboard_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            output_dir: PathBuf::from("output"),
            config_dir: None,
            clipboard_command: None,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let request_timeout = match get("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    crate::Error::Config(format!("GEMINI_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: get("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_base_url),
            request_timeout,
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            config_dir: get("SWAP_MEMES_CONFIG_DIR").map(PathBuf::from),
            clipboard_command: get("SWAP_MEMES_CLIPBOARD_CMD"),
        })
    }
}
