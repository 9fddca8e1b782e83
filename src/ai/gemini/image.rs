use super::client::GeminiHttpClient;
use super::types::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData,
    RequestContent, TextPart,
};
use crate::ai::GenerationService;
use crate::models::{GeneratedImage, GeneratedMeme, DEFAULT_IMAGE_MIME};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::time::Duration;

/// Accepts unpadded input and non-zero trailing bits in inline data.
const INLINE_DATA_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Generates a cartoon image plus caption through Gemini's multimodal output.
pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(model: String) -> Self {
        Self::new_with_client(model, Duration::from_secs(120), reqwest::Client::new())
    }

    pub fn new_with_client(model: String, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }
}

fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![TextPart {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
        },
    }
}

/// Pull the first image part and the first text part out of the first candidate.
pub(crate) fn extract_meme(response: GenerateContentResponse) -> Result<GeneratedMeme> {
    let parts = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .ok_or_else(|| {
            Error::MalformedResponse("missing candidates[0].content.parts".to_string())
        })?;

    let image_part = parts.iter().find_map(|p| {
        p.inline_data
            .as_ref()
            .filter(|inline| inline.data.as_deref().is_some_and(|d| !d.is_empty()))
    });

    let text = parts
        .iter()
        .find_map(|p| p.text.as_deref().filter(|t| !t.is_empty()))
        .map(str::to_string);

    // A caption without an image still counts as a failed generation.
    let Some(InlineData { mime_type, data }) = image_part else {
        if text.is_some() {
            tracing::warn!("Gemini returned text but no image");
        }
        return Err(Error::NoImage);
    };

    let mime_type = mime_type
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string();

    let bytes = decode_inline_data(data.as_deref().unwrap_or_default())?;

    tracing::debug!(
        "Gemini returned image with mime_type: {} ({} bytes)",
        mime_type,
        bytes.len()
    );

    Ok(GeneratedMeme {
        image: GeneratedImage::new(mime_type, bytes),
        text,
    })
}

/// Decode inline image data, tolerating line breaks and loose padding.
fn decode_inline_data(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    INLINE_DATA_ENGINE
        .decode(compact)
        .map_err(|e| Error::MalformedResponse(format!("inline image is not base64: {}", e)))
}

#[async_trait]
impl GenerationService for GeminiImageClient {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<GeneratedMeme> {
        let request = build_request(prompt);
        tracing::debug!("Sending prompt to Gemini: {}", prompt);

        let response: GenerateContentResponse =
            self.http.generate_content(credential, &request).await?;

        extract_meme(response)
    }
}
