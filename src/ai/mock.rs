use super::GenerationService;
use crate::models::{GeneratedImage, GeneratedMeme};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// 1x1 PNG returned when no response has been scripted.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Debug, Clone)]
enum ScriptedResponse {
    Meme(GeneratedMeme),
    Api { status: u16, body: String },
    NoImage,
    Malformed(String),
}

/// Scripted [`GenerationService`] that records every call it receives.
///
/// Clones share state, so a clone kept by a test can observe calls made
/// through the original.
#[derive(Clone, Default)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<ScriptedResponse>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meme(self, meme: GeneratedMeme) -> Self {
        self.push(ScriptedResponse::Meme(meme))
    }

    pub fn with_api_error(self, status: u16, body: &str) -> Self {
        self.push(ScriptedResponse::Api {
            status,
            body: body.to_string(),
        })
    }

    pub fn with_no_image(self) -> Self {
        self.push(ScriptedResponse::NoImage)
    }

    pub fn with_malformed_response(self, detail: &str) -> Self {
        self.push(ScriptedResponse::Malformed(detail.to_string()))
    }

    fn push(self, response: ScriptedResponse) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(credential, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<GeneratedMeme> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((credential.to_string(), prompt.to_string()));
            calls.len()
        };

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(GeneratedMeme {
                image: GeneratedImage::new("image/png", TINY_PNG.to_vec()),
                text: None,
            });
        }

        let index = (count - 1) % responses.len();
        match responses[index].clone() {
            ScriptedResponse::Meme(meme) => Ok(meme),
            ScriptedResponse::Api { status, body } => Err(Error::Api { status, body }),
            ScriptedResponse::NoImage => Err(Error::NoImage),
            ScriptedResponse::Malformed(detail) => Err(Error::MalformedResponse(detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_returns_png() {
        let client = MockGenerationClient::new();
        let meme = client.generate("key", "prompt").await.unwrap();
        assert_eq!(meme.image.mime_type, "image/png");
        assert_eq!(&meme.image.bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[tokio::test]
    async fn test_mock_cycles_scripted_responses() {
        let client = MockGenerationClient::new()
            .with_api_error(500, "boom")
            .with_no_image();

        assert!(matches!(
            client.generate("k", "p").await,
            Err(Error::Api { status: 500, .. })
        ));
        assert!(matches!(client.generate("k", "p").await, Err(Error::NoImage)));
        // Should cycle back
        assert!(matches!(
            client.generate("k", "p").await,
            Err(Error::Api { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_records_calls_across_clones() {
        let client = MockGenerationClient::new();
        let handle = client.clone();

        assert_eq!(handle.get_call_count(), 0);
        client.generate("abc", "draw").await.unwrap();
        assert_eq!(handle.get_call_count(), 1);
        assert_eq!(handle.calls(), vec![("abc".to_string(), "draw".to_string())]);
    }
}
