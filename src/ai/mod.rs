//! AI service integration for meme generation
//!
//! Provides the interface to Gemini's multimodal `generateContent` API, which
//! turns an elaborated cartoon prompt into an inline image plus caption.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiImageClient;
pub use mock::MockGenerationClient;

use crate::models::GeneratedMeme;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Issue exactly one generation request for `prompt`, authenticated by `credential`.
    async fn generate(&self, credential: &str, prompt: &str) -> Result<GeneratedMeme>;
}

#[async_trait]
impl<T: GenerationService + ?Sized> GenerationService for Box<T> {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<GeneratedMeme> {
        (**self).generate(credential, prompt).await
    }
}
