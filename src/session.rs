//! Session state and the controller that drives it.
//!
//! All UI-facing state lives in one [`SessionState`] owned by a
//! [`SessionController`]; it only changes through the controller's methods.

use crate::ai::GenerationService;
use crate::concepts::{self, EXAMPLE_CONCEPTS};
use crate::credentials::CredentialStore;
use crate::error::ErrorKind;
use crate::export::{self, ClipboardSink};
use crate::models::GeneratedMeme;
use crate::prompts;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long the "copied" flag stays set after a successful clipboard write.
pub const COPY_CONFIRMATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Succeeded,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub credential: String,
    pub concept: String,
    pub generating: bool,
    /// `data:` URI of the last generated image.
    pub result_image: Option<String>,
    pub result_text: Option<String>,
    pub error_message: Option<String>,
    copied_at: Option<Instant>,
}

impl SessionState {
    pub fn copy_confirmed(&self) -> bool {
        self.copy_confirmed_at(Instant::now())
    }

    pub fn copy_confirmed_at(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPY_CONFIRMATION)
    }

    /// Whether the generate trigger should be offered.
    pub fn can_generate(&self) -> bool {
        !self.generating && !self.credential.trim().is_empty() && !self.concept.trim().is_empty()
    }
}

/// A dispatched generation request.
///
/// Only the ticket with the latest sequence number may update the session.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    seq: u64,
    credential: String,
    prompt: String,
}

impl GenerationTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

pub struct SessionController<G, S> {
    generator: G,
    store: S,
    state: SessionState,
    latest_seq: u64,
}

impl<G: GenerationService, S: CredentialStore> SessionController<G, S> {
    /// Create a controller, loading any persisted credential.
    pub fn new(generator: G, store: S) -> Self {
        let credential = match store.load() {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("Could not load stored API key: {}. Starting without one.", e);
                String::new()
            }
        };

        Self {
            generator,
            store,
            state: SessionState {
                credential,
                ..SessionState::default()
            },
            latest_seq: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Update the credential and persist it (an empty value clears the stored one).
    pub fn set_credential(&mut self, value: &str) -> Result<()> {
        self.state.credential = value.to_string();
        self.store.save(value)
    }

    /// Use a credential for this session only, leaving the stored one alone.
    pub fn set_session_credential(&mut self, value: &str) {
        self.state.credential = value.to_string();
    }

    pub fn set_concept(&mut self, value: &str) {
        self.state.concept = value.to_string();
    }

    pub fn use_random_concept(&mut self, rng: &mut impl Rng) -> &str {
        self.state.concept = concepts::pick_random_concept(rng).to_string();
        &self.state.concept
    }

    /// Rephrase the current concept. Does nothing when the concept is blank.
    pub fn enhance_current_concept(&mut self, rng: &mut impl Rng) -> bool {
        if self.state.concept.trim().is_empty() {
            return false;
        }
        self.state.concept = prompts::enhance_concept(&self.state.concept, rng);
        true
    }

    pub fn use_example(&mut self, index: usize) -> Option<&str> {
        let example = EXAMPLE_CONCEPTS.get(index)?;
        self.state.concept = example.to_string();
        Some(&self.state.concept)
    }

    /// Validate inputs and enter `Generating`.
    ///
    /// Guard failures move the session to `Failed` without dispatching anything.
    /// While a request is in flight they only set the message; the pending
    /// request still decides the phase.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket> {
        let guard = if self.state.credential.trim().is_empty() {
            Some(Error::MissingCredential)
        } else if self.state.concept.trim().is_empty() {
            Some(Error::MissingConcept)
        } else {
            None
        };
        if let Some(e) = guard {
            if self.state.generating {
                debug!(
                    "Rejected new request while request #{} is pending: {}",
                    self.latest_seq, e
                );
            } else {
                self.state.phase = Phase::Failed(e.kind());
            }
            self.state.error_message = Some(e.to_string());
            return Err(e);
        }

        self.latest_seq += 1;
        self.state.phase = Phase::Generating;
        self.state.generating = true;
        self.state.error_message = None;
        self.state.result_image = None;
        self.state.result_text = None;

        let prompt = prompts::build_stylized_prompt(&self.state.concept);
        debug!("Sending prompt to AI (request #{}): {}", self.latest_seq, prompt);

        Ok(GenerationTicket {
            seq: self.latest_seq,
            credential: self.state.credential.clone(),
            prompt,
        })
    }

    /// Apply a finished request. Returns `false` when the ticket was superseded
    /// by a newer request and the outcome was dropped.
    pub fn finish_generation(
        &mut self,
        ticket: &GenerationTicket,
        outcome: &Result<GeneratedMeme>,
    ) -> bool {
        if ticket.seq != self.latest_seq {
            debug!(
                "Discarding stale result for request #{} (latest is #{})",
                ticket.seq, self.latest_seq
            );
            return false;
        }

        self.state.generating = false;
        match outcome {
            Ok(meme) => {
                info!("Meme generated ({} bytes)", meme.image.bytes.len());
                self.state.phase = Phase::Succeeded;
                self.state.error_message = None;
                self.state.result_image = Some(meme.image.data_uri());
                self.state.result_text = meme.text.clone();
            }
            Err(e) => {
                error!("Generation error: {}", e);
                self.state.phase = Phase::Failed(e.kind());
                self.state.error_message = Some(format!("Failed to generate meme: {}", e));
            }
        }
        true
    }

    /// Run one full generation: guard, single request, state update.
    pub async fn generate(&mut self) -> Result<()> {
        let ticket = self.begin_generation()?;
        let outcome = self
            .generator
            .generate(ticket.credential(), ticket.prompt())
            .await;

        self.finish_generation(&ticket, &outcome);
        outcome.map(|_| ())
    }

    /// Save the current result image as `swap-meme-<epoch-millis>.png` in `dir`.
    ///
    /// Returns `Ok(None)` when there is nothing to save.
    pub fn download_image(&self, dir: &Path) -> Result<Option<PathBuf>> {
        self.download_image_at(dir, Utc::now())
    }

    pub fn download_image_at(&self, dir: &Path, now: DateTime<Utc>) -> Result<Option<PathBuf>> {
        let Some(uri) = self.state.result_image.as_deref() else {
            return Ok(None);
        };
        let image = export::parse_data_uri(uri).ok_or_else(|| {
            Error::MalformedResponse("result image is not a base64 data URI".to_string())
        })?;
        export::save_image(dir, &image, now).map(Some)
    }

    /// Copy the current result image to `sink` and raise the "copied" flag.
    ///
    /// Returns `Ok(false)` when there is no image. Failures leave the phase untouched.
    pub async fn copy_image_to_clipboard(&mut self, sink: &dyn ClipboardSink) -> Result<bool> {
        self.copy_image_to_clipboard_at(sink, Instant::now()).await
    }

    pub async fn copy_image_to_clipboard_at(
        &mut self,
        sink: &dyn ClipboardSink,
        now: Instant,
    ) -> Result<bool> {
        let Some(uri) = self.state.result_image.as_deref() else {
            return Ok(false);
        };
        let image = export::parse_data_uri(uri)
            .ok_or_else(|| Error::Clipboard("result image is not a base64 data URI".to_string()))?;

        if let Err(e) = sink.write_image(&image.mime_type, &image.bytes).await {
            error!("Failed to copy: {}", e);
            return Err(e);
        }

        info!("Image copied to clipboard");
        self.state.copied_at = Some(now);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerationClient;
    use crate::credentials::MemoryCredentialStore;
    use crate::export::MockClipboard;
    use crate::models::GeneratedImage;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn meme(bytes: Vec<u8>, text: Option<&str>) -> GeneratedMeme {
        GeneratedMeme {
            image: GeneratedImage::new("image/png", bytes),
            text: text.map(str::to_string),
        }
    }

    fn controller(
        generator: MockGenerationClient,
        credential: &str,
    ) -> SessionController<MockGenerationClient, MemoryCredentialStore> {
        let store = if credential.is_empty() {
            MemoryCredentialStore::new()
        } else {
            MemoryCredentialStore::with_value(credential)
        };
        SessionController::new(generator, store)
    }

    #[test]
    fn test_new_loads_stored_credential() {
        let session = controller(MockGenerationClient::new(), "stored-key");
        assert_eq!(session.state().credential, "stored-key");
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_set_credential_persists_and_clears() {
        let mut session = controller(MockGenerationClient::new(), "");
        session.set_credential("k1").unwrap();
        assert_eq!(session.store().load().unwrap().as_deref(), Some("k1"));

        session.set_credential("").unwrap();
        assert_eq!(session.store().load().unwrap(), None);
        assert_eq!(session.state().credential, "");
    }

    #[tokio::test]
    async fn test_empty_concept_never_calls_client() {
        let generator = MockGenerationClient::new();
        let handle = generator.clone();
        let mut session = controller(generator, "abc");
        session.set_concept("   ");

        let err = session.generate().await.unwrap_err();
        assert!(matches!(err, Error::MissingConcept));
        assert_eq!(session.phase(), Phase::Failed(ErrorKind::MissingConcept));
        assert_eq!(
            session.state().error_message.as_deref(),
            Some("Please enter a meme concept")
        );
        assert!(!session.state().generating);
        assert_eq!(handle.get_call_count(), 0);
    }

    #[test]
    fn test_missing_credential_checked_first() {
        let mut session = controller(MockGenerationClient::new(), "");
        let err = session.begin_generation().unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
        assert_eq!(session.phase(), Phase::Failed(ErrorKind::MissingCredential));
    }

    #[test]
    fn test_begin_clears_previous_result() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        session.set_concept("Smart homes that make us dumber");

        let first = session.begin_generation().unwrap();
        session.finish_generation(&first, &Ok(meme(vec![1], Some("caption"))));
        assert_eq!(session.phase(), Phase::Succeeded);

        let second = session.begin_generation().unwrap();
        assert_eq!(session.phase(), Phase::Generating);
        assert!(session.state().generating);
        assert!(session.state().result_image.is_none());
        assert!(session.state().result_text.is_none());
        assert!(session.state().error_message.is_none());
        assert!(second.prompt().contains("Smart homes that make us dumber"));
        assert!(second.seq() > first.seq());
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        session.set_concept("Influencers selling authenticity");

        let older = session.begin_generation().unwrap();
        let newer = session.begin_generation().unwrap();

        assert!(session.finish_generation(&newer, &Ok(meme(vec![2], Some("new")))));
        assert!(!session.finish_generation(&older, &Ok(meme(vec![1], Some("old")))));

        assert_eq!(session.phase(), Phase::Succeeded);
        assert_eq!(session.state().result_text.as_deref(), Some("new"));
    }

    #[test]
    fn test_stale_outcome_does_not_end_newer_request() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        session.set_concept("Online activism without real-world action");

        let older = session.begin_generation().unwrap();
        let _newer = session.begin_generation().unwrap();

        assert!(!session.finish_generation(&older, &Err(Error::NoImage)));
        assert_eq!(session.phase(), Phase::Generating);
        assert!(session.state().generating);
    }

    #[test]
    fn test_guard_failure_while_pending_keeps_generating() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        session.set_concept("Noise-cancelling headphones in open-plan offices");

        let pending = session.begin_generation().unwrap();
        session.set_concept("");

        let err = session.begin_generation().unwrap_err();
        assert!(matches!(err, Error::MissingConcept));
        assert_eq!(session.phase(), Phase::Generating);
        assert!(session.state().generating);
        assert_eq!(
            session.state().error_message.as_deref(),
            Some("Please enter a meme concept")
        );

        assert!(session.finish_generation(&pending, &Err(Error::NoImage)));
        assert_eq!(session.phase(), Phase::Failed(ErrorKind::NoImage));
        assert!(!session.state().generating);
        assert_eq!(
            session.state().error_message.as_deref(),
            Some("Failed to generate meme: No image was generated in the response")
        );
    }

    #[test]
    fn test_pending_request_can_still_succeed_after_rejected_retry() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        session.set_concept("Standing desks used as shelves");

        let pending = session.begin_generation().unwrap();
        session.set_session_credential(" ");
        session.begin_generation().unwrap_err();

        assert!(session.finish_generation(&pending, &Ok(meme(vec![4], Some("done")))));
        assert_eq!(session.phase(), Phase::Succeeded);
        assert!(!session.state().generating);
        assert_eq!(session.state().result_text.as_deref(), Some("done"));
        assert!(session.state().error_message.is_none());
    }

    #[tokio::test]
    async fn test_api_failure_sets_message() {
        let generator = MockGenerationClient::new().with_api_error(403, "API key not valid");
        let mut session = controller(generator, "bad");
        session.set_concept("Self-help books gathering dust");

        assert!(session.generate().await.is_err());
        assert_eq!(session.phase(), Phase::Failed(ErrorKind::Api));
        assert_eq!(
            session.state().error_message.as_deref(),
            Some("Failed to generate meme: API Error (403): API key not valid")
        );
        assert!(!session.state().generating);
    }

    #[tokio::test]
    async fn test_no_image_failure() {
        let generator = MockGenerationClient::new().with_no_image();
        let mut session = controller(generator, "abc");
        session.set_concept("Fitness apps while sitting all day");

        session.generate().await.unwrap_err();
        assert_eq!(session.phase(), Phase::Failed(ErrorKind::NoImage));
        assert!(session.state().result_image.is_none());
    }

    #[tokio::test]
    async fn test_retry_after_failure_succeeds() {
        let generator = MockGenerationClient::new()
            .with_malformed_response("missing parts")
            .with_meme(meme(vec![5, 6], None));
        let mut session = controller(generator, "abc");
        session.set_concept("Subscription services we forgot we have");

        session.generate().await.unwrap_err();
        assert_eq!(session.phase(), Phase::Failed(ErrorKind::MalformedResponse));

        session.generate().await.unwrap();
        assert_eq!(session.phase(), Phase::Succeeded);
        assert!(session.state().error_message.is_none());
        assert!(session.state().result_text.is_none());
    }

    #[test]
    fn test_concept_helpers() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        let mut rng = StdRng::seed_from_u64(5);

        assert!(!session.enhance_current_concept(&mut rng));
        assert_eq!(session.state().concept, "");

        let picked = session.use_random_concept(&mut rng).to_string();
        assert!(concepts::RANDOM_CONCEPTS.contains(&picked.as_str()));

        assert!(session.enhance_current_concept(&mut rng));
        assert!(session.state().concept.contains(&picked.to_lowercase()));

        assert_eq!(
            session.use_example(2),
            Some("People taking photos of their food instead of eating it")
        );
        assert_eq!(session.use_example(99), None);
    }

    #[test]
    fn test_can_generate() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        assert!(!session.state().can_generate());
        session.set_concept("x");
        assert!(session.state().can_generate());
        session.begin_generation().unwrap();
        assert!(!session.state().can_generate());
    }

    #[tokio::test]
    async fn test_download_and_copy_without_image_are_noops() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        let dir = tempdir().unwrap();
        let clipboard = MockClipboard::new();

        assert_eq!(session.download_image(dir.path()).unwrap(), None);
        assert!(!session.copy_image_to_clipboard(&clipboard).await.unwrap());
        assert!(clipboard.contents().is_none());
        assert!(!session.state().copy_confirmed());
    }

    #[tokio::test]
    async fn test_download_writes_result_image() {
        let generator = MockGenerationClient::new().with_meme(meme(vec![7, 8, 9], None));
        let mut session = controller(generator, "abc");
        session.set_concept("Digital detox retreats advertised on social media");
        session.generate().await.unwrap();

        let dir = tempdir().unwrap();
        let now = Utc.timestamp_millis_opt(1_234).unwrap();
        let path = session.download_image_at(dir.path(), now).unwrap().unwrap();
        assert_eq!(path, dir.path().join("swap-meme-1234.png"));
        assert_eq!(std::fs::read(path).unwrap(), vec![7, 8, 9]);
    }

    #[tokio::test]
    async fn test_copy_sets_flag_that_expires() {
        let generator = MockGenerationClient::new().with_meme(meme(vec![1, 2], None));
        let mut session = controller(generator, "abc");
        session.set_concept("Virtual meetings that could have been emails");
        session.generate().await.unwrap();

        let clipboard = MockClipboard::new();
        let copied_at = Instant::now();
        assert!(session
            .copy_image_to_clipboard_at(&clipboard, copied_at)
            .await
            .unwrap());

        assert_eq!(
            clipboard.contents(),
            Some(("image/png".to_string(), vec![1, 2]))
        );
        assert!(session
            .state()
            .copy_confirmed_at(copied_at + Duration::from_millis(1_999)));
        assert!(!session.state().copy_confirmed_at(copied_at + COPY_CONFIRMATION));
    }

    #[tokio::test]
    async fn test_copy_failure_keeps_phase() {
        let mut session = controller(MockGenerationClient::new(), "abc");
        session.set_concept("Eco-friendly packaging for unnecessary products");
        session.generate().await.unwrap();

        let err = session
            .copy_image_to_clipboard(&MockClipboard::failing("no display"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Clipboard(_)));
        assert_eq!(session.phase(), Phase::Succeeded);
        assert!(!session.state().copy_confirmed());
    }
}
