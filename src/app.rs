//! Application wiring for the command-line front-end.

use crate::ai::{GeminiImageClient, GenerationService};
use crate::concepts::{self, EXAMPLE_CONCEPTS};
use crate::credentials::{self, CredentialStore, FileCredentialStore};
use crate::export::{ClipboardSink, CommandClipboard};
use crate::models::Config;
use crate::prompts;
use crate::session::{SessionController, SessionState};
use crate::Result;
use std::path::PathBuf;
use tracing::{info, warn};

type Session = SessionController<Box<dyn GenerationService>, Box<dyn CredentialStore>>;

/// Owns the session controller plus the side-effect sinks the CLI needs.
pub struct App {
    session: Session,
    clipboard: Box<dyn ClipboardSink>,
    output_dir: PathBuf,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub generator: Box<dyn GenerationService>,
    pub store: Box<dyn CredentialStore>,
    pub clipboard: Box<dyn ClipboardSink>,
}

/// What `generate` should do around the request itself.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub concept: Option<String>,
    pub random: bool,
    pub enhance: bool,
    /// Stored for later sessions, like typing into the key field.
    pub api_key: Option<String>,
    pub save: bool,
    pub copy: bool,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub concept: String,
    pub image_uri: String,
    pub caption: Option<String>,
    pub saved_to: Option<PathBuf>,
    pub copied: bool,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, output_dir: PathBuf) -> Self {
        Self {
            session: SessionController::new(services.generator, services.store),
            clipboard: services.clipboard,
            output_dir,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new(config: &Config) -> Result<Self> {
        let generator = GeminiImageClient::new_with_client(
            config.gemini_model.clone(),
            config.request_timeout,
            reqwest::Client::new(),
        )
        .with_base_url(config.gemini_base_url.clone());
        info!("Image provider: Gemini (model: {})", generator.model());

        let config_dir = credentials::config_dir(config.config_dir.clone());
        let store = FileCredentialStore::new(&config_dir);
        info!("Credential store: {}", store.path().display());

        let clipboard = match &config.clipboard_command {
            Some(command) => CommandClipboard::from_command_line(command)?,
            None => CommandClipboard::default(),
        };

        let mut app = Self::with_services(
            AppServices {
                generator: Box::new(generator),
                store: Box::new(store),
                clipboard: Box::new(clipboard),
            },
            config.output_dir.clone(),
        );

        if let Some(key) = &config.gemini_api_key {
            info!("Using GEMINI_API_KEY from the environment");
            app.session.set_session_credential(key);
        }

        Ok(app)
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn set_output_dir(&mut self, dir: PathBuf) {
        self.output_dir = dir;
    }

    /// Resolve the concept, run one generation, then save and copy as requested.
    pub async fn generate(&mut self, options: GenerateOptions) -> Result<GenerateReport> {
        if let Some(key) = &options.api_key {
            self.session.set_credential(key)?;
        }

        {
            let mut rng = rand::thread_rng();
            match &options.concept {
                Some(concept) => self.session.set_concept(concept),
                None if options.random => {
                    let picked = self.session.use_random_concept(&mut rng);
                    info!("Picked random concept: {}", picked);
                }
                None => {}
            }
            if options.enhance && !self.session.enhance_current_concept(&mut rng) {
                warn!("Nothing to enhance: the concept is empty");
            }
        }

        info!("Generating cartoon for: {}", self.state().concept);
        self.session.generate().await?;

        let saved_to = if options.save {
            self.session.download_image(&self.output_dir)?
        } else {
            None
        };

        let copied = if options.copy {
            match self
                .session
                .copy_image_to_clipboard(self.clipboard.as_ref())
                .await
            {
                Ok(copied) => copied,
                Err(e) => {
                    warn!("Copy failed: {}", e);
                    false
                }
            }
        } else {
            false
        };

        let state = self.state();
        Ok(GenerateReport {
            concept: state.concept.clone(),
            image_uri: state.result_image.clone().unwrap_or_default(),
            caption: state.result_text.clone(),
            saved_to,
            copied,
        })
    }

    pub fn set_key(&mut self, key: &str) -> Result<()> {
        self.session.set_credential(key)
    }

    pub fn clear_key(&mut self) -> Result<()> {
        self.session.set_credential("")
    }

    /// The active credential with everything but its first four characters hidden.
    pub fn masked_key(&self) -> Option<String> {
        let key = self.state().credential.as_str();
        if key.is_empty() {
            return None;
        }
        Some(mask_credential(key))
    }

    pub fn random_concept(&self) -> &'static str {
        concepts::pick_random_concept(&mut rand::thread_rng())
    }

    pub fn enhance(&self, concept: &str) -> String {
        prompts::enhance_concept(concept, &mut rand::thread_rng())
    }

    pub fn examples(&self) -> Vec<(String, &'static str)> {
        EXAMPLE_CONCEPTS
            .iter()
            .map(|concept| (concepts::concept_preview(concept), *concept))
            .collect()
    }
}

fn mask_credential(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    let hidden = key.chars().count().saturating_sub(4);
    format!("{}{}", visible, "*".repeat(hidden))
}
