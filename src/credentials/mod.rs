//! Local persistence of the Gemini API credential.
//!
//! The credential lives under a single fixed key in a small key-value store,
//! mirroring browser local storage: absence means "no credential configured".

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::Result;
use std::path::PathBuf;

/// Key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "gemini-api-key";

/// Save/load/clear a single credential string.
///
/// No format or authenticity checks happen here; a bad key is only discovered
/// when the generation endpoint rejects it.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;

    /// Persist `value`, or delete the entry when `value` is empty.
    fn save(&self, value: &str) -> Result<()>;

    fn clear(&self) -> Result<()> {
        self.save("")
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, value: &str) -> Result<()> {
        (**self).save(value)
    }
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/swap-memes/` unless `override_dir` is given.
pub fn config_dir(override_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir;
    }
    dirs::config_dir()
        .map(|d| d.join("swap-memes"))
        .unwrap_or_else(|| PathBuf::from(".swap-memes"))
}
