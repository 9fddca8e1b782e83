use super::{CredentialStore, CREDENTIAL_KEY};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const STORAGE_FILE: &str = "storage.json";

/// Credential kept in a JSON key-value file (`storage.json`) inside the
/// config directory. Unrelated keys in the file are left untouched.
pub struct FileCredentialStore {
    path: PathBuf,
    key: String,
}

impl FileCredentialStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(STORAGE_FILE),
            key: CREDENTIAL_KEY.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write to a sibling temp file, then rename it over the store so an
    /// interrupted write never leaves a truncated `storage.json`.
    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&temp)?;
        // `mode` only applies on creation; a leftover temp file keeps its bits.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(&self.key))
    }

    fn save(&self, value: &str) -> Result<()> {
        let (mut entries, repair) = match self.read_entries() {
            Ok(entries) => (entries, false),
            Err(Error::Serialization(e)) => {
                tracing::warn!(
                    "Ignoring unreadable {}: {}. Rewriting it.",
                    self.path.display(),
                    e
                );
                (BTreeMap::new(), true)
            }
            Err(e) => return Err(e),
        };
        if value.is_empty() {
            if entries.remove(&self.key).is_none() && !repair {
                return Ok(());
            }
            tracing::debug!("Removed stored credential from {}", self.path.display());
        } else {
            entries.insert(self.key.clone(), value.to_string());
            tracing::debug!("Stored credential in {}", self.path.display());
        }
        self.write_entries(&entries)
    }
}
