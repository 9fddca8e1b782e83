use super::ClipboardSink;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory clipboard. Clones share the captured contents.
#[derive(Clone, Default)]
pub struct MockClipboard {
    contents: Arc<Mutex<Option<(String, Vec<u8>)>>>,
    fail_with: Option<String>,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails with [`Error::Clipboard`] carrying `reason`.
    pub fn failing(reason: &str) -> Self {
        Self {
            contents: Arc::default(),
            fail_with: Some(reason.to_string()),
        }
    }

    /// Last written `(mime_type, bytes)`.
    pub fn contents(&self) -> Option<(String, Vec<u8>)> {
        self.contents.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClipboardSink for MockClipboard {
    async fn write_image(&self, mime_type: &str, bytes: &[u8]) -> Result<()> {
        if let Some(reason) = &self.fail_with {
            return Err(Error::Clipboard(reason.clone()));
        }
        *self.contents.lock().unwrap() = Some((mime_type.to_string(), bytes.to_vec()));
        Ok(())
    }
}
