use super::ClipboardSink;
use crate::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default clipboard command; `{mime}` is replaced by the image media type.
pub const DEFAULT_CLIPBOARD_COMMAND: &str = "wl-copy --type {mime}";

/// Pipes image bytes into an external clipboard tool's stdin
/// (`wl-copy`, `xclip -selection clipboard -t {mime}`, ...).
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = shell_words::split(command)
            .map_err(|e| Error::Config(format!("Invalid clipboard command: {}", e)))?
            .into_iter()
            .filter(|part| !part.is_empty());

        let program = parts
            .next()
            .ok_or_else(|| Error::Config("Clipboard command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    fn args_for(&self, mime_type: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{mime}", mime_type))
            .collect()
    }
}

impl Default for CommandClipboard {
    fn default() -> Self {
        Self {
            program: "wl-copy".to_string(),
            args: vec!["--type".to_string(), "{mime}".to_string()],
        }
    }
}

#[async_trait]
impl ClipboardSink for CommandClipboard {
    async fn write_image(&self, mime_type: &str, bytes: &[u8]) -> Result<()> {
        let args = self.args_for(mime_type);
        tracing::debug!("Running clipboard command: {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Clipboard(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(bytes)
                .await
                .map_err(|e| Error::Clipboard(format!("failed to write image: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Clipboard(format!("{} did not finish: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Clipboard(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
