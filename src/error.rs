//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Please enter your Google API key")]
    MissingCredential,

    #[error("Please enter a meme concept")]
    MissingConcept,

    #[error("API Error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("No image was generated in the response")]
    NoImage,

    #[error("Unexpected response structure from API: {0}")]
    MalformedResponse(String),

    #[error("Unable to copy image to clipboard: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`], cheap to copy into session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    MissingConcept,
    Api,
    NoImage,
    MalformedResponse,
    Clipboard,
    Transport,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingCredential => ErrorKind::MissingCredential,
            Error::MissingConcept => ErrorKind::MissingConcept,
            Error::Api { .. } => ErrorKind::Api,
            Error::NoImage => ErrorKind::NoImage,
            Error::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Error::Clipboard(_) => ErrorKind::Clipboard,
            Error::Http(_) => ErrorKind::Transport,
            Error::Io(_) | Error::Serialization(_) | Error::EnvVar(_) | Error::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// True for the guard failures that stop a request before it is sent.
    pub fn is_preflight(&self) -> bool {
        matches!(self, Error::MissingCredential | Error::MissingConcept)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_includes_status_and_body() {
        let err = Error::Api {
            status: 403,
            body: "API key not valid".to_string(),
        };
        assert_eq!(err.to_string(), "API Error (403): API key not valid");
        assert_eq!(err.kind(), ErrorKind::Api);
    }

    #[test]
    fn test_preflight_errors() {
        assert!(Error::MissingCredential.is_preflight());
        assert!(Error::MissingConcept.is_preflight());
        assert!(!Error::NoImage.is_preflight());
    }
}
