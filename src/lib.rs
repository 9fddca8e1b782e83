//! Swap Memes - turns observations about modern life into editorial cartoons
//!
//! A short concept is wrapped into a cartoon prompt, sent to Gemini's
//! multimodal image generation, and the returned image and caption are kept
//! in a session that can save or copy the result.

pub mod ai;
pub mod app;
pub mod concepts;
pub mod credentials;
pub mod error;
pub mod export;
pub mod models;
pub mod prompts;
pub mod session;

pub use error::{Error, ErrorKind, Result};
