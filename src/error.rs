//! Error types for logband

use crate::types::UserId;
use thiserror::Error;

/// Errors that can occur during detection
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("No events found for user {0}")]
    EmptyUser(UserId),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse event input: {0}")]
    ParseError(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Chart rendering failed: {0}")]
    RenderError(String),
}
