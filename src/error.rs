//! Error types for the page composer.
//!
//! Construction-time problems (bad templates, invalid client setup, duplicate
//! positions) are returned to the caller. Fetch-time failures are classified here
//! but never escape a provider: they feed retry, circuit breaking and tracing.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URI template: {0}")]
    InvalidTemplate(String),

    #[error("Missing URI template variables in parameters: {0:?}")]
    MissingTemplateVariables(Vec<String>),

    #[error("Unable to configure a fallback with non-resilient service client '{0}'")]
    FallbackNotAllowed(String),

    #[error("Duplicate position in plan: {0}")]
    DuplicatePosition(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error: status {status}")]
    ServerError { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit breaker '{0}' is open")]
    CircuitOpen(String),
}

impl ComposerError {
    /// Whether another attempt of the same fetch may succeed.
    ///
    /// Only connection-level failures and server-side error statuses qualify.
    /// Timeouts bound the whole command, so they are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ComposerError::Transport(_) | ComposerError::ServerError { .. }
        )
    }
}

impl From<config::ConfigError> for ComposerError {
    fn from(err: config::ConfigError) -> Self {
        ComposerError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for ComposerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ComposerError::Transport(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            ComposerError::Transport(format!("Connection error: {}", err))
        } else if err.is_builder() {
            ComposerError::Transport(format!("Invalid request: {}", err))
        } else {
            ComposerError::Transport(format!("HTTP error: {}", err))
        }
    }
}
