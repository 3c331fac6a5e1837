//! Error types for Tett.

use thiserror::Error;

/// Library-level error type for Tett operations.
#[derive(Error, Debug)]
pub enum TettError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No LLM provider is available: {0}")]
    Unavailable(String),

    #[error("Transcript text is missing or empty")]
    EmptyInput,

    #[error("Malformed LLM response at {stage}: {message}")]
    MalformedResponse { stage: &'static str, message: String },

    #[error("LLM gateway error: {0}")]
    Gateway(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TettError {
    /// Build a malformed-response error for a pipeline stage.
    pub fn malformed(stage: &'static str, message: impl Into<String>) -> Self {
        TettError::MalformedResponse {
            stage,
            message: message.into(),
        }
    }
}

/// Result type alias for Tett operations.
pub type Result<T> = std::result::Result<T, TettError>;
