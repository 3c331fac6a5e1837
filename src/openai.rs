//! OpenAI client configuration.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client with a custom timeout to prevent hung API calls.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    create_client_with_config(OpenAIConfig::default(), timeout)
}

/// Create an OpenAI client with an explicit config (e.g. a fallback API key).
pub fn create_client_with_config(config: OpenAIConfig, timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(config).with_http_client(http_client)
}
