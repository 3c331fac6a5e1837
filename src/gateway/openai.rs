//! OpenAI-backed gateway with primary and fallback provider selection.

use super::{extract_json_object, LlmGateway};
use crate::config::LlmSettings;
use crate::error::{Result, TettError};
use crate::openai::{create_client_with_config, create_client_with_timeout};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the primary provider's API key.
const PRIMARY_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable holding the fallback provider's API key.
/// When unset, the fallback model runs against the primary credentials.
const FALLBACK_KEY_VAR: &str = "TETT_FALLBACK_API_KEY";

fn env_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

/// Gateway backed by the OpenAI chat-completions API.
///
/// The primary model is used whenever its credentials are present; the
/// configured fallback model serves requests otherwise. No retries: one
/// outbound call per `invoke`, with failures propagated upward.
pub struct OpenAiGateway {
    client: async_openai::Client<OpenAIConfig>,
    fallback_client: async_openai::Client<OpenAIConfig>,
    model: String,
    fallback_model: Option<String>,
    temperature: f32,
}

impl OpenAiGateway {
    /// Create a gateway from LLM settings.
    pub fn new(settings: &LlmSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_seconds);

        let fallback_client = match env_key(FALLBACK_KEY_VAR) {
            Some(key) => {
                create_client_with_config(OpenAIConfig::new().with_api_key(key), timeout)
            }
            None => create_client_with_timeout(timeout),
        };

        Self {
            client: create_client_with_timeout(timeout),
            fallback_client,
            model: settings.model.clone(),
            fallback_model: settings.fallback_model.clone(),
            temperature: settings.temperature,
        }
    }

    async fn chat(
        &self,
        client: &async_openai::Client<OpenAIConfig>,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<Value> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| TettError::Gateway(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| TettError::Gateway(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TettError::Gateway(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| TettError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TettError::Gateway("Empty response from LLM".to_string()))?;

        debug!("LLM response: {}", content.chars().take(500).collect::<String>());

        extract_json_object(content)
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn invoke(&self, system: &str, user: &str) -> Result<Value> {
        if self.is_available() {
            self.chat(&self.client, &self.model, system, user).await
        } else if let Some(fallback_model) =
            self.fallback_model.as_ref().filter(|_| self.is_fallback_available())
        {
            debug!("Primary provider unavailable, using fallback model {}", fallback_model);
            self.chat(&self.fallback_client, fallback_model, system, user)
                .await
        } else {
            Err(TettError::Unavailable(format!(
                "set {} (or {} with a fallback model) to enable generation",
                PRIMARY_KEY_VAR, FALLBACK_KEY_VAR
            )))
        }
    }

    fn is_available(&self) -> bool {
        env_key(PRIMARY_KEY_VAR).is_some()
    }

    fn is_fallback_available(&self) -> bool {
        self.fallback_model.is_some()
            && (env_key(FALLBACK_KEY_VAR).is_some() || env_key(PRIMARY_KEY_VAR).is_some())
    }

    fn model_name(&self) -> String {
        if self.is_available() {
            self.model.clone()
        } else if let Some(fallback) = &self.fallback_model {
            fallback.clone()
        } else {
            self.model.clone()
        }
    }
}
