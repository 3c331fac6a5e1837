//! LLM invocation gateway.
//!
//! Thin adapter that sends a fully rendered prompt to a configured model and
//! parses a JSON response. Owns availability checks; performs no retries —
//! failures propagate to the orchestrator.

mod openai;

pub use openai::OpenAiGateway;

use crate::error::{Result, TettError};
use async_trait::async_trait;
use serde_json::Value;

/// Trait for LLM invocation.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a rendered system/user prompt pair and parse the JSON response.
    ///
    /// One outbound call per invocation, no retries. The response may wrap
    /// its JSON in markdown fences; implementations must tolerate that.
    async fn invoke(&self, system: &str, user: &str) -> Result<Value>;

    /// Whether the primary provider has credentials configured.
    fn is_available(&self) -> bool;

    /// Whether a fallback provider is configured and usable.
    fn is_fallback_available(&self) -> bool;

    /// Name of the model that will serve the next invocation.
    fn model_name(&self) -> String;
}

/// Extract a JSON object from an LLM response, tolerating markdown fences
/// and surrounding prose.
pub(crate) fn extract_json_object(response: &str) -> Result<Value> {
    let json_start = response.find('{');
    let json_end = response.rfind('}');

    let json_str = match (json_start, json_end) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => response,
    };

    serde_json::from_str(json_str).map_err(|e| {
        TettError::malformed(
            "gateway",
            format!(
                "Failed to parse LLM response as JSON: {}. Response was: {}",
                e,
                response.chars().take(500).collect::<String>()
            ),
        )
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        let value = extract_json_object(r#"{"summary": "text"}"#).unwrap();
        assert_eq!(value["summary"], "text");
    }

    #[test]
    fn test_extract_with_markdown_fences() {
        let response = r#"Here is the result:

```json
{"sections": [{"title": "Part 1"}]}
```

Let me know if you need anything else."#;

        let value = extract_json_object(response).unwrap();
        assert_eq!(value["sections"][0]["title"], "Part 1");
    }

    #[test]
    fn test_extract_rejects_non_json() {
        let err = extract_json_object("I could not produce a summary.").unwrap_err();
        assert!(matches!(
            err,
            TettError::MalformedResponse { stage: "gateway", .. }
        ));
    }

    #[test]
    fn test_extract_rejects_long_multibyte_response() {
        // 600 bytes of 3-byte chars; naive byte slicing at 500 would land
        // mid-character and panic instead of returning the error
        let response = "€".repeat(200);
        let err = extract_json_object(&response).unwrap_err();
        assert!(matches!(
            err,
            TettError::MalformedResponse { stage: "gateway", .. }
        ));
    }
}
