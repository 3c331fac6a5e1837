//! Final consolidation pass.
//!
//! One whole-document LLM call that removes residual cross-section
//! repetition while preserving the exact output schema. Consolidation is a
//! quality improvement, never a correctness gate: any failure falls back to
//! the original summary unchanged.

use crate::config::Prompts;
use crate::error::{Result, TettError};
use crate::gateway::LlmGateway;
use crate::summary::StructuredSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Consolidation pass over a complete structured summary.
pub struct Consolidator {
    gateway: Arc<dyn LlmGateway>,
    prompts: Prompts,
}

#[derive(Debug, Serialize)]
struct ConsolidationPayload<'a> {
    executive_summary: &'a str,
    key_takeaways: &'a [String],
    sections: Vec<PayloadSection<'a>>,
}

#[derive(Debug, Serialize)]
struct PayloadSection<'a> {
    title: &'a str,
    summary: &'a str,
    key_points: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ConsolidationResponse {
    executive_summary: String,
    key_takeaways: Vec<String>,
    sections: Vec<ResponseSection>,
}

#[derive(Debug, Deserialize)]
struct ResponseSection {
    title: String,
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
}

impl Consolidator {
    pub fn new(gateway: Arc<dyn LlmGateway>, prompts: Prompts) -> Self {
        Self { gateway, prompts }
    }

    /// Run the consolidation pass, falling back to the input on any failure.
    ///
    /// On success the returned summary has `metadata.consolidated = true`
    /// and only text content changed; structure and section order are
    /// preserved. On fallback the input is returned as-is.
    #[instrument(skip_all, fields(sections = summary.sections.len()))]
    pub async fn consolidate(&self, summary: StructuredSummary) -> StructuredSummary {
        match self.try_consolidate(&summary).await {
            Ok(consolidated) => {
                info!("Consolidation pass applied");
                consolidated
            }
            Err(e) => {
                warn!("Consolidation failed, keeping unconsolidated summary: {}", e);
                summary
            }
        }
    }

    async fn try_consolidate(&self, summary: &StructuredSummary) -> Result<StructuredSummary> {
        let payload = ConsolidationPayload {
            executive_summary: &summary.executive_summary,
            key_takeaways: &summary.key_takeaways,
            sections: summary
                .sections
                .iter()
                .map(|s| PayloadSection {
                    title: &s.title,
                    summary: &s.summary,
                    key_points: &s.key_points,
                })
                .collect(),
        };

        let mut vars = HashMap::new();
        vars.insert(
            "summary_json".to_string(),
            serde_json::to_string_pretty(&payload)?,
        );

        let system = self
            .prompts
            .render_with_custom(&self.prompts.consolidation.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.consolidation.user, &vars);

        let value = self.gateway.invoke(&system, &user).await?;

        let response: ConsolidationResponse = serde_json::from_value(value)
            .map_err(|e| TettError::malformed("consolidation", e.to_string()))?;

        Self::validate_shape(summary, &response)?;

        let mut consolidated = summary.clone();
        consolidated.executive_summary = response.executive_summary;
        consolidated.key_takeaways = response.key_takeaways;
        for (section, replacement) in consolidated.sections.iter_mut().zip(response.sections) {
            section.summary = replacement.summary;
            section.key_points = replacement.key_points;
        }
        consolidated.metadata.consolidated = true;

        Ok(consolidated)
    }

    /// Only text may change: section count, titles, and order must match
    /// the input exactly.
    fn validate_shape(
        summary: &StructuredSummary,
        response: &ConsolidationResponse,
    ) -> Result<()> {
        if response.executive_summary.trim().is_empty() {
            return Err(TettError::malformed("consolidation", "empty executive summary"));
        }
        if response.key_takeaways.is_empty() && !summary.key_takeaways.is_empty() {
            return Err(TettError::malformed("consolidation", "takeaways dropped"));
        }
        if response.sections.len() != summary.sections.len() {
            return Err(TettError::malformed(
                "consolidation",
                format!(
                    "section count changed: {} -> {}",
                    summary.sections.len(),
                    response.sections.len()
                ),
            ));
        }
        for (original, replacement) in summary.sections.iter().zip(&response.sections) {
            if original.title != replacement.title {
                return Err(TettError::malformed(
                    "consolidation",
                    format!(
                        "section title changed: {:?} -> {:?}",
                        original.title, replacement.title
                    ),
                ));
            }
            if replacement.summary.trim().is_empty() {
                return Err(TettError::malformed("consolidation", "empty section summary"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::MockGateway;
    use crate::summary::{SectionSummary, SummaryMetadata};
    use serde_json::json;

    fn sample() -> StructuredSummary {
        StructuredSummary {
            success: true,
            title: "Trading 101".to_string(),
            executive_summary: "A primer on disciplined trading.".to_string(),
            key_takeaways: vec!["Always use a stop loss".to_string()],
            target_audience: "Beginner traders".to_string(),
            sections: vec![
                SectionSummary {
                    title: "Risk".to_string(),
                    timestamp: "00:00".to_string(),
                    description: "Risk basics".to_string(),
                    summary: "Risk management is essential.".to_string(),
                    key_points: vec!["Always use a stop loss".to_string()],
                    entities: vec!["Kelly criterion".to_string()],
                },
                SectionSummary {
                    title: "Entries".to_string(),
                    timestamp: "10:00".to_string(),
                    description: "Entry timing".to_string(),
                    summary: "Risk management is essential; enter on confirmation.".to_string(),
                    key_points: vec!["Wait for confirmation".to_string()],
                    entities: vec![],
                },
            ],
            total_sections: 2,
            metadata: SummaryMetadata {
                model: "mock".to_string(),
                method: "chain_of_density".to_string(),
                transcript_length: 1000,
                consolidated: false,
            },
            error: None,
            cached: false,
            cached_at: None,
        }
    }

    #[tokio::test]
    async fn test_success_replaces_text_and_sets_flag() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({
            "executive_summary": "A primer on disciplined trading.",
            "key_takeaways": ["Always use a stop loss"],
            "sections": [
                {"title": "Risk", "summary": "Risk management is essential.", "key_points": ["Always use a stop loss"]},
                {"title": "Entries", "summary": "Enter on confirmation.", "key_points": ["Wait for confirmation"]}
            ]
        }));

        let consolidator = Consolidator::new(gateway, Prompts::default());
        let result = consolidator.consolidate(sample()).await;

        assert!(result.metadata.consolidated);
        // Repetition removed from section 2, section 1 untouched
        assert_eq!(result.sections[1].summary, "Enter on confirmation.");
        // Shape preserved: same count, titles, order; non-text fields kept
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[0].title, "Risk");
        assert_eq!(result.sections[1].title, "Entries");
        assert_eq!(result.sections[0].timestamp, "00:00");
        assert_eq!(result.sections[0].entities, vec!["Kelly criterion".to_string()]);
    }

    #[tokio::test]
    async fn test_call_failure_falls_back_to_input() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_err("rate limited");

        let input = sample();
        let consolidator = Consolidator::new(gateway, Prompts::default());
        let result = consolidator.consolidate(input.clone()).await;

        assert!(!result.metadata.consolidated);
        assert_eq!(result.executive_summary, input.executive_summary);
        assert_eq!(result.sections[1].summary, input.sections[1].summary);
    }

    #[tokio::test]
    async fn test_changed_section_count_falls_back() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({
            "executive_summary": "Shorter.",
            "key_takeaways": ["One takeaway"],
            "sections": [
                {"title": "Risk", "summary": "Merged everything here."}
            ]
        }));

        let consolidator = Consolidator::new(gateway, Prompts::default());
        let result = consolidator.consolidate(sample()).await;

        assert!(!result.metadata.consolidated);
        assert_eq!(result.sections.len(), 2);
    }

    #[tokio::test]
    async fn test_retitled_section_falls_back() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({
            "executive_summary": "Fine.",
            "key_takeaways": ["One takeaway"],
            "sections": [
                {"title": "Risk Management", "summary": "Renamed."},
                {"title": "Entries", "summary": "Kept."}
            ]
        }));

        let consolidator = Consolidator::new(gateway, Prompts::default());
        let result = consolidator.consolidate(sample()).await;

        assert!(!result.metadata.consolidated);
        assert_eq!(result.sections[0].title, "Risk");
    }

    #[tokio::test]
    async fn test_missing_keys_fall_back() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({"summary": "wrong shape entirely"}));

        let consolidator = Consolidator::new(gateway, Prompts::default());
        let result = consolidator.consolidate(sample()).await;
        assert!(!result.metadata.consolidated);
    }
}
