//! Chain-of-density section summarization with cross-section context.
//!
//! Sections summarized independently keep re-introducing the themes the
//! transcript repeats. The fix: the prompt for section k>1 embeds a compact
//! digest of sections 1..k-1 (titles and key points only) and instructs the
//! model to cover only information that is new relative to it. This makes
//! the stage inherently sequential; section k needs section k-1's output.

use crate::config::Prompts;
use crate::error::{Result, TettError};
use crate::gateway::LlmGateway;
use crate::summary::{RunningDigest, SectionSummary, TopicSection, TranscriptInput};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Per-section summarizer.
pub struct SectionSummarizer {
    gateway: Arc<dyn LlmGateway>,
    prompts: Prompts,
}

#[derive(Debug, Deserialize)]
struct SectionResponse {
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    entities: Vec<String>,
}

impl SectionSummarizer {
    pub fn new(gateway: Arc<dyn LlmGateway>, prompts: Prompts) -> Self {
        Self { gateway, prompts }
    }

    /// Summarize one section, conditioned on the digest of prior sections.
    ///
    /// The digest is an immutable snapshot for this invocation; the first
    /// section receives an empty digest and is summarized context-free.
    #[instrument(skip_all, fields(section = %section.title))]
    pub async fn summarize_section(
        &self,
        input: &TranscriptInput,
        section: &TopicSection,
        digest: &RunningDigest,
    ) -> Result<SectionSummary> {
        let digest_block = if digest.is_empty() {
            String::new()
        } else {
            let mut vars = HashMap::new();
            vars.insert("digest_entries".to_string(), digest.render());
            Prompts::render(&self.prompts.section.digest_block, &vars)
        };

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), input.title.clone());
        vars.insert("section_title".to_string(), section.title.clone());
        vars.insert("section_description".to_string(), section.description.clone());
        vars.insert("start_marker".to_string(), section.start_marker.clone());
        vars.insert("end_marker".to_string(), section.end_marker.clone());
        vars.insert("transcript".to_string(), input.transcript_text.clone());
        vars.insert("context".to_string(), input.context_block());
        vars.insert("digest".to_string(), digest_block);

        let system = self
            .prompts
            .render_with_custom(&self.prompts.section.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.section.user, &vars);

        let value = self.gateway.invoke(&system, &user).await?;

        let response: SectionResponse = serde_json::from_value(value)
            .map_err(|e| TettError::malformed("section", e.to_string()))?;

        if response.summary.trim().is_empty() {
            return Err(TettError::malformed("section", "empty summary text"));
        }

        debug!(
            "Section summarized with {} key points, {} entities (digest: {} prior sections)",
            response.key_points.len(),
            response.entities.len(),
            digest.len()
        );

        Ok(SectionSummary {
            title: section.title.clone(),
            timestamp: section.start_marker.clone(),
            description: section.description.clone(),
            summary: response.summary,
            key_points: response.key_points,
            entities: response.entities,
        })
    }
}
