//! Executive summary generation.
//!
//! Synthesizes all section summaries into a top-level narrative. This stage
//! never sees the raw transcript, only prior stage output, which keeps its
//! prompt size bounded regardless of transcript length.

use crate::config::Prompts;
use crate::error::{Result, TettError};
use crate::gateway::LlmGateway;
use crate::summary::SectionSummary;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// The top-level synthesis of all section summaries.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutiveSummary {
    pub executive_summary: String,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
}

/// Executive summary generator.
pub struct ExecutiveSummaryGenerator {
    gateway: Arc<dyn LlmGateway>,
    prompts: Prompts,
}

impl ExecutiveSummaryGenerator {
    pub fn new(gateway: Arc<dyn LlmGateway>, prompts: Prompts) -> Self {
        Self { gateway, prompts }
    }

    /// Generate the executive summary from section summaries.
    #[instrument(skip_all, fields(sections = sections.len()))]
    pub async fn generate(
        &self,
        title: &str,
        sections: &[SectionSummary],
    ) -> Result<ExecutiveSummary> {
        let mut block = String::new();
        for section in sections {
            block.push_str(&format!(
                "## {} ({})\n{}\n\n",
                section.title, section.timestamp, section.summary
            ));
        }

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), title.to_string());
        vars.insert("section_summaries".to_string(), block);

        let system = self
            .prompts
            .render_with_custom(&self.prompts.executive.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.executive.user, &vars);

        let value = self.gateway.invoke(&system, &user).await?;

        let response: ExecutiveSummary = serde_json::from_value(value)
            .map_err(|e| TettError::malformed("executive", e.to_string()))?;

        if response.executive_summary.trim().is_empty() {
            return Err(TettError::malformed("executive", "empty executive summary"));
        }

        Ok(response)
    }
}
