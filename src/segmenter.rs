//! LLM-based topic segmentation.
//!
//! Splits a transcript into an ordered list of topic sections with opaque
//! position hints and one-line descriptions. Boundaries are whatever the
//! model proposes; they are advisory metadata, never validated arithmetically.

use crate::config::Prompts;
use crate::error::{Result, TettError};
use crate::gateway::LlmGateway;
use crate::summary::{TopicSection, TranscriptInput};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// LLM-based topic segmenter.
pub struct TopicSegmenter {
    gateway: Arc<dyn LlmGateway>,
    prompts: Prompts,
}

#[derive(Debug, Deserialize)]
struct SegmentationResponse {
    #[serde(default)]
    sections: Vec<TopicSection>,
}

impl TopicSegmenter {
    pub fn new(gateway: Arc<dyn LlmGateway>, prompts: Prompts) -> Self {
        Self { gateway, prompts }
    }

    /// Partition the transcript into coherent topic sections.
    ///
    /// A transcript with no discernible topic shifts still yields one
    /// section spanning the whole transcript.
    #[instrument(skip(self, input), fields(content_id = %input.content_id))]
    pub async fn segment(&self, input: &TranscriptInput) -> Result<Vec<TopicSection>> {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), input.title.clone());
        vars.insert("transcript".to_string(), input.transcript_text.clone());
        vars.insert("context".to_string(), input.context_block());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.segmentation.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.segmentation.user, &vars);

        let value = self.gateway.invoke(&system, &user).await?;

        let response: SegmentationResponse = serde_json::from_value(value)
            .map_err(|e| TettError::malformed("segmenter", e.to_string()))?;

        let mut sections = response.sections;
        sections.retain(|s| !s.title.trim().is_empty());

        if sections.is_empty() {
            warn!("Segmenter returned no sections, using whole-document section");
            sections.push(TopicSection {
                title: input.title.clone(),
                start_marker: "start".to_string(),
                end_marker: "end".to_string(),
                description: "The full content as a single topic.".to_string(),
            });
        }

        info!("Identified {} topic sections", sections.len());
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::MockGateway;
    use serde_json::json;

    fn input() -> TranscriptInput {
        TranscriptInput::new("vid-1", "Trading 101", "Some transcript text.")
    }

    #[tokio::test]
    async fn test_segment_parses_sections() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({
            "sections": [
                {"title": "Intro to Risk", "start_marker": "00:00", "end_marker": "05:30", "description": "Why risk matters."},
                {"title": "Stop Losses", "start_marker": "05:30", "end_marker": "12:00", "description": "Using stop losses."}
            ]
        }));

        let segmenter = TopicSegmenter::new(gateway.clone(), Prompts::default());
        let sections = segmenter.segment(&input()).await.unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Intro to Risk");
        assert_eq!(sections[1].start_marker, "05:30");
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_segment_empty_list_degrades_to_whole_document() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({"sections": []}));

        let segmenter = TopicSegmenter::new(gateway, Prompts::default());
        let sections = segmenter.segment(&input()).await.unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Trading 101");
    }

    #[tokio::test]
    async fn test_segment_malformed_response() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({"sections": "not a list"}));

        let segmenter = TopicSegmenter::new(gateway, Prompts::default());
        let err = segmenter.segment(&input()).await.unwrap_err();
        assert!(matches!(
            err,
            TettError::MalformedResponse { stage: "segmenter", .. }
        ));
    }

    #[tokio::test]
    async fn test_meeting_context_reaches_prompt() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({"sections": [{"title": "Budget Review"}]}));

        let input = TranscriptInput::new("m-1", "Weekly Sync", "We discussed the budget.")
            .with_kind(crate::summary::ContentKind::Meeting)
            .with_context("subject", "Q3 budget")
            .with_context("participants", "Ana, Bjorn");

        let segmenter = TopicSegmenter::new(gateway.clone(), Prompts::default());
        segmenter.segment(&input).await.unwrap();

        let prompt = gateway.call(0).full();
        assert!(prompt.contains("Q3 budget"));
        assert!(prompt.contains("Ana, Bjorn"));
    }
}
