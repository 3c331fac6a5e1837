//! Pipeline orchestrator for Tett.
//!
//! Sequences the stages, merges their results into the final structured
//! summary, and enforces at-most-one fresh generation per content id unless
//! regeneration is forced.

use crate::cache::{CacheKey, CachedSummary, MemorySummaryCache, SummaryCache};
use crate::config::{Prompts, Settings};
use crate::consolidate::Consolidator;
use crate::dedup::KeyPointDeduplicator;
use crate::error::{Result, TettError};
use crate::executive::ExecutiveSummaryGenerator;
use crate::gateway::{LlmGateway, OpenAiGateway};
use crate::section::SectionSummarizer;
use crate::segmenter::TopicSegmenter;
use crate::summary::{
    RunningDigest, SectionSummary, StructuredSummary, SummaryMetadata, TranscriptInput,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

/// Pipeline stage labels, used for log progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segmenting,
    Summarizing(usize),
    Synthesizing,
    Deduplicating,
    Consolidating,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Segmenting => write!(f, "segmenting"),
            Stage::Summarizing(i) => write!(f, "summarizing section {}", i + 1),
            Stage::Synthesizing => write!(f, "synthesizing"),
            Stage::Deduplicating => write!(f, "deduplicating"),
            Stage::Consolidating => write!(f, "consolidating"),
        }
    }
}

/// The main summarization pipeline.
pub struct SummaryPipeline {
    settings: Settings,
    gateway: Arc<dyn LlmGateway>,
    cache: Arc<dyn SummaryCache>,
    segmenter: TopicSegmenter,
    sections: SectionSummarizer,
    executive: ExecutiveSummaryGenerator,
    dedup: KeyPointDeduplicator,
    consolidator: Consolidator,
}

impl SummaryPipeline {
    /// Create a pipeline with the default OpenAI gateway and in-memory cache.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let gateway: Arc<dyn LlmGateway> = Arc::new(OpenAiGateway::new(&settings.llm));
        let cache: Arc<dyn SummaryCache> = Arc::new(MemorySummaryCache::new());

        Ok(Self::with_components(settings, prompts, gateway, cache))
    }

    /// Create a pipeline with injected components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        gateway: Arc<dyn LlmGateway>,
        cache: Arc<dyn SummaryCache>,
    ) -> Self {
        Self {
            segmenter: TopicSegmenter::new(gateway.clone(), prompts.clone()),
            sections: SectionSummarizer::new(gateway.clone(), prompts.clone()),
            executive: ExecutiveSummaryGenerator::new(gateway.clone(), prompts.clone()),
            dedup: KeyPointDeduplicator::new(gateway.clone(), prompts.clone()),
            consolidator: Consolidator::new(gateway.clone(), prompts),
            settings,
            gateway,
            cache,
        }
    }

    /// Whether the primary LLM provider is available.
    pub fn is_available(&self) -> bool {
        self.gateway.is_available()
    }

    /// Whether the fallback LLM provider is available.
    pub fn is_fallback_available(&self) -> bool {
        self.gateway.is_fallback_available()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generate a structured summary for a transcript.
    ///
    /// The sole public entry point. Fatal errors are reported as
    /// `{success: false, error}` with no partial summary; a previously
    /// cached good result is never invalidated by a failed attempt.
    #[instrument(skip(self, input), fields(content_id = %input.content_id))]
    pub async fn generate_summary(
        &self,
        input: &TranscriptInput,
        force_regenerate: bool,
    ) -> StructuredSummary {
        match self.try_generate(input, force_regenerate).await {
            Ok(summary) => summary,
            Err(e) => {
                info!("Summary generation failed: {}", e);
                StructuredSummary::failure(&input.title, e)
            }
        }
    }

    /// Generate a structured summary, surfacing failures as typed errors.
    pub async fn try_generate(
        &self,
        input: &TranscriptInput,
        force_regenerate: bool,
    ) -> Result<StructuredSummary> {
        if input.transcript_text.trim().is_empty() {
            return Err(TettError::EmptyInput);
        }

        if !self.gateway.is_available() && !self.gateway.is_fallback_available() {
            return Err(TettError::Unavailable(
                "no LLM credentials configured".to_string(),
            ));
        }

        let key = CacheKey::new(&input.content_id, input.caller_id.as_deref());

        if !force_regenerate {
            if let Some(entry) = self.cache.get(&key).await? {
                info!("Cache hit for {}, returning stored summary", input.content_id);
                let mut summary = entry.summary;
                summary.cached = true;
                summary.cached_at = Some(entry.generated_at);
                return Ok(summary);
            }
        }

        let summary = self.run_stages(input).await?;

        self.cache
            .put(
                &key,
                CachedSummary {
                    summary: summary.clone(),
                    generated_at: Utc::now(),
                },
            )
            .await?;

        Ok(summary)
    }

    /// Run the generation stages in order. No caching concerns here.
    async fn run_stages(&self, input: &TranscriptInput) -> Result<StructuredSummary> {
        let max_takeaways = self.settings.summarization.max_takeaways;

        info!(stage = %Stage::Segmenting, "Segmenting transcript");
        let topic_sections = self.segmenter.segment(input).await?;

        // Sequential by design: each section's prompt depends on the digest
        // built from the previous sections' actual output.
        let mut digest = RunningDigest::new();
        let mut section_summaries: Vec<SectionSummary> = Vec::with_capacity(topic_sections.len());
        for (i, section) in topic_sections.iter().enumerate() {
            info!(stage = %Stage::Summarizing(i), "Summarizing section '{}'", section.title);
            let summary = self
                .sections
                .summarize_section(input, section, &digest)
                .await?;
            digest.push(&summary);
            section_summaries.push(summary);
        }

        info!(stage = %Stage::Synthesizing, "Generating executive summary");
        let executive = self.executive.generate(&input.title, &section_summaries).await?;

        info!(stage = %Stage::Deduplicating, "Deduplicating key points");
        let mut accumulated = executive.key_takeaways.clone();
        for section in &section_summaries {
            accumulated.extend(section.key_points.iter().cloned());
        }
        let candidates = drop_exact_duplicates(accumulated);
        let key_takeaways = self.dedup.deduplicate(&candidates, max_takeaways).await?;

        let total_sections = section_summaries.len();
        let summary = StructuredSummary {
            success: true,
            title: input.title.clone(),
            executive_summary: executive.executive_summary,
            key_takeaways,
            target_audience: executive.target_audience,
            sections: section_summaries,
            total_sections,
            metadata: SummaryMetadata {
                model: self.gateway.model_name(),
                method: self.settings.summarization.method.clone(),
                transcript_length: input.transcript_text.chars().count(),
                consolidated: false,
            },
            error: None,
            cached: false,
            cached_at: None,
        };

        let mut summary = if self.settings.summarization.consolidation_enabled {
            info!(stage = %Stage::Consolidating, "Running consolidation pass");
            self.consolidator.consolidate(summary).await
        } else {
            summary
        };

        summary.key_takeaways.truncate(max_takeaways);
        Ok(summary)
    }
}

/// Drop verbatim duplicates before similarity-based dedup, keeping first
/// occurrences. Comparison is case- and punctuation-insensitive so that the
/// same sentence repeated by several sections collapses without an LLM call.
fn drop_exact_duplicates(points: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut distinct = Vec::with_capacity(points.len());
    for point in points {
        let normalized: String = point
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if !normalized.is_empty() && seen.insert(normalized) {
            distinct.push(point);
        }
    }
    distinct
}
