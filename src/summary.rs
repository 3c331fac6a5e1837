//! Data model for the summarization pipeline.
//!
//! These types flow between pipeline stages and form the externally visible
//! summary artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of content being summarized. Only affects prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Generic,
    Meeting,
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "video" | "podcast" => Ok(ContentKind::Generic),
            "meeting" => Ok(ContentKind::Meeting),
            _ => Err(format!("Unknown content kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Generic => write!(f, "generic"),
            ContentKind::Meeting => write!(f, "meeting"),
        }
    }
}

/// Immutable input to one summarization run. Owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptInput {
    /// Identifier of the content being summarized; part of the cache key.
    pub content_id: String,
    /// Identity of the requesting caller; part of the cache key.
    /// `None` is normalized to an empty segment for single-tenant hosts.
    #[serde(default)]
    pub caller_id: Option<String>,
    /// Title of the content.
    pub title: String,
    /// The full transcript text.
    pub transcript_text: String,
    /// Content kind; meeting inputs get subject/date/participants in prompts.
    #[serde(default)]
    pub content_kind: ContentKind,
    /// Kind-specific attributes used only to enrich prompts, never parsed.
    #[serde(default)]
    pub context_fields: HashMap<String, String>,
}

impl TranscriptInput {
    /// Create a generic transcript input.
    pub fn new(content_id: &str, title: &str, transcript_text: &str) -> Self {
        Self {
            content_id: content_id.to_string(),
            caller_id: None,
            title: title.to_string(),
            transcript_text: transcript_text.to_string(),
            content_kind: ContentKind::Generic,
            context_fields: HashMap::new(),
        }
    }

    /// Set the caller identity used in the cache key.
    pub fn with_caller(mut self, caller_id: &str) -> Self {
        self.caller_id = Some(caller_id.to_string());
        self
    }

    /// Set the content kind.
    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.content_kind = kind;
        self
    }

    /// Add a context field (e.g. meeting subject or participant list).
    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context_fields.insert(key.to_string(), value.to_string());
        self
    }

    /// Render the context fields as a prompt block. Meeting inputs are
    /// labeled as such; fields are emitted in a stable order.
    pub fn context_block(&self) -> String {
        if self.context_fields.is_empty() && self.content_kind == ContentKind::Generic {
            return String::new();
        }

        let mut out = String::new();
        if self.content_kind == ContentKind::Meeting {
            out.push_str("This is a meeting transcript.\n");
        }

        let mut keys: Vec<&String> = self.context_fields.keys().collect();
        keys.sort();
        for key in keys {
            out.push_str(&format!("{}: {}\n", key, self.context_fields[key]));
        }
        out
    }
}

/// A topic-bounded segment of the transcript, as proposed by the segmenter.
///
/// `start_marker`/`end_marker` are opaque position hints (timestamp strings
/// or offsets). The pipeline passes them through verbatim and never computes
/// with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSection {
    pub title: String,
    #[serde(default)]
    pub start_marker: String,
    #[serde(default)]
    pub end_marker: String,
    #[serde(default)]
    pub description: String,
}

/// The summary produced for one topic section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    pub title: String,
    /// Position hint carried over from the section's start marker.
    pub timestamp: String,
    pub description: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub entities: Vec<String>,
}

/// One entry of the running digest: what a prior section already covered.
#[derive(Debug, Clone)]
pub struct DigestEntry {
    pub title: String,
    pub key_points: Vec<String>,
}

/// Append-only digest of previously summarized sections.
///
/// Carried across section summarizer invocations within a single run so that
/// section N knows what sections 1..N-1 already said. Discarded afterward.
#[derive(Debug, Clone, Default)]
pub struct RunningDigest {
    entries: Vec<DigestEntry>,
}

impl RunningDigest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summarized section's title and key points.
    pub fn push(&mut self, section: &SectionSummary) {
        self.entries.push(DigestEntry {
            title: section.title.clone(),
            key_points: section.key_points.clone(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Render the digest as a compact prompt block: titles and key points
    /// only, not full summaries, to keep prompt size bounded.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("Section: {}\n", entry.title));
            for point in &entry.key_points {
                out.push_str(&format!("- {}\n", point));
            }
        }
        out
    }
}

/// Generation metadata attached to a structured summary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SummaryMetadata {
    /// Model that produced the summary.
    pub model: String,
    /// Summarization method label.
    pub method: String,
    /// Length of the input transcript in characters.
    pub transcript_length: usize,
    /// Whether the consolidation pass succeeded.
    #[serde(default)]
    pub consolidated: bool,
}

/// The externally visible summary artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredSummary {
    pub success: bool,
    pub title: String,
    pub executive_summary: String,
    pub key_takeaways: Vec<String>,
    pub target_audience: String,
    pub sections: Vec<SectionSummary>,
    pub total_sections: usize,
    pub metadata: SummaryMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether this result was served from the cache. Set only by the
    /// orchestrator, never by LLM-calling stages.
    #[serde(default)]
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

impl StructuredSummary {
    /// Build the failure artifact returned when generation fails hard.
    /// No partial summary content is carried.
    pub fn failure(title: &str, error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            title: title.to_string(),
            executive_summary: String::new(),
            key_takeaways: Vec::new(),
            target_audience: String::new(),
            sections: Vec::new(),
            total_sections: 0,
            metadata: SummaryMetadata::default(),
            error: Some(error.to_string()),
            cached: false,
            cached_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_parse() {
        assert_eq!("meeting".parse::<ContentKind>().unwrap(), ContentKind::Meeting);
        assert_eq!("generic".parse::<ContentKind>().unwrap(), ContentKind::Generic);
        assert!("webinar2".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_digest_render() {
        let mut digest = RunningDigest::new();
        assert!(digest.is_empty());

        digest.push(&SectionSummary {
            title: "Risk Management".to_string(),
            timestamp: "00:00".to_string(),
            description: String::new(),
            summary: "Full summary text that must not appear in the digest".to_string(),
            key_points: vec!["Always size positions".to_string()],
            entities: vec![],
        });

        let rendered = digest.render();
        assert!(rendered.contains("Section: Risk Management"));
        assert!(rendered.contains("- Always size positions"));
        assert!(!rendered.contains("Full summary text"));
    }

    #[test]
    fn test_failure_summary() {
        let summary = StructuredSummary::failure("My Video", "boom");
        assert!(!summary.success);
        assert_eq!(summary.error.as_deref(), Some("boom"));
        assert!(summary.sections.is_empty());
        assert_eq!(summary.total_sections, 0);
    }
}
