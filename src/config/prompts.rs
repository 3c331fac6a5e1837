//! Prompt templates for the summarization pipeline.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub segmentation: SegmentationPrompts,
    pub section: SectionPrompts,
    pub executive: ExecutivePrompts,
    pub dedup: DedupPrompts,
    pub consolidation: ConsolidationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for topic segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SegmentationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a content analyst. Your task is to partition a spoken-content transcript into coherent topic segments.

When analyzing a transcript:
1. Look for natural topic transitions and subject changes
2. Group related discussion together into one segment
3. Prefer fewer, coherent segments over many fragmentary ones
4. If the transcript has no discernible topic shifts, return a single segment spanning the whole transcript

Respond with JSON only."#.to_string(),

            user: r#"Partition this transcript into coherent topic segments.

Title: {{title}}
{{context}}
Transcript:
{{transcript}}

For each segment, provide:
- "title": A brief descriptive title (3-8 words)
- "start_marker": Approximate start position (timestamp if present in the transcript, otherwise a short quote of the opening words)
- "end_marker": Approximate end position in the same format
- "description": One sentence describing what the segment covers

Respond with a JSON object of the form:
{"sections": [{"title": "...", "start_marker": "...", "end_marker": "...", "description": "..."}]}"#.to_string(),
        }
    }
}

/// Prompts for per-section chain-of-density summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPrompts {
    pub system: String,
    pub user: String,
    /// Block inserted into the user prompt for sections after the first.
    pub digest_block: String,
}

impl Default for SectionPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert summarizer producing dense, information-rich section summaries of spoken content.

Rules:
- Every sentence must carry concrete information: facts, numbers, names, decisions, recommendations
- No filler, no meta-commentary about the transcript itself
- Key points are short, self-contained statements
- Entities are proper nouns and named concepts mentioned in this section only

Respond with JSON only."#.to_string(),

            user: r#"Summarize the section "{{section_title}}" of the content titled "{{title}}".

Section focus: {{section_description}}
Approximate position: {{start_marker}} to {{end_marker}}
{{context}}{{digest}}
Transcript:
{{transcript}}

Respond with a JSON object of the form:
{"summary": "...", "key_points": ["..."], "entities": ["..."]}

Keep key_points to at most 5 short statements covering only this section."#.to_string(),

            digest_block: r#"
The following points were already captured by earlier sections. Cover ONLY information that is new relative to this list. Do not restate any of these points even if the transcript repeats them:
{{digest_entries}}
"#.to_string(),
        }
    }
}

/// Prompts for executive summary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutivePrompts {
    pub system: String,
    pub user: String,
}

impl Default for ExecutivePrompts {
    fn default() -> Self {
        Self {
            system: r#"You synthesize section summaries into a top-level executive summary.

Rules:
- Work only from the section summaries provided, never invent content
- Do not restate the same point from multiple sections; state each idea once
- The executive summary is a short narrative, not a list
- Key takeaways are the most important distinct ideas across all sections
- Target audience is one line describing who benefits most from this content

Respond with JSON only."#.to_string(),

            user: r#"Write an executive summary for "{{title}}" from these section summaries:

{{section_summaries}}

Respond with a JSON object of the form:
{"executive_summary": "...", "key_takeaways": ["..."], "target_audience": "..."}"#.to_string(),
        }
    }
}

/// Prompts for key-point deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupPrompts {
    pub system: String,
    pub user: String,
}

impl Default for DedupPrompts {
    fn default() -> Self {
        Self {
            system: r#"You merge near-duplicate key points from a multi-section summary into a bounded, maximally diverse set.

Rules:
- Identify points that are duplicates or paraphrases of each other
- Merge each duplicate cluster into ONE representative point capturing the union of meaning
- Every output point must be traceable to at least one input point; never invent new points
- Favor coverage diversity: each retained point should be maximally different from the others while the set collectively covers all distinct ideas

Respond with JSON only."#.to_string(),

            user: r#"Merge near-duplicate points from this list into at most {{max_points}} distinct points:

{{points}}

Respond with a JSON object of the form:
{"points": ["..."]}"#.to_string(),
        }
    }
}

/// Prompts for the final consolidation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ConsolidationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You polish a structured multi-section summary by removing residual cross-section repetition.

Rules:
- If two sections make the same point, keep it in exactly one place and tighten the other section's text
- Only text content may change. Never change the structure: same number of sections, same section titles, same order, same field names
- Do not add information that is not already present
- Return the complete summary, not a diff

Respond with JSON only."#.to_string(),

            user: r#"Remove any repeated ideas from this structured summary while keeping its exact shape:

{{summary_json}}

Respond with a JSON object with the same keys and the same "sections" array length and order:
{"executive_summary": "...", "key_takeaways": ["..."], "sections": [{"title": "...", "summary": "...", "key_points": ["..."]}]}"#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let segmentation_path = custom_path.join("segmentation.toml");
            if segmentation_path.exists() {
                let content = std::fs::read_to_string(&segmentation_path)?;
                prompts.segmentation = toml::from_str(&content)?;
            }

            let section_path = custom_path.join("section.toml");
            if section_path.exists() {
                let content = std::fs::read_to_string(&section_path)?;
                prompts.section = toml::from_str(&content)?;
            }

            let executive_path = custom_path.join("executive.toml");
            if executive_path.exists() {
                let content = std::fs::read_to_string(&executive_path)?;
                prompts.executive = toml::from_str(&content)?;
            }

            let dedup_path = custom_path.join("dedup.toml");
            if dedup_path.exists() {
                let content = std::fs::read_to_string(&dedup_path)?;
                prompts.dedup = toml::from_str(&content)?;
            }

            let consolidation_path = custom_path.join("consolidation.toml");
            if consolidation_path.exists() {
                let content = std::fs::read_to_string(&consolidation_path)?;
                prompts.consolidation = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.segmentation.system.is_empty());
        assert!(!prompts.section.digest_block.is_empty());
        assert!(prompts.dedup.user.contains("{{max_points}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Summarize {{title}} in {{max_points}} points.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("title".to_string(), "Trading 101".to_string());
        vars.insert("max_points".to_string(), "8".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Summarize Trading 101 in 8 points.");
    }

    #[test]
    fn test_custom_variables_overridden_by_call_site() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("title".to_string(), "From Config".to_string());

        let mut vars = std::collections::HashMap::new();
        vars.insert("title".to_string(), "From Caller".to_string());

        let result = prompts.render_with_custom("Title: {{title}}", &vars);
        assert_eq!(result, "Title: From Caller");
    }
}
