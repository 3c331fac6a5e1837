//! Configuration management.

mod prompts;
mod settings;

pub use prompts::{
    ConsolidationPrompts, DedupPrompts, ExecutivePrompts, Prompts, SectionPrompts,
    SegmentationPrompts,
};
pub use settings::{GeneralSettings, LlmSettings, PromptSettings, Settings, SummarizationSettings};
