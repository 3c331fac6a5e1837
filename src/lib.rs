//! Tett - Structured Transcript Summarization
//!
//! A multi-stage LLM pipeline that turns long-form spoken-content
//! transcripts (videos, meetings, podcasts) into dense, non-redundant
//! multi-section summaries.
//!
//! The name "Tett" comes from the Norwegian word for "dense."
//!
//! # Overview
//!
//! Given a transcript, Tett produces:
//! - Topic-bounded sections with approximate position hints
//! - A dense chain-of-density summary per section
//! - A top-level executive summary and target-audience line
//! - A deduplicated, bounded list of key takeaways
//!
//! Redundancy is suppressed at three points: each section is summarized
//! against a digest of what earlier sections already covered, near-duplicate
//! key points are merged, and a final consolidation pass removes residual
//! cross-section repetition.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `gateway` - LLM invocation with primary/fallback providers
//! - `segmenter` - Topic segmentation
//! - `section` - Per-section chain-of-density summarization
//! - `executive` - Executive summary synthesis
//! - `dedup` - Key-point deduplication
//! - `consolidate` - Final whole-document consolidation pass
//! - `cache` - Summary cache abstraction
//! - `pipeline` - Stage orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use tett::config::Settings;
//! use tett::pipeline::SummaryPipeline;
//! use tett::summary::TranscriptInput;
//!
//! #[tokio::main]
//! async fn main() -> tett::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = SummaryPipeline::new(settings)?;
//!
//!     let input = TranscriptInput::new("vid-1", "Trading 101", "transcript text...");
//!     let summary = pipeline.generate_summary(&input, false).await;
//!     println!("{} sections, cached: {}", summary.total_sections, summary.cached);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod consolidate;
pub mod dedup;
pub mod error;
pub mod executive;
pub mod gateway;
pub mod logging;
pub mod openai;
pub mod pipeline;
pub mod section;
pub mod segmenter;
pub mod summary;

pub use error::{Result, TettError};
pub use pipeline::SummaryPipeline;
pub use summary::{StructuredSummary, TranscriptInput};
