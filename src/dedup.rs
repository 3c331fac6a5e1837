//! Similarity-based key-point deduplication.
//!
//! Collapses near-duplicate key points accumulated across sections into a
//! bounded, maximally diverse set. Short lists skip the LLM entirely.

use crate::config::Prompts;
use crate::error::{Result, TettError};
use crate::gateway::LlmGateway;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default cap on the number of retained points.
pub const DEFAULT_MAX_POINTS: usize = 8;

/// Key-point deduplicator.
pub struct KeyPointDeduplicator {
    gateway: Arc<dyn LlmGateway>,
    prompts: Prompts,
}

#[derive(Debug, Deserialize)]
struct DedupResponse {
    points: Vec<String>,
}

impl KeyPointDeduplicator {
    pub fn new(gateway: Arc<dyn LlmGateway>, prompts: Prompts) -> Self {
        Self { gateway, prompts }
    }

    /// Merge near-duplicate points into at most `max_points` distinct ones.
    ///
    /// Lists already within the bound are returned unchanged with no LLM
    /// call. The bound is also enforced code-side after the merge in case
    /// the model overruns it.
    #[instrument(skip_all, fields(points = points.len(), max_points))]
    pub async fn deduplicate(&self, points: &[String], max_points: usize) -> Result<Vec<String>> {
        if points.len() <= max_points {
            debug!("Within bound, skipping dedup call");
            return Ok(points.to_vec());
        }

        let listed = points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {}", i + 1, p))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("points".to_string(), listed);
        vars.insert("max_points".to_string(), max_points.to_string());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.dedup.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.dedup.user, &vars);

        let value = self.gateway.invoke(&system, &user).await?;

        let response: DedupResponse = serde_json::from_value(value)
            .map_err(|e| TettError::malformed("dedup", e.to_string()))?;

        let mut merged = response.points;
        merged.retain(|p| !p.trim().is_empty());
        if merged.is_empty() {
            return Err(TettError::malformed("dedup", "merged point list is empty"));
        }
        merged.truncate(max_points);

        debug!("Merged {} points into {}", points.len(), merged.len());
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::MockGateway;
    use serde_json::json;

    fn points(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Point {}", i)).collect()
    }

    #[tokio::test]
    async fn test_fast_path_returns_input_unchanged_without_call() {
        let gateway = Arc::new(MockGateway::new());
        let dedup = KeyPointDeduplicator::new(gateway.clone(), Prompts::default());

        let input = points(8);
        let result = dedup.deduplicate(&input, DEFAULT_MAX_POINTS).await.unwrap();

        assert_eq!(result, input);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_path_bounds_output() {
        // 20 points across 4 repeated concepts
        let concepts = ["stop loss", "position sizing", "journaling", "patience"];
        let input: Vec<String> = (0..20)
            .map(|i| format!("Remember {} (variant {})", concepts[i % 4], i))
            .collect();

        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({
            "points": [
                "Always use a stop loss",
                "Size positions according to risk",
                "Keep a trading journal",
                "Be patient with entries"
            ]
        }));

        let dedup = KeyPointDeduplicator::new(gateway.clone(), Prompts::default());
        let result = dedup.deduplicate(&input, DEFAULT_MAX_POINTS).await.unwrap();

        assert!(result.len() <= DEFAULT_MAX_POINTS);
        for concept in ["stop loss", "position", "journal", "patient"] {
            assert!(
                result.iter().any(|p| p.to_lowercase().contains(concept)),
                "missing concept {}",
                concept
            );
        }
        assert_eq!(gateway.call_count(), 1);

        // All 20 inputs were presented to the model
        let prompt = gateway.call(0).full();
        assert!(prompt.contains("20."));
    }

    #[tokio::test]
    async fn test_model_overrun_is_truncated() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({ "points": points(12) }));

        let dedup = KeyPointDeduplicator::new(gateway, Prompts::default());
        let result = dedup.deduplicate(&points(20), DEFAULT_MAX_POINTS).await.unwrap();
        assert_eq!(result.len(), DEFAULT_MAX_POINTS);
    }

    #[tokio::test]
    async fn test_empty_merge_is_malformed() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_ok(json!({ "points": [] }));

        let dedup = KeyPointDeduplicator::new(gateway, Prompts::default());
        let err = dedup.deduplicate(&points(10), 4).await.unwrap_err();
        assert!(matches!(
            err,
            TettError::MalformedResponse { stage: "dedup", .. }
        ));
    }
}
