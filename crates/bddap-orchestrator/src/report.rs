use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RunResult;

/// Everything a batch produced, ready to hand to a scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<RunResult>,
}

impl RunReport {
    #[must_use]
    pub fn new(results: Vec<RunResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            results,
        }
    }

    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, RunResult::Conversation(_)))
            .count()
    }

    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, RunResult::Artifact(_)))
            .count()
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Only if serialization itself fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactResult, ConversationResult};
    use bddap_llm::Message;
    use bddap_spec::{Feature, FeatureCategory};

    #[test]
    fn test_report_json_shape() {
        let report = RunReport::new(vec![
            RunResult::Conversation(ConversationResult {
                conversation_id: "c-1".to_string(),
                matched_feature: Feature::new("Chat", FeatureCategory::Conversation),
                transcript: vec![Message::human("hi"), Message::assistant("hello")],
                prompts_encountered: Vec::new(),
            }),
            RunResult::Artifact(ArtifactResult {
                artifact_id: "a-1".to_string(),
                matched_feature: Feature::new("Poem", FeatureCategory::Artifact),
                result: "roses are red".to_string(),
                prompts_encountered: Vec::new(),
            }),
        ]);

        assert_eq!(report.conversation_count(), 1);
        assert_eq!(report.artifact_count(), 1);

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["results"][0]["kind"], "conversation");
        assert_eq!(json["results"][0]["transcript"][0]["role"], "human");
        assert_eq!(json["results"][0]["matched_feature"]["category"], "Conversation");
        assert_eq!(json["results"][1]["kind"], "artifact");
    }
}
