use std::time::Duration;

use serde::Serialize;

use crate::model::AutoPrompterConfig;

pub const DEFAULT_CONVERSATIONS_PER_PERSONA: usize = 5;
pub const DEFAULT_USER_MESSAGES_PER_CONVERSATION: usize = 5;
pub const DEFAULT_MAX_ARTIFACTS_AFTER_REDUCTION: usize = 5;
pub const DEFAULT_ARTIFACT_VARIABILITY_GENERATION: usize = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 1;

/// Resolved run settings.
///
/// Defaults are applied exactly once, here; simulation and generation code
/// never looks at the optional file values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub conversations_per_persona: usize,
    pub user_messages_per_simulated_conversation: usize,
    pub max_artifacts_after_dimensionality_reduction: usize,
    pub artifact_variability_generation: usize,
    pub max_concurrency: usize,
    #[serde(with = "optional_secs")]
    pub call_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            conversations_per_persona: DEFAULT_CONVERSATIONS_PER_PERSONA,
            user_messages_per_simulated_conversation: DEFAULT_USER_MESSAGES_PER_CONVERSATION,
            max_artifacts_after_dimensionality_reduction: DEFAULT_MAX_ARTIFACTS_AFTER_REDUCTION,
            artifact_variability_generation: DEFAULT_ARTIFACT_VARIABILITY_GENERATION,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout: None,
        }
    }
}

impl Settings {
    pub(crate) fn from_config(config: &AutoPrompterConfig) -> Self {
        let defaults = Self::default();
        Self {
            conversations_per_persona: config
                .conversations_per_persona
                .map_or(defaults.conversations_per_persona, |v| v as usize),
            user_messages_per_simulated_conversation: config
                .user_messages_per_simulated_conversation
                .map_or(defaults.user_messages_per_simulated_conversation, |v| {
                    v as usize
                }),
            max_artifacts_after_dimensionality_reduction: config
                .max_artifacts_after_dimensionality_reduction
                .map_or(defaults.max_artifacts_after_dimensionality_reduction, |v| {
                    v as usize
                }),
            artifact_variability_generation: config
                .artifact_variability_generation
                .map_or(defaults.artifact_variability_generation, |v| v as usize),
            max_concurrency: config
                .max_concurrency
                .map_or(defaults.max_concurrency, |v| (v as usize).max(1)),
            call_timeout: config.call_timeout_secs.map(Duration::from_secs),
        }
    }

    /// How many artifacts to generate for an artifact of the given
    /// variability: `round(variability * artifact_variability_generation)`,
    /// at least one. Variability is clamped to [0, 1].
    #[must_use]
    pub fn artifact_count_for(&self, variability: f64) -> usize {
        let variability = if variability.is_finite() {
            variability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let count = (variability * self.artifact_variability_generation as f64).round() as usize;
        count.max(1)
    }

    /// Total conversations a simulation with `personas` personas will emit.
    #[must_use]
    pub fn expected_conversations(&self, personas: usize) -> usize {
        personas * self.conversations_per_persona
    }
}

mod optional_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }
}
