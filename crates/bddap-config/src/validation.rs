use crate::model::SUPPORTED_PROVIDERS;
use crate::{Config, ConfigError};

impl Config {
    /// Validate value ranges and the provider name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ap = &self.autoprompter;
        let counts = [
            ("conversations_per_persona", ap.conversations_per_persona),
            (
                "user_messages_per_simulated_conversation",
                ap.user_messages_per_simulated_conversation,
            ),
            (
                "max_artifacts_after_dimensionality_reduction",
                ap.max_artifacts_after_dimensionality_reduction,
            ),
            (
                "artifact_variability_generation",
                ap.artifact_variability_generation,
            ),
            ("max_concurrency", ap.max_concurrency),
        ];
        for (key, value) in counts {
            if value == Some(0) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: "0 (must be at least 1)".to_string(),
                });
            }
        }

        if ap.call_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "call_timeout_secs".to_string(),
                value: "0 (omit the key to disable timeouts)".to_string(),
            });
        }

        if let Some(variability) = self.llm.variability
            && !(0.0..=1.0).contains(&variability)
        {
            return Err(ConfigError::InvalidValue {
                key: "llm.variability".to_string(),
                value: format!("{variability} (must be within [0, 1])"),
            });
        }

        if let Some(provider) = self.llm.provider.as_deref()
            && !SUPPORTED_PROVIDERS.contains(&provider)
        {
            return Err(ConfigError::InvalidValue {
                key: "llm.provider".to_string(),
                value: format!(
                    "'{provider}' (supported: {})",
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            });
        }

        Ok(())
    }
}
