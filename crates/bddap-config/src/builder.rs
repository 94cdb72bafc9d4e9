use std::time::Duration;

use crate::{Config, ConfigError, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding bddap in an application's test suite, where the
    /// run must not depend on the user's environment or config files.
    ///
    /// ```rust
    /// use bddap_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .conversations_per_persona(2)
    ///     .user_messages_per_simulated_conversation(3)
    ///     .call_timeout(Duration::from_secs(60))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.settings().conversations_per_persona, 2);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    fn mark(&mut self, key: &str) {
        self.config
            .source_attribution
            .insert(key.to_string(), ConfigSource::Programmatic);
    }

    #[must_use]
    pub fn conversations_per_persona(mut self, count: u32) -> Self {
        self.config.autoprompter.conversations_per_persona = Some(count);
        self.mark("conversations_per_persona");
        self
    }

    #[must_use]
    pub fn user_messages_per_simulated_conversation(mut self, count: u32) -> Self {
        self.config
            .autoprompter
            .user_messages_per_simulated_conversation = Some(count);
        self.mark("user_messages_per_simulated_conversation");
        self
    }

    #[must_use]
    pub fn artifact_variability_generation(mut self, count: u32) -> Self {
        self.config.autoprompter.artifact_variability_generation = Some(count);
        self.mark("artifact_variability_generation");
        self
    }

    /// Number of conversation runs or artifact inputs in flight at once.
    /// `1` keeps the pipeline strictly sequential.
    #[must_use]
    pub fn max_concurrency(mut self, limit: u32) -> Self {
        self.config.autoprompter.max_concurrency = Some(limit);
        self.mark("max_concurrency");
        self
    }

    /// Per-call timeout for backend and callback invocations (whole seconds).
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.autoprompter.call_timeout_secs = Some(timeout.as_secs());
        self.mark("call_timeout_secs");
        self
    }

    #[must_use]
    pub fn llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.config.llm.provider = Some(provider.into());
        self.mark("llm.provider");
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.llm.model = Some(model.into());
        self.mark("llm.model");
        self
    }

    /// Temperature of the auto-prompter's own backend, in [0, 1].
    #[must_use]
    pub fn variability(mut self, variability: f64) -> Self {
        self.config.llm.variability = Some(variability);
        self.mark("llm.variability");
        self
    }

    #[must_use]
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.config.llm.api_key_env = Some(var.into());
        self.mark("llm.api_key_env");
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.llm.base_url = Some(url.into());
        self.mark("llm.base_url");
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a value is out of range.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
