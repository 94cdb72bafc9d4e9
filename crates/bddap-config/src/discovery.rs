use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{AutoPrompterConfig, LlmConfig};
use crate::{CONFIG_DIR, CONFIG_FILE, CliArgs, Config, ConfigError, ConfigSource};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    autoprompter: Option<AutoPrompterConfig>,
    llm: Option<LlmConfig>,
}

/// Record `key` as coming from `source` when `value` is set.
macro_rules! apply {
    ($attr:expr, $source:expr, $target:expr, $value:expr, $key:literal) => {
        if let Some(v) = $value {
            $target = Some(v);
            $attr.insert($key.to_string(), $source.clone());
        }
    };
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the working directory cannot be read, an
    /// explicit config path does not exist, the file is not valid TOML, or a
    /// value fails validation.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            ConfigError::InvalidFile(format!("cannot determine current directory: {e}"))
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover configuration starting from a specific directory.
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    ///
    /// # Errors
    ///
    /// See [`Config::discover`].
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    });
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            debug!(path = %path.display(), "Loading configuration file");
            let file_config = Self::load_config_file(path)?;
            let source = ConfigSource::ConfigFile(path.clone());
            let attr = &mut config.source_attribution;

            if let Some(ap) = file_config.autoprompter {
                let target = &mut config.autoprompter;
                apply!(attr, source, target.conversations_per_persona, ap.conversations_per_persona, "conversations_per_persona");
                apply!(attr, source, target.user_messages_per_simulated_conversation, ap.user_messages_per_simulated_conversation, "user_messages_per_simulated_conversation");
                apply!(attr, source, target.max_artifacts_after_dimensionality_reduction, ap.max_artifacts_after_dimensionality_reduction, "max_artifacts_after_dimensionality_reduction");
                apply!(attr, source, target.artifact_variability_generation, ap.artifact_variability_generation, "artifact_variability_generation");
                apply!(attr, source, target.max_concurrency, ap.max_concurrency, "max_concurrency");
                apply!(attr, source, target.call_timeout_secs, ap.call_timeout_secs, "call_timeout_secs");
            }

            if let Some(llm) = file_config.llm {
                let target = &mut config.llm;
                apply!(attr, source, target.provider, llm.provider, "llm.provider");
                apply!(attr, source, target.model, llm.model, "llm.model");
                apply!(attr, source, target.variability, llm.variability, "llm.variability");
                apply!(attr, source, target.max_tokens, llm.max_tokens, "llm.max_tokens");
                apply!(attr, source, target.base_url, llm.base_url, "llm.base_url");
                apply!(attr, source, target.api_key_env, llm.api_key_env, "llm.api_key_env");
                apply!(attr, source, target.azure, llm.azure, "llm.azure");
            }
        }

        let cli = ConfigSource::Cli;
        let attr = &mut config.source_attribution;
        let ap = &mut config.autoprompter;
        apply!(attr, cli, ap.conversations_per_persona, cli_args.conversations_per_persona, "conversations_per_persona");
        apply!(attr, cli, ap.user_messages_per_simulated_conversation, cli_args.user_messages_per_simulated_conversation, "user_messages_per_simulated_conversation");
        apply!(attr, cli, ap.max_concurrency, cli_args.max_concurrency, "max_concurrency");
        apply!(attr, cli, ap.call_timeout_secs, cli_args.call_timeout_secs, "call_timeout_secs");
        let llm = &mut config.llm;
        apply!(attr, cli, llm.provider, cli_args.llm_provider.clone(), "llm.provider");
        apply!(attr, cli, llm.model, cli_args.model.clone(), "llm.model");
        apply!(attr, cli, llm.variability, cli_args.variability, "llm.variability");

        config.validate()?;
        Ok(config)
    }

    /// Search upward from `start_dir` for `.bddap/config.toml`.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
    }
}
