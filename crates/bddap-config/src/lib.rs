//! Configuration for bddap.
//!
//! Precedence: CLI arguments > `.bddap/config.toml` > built-in defaults.
//! Every resolved value records where it came from in
//! [`Config::source_attribution`].
//!
//! ```toml
//! [autoprompter]
//! conversations_per_persona = 5
//! user_messages_per_simulated_conversation = 5
//! max_concurrency = 1
//! call_timeout_secs = 120
//!
//! [llm]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! variability = 0.0
//! ```

mod builder;
mod discovery;
mod model;
mod settings;
mod validation;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub use bddap_utils::error::ConfigError;
pub use builder::ConfigBuilder;
pub use model::{
    AutoPrompterConfig, AzureConfig, LlmConfig, PROVIDER_AZURE_OPENAI, PROVIDER_OPENAI,
    SUPPORTED_PROVIDERS,
};
pub use settings::Settings;

/// Name of the state directory searched for upward from the working directory
pub const CONFIG_DIR: &str = ".bddap";

/// Name of the configuration file inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Defaults,
    ConfigFile(PathBuf),
    Cli,
    Programmatic,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "default"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Cli => write!(f, "cli"),
            Self::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// CLI overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub conversations_per_persona: Option<u32>,
    pub user_messages_per_simulated_conversation: Option<u32>,
    pub max_concurrency: Option<u32>,
    pub call_timeout_secs: Option<u64>,
    pub llm_provider: Option<String>,
    pub model: Option<String>,
    pub variability: Option<f64>,
}

/// Configuration for bddap operations.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Simulation and generation knobs
    pub autoprompter: AutoPrompterConfig,
    /// Chat backend configuration
    pub llm: LlmConfig,
    /// Source attribution for each setting (for `bddap config`)
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    /// Resolve the single settings value object used for a run.
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings::from_config(&self.autoprompter)
    }

    /// Source of a setting, `Defaults` when it was never set explicitly.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .cloned()
            .unwrap_or(ConfigSource::Defaults)
    }
}
