//! CLI argument definitions

use bddap_config::CliArgs;
use bddap_spec::FeatureCategory;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// bddap - behaviour-driven auto-prompting for LLM applications
#[derive(Parser, Debug)]
#[command(name = "bddap")]
#[command(about = "Parse feature specifications and inspect auto-prompter configuration")]
#[command(long_about = r#"
bddap drives an LLM-backed chat application through simulated persona
conversations and artifact generation, matched to features described in
.feature files. This binary inspects specifications and configuration;
simulations are run from the application's own interaction flows.

EXAMPLES:
  # Summarise every .feature file in a directory
  bddap parse bddap/specs

  # Print the parsed tree as JSON
  bddap parse poem.feature --json

  # Look up the feature a conversation descriptor will match
  bddap find --name "Poem Generation" --category conversation bddap/specs

  # Show resolved settings and where each came from
  bddap config

CONFIGURATION:
  Precedence: CLI flags > .bddap/config.toml > defaults
  The config file is discovered by searching upward from the current directory
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Simulated conversations per persona
    #[arg(long, global = true)]
    pub conversations_per_persona: Option<u32>,

    /// Human turns per simulated conversation
    #[arg(long, global = true)]
    pub user_messages: Option<u32>,

    /// Conversation runs / artifact inputs in flight at once
    #[arg(long, global = true)]
    pub max_concurrency: Option<u32>,

    /// Per-call timeout for backend and callback calls, in seconds
    #[arg(long, global = true)]
    pub call_timeout: Option<u64>,

    /// Chat backend provider: openai or azure-openai
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// Model name for the chat backend
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Backend temperature in [0, 1]
    #[arg(long, global = true)]
    pub variability: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse specification files and print what was found
    Parse {
        /// `.feature` files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print the parsed specifications as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the first feature with a given name and category
    Find {
        /// Exact feature name, without the category tag
        #[arg(long)]
        name: String,

        #[arg(long, value_enum)]
        category: CategoryArg,

        /// `.feature` files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print the feature as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration with source attribution
    Config {
        /// Print the resolved settings as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryArg {
    Conversation,
    Artifact,
    Other,
}

impl From<CategoryArg> for FeatureCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Conversation => FeatureCategory::Conversation,
            CategoryArg::Artifact => FeatureCategory::Artifact,
            CategoryArg::Other => FeatureCategory::Other,
        }
    }
}

impl Cli {
    /// Overrides for configuration discovery.
    #[must_use]
    pub fn config_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            conversations_per_persona: self.conversations_per_persona,
            user_messages_per_simulated_conversation: self.user_messages,
            max_concurrency: self.max_concurrency,
            call_timeout_secs: self.call_timeout,
            llm_provider: self.llm_provider.clone(),
            model: self.model.clone(),
            variability: self.variability,
        }
    }
}
