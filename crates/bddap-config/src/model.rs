use serde::{Deserialize, Serialize};

/// OpenAI chat completions API
pub const PROVIDER_OPENAI: &str = "openai";

/// Azure OpenAI deployment
pub const PROVIDER_AZURE_OPENAI: &str = "azure-openai";

/// Canonical list of supported chat backend providers
pub const SUPPORTED_PROVIDERS: &[&str] = &[PROVIDER_OPENAI, PROVIDER_AZURE_OPENAI];

/// `[autoprompter]` section.
///
/// All fields are optional in the file; defaults are applied once when
/// [`Settings`](crate::Settings) is resolved.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoPrompterConfig {
    /// Simulated conversations per persona. Default: 5
    pub conversations_per_persona: Option<u32>,
    /// Human turns per simulated conversation. Default: 5
    pub user_messages_per_simulated_conversation: Option<u32>,
    /// Upper bound on artifacts kept after reduction. Advisory. Default: 5
    pub max_artifacts_after_dimensionality_reduction: Option<u32>,
    /// Artifacts to generate for an artifact of variability 1. Default: 10
    pub artifact_variability_generation: Option<u32>,
    /// Conversation runs / artifact inputs in flight at once. Default: 1
    pub max_concurrency: Option<u32>,
    /// Per-call timeout for backend and callback calls, in seconds. Default: none
    pub call_timeout_secs: Option<u64>,
}

/// `[llm]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// `openai` or `azure-openai`. Unset: Azure iff `AZURE_OPENAI_API_KEY` is exported
    pub provider: Option<String>,
    /// Model name. Falls back to `OPENAI_MODEL_NAME` / `AZURE_OPENAI_MODEL_NAME`
    pub model: Option<String>,
    /// Temperature in [0, 1] fixed at construction. Default: 0
    pub variability: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Override for the chat completions endpoint (OpenAI only)
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub azure: Option<AzureConfig>,
}

/// `[llm.azure]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AzureConfig {
    /// Falls back to `AZURE_OPENAI_INSTANCE_NAME`
    pub instance: Option<String>,
    /// Falls back to `AZURE_OPENAI_DEPLOYMENT_NAME`
    pub deployment: Option<String>,
    /// Falls back to `AZURE_OPENAI_API_VERSION`, then `2023-05-15`
    pub api_version: Option<String>,
}
