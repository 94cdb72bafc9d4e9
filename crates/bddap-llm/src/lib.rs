//! Chat backend abstraction
//!
//! Everything that talks to a language model goes through the [`LlmBackend`]
//! trait, so the simulator and generator never know which provider answers.
//! [`from_config`] builds the OpenAI-compatible HTTP backend for either the
//! public OpenAI API or an Azure OpenAI deployment.

pub(crate) mod http_client;
mod openai_backend;
mod types;

pub use bddap_utils::error::LlmError;
pub use openai_backend::{Endpoint, OpenAiBackend};
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use bddap_config::{Config, ConfigError, LlmConfig, PROVIDER_AZURE_OPENAI, PROVIDER_OPENAI};
use openai_backend::{DEFAULT_AZURE_API_VERSION, DEFAULT_OPENAI_URL};
use tracing::debug;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL_NAME: &str = "OPENAI_MODEL_NAME";
pub const ENV_AZURE_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_AZURE_MODEL_NAME: &str = "AZURE_OPENAI_MODEL_NAME";
pub const ENV_AZURE_INSTANCE_NAME: &str = "AZURE_OPENAI_INSTANCE_NAME";
pub const ENV_AZURE_DEPLOYMENT_NAME: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const ENV_AZURE_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";

/// Everything needed to construct an [`OpenAiBackend`], resolved from
/// configuration and the environment.
#[derive(Clone, PartialEq)]
pub struct BackendSpec {
    pub endpoint: Endpoint,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl std::fmt::Debug for BackendSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSpec")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Resolve a [`BackendSpec`] from `[llm]` configuration, falling back to
/// `env` for anything the file leaves unset.
///
/// With no explicit provider, Azure OpenAI is chosen iff
/// `AZURE_OPENAI_API_KEY` is present.
///
/// # Errors
///
/// Returns `ConfigError::MissingRequired` when the API key, the model or an
/// Azure instance/deployment cannot be found, and
/// `ConfigError::InvalidValue` for an unknown provider.
pub fn resolve_backend_spec<F>(llm: &LlmConfig, env: F) -> Result<BackendSpec, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    let provider = match llm.provider.as_deref() {
        Some(provider) => provider.to_string(),
        None if lookup(ENV_AZURE_API_KEY).is_some() => PROVIDER_AZURE_OPENAI.to_string(),
        None => PROVIDER_OPENAI.to_string(),
    };

    let temperature = llm.variability.unwrap_or(0.0);

    match provider.as_str() {
        PROVIDER_OPENAI => {
            let key_env = llm.api_key_env.as_deref().unwrap_or(ENV_OPENAI_API_KEY);
            let api_key = lookup(key_env).ok_or_else(|| {
                ConfigError::MissingRequired(format!("API key (environment variable {key_env})"))
            })?;
            let model = llm
                .model
                .clone()
                .or_else(|| lookup(ENV_OPENAI_MODEL_NAME))
                .ok_or_else(|| {
                    ConfigError::MissingRequired(format!(
                        "llm.model (or {ENV_OPENAI_MODEL_NAME})"
                    ))
                })?;

            Ok(BackendSpec {
                endpoint: Endpoint::OpenAi {
                    base_url: llm
                        .base_url
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
                },
                api_key,
                model,
                temperature,
                max_tokens: llm.max_tokens,
            })
        }
        PROVIDER_AZURE_OPENAI => {
            let azure = llm.azure.clone().unwrap_or_default();
            let key_env = llm.api_key_env.as_deref().unwrap_or(ENV_AZURE_API_KEY);
            let api_key = lookup(key_env).ok_or_else(|| {
                ConfigError::MissingRequired(format!("API key (environment variable {key_env})"))
            })?;
            let model = llm
                .model
                .clone()
                .or_else(|| lookup(ENV_AZURE_MODEL_NAME))
                .ok_or_else(|| {
                    ConfigError::MissingRequired(format!("llm.model (or {ENV_AZURE_MODEL_NAME})"))
                })?;
            let instance = azure
                .instance
                .or_else(|| lookup(ENV_AZURE_INSTANCE_NAME))
                .ok_or_else(|| {
                    ConfigError::MissingRequired(format!(
                        "llm.azure.instance (or {ENV_AZURE_INSTANCE_NAME})"
                    ))
                })?;
            let deployment = azure
                .deployment
                .or_else(|| lookup(ENV_AZURE_DEPLOYMENT_NAME))
                .ok_or_else(|| {
                    ConfigError::MissingRequired(format!(
                        "llm.azure.deployment (or {ENV_AZURE_DEPLOYMENT_NAME})"
                    ))
                })?;
            let api_version = azure
                .api_version
                .or_else(|| lookup(ENV_AZURE_API_VERSION))
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());

            Ok(BackendSpec {
                endpoint: Endpoint::Azure {
                    instance,
                    deployment,
                    api_version,
                },
                api_key,
                model,
                temperature,
                max_tokens: llm.max_tokens,
            })
        }
        unknown => Err(ConfigError::InvalidValue {
            key: "llm.provider".to_string(),
            value: format!(
                "'{unknown}' (supported: {PROVIDER_OPENAI}, {PROVIDER_AZURE_OPENAI})"
            ),
        }),
    }
}

/// Construct a backend from a resolved spec.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the HTTP client cannot be built.
pub fn from_spec(spec: BackendSpec) -> Result<Box<dyn LlmBackend>, ConfigError> {
    debug!(
        provider = spec.endpoint.provider(),
        model = %spec.model,
        temperature = spec.temperature,
        "Constructing chat backend"
    );
    let backend = OpenAiBackend::new(
        spec.endpoint,
        spec.api_key,
        spec.model,
        spec.temperature,
        spec.max_tokens,
    )
    .map_err(|reason| ConfigError::InvalidValue {
        key: "llm".to_string(),
        value: reason,
    })?;
    Ok(Box::new(backend))
}

/// Create a chat backend from configuration and the process environment.
///
/// # Errors
///
/// Returns `ConfigError` when required backend configuration is missing.
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, ConfigError> {
    let spec = resolve_backend_spec(&config.llm, |key| std::env::var(key).ok())?;
    from_spec(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bddap_config::AzureConfig;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_openai_from_environment() {
        let spec = resolve_backend_spec(
            &LlmConfig::default(),
            env_of(&[(ENV_OPENAI_API_KEY, "sk-test"), (ENV_OPENAI_MODEL_NAME, "gpt-4o")]),
        )
        .unwrap();

        assert_eq!(
            spec.endpoint,
            Endpoint::OpenAi {
                base_url: DEFAULT_OPENAI_URL.to_string()
            }
        );
        assert_eq!(spec.api_key, "sk-test");
        assert_eq!(spec.model, "gpt-4o");
        assert_eq!(spec.temperature, 0.0);
    }

    #[test]
    fn test_azure_chosen_when_azure_key_present() {
        let spec = resolve_backend_spec(
            &LlmConfig::default(),
            env_of(&[
                (ENV_OPENAI_API_KEY, "sk-ignored"),
                (ENV_AZURE_API_KEY, "azure-key"),
                (ENV_AZURE_MODEL_NAME, "gpt-35"),
                (ENV_AZURE_INSTANCE_NAME, "acme"),
                (ENV_AZURE_DEPLOYMENT_NAME, "chat"),
            ]),
        )
        .unwrap();

        assert_eq!(
            spec.endpoint,
            Endpoint::Azure {
                instance: "acme".to_string(),
                deployment: "chat".to_string(),
                api_version: "2023-05-15".to_string(),
            }
        );
        assert_eq!(spec.api_key, "azure-key");
    }

    #[test]
    fn test_config_file_values_win_over_environment() {
        let llm = LlmConfig {
            provider: Some(PROVIDER_AZURE_OPENAI.to_string()),
            model: Some("file-model".to_string()),
            variability: Some(0.4),
            api_key_env: Some("MY_KEY".to_string()),
            azure: Some(AzureConfig {
                instance: Some("file-instance".to_string()),
                deployment: Some("file-deployment".to_string()),
                api_version: Some("2024-02-01".to_string()),
            }),
            ..LlmConfig::default()
        };
        let spec = resolve_backend_spec(
            &llm,
            env_of(&[
                ("MY_KEY", "custom"),
                (ENV_AZURE_MODEL_NAME, "env-model"),
                (ENV_AZURE_INSTANCE_NAME, "env-instance"),
            ]),
        )
        .unwrap();

        assert_eq!(spec.api_key, "custom");
        assert_eq!(spec.model, "file-model");
        assert_eq!(spec.temperature, 0.4);
        assert_eq!(
            spec.endpoint,
            Endpoint::Azure {
                instance: "file-instance".to_string(),
                deployment: "file-deployment".to_string(),
                api_version: "2024-02-01".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let result = resolve_backend_spec(
            &LlmConfig::default(),
            env_of(&[(ENV_OPENAI_MODEL_NAME, "gpt-4o")]),
        );
        match result {
            Err(ConfigError::MissingRequired(what)) => assert!(what.contains(ENV_OPENAI_API_KEY)),
            other => panic!("Expected MissingRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_model_is_config_error() {
        let result =
            resolve_backend_spec(&LlmConfig::default(), env_of(&[(ENV_OPENAI_API_KEY, "sk")]));
        assert!(matches!(result, Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_blank_env_values_count_as_missing() {
        let result = resolve_backend_spec(
            &LlmConfig::default(),
            env_of(&[(ENV_OPENAI_API_KEY, "  "), (ENV_OPENAI_MODEL_NAME, "gpt-4o")]),
        );
        assert!(matches!(result, Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_azure_requires_deployment() {
        let result = resolve_backend_spec(
            &LlmConfig::default(),
            env_of(&[
                (ENV_AZURE_API_KEY, "azure-key"),
                (ENV_AZURE_MODEL_NAME, "gpt-35"),
                (ENV_AZURE_INSTANCE_NAME, "acme"),
            ]),
        );
        match result {
            Err(ConfigError::MissingRequired(what)) => assert!(what.contains("deployment")),
            other => panic!("Expected MissingRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let llm = LlmConfig {
            provider: Some("claude-cli".to_string()),
            ..LlmConfig::default()
        };
        assert!(matches!(
            resolve_backend_spec(&llm, env_of(&[])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_spec_debug_redacts_key() {
        let spec = resolve_backend_spec(
            &LlmConfig::default(),
            env_of(&[(ENV_OPENAI_API_KEY, "sk-secret"), (ENV_OPENAI_MODEL_NAME, "m")]),
        )
        .unwrap();
        assert!(!format!("{spec:?}").contains("sk-secret"));
    }

    #[test]
    fn test_from_spec_builds_backend() {
        let spec = BackendSpec {
            endpoint: Endpoint::OpenAi {
                base_url: DEFAULT_OPENAI_URL.to_string(),
            },
            api_key: "k".to_string(),
            model: "m".to_string(),
            temperature: 0.0,
            max_tokens: None,
        };
        assert!(from_spec(spec).is_ok());
    }
}
