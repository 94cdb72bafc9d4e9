use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `BddapError` is the error returned by every fallible bddap operation that
/// crosses a crate boundary. It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Spec` | Specification files missing/unreadable, feature lookup misses |
/// | `Llm` | Chat backend failures (transport, auth, quota, outage) |
/// | `Callback` | Failures of caller-supplied `send_message` / `get_artifact` |
/// | `Config` | Configuration file or backend construction errors |
/// | `Timeout` | A caller-specified per-call timeout elapsed |
/// | `Cancelled` | The run was cancelled cooperatively |
/// | `BatchAborted` | A flow failed and the remaining flows were not run |
///
/// No variant is ever recovered from inside the library: the first error
/// encountered aborts the enclosing run, input, or flow batch.
#[derive(Error, Debug)]
pub enum BddapError {
    #[error("Specification error: {0}")]
    Spec(#[from] SpecError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("{operation} was cancelled")]
    Cancelled { operation: String },

    #[error("Batch aborted at step {step} of {total} (flow '{flow}', {stage}): {source}")]
    BatchAborted {
        step: usize,
        total: usize,
        flow: String,
        stage: FlowStage,
        #[source]
        source: Box<BddapError>,
    },

    #[error("Application error: {0}")]
    Application(#[from] anyhow::Error),
}

/// Stage of an interaction flow, used to pinpoint where a batch aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Setup,
    Main,
    Teardown,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Main => write!(f, "main"),
            Self::Teardown => write!(f, "teardown"),
        }
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Specification,
    Backend,
    Application,
    FileSystem,
    Execution,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Specification => write!(f, "Specification"),
            Self::Backend => write!(f, "LLM Backend"),
            Self::Application => write!(f, "Application"),
            Self::FileSystem => write!(f, "File System"),
            Self::Execution => write!(f, "Execution"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => format!("Required configuration '{key}' is missing"),
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [autoprompter] and [llm] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => Some(
                "The chat backend needs an API key and a model before any simulation can run."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .bddap/config.toml".to_string(),
                "Run 'bddap config' to see the resolved configuration".to_string(),
            ],
            Self::MissingRequired(_) => vec![
                "Export OPENAI_API_KEY and OPENAI_MODEL_NAME (or the AZURE_OPENAI_* equivalents)"
                    .to_string(),
                "Or set [llm] model and api_key_env in .bddap/config.toml".to_string(),
            ],
            Self::InvalidValue { .. } => {
                vec!["Counts must be positive and variability must lie in [0, 1]".to_string()]
            }
            Self::NotFound { .. } => {
                vec!["Pass an existing file to --config or remove the flag".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors from reading specification files and looking up features.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Specification file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read specification {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Feature '{name}' with category {category} not found in any specification")]
    FeatureNotFound { name: String, category: String },
}

impl UserFriendlyError for SpecError {
    fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { path } => format!("Cannot find specification path '{path}'"),
            Self::Read { path, reason } => format!("Cannot read specification '{path}': {reason}"),
            Self::FeatureNotFound { name, category } => {
                format!("No {category} feature named '{name}' was parsed")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::FeatureNotFound { .. } => Some(
                "Descriptors are matched to features by exact name and category tag.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FileNotFound { .. } | Self::Read { .. } => vec![
                "Point at a .feature file or a directory containing .feature files".to_string(),
            ],
            Self::FeatureNotFound { category, .. } => vec![
                format!("Tag the feature line with [{category}]"),
                "Run 'bddap parse <path>' to list the parsed feature names".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. } | Self::Read { .. } => ErrorCategory::FileSystem,
            Self::FeatureNotFound { .. } => ErrorCategory::Specification,
        }
    }
}

/// Chat backend errors
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Response could not be parsed or carried no text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::InvalidResponse(msg) => format!("LLM provider returned an unusable reply: {msg}"),
            Self::Timeout { duration } => format!("LLM invocation timed out after {duration:?}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys or credentials."
                    .to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "bddap does not retry or rate-limit; lower max_concurrency to reduce pressure."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProviderAuth(_) => vec!["Check the API key environment variable".to_string()],
            Self::ProviderQuota(_) => vec![
                "Reduce conversations_per_persona or max_concurrency".to_string(),
            ],
            Self::Timeout { .. } => vec!["Increase call_timeout_secs".to_string()],
            _ => vec!["Re-run the batch once the provider is reachable".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Backend
    }
}

/// Failure of a caller-supplied callback (`send_message` or `get_artifact`).
#[derive(Error, Debug)]
#[error("{callback} failed for {target}: {source}")]
pub struct CallbackError {
    /// Which callback failed
    pub callback: &'static str,
    /// Conversation id or artifact input index the call was made for
    pub target: String,
    #[source]
    pub source: anyhow::Error,
}

impl CallbackError {
    #[must_use]
    pub fn send_message(conversation_id: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            callback: "send_message",
            target: format!("conversation {}", conversation_id.into()),
            source,
        }
    }

    #[must_use]
    pub fn get_artifact(input_index: usize, source: anyhow::Error) -> Self {
        Self {
            callback: "get_artifact",
            target: format!("input #{input_index}"),
            source,
        }
    }
}

impl BddapError {
    /// The innermost error, looking through `BatchAborted` wrappers.
    #[must_use]
    pub fn root(&self) -> &BddapError {
        match self {
            Self::BatchAborted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get a user-friendly error message with context and actionable suggestions.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        crate::redaction::redact_secrets(&output)
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self.root() {
            Self::Config(_) => ExitCode::CONFIG,
            Self::Spec(SpecError::FeatureNotFound { .. }) => ExitCode::FEATURE_NOT_FOUND,
            Self::Spec(_) => ExitCode::SPEC_NOT_FOUND,
            Self::Llm(LlmError::Timeout { .. }) | Self::Timeout { .. } => ExitCode::TIMEOUT,
            Self::Llm(_) => ExitCode::BACKEND_FAILURE,
            Self::Callback(_) | Self::Application(_) => ExitCode::CALLBACK_FAILURE,
            Self::Cancelled { .. } => ExitCode::CANCELLED,
            Self::BatchAborted { .. } => ExitCode::INTERNAL,
        }
    }
}

impl UserFriendlyError for BddapError {
    fn user_message(&self) -> String {
        match self {
            Self::Spec(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Config(e) => e.user_message(),
            Self::BatchAborted {
                step,
                total,
                flow,
                stage,
                source,
            } => format!(
                "Interaction flow '{flow}' failed during {stage} (step {step} of {total}); \
                 the remaining flows were not run: {}",
                source.user_message()
            ),
            other => other.to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Spec(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::Config(e) => e.context(),
            Self::BatchAborted { source, .. } => source.context(),
            Self::Callback(_) => Some(
                "The application under test returned an error; the run was aborted without retry."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Spec(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Config(e) => e.suggestions(),
            Self::BatchAborted { source, .. } => source.suggestions(),
            Self::Timeout { .. } => vec!["Increase call_timeout_secs".to_string()],
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Spec(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::Config(e) => e.category(),
            Self::Callback(_) | Self::Application(_) => ErrorCategory::Application,
            Self::BatchAborted { source, .. } => source.category(),
            Self::Timeout { .. } | Self::Cancelled { .. } => ErrorCategory::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;

    fn feature_miss() -> BddapError {
        BddapError::Spec(SpecError::FeatureNotFound {
            name: "Poem Generation".to_string(),
            category: "Artifact".to_string(),
        })
    }

    #[test]
    fn test_feature_not_found_names_the_pair() {
        let message = feature_miss().to_string();
        assert!(message.contains("Poem Generation"));
        assert!(message.contains("Artifact"));
    }

    #[test]
    fn test_batch_aborted_reports_step_and_maps_to_root_exit_code() {
        let err = BddapError::BatchAborted {
            step: 2,
            total: 3,
            flow: "poems".to_string(),
            stage: FlowStage::Main,
            source: Box::new(feature_miss()),
        };

        assert!(err.to_string().contains("step 2 of 3"));
        assert!(err.to_string().contains("main"));
        assert!(matches!(err.root(), BddapError::Spec(_)));
        assert_eq!(err.to_exit_code(), ExitCode::FEATURE_NOT_FOUND);
    }

    #[test]
    fn test_unreadable_spec_is_a_file_system_error() {
        let err = BddapError::Spec(SpecError::Read {
            path: "specs/poem.feature".to_string(),
            reason: "permission denied".to_string(),
        });

        assert_eq!(err.category(), ErrorCategory::FileSystem);
        assert_eq!(err.to_exit_code(), ExitCode::SPEC_NOT_FOUND);
        assert!(err.to_string().contains("specs/poem.feature"));
    }

    #[test]
    fn test_callback_error_display() {
        let err = CallbackError::send_message("abc", anyhow::anyhow!("boom"));
        assert_eq!(
            err.to_string(),
            "send_message failed for conversation abc: boom"
        );

        let err = CallbackError::get_artifact(3, anyhow::anyhow!("nope"));
        assert_eq!(err.to_string(), "get_artifact failed for input #3: nope");
    }

    #[test]
    fn test_display_for_user_includes_suggestions() {
        let err = BddapError::Config(ConfigError::MissingRequired("llm.model".to_string()));
        let rendered = err.display_for_user();
        assert!(rendered.starts_with("Error: Required configuration 'llm.model' is missing"));
        assert!(rendered.contains("Suggestions:"));
        assert_eq!(err.to_exit_code(), ExitCode::CONFIG);
    }

    #[test]
    fn test_exit_codes_for_backend_errors() {
        let timeout = BddapError::Llm(LlmError::Timeout {
            duration: Duration::from_secs(5),
        });
        assert_eq!(timeout.to_exit_code(), ExitCode::TIMEOUT);

        let outage = BddapError::Llm(LlmError::ProviderOutage("503".to_string()));
        assert_eq!(outage.to_exit_code(), ExitCode::BACKEND_FAILURE);

        let cancelled = BddapError::Cancelled {
            operation: "flow batch".to_string(),
        };
        assert_eq!(cancelled.to_exit_code(), ExitCode::CANCELLED);
    }
}
