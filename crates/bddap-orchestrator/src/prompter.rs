//! The auto-prompter: parsed specifications, resolved settings and a chat
//! backend, ready to simulate conversations and generate artifacts.

use bddap_config::{Config, Settings};
use bddap_llm::LlmBackend;
use bddap_spec::{SpecSource, Specification};
use bddap_utils::cancel::CancellationToken;
use bddap_utils::error::BddapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::artifacts::ArtifactGenerator;
use crate::simulator::ConversationSimulator;
use crate::types::{ArtifactDescriptor, ArtifactResult, ConversationDescriptor, ConversationResult};

/// A term specific to the application and its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTerm {
    pub term: String,
    pub definition: String,
}

/// Everything needed to initialise an [`AutoPrompter`].
#[derive(Debug, Clone)]
pub struct AutoPrompterParams {
    /// High level description of the application under test
    pub application_overview: String,
    pub spec_source: SpecSource,
    /// Credentials file for the caller to load; never read here
    pub env_file: Option<PathBuf>,
    pub key_terms: Vec<KeyTerm>,
    pub config: Config,
}

impl AutoPrompterParams {
    pub fn new(application_overview: impl Into<String>, spec_source: SpecSource) -> Self {
        Self {
            application_overview: application_overview.into(),
            spec_source,
            env_file: None,
            key_terms: Vec::new(),
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_env_file(mut self, env_file: impl Into<PathBuf>) -> Self {
        self.env_file = Some(env_file.into());
        self
    }

    #[must_use]
    pub fn with_key_term(mut self, term: impl Into<String>, definition: impl Into<String>) -> Self {
        self.key_terms.push(KeyTerm {
            term: term.into(),
            definition: definition.into(),
        });
        self
    }
}

pub struct AutoPrompter {
    application_overview: String,
    key_terms: Vec<KeyTerm>,
    specifications: Vec<Specification>,
    settings: Settings,
    backend: Arc<dyn LlmBackend>,
    cancel: CancellationToken,
}

impl fmt::Debug for AutoPrompter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoPrompter")
            .field("application_overview", &self.application_overview)
            .field("specifications", &self.specifications.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AutoPrompter {
    /// Build the chat backend from `params.config` and parse the
    /// specifications.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the backend cannot be configured, `SpecError` when
    /// a specification path cannot be read.
    pub fn initialise(params: AutoPrompterParams) -> Result<Self, BddapError> {
        let backend: Arc<dyn LlmBackend> = Arc::from(bddap_llm::from_config(&params.config)?);
        Self::with_backend(params, backend)
    }

    /// Like [`AutoPrompter::initialise`] with a caller-supplied backend.
    ///
    /// # Errors
    ///
    /// `SpecError` when a specification path cannot be read.
    pub fn with_backend(
        params: AutoPrompterParams,
        backend: Arc<dyn LlmBackend>,
    ) -> Result<Self, BddapError> {
        info!(source = ?params.spec_source, "Parsing specifications");
        let specifications = params.spec_source.parse_all()?;
        let settings = params.config.settings();

        Ok(Self {
            application_overview: params.application_overview,
            key_terms: params.key_terms,
            specifications,
            settings,
            backend,
            cancel: CancellationToken::new(),
        })
    }

    /// Share a cancellation token with the caller.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn application_overview(&self) -> &str {
        &self.application_overview
    }

    #[must_use]
    pub fn key_terms(&self) -> &[KeyTerm] {
        &self.key_terms
    }

    #[must_use]
    pub fn specifications(&self) -> &[Specification] {
        &self.specifications
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// # Errors
    ///
    /// See [`ConversationSimulator::simulate`].
    pub async fn simulate_conversations(
        &self,
        descriptor: &ConversationDescriptor,
    ) -> Result<Vec<ConversationResult>, BddapError> {
        ConversationSimulator::new(self.backend.as_ref(), &self.settings, &self.cancel)
            .simulate(descriptor, &self.specifications)
            .await
    }

    /// # Errors
    ///
    /// See [`ArtifactGenerator::generate`].
    pub async fn generate_artifacts<I>(
        &self,
        descriptor: &ArtifactDescriptor<I>,
        inputs: &[I],
    ) -> Result<Vec<ArtifactResult>, BddapError>
    where
        I: Send + Sync + 'static,
    {
        ArtifactGenerator::new(&self.settings, &self.cancel)
            .generate(descriptor, &self.specifications, inputs)
            .await
    }
}
