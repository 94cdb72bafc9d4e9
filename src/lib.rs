//! bddap - behaviour-driven auto-prompting for LLM-backed chat applications
//!
//! bddap reads `.feature` files describing how an application should behave,
//! then drives the application through simulated persona conversations and
//! artifact generation so the outputs can be scored against those features.
//!
//! bddap can be used in two ways:
//! - **Library**: embed the [`AutoPrompter`] in the application's own test
//!   harness and run [`InteractionFlow`]s through [`run_flows`]
//! - **CLI**: inspect specifications and resolved configuration with `bddap`
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bddap::{
//!     AutoPrompter, AutoPrompterParams, ConversationDescriptor, Persona, SendMessageFn,
//!     SpecSource,
//! };
//!
//! # async fn demo() -> Result<(), bddap::BddapError> {
//! let params =
//!     AutoPrompterParams::new("A poetry assistant", SpecSource::from_path("bddap/specs"));
//! let prompter = AutoPrompter::initialise(params)?;
//!
//! let descriptor = ConversationDescriptor::new(
//!     "Poem Generation",
//!     "Writes short poems on request",
//!     vec![Persona::positive("a student")],
//!     Arc::new(SendMessageFn(|_id: String, text: String| async move {
//!         Ok::<_, anyhow::Error>(format!("A poem about {text}"))
//!     })),
//! );
//! let conversations = prompter.simulate_conversations(&descriptor).await?;
//! # let _ = conversations;
//! # Ok(())
//! # }
//! ```
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Summarise every .feature file in a directory
//! bddap parse bddap/specs
//!
//! # Show resolved settings and where each came from
//! bddap config --json
//! ```
//!
//! Internal modules are accessible via module paths but are marked `#[doc(hidden)]`
//! and are not covered by semver stability guarantees.

// ============================================================================
// Stable Public API
// ============================================================================

/// Facade over specification parsing, settings and the chat backend.
///
/// Build one with [`AutoPrompter::initialise`] (backend from configuration and
/// environment) or [`AutoPrompter::with_backend`] (caller-supplied backend).
pub use bddap_orchestrator::{AutoPrompter, AutoPrompterParams, KeyTerm};

/// Descriptors, callbacks and results of simulation and generation.
pub use bddap_orchestrator::{
    ArtifactDescriptor, ArtifactResult, ConversationDescriptor, ConversationResult, GetArtifact,
    GetArtifactFn, Persona, RunResult, SendMessage, SendMessageFn, into_run_results,
};

/// Ordered batches of interaction flows.
pub use bddap_orchestrator::{FlowOrchestrator, InteractionFlow, RunReport, run_flows};

/// Prompt registry: call [`get_prompt`] wherever the application builds a
/// prompt and it is recorded against the run currently in progress.
pub use bddap_orchestrator::{PromptParams, get_prompt};

/// In-memory conversation history keyed by conversation id.
pub use bddap_orchestrator::{ConversationStore, StoreError};

/// Lower-level drivers used by [`AutoPrompter`].
pub use bddap_orchestrator::{ArtifactGenerator, ConversationSimulator};

/// Parsed specification model and lookup.
pub use bddap_spec::{
    Feature, FeatureCategory, Scenario, SpecSource, Specification, ValidationResult,
    find_feature, parse_str,
};

/// Configuration for bddap operations.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
pub use bddap_config::{CliArgs, Config, ConfigBuilder, Settings};

/// Chat backend abstraction and the message model shared with applications.
pub use bddap_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult, Message, Role};

/// Library-level error type with rich context.
///
/// Library code returns `BddapError` and does NOT call `std::process::exit()`.
pub use bddap_utils::error::{BddapError, ErrorCategory, UserFriendlyError};

/// Exit codes matching the documented exit code table.
pub use bddap_utils::exit_codes::ExitCode;

/// Cooperative cancellation shared by every run of a batch.
pub use bddap_utils::cancel::CancellationToken;

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub mod cli;

#[doc(hidden)]
pub use bddap_utils::{error, exit_codes, logging, redaction};

#[doc(hidden)]
pub use bddap_config as config;

#[doc(hidden)]
pub use bddap_llm as llm;

#[doc(hidden)]
pub use bddap_spec as spec;
