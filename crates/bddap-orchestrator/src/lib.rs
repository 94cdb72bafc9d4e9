//! Auto-prompting orchestration
//!
//! Drives an application under test through persona-driven conversations
//! and artifact generation, matched to features parsed by `bddap-spec`, and
//! runs ordered batches of interaction flows.
//!
//! All loops are sequential by default. With `max_concurrency > 1` the
//! conversation runs and artifact inputs of one call are driven through an
//! ordered, bounded stream, so result order never depends on timing.

mod artifacts;
mod context;
mod flow;
mod prompter;
mod prompts;
mod report;
mod simulator;
mod store;
mod types;

pub use artifacts::ArtifactGenerator;
pub use flow::{FlowOrchestrator, InteractionFlow, run_flows};
pub use prompter::{AutoPrompter, AutoPrompterParams, KeyTerm};
pub use prompts::{PromptParams, get_prompt};
pub use report::RunReport;
pub use simulator::{ConversationSimulator, SIMULATE_USER_TURN};
pub use store::{ConversationStore, StoreError};
pub use types::{
    ArtifactDescriptor, ArtifactResult, ConversationDescriptor, ConversationResult, GetArtifact,
    GetArtifactFn, Persona, RunResult, SendMessage, SendMessageFn, into_run_results,
};
