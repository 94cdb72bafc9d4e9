//! Poetry assistant demo
//!
//! A toy poetry app driven through one conversation flow and one artifact
//! flow. The report is printed to stdout as JSON.
//!
//! Uses the configured chat backend when `OPENAI_API_KEY` or
//! `AZURE_OPENAI_API_KEY` is set, otherwise a canned offline backend.
//!
//! ```bash
//! cargo run --example poetry
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bddap::{
    ArtifactDescriptor, AutoPrompter, AutoPrompterParams, BddapError, Config,
    ConversationDescriptor, ConversationStore, GetArtifactFn, InteractionFlow, LlmBackend,
    LlmError, LlmInvocation, LlmResult, Message, Persona, PromptParams, RunReport, RunResult,
    SendMessageFn, SpecSource, get_prompt, into_run_results, run_flows,
};

const POET_PROMPT: &str = "You are a poet. Answer every request with a short rhyming poem.";

/// The application under test: remembers each conversation and answers with
/// a poem about the last thing the user said.
struct PoetryApp {
    store: ConversationStore,
}

impl PoetryApp {
    fn reply(&self, conversation_id: &str, user_text: &str) -> String {
        let _system = get_prompt(
            PromptParams::new("poet_system", POET_PROMPT).with_description("Persona of the poet"),
        );
        self.store.append(conversation_id, Message::human(user_text));
        let turn = self.store.history(conversation_id).len().div_ceil(2);
        let reply = format!("Verse {turn}: of {user_text} I sing, a small and rhyming thing.");
        self.store.append(conversation_id, Message::assistant(reply.clone()));
        reply
    }

    fn poem(topic: &str) -> String {
        let _ = get_prompt(PromptParams::new("poet_system", POET_PROMPT));
        format!("Of {topic} I write,\nby day and by night.")
    }
}

/// Used when no backend is configured.
struct OfflineBackend;

#[async_trait]
impl LlmBackend for OfflineBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let turn = inv.messages.len().div_ceil(2);
        Ok(LlmResult::new(
            format!("Could you write me poem number {turn} about the sea?"),
            "offline",
            "canned",
        ))
    }
}

fn prompter(params: &AutoPrompterParams) -> Result<AutoPrompter, BddapError> {
    match AutoPrompter::initialise(params.clone()) {
        Ok(prompter) => Ok(prompter),
        Err(BddapError::Config(e)) => {
            eprintln!("No chat backend configured ({e}); using the offline backend");
            AutoPrompter::with_backend(params.clone(), Arc::new(OfflineBackend))
        }
        Err(e) => Err(e),
    }
}

struct ConversationFlow {
    params: AutoPrompterParams,
    app: Arc<PoetryApp>,
}

#[async_trait]
impl InteractionFlow for ConversationFlow {
    fn name(&self) -> &str {
        "poem chat"
    }

    fn params(&self) -> &AutoPrompterParams {
        &self.params
    }

    async fn main(&self, params: &AutoPrompterParams) -> Result<Vec<RunResult>, BddapError> {
        let prompter = prompter(params)?;
        let app = Arc::clone(&self.app);
        let descriptor = ConversationDescriptor::new(
            "Poem Chat",
            "Chat with an assistant that answers in verse",
            vec![
                Persona::positive("A student who wants a poem for class"),
                Persona::negative("Someone asking for tax advice"),
            ],
            Arc::new(SendMessageFn(move |id: String, text: String| {
                let app = Arc::clone(&app);
                async move { Ok::<_, anyhow::Error>(app.reply(&id, &text)) }
            })),
        );
        Ok(into_run_results(
            prompter.simulate_conversations(&descriptor).await?,
        ))
    }

    async fn teardown(&self, results: &[RunResult]) -> Result<(), BddapError> {
        for result in results {
            self.app.store.reset(result.id());
        }
        Ok(())
    }
}

struct ArtifactFlow {
    params: AutoPrompterParams,
    topics: Vec<String>,
}

#[async_trait]
impl InteractionFlow for ArtifactFlow {
    fn name(&self) -> &str {
        "poem generation"
    }

    fn params(&self) -> &AutoPrompterParams {
        &self.params
    }

    async fn main(&self, params: &AutoPrompterParams) -> Result<Vec<RunResult>, BddapError> {
        let prompter = prompter(params)?;
        let descriptor = ArtifactDescriptor::<String>::new(
            "Poem Generation",
            "Writes a poem about a topic",
            Arc::new(GetArtifactFn(|topic: String| async move {
                Ok::<_, anyhow::Error>(PoetryApp::poem(&topic))
            })),
        )
        .with_variability(0.3);
        Ok(into_run_results(
            prompter.generate_artifacts(&descriptor, &self.topics).await?,
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = bddap::logging::init_tracing(false);

    let specs = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/specs");
    let config = Config::builder()
        .conversations_per_persona(2)
        .user_messages_per_simulated_conversation(3)
        .build()?;
    let params = AutoPrompterParams::new(
        "A poetry assistant that answers every message with a short poem",
        SpecSource::from_path(specs),
    )
    .with_config(config)
    .with_key_term("verse", "a single line of a poem");

    let app = Arc::new(PoetryApp {
        store: ConversationStore::new(),
    });
    let flows: Vec<Box<dyn InteractionFlow>> = vec![
        Box::new(ConversationFlow {
            params: params.clone(),
            app,
        }),
        Box::new(ArtifactFlow {
            params,
            topics: vec!["the moon".to_string(), "autumn".to_string()],
        }),
    ];

    let results = run_flows(&flows).await?;
    println!("{}", RunReport::new(results).to_json_pretty()?);
    Ok(())
}
