//! Persona-driven conversation simulation
//!
//! For every persona, `conversations_per_persona` independent runs of exactly
//! `user_messages_per_simulated_conversation` round trips. Each round trip
//! asks the chat backend for the persona's next turn, sends it to the
//! application and appends both turns to the transcript.

use bddap_config::Settings;
use bddap_llm::{LlmBackend, LlmInvocation, Message};
use bddap_spec::{Feature, FeatureCategory, Specification, find_feature};
use bddap_utils::cancel::CancellationToken;
use bddap_utils::error::{BddapError, CallbackError};
use bddap_utils::logging::conversation_span;
use futures::{StreamExt, TryStreamExt, stream};
use std::time::Instant;
use tracing::{Instrument, debug, info};
use uuid::Uuid;

use crate::context::CallGuard;
use crate::prompts::record_prompts;
use crate::types::{ConversationDescriptor, ConversationResult, Persona};

/// Purpose recorded on every backend invocation made by the simulator
pub const SIMULATE_USER_TURN: &str = "simulate_user_turn";

pub struct ConversationSimulator<'a> {
    backend: &'a dyn LlmBackend,
    guard: CallGuard<'a>,
}

impl<'a> ConversationSimulator<'a> {
    pub fn new(
        backend: &'a dyn LlmBackend,
        settings: &'a Settings,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            backend,
            guard: CallGuard { settings, cancel },
        }
    }

    /// Simulate every persona's conversations against `descriptor`.
    ///
    /// Results come out in persona order, then run order. The feature is
    /// looked up before anything else, so a miss makes no external calls.
    ///
    /// # Errors
    ///
    /// `SpecError::FeatureNotFound` on a lookup miss; otherwise the first
    /// backend, callback, timeout or cancellation error, which aborts the
    /// whole simulation.
    pub async fn simulate(
        &self,
        descriptor: &ConversationDescriptor,
        specs: &[Specification],
    ) -> Result<Vec<ConversationResult>, BddapError> {
        let feature = find_feature(specs, &descriptor.name, FeatureCategory::Conversation)?;
        let settings = self.guard.settings;
        let start = Instant::now();

        info!(
            conversation = %descriptor.name,
            personas = descriptor.likely_personas.len(),
            runs_per_persona = settings.conversations_per_persona,
            turns = settings.user_messages_per_simulated_conversation,
            "Simulating conversations"
        );

        let units = descriptor
            .likely_personas
            .iter()
            .enumerate()
            .flat_map(|(persona_index, persona)| {
                (0..settings.conversations_per_persona)
                    .map(move |run_index| (persona_index, persona, run_index))
            });

        // Owned before streaming so the returned future stays Send.
        let runs: Vec<_> = units
            .map(|(persona_index, persona, run_index)| {
                self.run_conversation(descriptor, feature, persona, persona_index, run_index)
            })
            .collect();

        let results: Vec<ConversationResult> = stream::iter(runs)
            .buffered(self.guard.concurrency())
            .try_collect()
            .await?;

        info!(
            conversation = %descriptor.name,
            results = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Conversation simulation complete"
        );
        Ok(results)
    }

    async fn run_conversation(
        &self,
        descriptor: &ConversationDescriptor,
        feature: &Feature,
        persona: &Persona,
        persona_index: usize,
        run_index: usize,
    ) -> Result<ConversationResult, BddapError> {
        let conversation_id = Uuid::new_v4().to_string();
        let span = conversation_span(&descriptor.name, persona_index, run_index, &conversation_id);

        let (transcript, prompts_encountered) = record_prompts(
            self.round_trips(descriptor, persona, &conversation_id)
                .instrument(span),
        )
        .await;

        Ok(ConversationResult {
            conversation_id,
            matched_feature: feature.clone(),
            transcript: transcript?,
            prompts_encountered,
        })
    }

    async fn round_trips(
        &self,
        descriptor: &ConversationDescriptor,
        persona: &Persona,
        conversation_id: &str,
    ) -> Result<Vec<Message>, BddapError> {
        let turns = self.guard.settings.user_messages_per_simulated_conversation;
        let instruction = Message::system(persona.simulation_prompt());
        let mut transcript: Vec<Message> = Vec::with_capacity(turns * 2);

        for turn in 0..turns {
            self.guard.checkpoint("conversation round trip")?;

            let mut messages = Vec::with_capacity(transcript.len() + 1);
            messages.push(instruction.clone());
            messages.extend(transcript.iter().cloned());
            let invocation = LlmInvocation::new(SIMULATE_USER_TURN, messages)
                .with_timeout(self.guard.settings.call_timeout);

            let user_text = self
                .guard
                .call("chat backend invocation", async {
                    self.backend
                        .invoke(invocation)
                        .await
                        .map_err(BddapError::from)
                })
                .await?
                .raw_response;

            let reply = self
                .guard
                .call("send_message", async {
                    descriptor
                        .sender
                        .send_message(conversation_id, &user_text)
                        .await
                        .map_err(|e| BddapError::from(CallbackError::send_message(conversation_id, e)))
                })
                .await?;

            transcript.push(Message::human(user_text));
            transcript.push(Message::assistant(reply));
            debug!(turn = turn + 1, of = turns, "Round trip complete");
        }

        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SendMessageFn;
    use async_trait::async_trait;
    use bddap_llm::{LlmError, LlmResult, Role};
    use bddap_spec::parse_str;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Records every invocation and answers with a numbered user turn.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(inv.messages);
            Ok(LlmResult::new(format!("user turn {}", calls.len()), "test", "test"))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl LlmBackend for FailingBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Err(LlmError::ProviderOutage("down".to_string()))
        }
    }

    fn specs() -> Vec<Specification> {
        vec![parse_str(
            "Feature: Poem Chat [Conversation]\nScenario: stays on topic (8/10)\n",
        )]
    }

    fn settings(runs: usize, turns: usize) -> Settings {
        Settings {
            conversations_per_persona: runs,
            user_messages_per_simulated_conversation: turns,
            ..Settings::default()
        }
    }

    fn echo_descriptor(personas: Vec<Persona>) -> ConversationDescriptor {
        ConversationDescriptor::new(
            "Poem Chat",
            "chat about poems",
            personas,
            Arc::new(SendMessageFn(|_id: String, text: String| async move {
                Ok::<_, anyhow::Error>(format!("reply to {text}"))
            })),
        )
    }

    #[tokio::test]
    async fn test_emits_personas_times_runs_with_alternating_turns() {
        let backend = RecordingBackend::default();
        let settings = settings(3, 2);
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);
        let descriptor =
            echo_descriptor(vec![Persona::positive("a poet"), Persona::negative("a troll")]);

        let results = simulator.simulate(&descriptor, &specs()).await.unwrap();

        assert_eq!(results.len(), 6);
        let mut ids: Vec<_> = results.iter().map(|r| r.conversation_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);

        for result in &results {
            assert_eq!(result.matched_feature.name, "Poem Chat");
            assert_eq!(result.transcript.len(), 4);
            for (i, message) in result.transcript.iter().enumerate() {
                let expected = if i % 2 == 0 { Role::Human } else { Role::Assistant };
                assert_eq!(message.role, expected);
            }
            assert_eq!(
                result.transcript[1].content,
                format!("reply to {}", result.transcript[0].content)
            );
            assert!(result.prompts_encountered.is_empty());
        }

        assert_eq!(backend.calls.lock().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_backend_sees_instruction_then_transcript() {
        let backend = RecordingBackend::default();
        let settings = settings(1, 3);
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);

        simulator
            .simulate(&echo_descriptor(vec![Persona::negative("a spammer")]), &specs())
            .await
            .unwrap();

        let calls = backend.calls.lock().unwrap();
        let lengths: Vec<_> = calls.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![1, 3, 5]);
        for call in calls.iter() {
            assert_eq!(call[0].role, Role::System);
            assert!(call[0].content.contains("a spammer"));
            assert!(call[0].content.contains("negative intentions"));
        }
        assert_eq!(calls[2][1], Message::human("user turn 1"));
    }

    #[tokio::test]
    async fn test_concurrent_runs_cover_every_persona() {
        let backend = RecordingBackend::default();
        let settings = Settings {
            max_concurrency: 4,
            ..settings(3, 1)
        };
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);
        let personas = vec![
            Persona::positive("first"),
            Persona::positive("second"),
            Persona::positive("third"),
        ];

        let results = simulator
            .simulate(&echo_descriptor(personas), &specs())
            .await
            .unwrap();

        assert_eq!(results.len(), 9);
        let calls = backend.calls.lock().unwrap();
        // Every unit makes exactly one backend call carrying its persona
        let mut by_persona = [0usize; 3];
        for call in calls.iter() {
            for (i, name) in ["first", "second", "third"].iter().enumerate() {
                if call[0].content.contains(&format!("persona: {name}.")) {
                    by_persona[i] += 1;
                }
            }
        }
        assert_eq!(by_persona, [3, 3, 3]);
    }

    #[tokio::test]
    async fn test_missing_feature_makes_no_calls() {
        let backend = RecordingBackend::default();
        let settings = Settings::default();
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);
        let mut descriptor = echo_descriptor(vec![Persona::positive("a poet")]);
        descriptor.name = "Unknown".to_string();

        let err = simulator.simulate(&descriptor, &specs()).await.unwrap_err();
        assert!(matches!(err, BddapError::Spec(_)), "got {err:?}");
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_artifact_feature_does_not_match_conversation() {
        let backend = RecordingBackend::default();
        let settings = Settings::default();
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);
        let specs = vec![parse_str("Feature: Poem Chat [Artifact]\n")];

        let result = simulator
            .simulate(&echo_descriptor(vec![Persona::positive("p")]), &specs)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_backend_error_aborts_simulation() {
        let settings = Settings::default();
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&FailingBackend, &settings, &cancel);

        let err = simulator
            .simulate(&echo_descriptor(vec![Persona::positive("p")]), &specs())
            .await
            .unwrap_err();
        assert!(matches!(err, BddapError::Llm(LlmError::ProviderOutage(_))), "got {err:?}");
    }

    #[tokio::test]
    async fn test_send_message_error_aborts_simulation() {
        let backend = RecordingBackend::default();
        let settings = settings(5, 5);
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);
        let descriptor = ConversationDescriptor::new(
            "Poem Chat",
            "",
            vec![Persona::positive("p"), Persona::positive("q")],
            Arc::new(SendMessageFn(|_id: String, _text: String| async move {
                Err::<String, _>(anyhow::anyhow!("application crashed"))
            })),
        );

        let err = simulator.simulate(&descriptor, &specs()).await.unwrap_err();
        match err {
            BddapError::Callback(e) => {
                assert_eq!(e.callback, "send_message");
                assert!(e.to_string().contains("application crashed"));
            }
            other => panic!("Expected Callback, got {other:?}"),
        }
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_round_trip() {
        let backend = RecordingBackend::default();
        let settings = Settings::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);

        let err = simulator
            .simulate(&echo_descriptor(vec![Persona::positive("p")]), &specs())
            .await
            .unwrap_err();
        assert!(matches!(err, BddapError::Cancelled { .. }), "got {err:?}");
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompts_fetched_by_application_are_recorded() {
        use crate::prompts::{PromptParams, get_prompt};

        let backend = RecordingBackend::default();
        let settings = settings(2, 2);
        let cancel = CancellationToken::new();
        let simulator = ConversationSimulator::new(&backend, &settings, &cancel);
        let descriptor = ConversationDescriptor::new(
            "Poem Chat",
            "",
            vec![Persona::positive("p")],
            Arc::new(SendMessageFn(|_id: String, _text: String| async move {
                let system = get_prompt(PromptParams::new("poem system", "be poetic"));
                Ok::<_, anyhow::Error>(system)
            })),
        );

        let results = simulator.simulate(&descriptor, &specs()).await.unwrap();
        for result in results {
            assert_eq!(result.prompts_encountered.len(), 1);
            assert_eq!(result.prompts_encountered[0].name, "poem system");
        }
    }
}
