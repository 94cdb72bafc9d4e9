//! Interaction flows
//!
//! A batch is an ordered list of flows. Each flow runs setup, main and
//! teardown in turn; the next flow starts only after the previous one's
//! teardown returns. The first error aborts the batch and is reported as
//! `BddapError::BatchAborted` naming the step and stage that failed.

use async_trait::async_trait;
use bddap_utils::cancel::CancellationToken;
use bddap_utils::error::{BddapError, FlowStage};
use bddap_utils::logging::{flow_span, log_step_complete, log_step_error};
use std::time::Instant;
use tracing::{Instrument, debug};

use crate::prompter::AutoPrompterParams;
use crate::types::RunResult;

/// One setup/main/teardown unit of a batch.
#[async_trait]
pub trait InteractionFlow: Send + Sync {
    /// Name used in logs and abort reports
    fn name(&self) -> &str;

    /// Parameters handed to [`InteractionFlow::main`]
    fn params(&self) -> &AutoPrompterParams;

    async fn setup(&self) -> Result<(), BddapError> {
        Ok(())
    }

    async fn main(&self, params: &AutoPrompterParams) -> Result<Vec<RunResult>, BddapError>;

    /// Receives only this flow's own results.
    async fn teardown(&self, _results: &[RunResult]) -> Result<(), BddapError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowOrchestrator {
    cancel: CancellationToken,
}

impl FlowOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Run `flows` in order, concatenating their results.
    ///
    /// # Errors
    ///
    /// `BddapError::BatchAborted` wrapping the first error from any stage;
    /// no later flow is started.
    pub async fn run(
        &self,
        flows: &[Box<dyn InteractionFlow>],
    ) -> Result<Vec<RunResult>, BddapError> {
        let total = flows.len();
        let mut all = Vec::new();

        for (index, flow) in flows.iter().enumerate() {
            let started = Instant::now();
            let outcome = self
                .run_flow(flow.as_ref())
                .instrument(flow_span(index, total, flow.name()))
                .await;
            let elapsed = started.elapsed().as_millis();

            match outcome {
                Ok(results) => {
                    log_step_complete(flow.name(), results.len(), elapsed);
                    all.extend(results);
                }
                Err((stage, source)) => {
                    log_step_error(flow.name(), &source.to_string(), elapsed);
                    return Err(BddapError::BatchAborted {
                        step: index + 1,
                        total,
                        flow: flow.name().to_string(),
                        stage,
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(all)
    }

    async fn run_flow(
        &self,
        flow: &dyn InteractionFlow,
    ) -> Result<Vec<RunResult>, (FlowStage, BddapError)> {
        let at = |stage: FlowStage| move |e: BddapError| (stage, e);

        self.cancel.check("flow setup").map_err(at(FlowStage::Setup))?;
        debug!("Running flow setup");
        flow.setup().await.map_err(at(FlowStage::Setup))?;

        self.cancel.check("flow main").map_err(at(FlowStage::Main))?;
        let results = flow
            .main(flow.params())
            .await
            .map_err(at(FlowStage::Main))?;

        self.cancel
            .check("flow teardown")
            .map_err(at(FlowStage::Teardown))?;
        debug!(results = results.len(), "Running flow teardown");
        flow.teardown(&results)
            .await
            .map_err(at(FlowStage::Teardown))?;

        Ok(results)
    }
}

/// Run a batch with a fresh orchestrator.
///
/// # Errors
///
/// See [`FlowOrchestrator::run`].
pub async fn run_flows(flows: &[Box<dyn InteractionFlow>]) -> Result<Vec<RunResult>, BddapError> {
    FlowOrchestrator::new().run(flows).await
}
