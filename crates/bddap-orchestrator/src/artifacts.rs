//! Artifact generation: one `get_artifact` call per input, results in input
//! order.

use bddap_config::Settings;
use bddap_spec::{Feature, FeatureCategory, Specification, find_feature};
use bddap_utils::cancel::CancellationToken;
use bddap_utils::error::{BddapError, CallbackError};
use bddap_utils::logging::artifact_span;
use futures::{StreamExt, TryStreamExt, stream};
use std::time::Instant;
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::context::CallGuard;
use crate::prompts::record_prompts;
use crate::types::{ArtifactDescriptor, ArtifactResult};

pub struct ArtifactGenerator<'a> {
    guard: CallGuard<'a>,
}

impl<'a> ArtifactGenerator<'a> {
    pub fn new(settings: &'a Settings, cancel: &'a CancellationToken) -> Self {
        Self {
            guard: CallGuard { settings, cancel },
        }
    }

    /// Generate one artifact per input. Equal inputs are not deduplicated.
    ///
    /// # Errors
    ///
    /// `SpecError::FeatureNotFound` before any call on a lookup miss;
    /// otherwise the first callback, timeout or cancellation error, which
    /// abandons the remaining inputs.
    pub async fn generate<I>(
        &self,
        descriptor: &ArtifactDescriptor<I>,
        specs: &[Specification],
        inputs: &[I],
    ) -> Result<Vec<ArtifactResult>, BddapError>
    where
        I: Send + Sync + 'static,
    {
        let feature = find_feature(specs, &descriptor.name, FeatureCategory::Artifact)?;
        let start = Instant::now();

        info!(
            artifact = %descriptor.name,
            inputs = inputs.len(),
            variability = descriptor.variability,
            "Generating artifacts"
        );

        let pending: Vec<_> = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| self.generate_one(descriptor, feature, index, input))
            .collect();

        let results: Vec<ArtifactResult> = stream::iter(pending)
            .buffered(self.guard.concurrency())
            .try_collect()
            .await?;

        info!(
            artifact = %descriptor.name,
            results = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Artifact generation complete"
        );
        Ok(results)
    }

    async fn generate_one<I>(
        &self,
        descriptor: &ArtifactDescriptor<I>,
        feature: &Feature,
        index: usize,
        input: &I,
    ) -> Result<ArtifactResult, BddapError>
    where
        I: Send + Sync + 'static,
    {
        self.guard.checkpoint("artifact generation")?;

        let call = self.guard.call("get_artifact", async {
            descriptor
                .generator
                .get_artifact(input)
                .await
                .map_err(|e| BddapError::from(CallbackError::get_artifact(index, e)))
        });
        let (result, prompts_encountered) =
            record_prompts(call.instrument(artifact_span(&descriptor.name, index))).await;

        Ok(ArtifactResult {
            artifact_id: Uuid::new_v4().to_string(),
            matched_feature: feature.clone(),
            result: result?,
            prompts_encountered,
        })
    }
}
