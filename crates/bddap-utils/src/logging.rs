//! Logging and observability infrastructure for bddap
//!
//! Structured logging with `tracing`. Library code only emits events and
//! spans; the binary (or an embedding application) installs the subscriber.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise `verbose` selects between
/// `bddap=debug` with span-close timing and a compact `bddap=info` format.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("bddap=debug,info")
            } else {
                EnvFilter::try_new("bddap=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span for one interaction flow of a batch.
pub fn flow_span(index: usize, total: usize, name: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "flow",
        step = index + 1,
        total = total,
        name = %name,
    )
}

/// Span for a single simulated conversation run.
pub fn conversation_span(
    conversation: &str,
    persona_index: usize,
    run_index: usize,
    conversation_id: &str,
) -> tracing::Span {
    span!(
        Level::INFO,
        "conversation_run",
        conversation = %conversation,
        persona = persona_index,
        run = run_index,
        conversation_id = %conversation_id,
    )
}

/// Span for generating one artifact from one input.
pub fn artifact_span(artifact: &str, input_index: usize) -> tracing::Span {
    span!(
        Level::INFO,
        "artifact_generation",
        artifact = %artifact,
        input = input_index,
    )
}

/// Log completion of a batch step with its result count.
pub fn log_step_complete(step: &str, results: usize, duration_ms: u128) {
    info!(
        step = %step,
        results = results,
        duration_ms = %duration_ms,
        "Step completed"
    );
}

/// Log a failed batch step. The error text is redacted first.
pub fn log_step_error(step: &str, error: &str, duration_ms: u128) {
    let sanitized_error = redact_secrets(error);
    error!(
        step = %step,
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "Step failed"
    );
}
