//! Prompt registry
//!
//! Applications fetch their prompts through [`get_prompt`]. Outside a run it
//! returns the content unchanged. While a conversation run or artifact
//! generation is in progress, every prompt fetched on that task is recorded
//! and ends up in the result's `prompts_encountered`.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::future::Future;

/// A named prompt used by the application under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptParams {
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PromptParams {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

tokio::task_local! {
    static ENCOUNTERED: RefCell<Vec<PromptParams>>;
}

/// Return the prompt's content, recording it if a run is in progress.
///
/// Prompts are deduplicated by name; the first one seen is kept.
pub fn get_prompt(params: PromptParams) -> String {
    let _ = ENCOUNTERED.try_with(|encountered| {
        let mut encountered = encountered.borrow_mut();
        if !encountered.iter().any(|p| p.name == params.name) {
            encountered.push(params.clone());
        }
    });
    params.content
}

/// Run `fut` with a fresh recording scope and return what it recorded.
pub(crate) async fn record_prompts<F, T>(fut: F) -> (T, Vec<PromptParams>)
where
    F: Future<Output = T>,
{
    ENCOUNTERED
        .scope(RefCell::new(Vec::new()), async move {
            let output = fut.await;
            let encountered = ENCOUNTERED.with(RefCell::take);
            (output, encountered)
        })
        .await
}
