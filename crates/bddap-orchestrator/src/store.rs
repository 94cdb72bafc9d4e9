//! Conversation history keyed by conversation id, owned by the application
//! under test.

use bddap_llm::Message;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),
}

/// Thread-safe `conversation_id -> transcript` map.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Mutex<HashMap<String, Vec<Message>>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Message>>> {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a message, creating the conversation on first use.
    pub fn append(&self, conversation_id: &str, message: Message) {
        self.lock()
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
    }

    /// Snapshot of a conversation; empty if it was never started.
    #[must_use]
    pub fn history(&self, conversation_id: &str) -> Vec<Message> {
        self.lock()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Clear a conversation's history, keeping the conversation.
    pub fn reset(&self, conversation_id: &str) {
        self.lock()
            .insert(conversation_id.to_string(), Vec::new());
    }

    /// # Errors
    ///
    /// `StoreError::NotFound` if the conversation does not exist.
    pub fn delete(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.lock()
            .remove(conversation_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(conversation_id.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
