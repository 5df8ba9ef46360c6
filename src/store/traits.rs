//! `Database` trait — async interface for conversation persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;

/// A persisted conversation message.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic conversation persistence.
#[async_trait]
pub trait Database: Send + Sync {
    /// Ensure a conversation row exists, creating it if needed.
    async fn ensure_conversation(
        &self,
        thread_id: &str,
        title: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Append a message to a conversation.
    async fn append_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), StoreError>;

    /// List a conversation's messages in insertion order. An unknown
    /// thread_id yields an empty list, not an error.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError>;

    /// Delete a conversation and its messages.
    async fn delete_conversation(&self, thread_id: &str) -> Result<(), StoreError>;
}
