//! ConversationStore — per-thread state, locking, hydration, pruning.
//!
//! The store owns one `Arc<Mutex<ConversationState>>` per thread_id. Holding
//! that mutex for the duration of a turn is the per-thread serialization
//! guarantee: at most one in-flight turn per conversation, while turns on
//! different threads proceed concurrently.

pub mod state;

pub use state::{ConversationState, Message, ToolInvocationRecord, ToolOutcome, UserProfile};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::llm::Role;
use crate::store::Database;

/// In-memory conversation registry with optional write-through persistence.
pub struct ConversationStore {
    threads: RwLock<HashMap<String, Arc<Mutex<ConversationState>>>>,
    db: Option<Arc<dyn Database>>,
}

impl ConversationStore {
    pub fn new(db: Option<Arc<dyn Database>>) -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
            db,
        }
    }

    /// Get the state handle for a thread, creating it if needed.
    ///
    /// A thread seen for the first time in this process is hydrated from the
    /// database when persistence is enabled, so a pruned or restarted
    /// conversation resumes with its history.
    pub async fn entry(&self, thread_id: &str) -> Arc<Mutex<ConversationState>> {
        if let Some(existing) = self.threads.read().await.get(thread_id) {
            return Arc::clone(existing);
        }

        let mut state = ConversationState::new(thread_id);
        if let Some(db) = &self.db {
            match db.list_messages(thread_id).await {
                Ok(stored) => {
                    state.messages = stored
                        .into_iter()
                        .filter_map(|m| {
                            let role = match m.role.as_str() {
                                "user" => Role::User,
                                "assistant" => Role::Assistant,
                                _ => return None,
                            };
                            Some(Message {
                                id: m.id,
                                role,
                                content: m.content,
                                tool_calls: Vec::new(),
                                created_at: m.created_at,
                            })
                        })
                        .collect();
                    if !state.messages.is_empty() {
                        debug!(
                            thread_id,
                            count = state.messages.len(),
                            "Hydrated conversation from DB"
                        );
                    }
                }
                Err(e) => warn!(thread_id, "Failed to hydrate conversation: {}", e),
            }
        }

        let mut threads = self.threads.write().await;
        // A concurrent caller may have inserted while we hydrated.
        Arc::clone(
            threads
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(state))),
        )
    }

    /// Snapshot the message history of a thread, if it exists.
    pub async fn history(&self, thread_id: &str) -> Option<Vec<Message>> {
        let handle = {
            let threads = self.threads.read().await;
            threads.get(thread_id).cloned()
        };
        match handle {
            Some(handle) => Some(handle.lock().await.messages.clone()),
            None => None,
        }
    }

    /// Drop a thread's state entirely, in memory and in the database.
    ///
    /// The next message on the same thread_id behaves exactly like a brand
    /// new thread: empty history, fresh classification.
    pub async fn clear(&self, thread_id: &str) {
        self.threads.write().await.remove(thread_id);
        if let Some(db) = &self.db {
            if let Err(e) = db.delete_conversation(thread_id).await {
                warn!(thread_id, "Failed to delete persisted conversation: {}", e);
            }
        }
        debug!(thread_id, "Conversation cleared");
    }

    /// Persist a completed turn. Fire-and-forget: persistence failures are
    /// logged, never surfaced into the turn result.
    pub fn persist_turn(&self, thread_id: &str, user_input: &str, response: &str) {
        let db = match &self.db {
            Some(db) => Arc::clone(db),
            None => return,
        };
        let thread_id = thread_id.to_string();
        let user_input = user_input.to_string();
        let response = response.to_string();

        tokio::spawn(async move {
            if let Err(e) = db.ensure_conversation(&thread_id, None).await {
                warn!(thread_id, "Failed to ensure conversation: {}", e);
                return;
            }
            if let Err(e) = db.append_message(&thread_id, "user", &user_input).await {
                warn!(thread_id, "Failed to persist user message: {}", e);
                return;
            }
            if let Err(e) = db.append_message(&thread_id, "assistant", &response).await {
                warn!(thread_id, "Failed to persist assistant message: {}", e);
            }
        });
    }

    /// Remove threads idle for longer than `idle_timeout` from memory.
    /// Persisted history survives; a pruned thread re-hydrates on its next
    /// message. Returns the number of threads pruned.
    pub async fn prune_idle(&self, idle_timeout: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(idle_timeout).unwrap_or(chrono::Duration::hours(1));
        let mut threads = self.threads.write().await;
        let before = threads.len();
        let mut keep = HashMap::new();
        for (id, handle) in threads.drain() {
            // A locked thread has a turn in flight; always keep it.
            let idle = match handle.try_lock() {
                Ok(state) => state.last_active_at < cutoff,
                Err(_) => false,
            };
            if !idle {
                keep.insert(id, handle);
            }
        }
        *threads = keep;
        let pruned = before - threads.len();
        if pruned > 0 {
            debug!(pruned, "Pruned idle conversations");
        }
        pruned
    }

    /// Number of threads currently held in memory.
    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.threads.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    #[tokio::test]
    async fn entry_creates_empty_state_once() {
        let store = ConversationStore::new(None);
        let a = store.entry("t1").await;
        let b = store.entry("t1").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.lock().await.messages.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn clear_resets_thread() {
        let store = ConversationStore::new(None);
        {
            let handle = store.entry("t1").await;
            let mut state = handle.lock().await;
            state.messages.push(Message::user("bonjour"));
        }
        store.clear("t1").await;
        let handle = store.entry("t1").await;
        assert!(handle.lock().await.messages.is_empty());
    }

    #[tokio::test]
    async fn hydrates_from_database() {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        db.ensure_conversation("t1", None).await.unwrap();
        db.append_message("t1", "user", "bonjour").await.unwrap();
        db.append_message("t1", "assistant", "Bonjour !").await.unwrap();

        let store = ConversationStore::new(Some(db));
        let handle = store.entry("t1").await;
        let state = handle.lock().await;
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(state.messages[1].content, "Bonjour !");
    }

    #[tokio::test]
    async fn prune_removes_only_idle_threads() {
        let store = ConversationStore::new(None);
        {
            let handle = store.entry("old").await;
            let mut state = handle.lock().await;
            state.last_active_at = Utc::now() - chrono::Duration::hours(2);
        }
        store.entry("fresh").await;

        let pruned = store.prune_idle(Duration::from_secs(3600)).await;
        assert_eq!(pruned, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.history("fresh").await.is_some());
        assert!(store.history("old").await.is_none());
    }
}
