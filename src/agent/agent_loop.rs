//! Main agent — per-turn routing between the general tool-using loop and
//! the specialized chains, plus conversation bookkeeping.
//!
//! `process_message` is the single entry point the consumer surface calls.
//! It is also the last line of defense: it never returns an error and never
//! panics; every internal failure becomes the fixed apology response with
//! the short error description tucked into the `error` field.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::agent::chains::SpecializedChains;
use crate::agent::intent::{self, Intent};
use crate::agent::prompts;
use crate::agent::tool_executor::{self, LoopOutcome};
use crate::config::AgentConfig;
use crate::conversation::{ConversationState, ConversationStore, Message};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, Role};
use crate::tools::{ToolContext, ToolRegistry};

/// Fixed user-facing answer when a turn fails internally.
pub const APOLOGY_MESSAGE: &str =
    "Désolé, une erreur s'est produite. Pouvez-vous reformuler votre question ?";

/// Core dependencies for the agent.
///
/// Explicitly constructed and injected at process start; no process-wide
/// singletons.
pub struct AgentDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub tools: Arc<ToolRegistry>,
    pub conversations: Arc<ConversationStore>,
    pub chains: SpecializedChains,
}

/// Structured result of one processed message.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub response: String,
    pub intent: String,
    pub specialized: bool,
    pub thread_id: String,
    pub tools_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The conversational agent.
pub struct Agent {
    config: AgentConfig,
    deps: AgentDeps,
}

impl Agent {
    pub fn new(config: AgentConfig, deps: AgentDeps) -> Self {
        Self { config, deps }
    }

    pub fn conversations(&self) -> &Arc<ConversationStore> {
        &self.deps.conversations
    }

    /// Process one user message on a thread.
    ///
    /// Turns on the same thread are serialized: the state mutex is held for
    /// the whole turn. Turns on different threads run concurrently.
    pub async fn process_message(
        &self,
        message: &str,
        thread_id: &str,
        user_profile: Option<crate::conversation::UserProfile>,
    ) -> ProcessOutcome {
        let handle = self.deps.conversations.entry(thread_id).await;
        let mut state = handle.lock().await;
        state.touch();

        if let Some(profile) = user_profile {
            state.user_profile.merge(profile);
        }

        // Classification never aborts a turn; the keyword table is total.
        let intent = intent::classify(message);
        let specialized = intent::should_specialize(intent, message);
        state.current_intent = Some(intent);
        debug!(thread_id, intent = %intent, specialized, "Message classified");

        state.messages.push(Message::user(message));

        let result = if specialized {
            self.run_specialized(&mut state, intent, message).await
        } else {
            self.run_general(&mut state, message).await
        };

        let (response, tools_used, turn_error) = match result {
            Ok((response, tools_used)) => (response, tools_used, None),
            Err(e) => {
                // The raw error is for logs and observability only.
                error!(thread_id, "Turn failed: {}", e);
                state.messages.push(Message::assistant(APOLOGY_MESSAGE));
                (APOLOGY_MESSAGE.to_string(), Vec::new(), Some(e.to_string()))
            }
        };

        self.deps
            .conversations
            .persist_turn(thread_id, message, &response);

        ProcessOutcome {
            response,
            intent: intent.as_str().to_string(),
            specialized,
            thread_id: thread_id.to_string(),
            tools_used,
            error: turn_error,
        }
    }

    /// Specialized path: one template completion, no tools.
    async fn run_specialized(
        &self,
        state: &mut ConversationState,
        intent: Intent,
        message: &str,
    ) -> Result<(String, Vec<String>), crate::error::Error> {
        let text = self
            .deps
            .chains
            .run(intent, message, &state.user_profile)
            .await?;

        // Scratch first, then fold into history exactly once.
        state.specialized_response = Some(text);
        let response = state.specialized_response.take().unwrap_or_default();
        state.messages.push(Message::assistant(response.clone()));

        Ok((response, Vec::new()))
    }

    /// General path: system context + history through the tool loop.
    async fn run_general(
        &self,
        state: &mut ConversationState,
        _message: &str,
    ) -> Result<(String, Vec<String>), crate::error::Error> {
        let system_prompt = prompts::main_agent_prompt(
            &state.user_profile.summary(),
            &Utc::now().format("%d/%m/%Y").to_string(),
        );

        let mut messages = vec![ChatMessage::system(system_prompt)];
        messages.extend(state.messages.iter().filter_map(|m| match m.role {
            Role::User => Some(ChatMessage::user(&m.content)),
            Role::Assistant => Some(ChatMessage::assistant(&m.content)),
            _ => None,
        }));

        let ctx = ToolContext::new(&state.thread_id);
        let LoopOutcome { response, records } = tool_executor::run_tool_loop(
            &self.deps.llm,
            &self.deps.tools,
            messages,
            &ctx,
            self.config.max_tool_rounds,
            self.config.max_completion_tokens,
            self.config.temperature,
        )
        .await?;

        let tools_used: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        state
            .messages
            .push(Message::assistant(response.clone()).with_tool_calls(records));

        Ok((response, tools_used))
    }

    /// LLM summary of a conversation: needs, actions, next steps.
    pub async fn conversation_summary(&self, thread_id: &str) -> Result<String, crate::error::Error> {
        let history = self.deps.conversations.history(thread_id).await;
        let messages = match history {
            Some(messages) if !messages.is_empty() => messages,
            _ => return Ok("Aucune conversation trouvée.".to_string()),
        };

        let transcript = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "utilisateur",
                    Role::Assistant => "assistant",
                    Role::System => "système",
                    Role::Tool => "outil",
                };
                format!("{}: {}", role, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut request =
            CompletionRequest::new(vec![ChatMessage::user(prompts::summary_prompt(&transcript))]);
        request.max_tokens = self.config.max_completion_tokens;
        request.temperature = self.config.temperature;

        let response = self.deps.llm.complete(request).await?;
        Ok(response.content)
    }

    /// Drop a conversation. The next message on this thread_id starts fresh.
    pub async fn clear_conversation(&self, thread_id: &str) {
        self.deps.conversations.clear(thread_id).await;
    }

    /// Spawn the background task pruning idle conversations.
    pub fn spawn_pruning_task(&self) -> JoinHandle<()> {
        let conversations = Arc::clone(&self.deps.conversations);
        let idle_timeout = self.config.thread_idle_timeout;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
            interval.tick().await; // Skip immediate first tick
            loop {
                interval.tick().await;
                let pruned = conversations.prune_idle(idle_timeout).await;
                if pruned > 0 {
                    info!(pruned, "Idle conversations pruned");
                }
            }
        })
    }
}
