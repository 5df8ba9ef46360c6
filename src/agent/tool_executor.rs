//! The model↔tool loop of the general path.
//!
//! One round = one model call. When the model requests tool calls they are
//! executed and their results replayed — in the exact order the model
//! requested them — before the next model call. The loop terminates when the
//! model answers with no tool calls, or when the round cap is reached.
//!
//! Hard contract: tools never crash the loop. Every tool failure (unknown
//! name, invalid arguments, downstream error) becomes a tool-result error
//! string the model sees and can react to. Only a model-invocation failure
//! propagates, and the turn handler above converts it to the fixed apology.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::conversation::{ToolInvocationRecord, ToolOutcome};
use crate::error::LlmError;
use crate::llm::{ChatMessage, LlmProvider, ToolCompletionRequest};
use crate::tools::{ToolContext, ToolRegistry};

/// Answer given when the round cap cuts the loop off.
pub const LOOP_EXHAUSTED_MESSAGE: &str =
    "Je n'ai pas réussi à terminer cette demande. Pouvez-vous la préciser ou la découper ?";

/// Result of a completed loop.
pub struct LoopOutcome {
    pub response: String,
    pub records: Vec<ToolInvocationRecord>,
}

/// Run the tool-calling loop until the model produces a final answer.
pub async fn run_tool_loop(
    llm: &Arc<dyn LlmProvider>,
    registry: &Arc<ToolRegistry>,
    mut messages: Vec<ChatMessage>,
    ctx: &ToolContext,
    max_rounds: usize,
    max_tokens: u32,
    temperature: f32,
) -> Result<LoopOutcome, LlmError> {
    let definitions = registry.tool_definitions();
    let mut records: Vec<ToolInvocationRecord> = Vec::new();

    for round in 1..=max_rounds {
        let mut request = ToolCompletionRequest::new(messages.clone(), definitions.clone());
        request.max_tokens = max_tokens;
        request.temperature = temperature;

        let response = llm.complete_with_tools(request).await?;

        if response.tool_calls.is_empty() {
            let content = response.content.unwrap_or_default();
            debug!(round, "Model produced final answer");
            return Ok(LoopOutcome {
                response: content,
                records,
            });
        }

        debug!(
            round,
            calls = response.tool_calls.len(),
            "Model requested tool calls"
        );

        // Replay the assistant turn, then the results in request order.
        messages.push(ChatMessage::assistant_tool_calls(
            response.content.clone(),
            response.tool_calls.clone(),
        ));

        for call in &response.tool_calls {
            let (result_text, outcome) = execute_one(registry, call, ctx).await;
            records.push(ToolInvocationRecord {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
                outcome,
            });
            messages.push(ChatMessage::tool_result(call.id.clone(), result_text));
        }
    }

    warn!(max_rounds, "Tool loop hit the round cap");
    Ok(LoopOutcome {
        response: LOOP_EXHAUSTED_MESSAGE.to_string(),
        records,
    })
}

/// Execute a single requested call, converting every failure into an error
/// string for the model.
async fn execute_one(
    registry: &Arc<ToolRegistry>,
    call: &crate::llm::ToolCall,
    ctx: &ToolContext,
) -> (String, ToolOutcome) {
    let Some(tool) = registry.get(&call.name) else {
        let text = format!("Outil inconnu : {}", call.name);
        warn!(tool = %call.name, "Model requested an unknown tool");
        return (text.clone(), ToolOutcome::Error(text));
    };

    match tool.execute(call.arguments.clone(), ctx).await {
        Ok(output) => {
            debug!(
                tool = %call.name,
                duration_ms = output.duration.as_millis() as u64,
                "Tool executed"
            );
            (output.content.clone(), ToolOutcome::Ok(output.content))
        }
        Err(e) => {
            let text = e.to_string();
            warn!(tool = %call.name, "Tool failed: {}", text);
            (text.clone(), ToolOutcome::Error(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{
        CompletionRequest, CompletionResponse, Role, ToolCall, ToolCompletionResponse,
    };
    use crate::tools::{Tool, ToolError, ToolOutput};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Provider replaying a script of responses and recording requests.
    struct ScriptedProvider {
        script: Mutex<Vec<ToolCompletionResponse>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<ToolCompletionResponse>) -> Self {
            Self {
                script: Mutex::new(script),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn text(content: &str) -> ToolCompletionResponse {
            ToolCompletionResponse {
                content: Some(content.to_string()),
                tool_calls: Vec::new(),
                input_tokens: 0,
                output_tokens: 0,
            }
        }

        fn calls(calls: Vec<(&str, &str, serde_json::Value)>) -> ToolCompletionResponse {
            ToolCompletionResponse {
                content: None,
                tool_calls: calls
                    .into_iter()
                    .map(|(id, name, arguments)| ToolCall {
                        id: id.to_string(),
                        name: name.to_string(),
                        arguments,
                    })
                    .collect(),
                input_tokens: 0,
                output_tokens: 0,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            unreachable!("loop always calls complete_with_tools")
        }

        async fn complete_with_tools(
            &self,
            request: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.messages);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                // Keep requesting a tool forever (round-cap tests)
                return Ok(ScriptedProvider::calls(vec![(
                    "loop",
                    "echo",
                    serde_json::json!({"text": "again"}),
                )]));
            }
            Ok(script.remove(0))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
        async fn execute(
            &self,
            params: serde_json::Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            let text = params.get("text").and_then(|v| v.as_str()).unwrap_or("");
            Ok(ToolOutput::text(
                format!("echo:{}", text),
                Duration::from_millis(1),
            ))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _params: serde_json::Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            Err(ToolError::ExecutionFailed(
                "Erreur lors de la recherche : service indisponible".to_string(),
            ))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        Arc::new(registry)
    }

    async fn run(
        provider: Arc<ScriptedProvider>,
        max_rounds: usize,
    ) -> (LoopOutcome, Arc<ScriptedProvider>) {
        let llm: Arc<dyn LlmProvider> = provider.clone();
        let outcome = run_tool_loop(
            &llm,
            &registry(),
            vec![ChatMessage::user("bonjour")],
            &ToolContext::new("t1"),
            max_rounds,
            1024,
            0.7,
        )
        .await
        .unwrap();
        (outcome, provider)
    }

    #[tokio::test]
    async fn text_response_ends_the_loop_immediately() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
            "Bonjour !",
        )]));
        let (outcome, provider) = run(provider, 8).await;
        assert_eq!(outcome.response, "Bonjour !");
        assert!(outcome.records.is_empty());
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tool_results_replay_in_request_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::calls(vec![
                ("c1", "echo", serde_json::json!({"text": "premier"})),
                ("c2", "echo", serde_json::json!({"text": "second"})),
            ]),
            ScriptedProvider::text("fini"),
        ]));
        let (outcome, provider) = run(provider, 8).await;

        assert_eq!(outcome.response, "fini");
        assert_eq!(outcome.records.len(), 2);
        assert!(matches!(&outcome.records[0].outcome, ToolOutcome::Ok(s) if s == "echo:premier"));

        // Second model call must contain the two tool results, in order,
        // after the assistant tool-call turn.
        let seen = provider.seen.lock().unwrap();
        let second_request = &seen[1];
        let tool_messages: Vec<&ChatMessage> = second_request
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 2);
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(tool_messages[0].content, "echo:premier");
        assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("c2"));
        assert_eq!(tool_messages[1].content, "echo:second");
    }

    #[tokio::test]
    async fn failing_tool_feeds_error_back_without_aborting() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::calls(vec![("c1", "failing", serde_json::json!({}))]),
            ScriptedProvider::text("compris"),
        ]));
        let (outcome, provider) = run(provider, 8).await;

        assert_eq!(outcome.response, "compris");
        assert!(matches!(&outcome.records[0].outcome, ToolOutcome::Error(_)));

        let seen = provider.seen.lock().unwrap();
        let tool_message = seen[1].iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_message.content.contains("service indisponible"));
    }

    #[tokio::test]
    async fn unknown_tool_feeds_error_back() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::calls(vec![("c1", "no_such_tool", serde_json::json!({}))]),
            ScriptedProvider::text("ok"),
        ]));
        let (outcome, provider) = run(provider, 8).await;

        assert_eq!(outcome.response, "ok");
        let seen = provider.seen.lock().unwrap();
        let tool_message = seen[1].iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_message.content.contains("Outil inconnu"));
    }

    #[tokio::test]
    async fn round_cap_forces_fixed_answer() {
        // Empty script: the provider requests tools forever
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let (outcome, provider) = run(provider, 3).await;

        assert_eq!(outcome.response, LOOP_EXHAUSTED_MESSAGE);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(provider.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        struct BrokenProvider;

        #[async_trait]
        impl LlmProvider for BrokenProvider {
            fn model_name(&self) -> &str {
                "broken"
            }
            async fn complete(
                &self,
                _request: CompletionRequest,
            ) -> Result<CompletionResponse, LlmError> {
                unreachable!()
            }
            async fn complete_with_tools(
                &self,
                _request: ToolCompletionRequest,
            ) -> Result<ToolCompletionResponse, LlmError> {
                Err(LlmError::RequestFailed {
                    provider: "broken".to_string(),
                    reason: "connexion refusée".to_string(),
                })
            }
        }

        let llm: Arc<dyn LlmProvider> = Arc::new(BrokenProvider);
        let result = run_tool_loop(
            &llm,
            &registry(),
            vec![ChatMessage::user("bonjour")],
            &ToolContext::new("t1"),
            8,
            1024,
            0.7,
        )
        .await;
        assert!(result.is_err());
    }
}
