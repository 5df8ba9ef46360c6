//! reqwest-based client for OpenAI-compatible chat-completions endpoints.
//!
//! Both supported backends (OpenAI, Mistral) speak the same
//! `POST /v1/chat/completions` wire format, so a single client covers them.
//! Retries on 429 and 5xx with exponential backoff; other failures are
//! returned to the caller immediately.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse, ToolDefinition,
};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct OpenAiCompatProvider {
    http: reqwest::Client,
    provider_name: String,
    completions_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiCompatProvider {
    pub fn new(
        provider_name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
    ) -> Self {
        let base = base_url.into();
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            provider_name: provider_name.into(),
            completions_url: format!("{}/chat/completions", base.trim_end_matches('/')),
            api_key,
            model: model.into(),
        }
    }

    async fn call(&self, body: WireRequest<'_>) -> Result<WireResponse, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    provider = %self.provider_name,
                    "completion attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .http
                .post(&self.completions_url)
                .bearer_auth(self.api_key.expose_secret())
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::RequestFailed {
                        provider: self.provider_name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!(provider = %self.provider_name, %status, "completion API error");
                last_error = Some(LlmError::Api {
                    provider: self.provider_name.clone(),
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    provider: self.provider_name.clone(),
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: WireResponse =
                response.json().await.map_err(|e| LlmError::InvalidResponse {
                    provider: self.provider_name.clone(),
                    reason: e.to_string(),
                })?;

            if let Some(usage) = &parsed.usage {
                debug!(
                    provider = %self.provider_name,
                    input_tokens = usage.prompt_tokens,
                    output_tokens = usage.completion_tokens,
                    "completion succeeded"
                );
            }

            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            provider: self.provider_name.clone(),
            attempts: MAX_RETRIES,
        }))
    }

    fn first_choice(&self, response: WireResponse) -> Result<WireChoiceMessage, LlmError> {
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: self.provider_name.clone(),
                reason: "response contained no choices".to_string(),
            })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let messages: Vec<WireMessage> = request.messages.iter().map(WireMessage::from).collect();
        let response = self
            .call(WireRequest {
                model: &self.model,
                messages,
                tools: None,
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            })
            .await?;

        let usage = response.usage.clone().unwrap_or_default();
        let message = self.first_choice(response)?;

        Ok(CompletionResponse {
            content: message.content.unwrap_or_default(),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let messages: Vec<WireMessage> = request.messages.iter().map(WireMessage::from).collect();
        let tools: Vec<WireTool> = request.tools.iter().map(WireTool::from).collect();

        let response = self
            .call(WireRequest {
                model: &self.model,
                messages,
                tools: if tools.is_empty() { None } else { Some(tools) },
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            })
            .await?;

        let usage = response.usage.clone().unwrap_or_default();
        let message = self.first_choice(response)?;

        let mut tool_calls = Vec::new();
        for (index, call) in message.tool_calls.unwrap_or_default().into_iter().enumerate() {
            // Arguments arrive as a JSON-encoded string; malformed arguments
            // become an empty object so validation can reject them downstream.
            let arguments = serde_json::from_str(&call.function.arguments)
                .unwrap_or_else(|_| serde_json::json!({}));
            tool_calls.push(ToolCall {
                id: if call.id.is_empty() {
                    format!("call_{}", index)
                } else {
                    call.id
                },
                name: call.function.name,
                arguments,
            });
        }

        Ok(ToolCompletionResponse {
            content: message.content,
            tool_calls,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    temperature: f32,
    max_tokens: u32,
}

/// `content` is always a string, never null: several OpenAI-compatible
/// backends reject null content on assistant messages that carry tool calls.
#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|c| WireToolCall {
                        id: c.id.clone(),
                        kind: "function".to_string(),
                        function: WireFunctionCall {
                            name: c.name.clone(),
                            arguments: c.arguments.to_string(),
                        },
                    })
                    .collect(),
            )
        };
        Self {
            role,
            content: msg.content.clone(),
            tool_call_id: msg.tool_call_id.clone(),
            tool_calls,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

impl From<&ToolDefinition> for WireTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_message_from_tool_result() {
        let msg = ChatMessage::tool_result("call_1", "résultat");
        let wire = WireMessage::from(&msg);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_1"));
        assert!(wire.tool_calls.is_none());
    }

    #[test]
    fn wire_message_serializes_tool_calls_as_json_string() {
        let msg = ChatMessage::assistant_tool_calls(
            None,
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "search_job_offers".to_string(),
                arguments: serde_json::json!({"keywords": "développeur"}),
            }],
        );
        let wire = WireMessage::from(&msg);
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "search_job_offers");
        // Arguments must round-trip as a JSON-encoded string
        let parsed: serde_json::Value =
            serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(parsed["keywords"], "développeur");
        // Content must be an empty string, not null
        assert_eq!(wire.content, "");
    }

    #[test]
    fn parses_tool_call_response() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "abc",
                        "type": "function",
                        "function": {
                            "name": "search_knowledge",
                            "arguments": "{\"query\": \"CPF\"}"
                        }
                    }]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        });
        let response: WireResponse = serde_json::from_value(raw).unwrap();
        let message = response.choices.into_iter().next().unwrap().message;
        let calls = message.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "search_knowledge");
    }
}
