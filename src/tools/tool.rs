//! Tool abstraction for agent capabilities.

use std::time::Duration;

use async_trait::async_trait;

/// Context handed to a tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Conversation thread the call belongs to (logging only).
    pub thread_id: String,
}

impl ToolContext {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }
}

/// Result of a successful tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Text fed back to the model.
    pub content: String,
    pub duration: Duration,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>, duration: Duration) -> Self {
        Self {
            content: content.into(),
            duration,
        }
    }

    /// Pretty-printed JSON output.
    pub fn json(value: &serde_json::Value, duration: Duration) -> Self {
        Self {
            content: serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| value.to_string()),
            duration,
        }
    }
}

/// Errors a tool may return. The executor converts these into tool-result
/// error strings fed back to the model; they never abort the loop.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Paramètres invalides : {0}")]
    InvalidParameters(String),

    #[error("{0}")]
    ExecutionFailed(String),
}

/// A named, schema-validated operation the agent loop may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name (model-facing).
    fn name(&self) -> &str;

    /// Description used by the model for tool selection.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with validated arguments.
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;
}

// ── Argument helpers ────────────────────────────────────────────────

/// Require a non-empty string parameter.
pub fn require_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("champ requis manquant : {}", key)))
}

/// Optional string parameter; absent or empty yields None.
pub fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Optional unsigned integer parameter with a default.
pub fn u64_or(params: &serde_json::Value, key: &str, default: u64) -> u64 {
    params.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
}
