//! Per-thread conversation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::intent::Intent;
use crate::llm::Role;

/// Outcome of a single tool invocation, kept for observability and for
/// rendering the assistant turn that requested it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum ToolOutcome {
    Ok(String),
    Error(String),
}

/// Record of one tool call requested by the model during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    pub name: String,
    pub arguments: serde_json::Value,
    pub outcome: ToolOutcome,
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Tool calls made while producing this message (assistant messages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocationRecord>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_tool_calls(mut self, records: Vec<ToolInvocationRecord>) -> Self {
        self.tool_calls = records;
        self
    }
}

/// Free-form user profile shared by the caller.
///
/// Read-mostly input: the core renders it into prompts and only writes back
/// fields supplied by the caller, never invented values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.situation.is_none()
            && self.skills.is_empty()
            && self.target_job.is_none()
            && self.preferences.is_none()
    }

    /// Overlay fields supplied by the caller onto the stored profile.
    pub fn merge(&mut self, incoming: UserProfile) {
        if incoming.name.is_some() {
            self.name = incoming.name;
        }
        if incoming.situation.is_some() {
            self.situation = incoming.situation;
        }
        if !incoming.skills.is_empty() {
            self.skills = incoming.skills;
        }
        if incoming.target_job.is_some() {
            self.target_job = incoming.target_job;
        }
        if incoming.preferences.is_some() {
            self.preferences = incoming.preferences;
        }
    }

    /// Render the profile as context lines for prompts.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "Utilisateur non identifié - Première interaction".to_string();
        }
        let mut lines = Vec::new();
        if let Some(name) = &self.name {
            lines.push(format!("Nom : {}", name));
        }
        if let Some(situation) = &self.situation {
            lines.push(format!("Situation : {}", situation));
        }
        if !self.skills.is_empty() {
            lines.push(format!("Compétences : {}", self.skills.join(", ")));
        }
        if let Some(target_job) = &self.target_job {
            lines.push(format!("Métier visé : {}", target_job));
        }
        if let Some(preferences) = &self.preferences {
            lines.push(format!("Préférences : {}", preferences));
        }
        lines.join("\n")
    }
}

/// State of one conversation thread.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub thread_id: String,
    /// Ordered message history. Append-only within a turn.
    pub messages: Vec<Message>,
    pub user_profile: UserProfile,
    /// Last classified intent. Per-turn scratch, overwritten each turn.
    pub current_intent: Option<Intent>,
    /// Last specialized-chain output awaiting formatting. Cleared once
    /// folded into `messages`.
    pub specialized_response: Option<String>,
    pub last_active_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            user_profile: UserProfile::default(),
            current_intent: None,
            specialized_response: None,
            last_active_at: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_renders_unidentified_user() {
        let profile = UserProfile::default();
        assert_eq!(
            profile.summary(),
            "Utilisateur non identifié - Première interaction"
        );
    }

    #[test]
    fn profile_summary_lists_provided_fields() {
        let profile = UserProfile {
            name: Some("Jean Dupont".to_string()),
            skills: vec!["Python".to_string(), "Rust".to_string()],
            ..Default::default()
        };
        let summary = profile.summary();
        assert!(summary.contains("Jean Dupont"));
        assert!(summary.contains("Python, Rust"));
        assert!(!summary.contains("Situation"));
    }

    #[test]
    fn merge_overlays_only_provided_fields() {
        let mut profile = UserProfile {
            name: Some("Jean".to_string()),
            situation: Some("En recherche".to_string()),
            ..Default::default()
        };
        profile.merge(UserProfile {
            name: Some("Jeanne".to_string()),
            ..Default::default()
        });
        assert_eq!(profile.name.as_deref(), Some("Jeanne"));
        assert_eq!(profile.situation.as_deref(), Some("En recherche"));
    }

    #[test]
    fn new_state_is_empty() {
        let state = ConversationState::new("t1");
        assert!(state.messages.is_empty());
        assert!(state.current_intent.is_none());
        assert!(state.specialized_response.is_none());
    }
}
