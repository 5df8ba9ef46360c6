//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Agent behavior configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum model→tool rounds in a single turn before the loop is cut off.
    pub max_tool_rounds: usize,
    /// Maximum tokens requested per completion.
    pub max_completion_tokens: u32,
    /// Idle conversations are pruned from memory after this duration.
    pub thread_idle_timeout: Duration,
    /// Sampling temperature for completions.
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 8,
            max_completion_tokens: 4096,
            thread_idle_timeout: Duration::from_secs(3600), // 1 hour
            temperature: 0.7,
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
    /// Override for the chat-completions base URL (tests, proxies).
    pub base_url: Option<String>,
}

/// France Travail API settings.
#[derive(Debug, Clone)]
pub struct FranceTravailSettings {
    pub client_id: String,
    pub client_secret: SecretString,
    pub api_base_url: String,
    pub token_url: String,
}

/// Process-wide settings, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: LlmSettings,
    pub france_travail: FranceTravailSettings,
    /// Path of the conversation database. None disables persistence.
    pub db_path: Option<String>,
    /// Directory holding the knowledge seed JSON files.
    pub knowledge_dir: Option<PathBuf>,
    /// Directory where generated documents are written.
    pub documents_dir: PathBuf,
    /// Port for the HTTP shell.
    pub http_port: u16,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = std::env::var("MODEL_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let (backend, key_var, default_model) = match provider.as_str() {
            "openai" => (LlmBackend::OpenAi, "OPENAI_API_KEY", "gpt-4o"),
            "mistral" => (LlmBackend::Mistral, "MISTRAL_API_KEY", "mistral-large-latest"),
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "MODEL_PROVIDER".to_string(),
                    message: format!("unsupported provider '{}' (openai, mistral)", other),
                });
            }
        };

        let api_key = require_env(key_var)?;
        let model = std::env::var("MODEL_NAME").unwrap_or_else(|_| default_model.to_string());

        let ft_base = std::env::var("FRANCE_TRAVAIL_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.francetravail.io/partenaire".to_string());
        let token_url = std::env::var("FRANCE_TRAVAIL_TOKEN_URL").unwrap_or_else(|_| {
            "https://francetravail.io/connexion/oauth2/access_token".to_string()
        });

        Ok(Self {
            llm: LlmSettings {
                backend,
                api_key: SecretString::from(api_key),
                model,
                base_url: std::env::var("MODEL_BASE_URL").ok(),
            },
            france_travail: FranceTravailSettings {
                client_id: require_env("FRANCE_TRAVAIL_CLIENT_ID")?,
                client_secret: SecretString::from(require_env("FRANCE_TRAVAIL_CLIENT_SECRET")?),
                api_base_url: ft_base,
                token_url,
            },
            db_path: std::env::var("EMPLOI_ASSIST_DB_PATH").ok(),
            knowledge_dir: std::env::var("EMPLOI_ASSIST_KNOWLEDGE_DIR")
                .ok()
                .map(PathBuf::from),
            documents_dir: std::env::var("EMPLOI_ASSIST_DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./generated_documents")),
            http_port: std::env::var("EMPLOI_ASSIST_HTTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}
