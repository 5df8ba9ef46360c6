use std::sync::Arc;

use emploi_assist::agent::{Agent, AgentDeps, SpecializedChains};
use emploi_assist::api::{AuthClient, JobSearchClient};
use emploi_assist::config::{AgentConfig, Settings};
use emploi_assist::conversation::ConversationStore;
use emploi_assist::docs::DocumentGenerator;
use emploi_assist::http;
use emploi_assist::knowledge::{InMemoryKnowledgeBase, KnowledgeBase, loader};
use emploi_assist::llm::create_provider;
use emploi_assist::store::{Database, LibSqlBackend};
use emploi_assist::tools::ToolRegistry;
use emploi_assist::tools::builtin::{
    AdminInfoTool, DocumentTool, JobSearchTool, KnowledgeSearchTool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::from_env()?;
    let config = AgentConfig::default();

    eprintln!("🇫🇷 Emploi Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat API: http://0.0.0.0:{}/api/chat", settings.http_port);

    // ── LLM provider ────────────────────────────────────────────────
    let llm = create_provider(&settings.llm)?;

    // ── Conversation persistence ────────────────────────────────────
    let db: Option<Arc<dyn Database>> = match &settings.db_path {
        Some(path) => {
            let backend = LibSqlBackend::new_local(std::path::Path::new(path)).await?;
            eprintln!("   Database: {}", path);
            Some(Arc::new(backend))
        }
        None => None,
    };
    let conversations = Arc::new(ConversationStore::new(db));

    // ── External collaborators ──────────────────────────────────────
    let http_client = reqwest::Client::new();
    let auth = Arc::new(AuthClient::new(http_client, &settings.france_travail));
    let job_client = Arc::new(JobSearchClient::new(
        auth,
        &settings.france_travail.api_base_url,
    ));

    let knowledge = Arc::new(InMemoryKnowledgeBase::new());
    if let Some(dir) = &settings.knowledge_dir {
        let count = loader::load_seed_dir(knowledge.as_ref(), dir).await?;
        eprintln!("   Knowledge: {} documents from {}", count, dir.display());
    }
    let knowledge: Arc<dyn KnowledgeBase> = knowledge;

    let generator = Arc::new(DocumentGenerator::new(settings.documents_dir.clone()));

    // ── Tool registry ───────────────────────────────────────────────
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(JobSearchTool::new(Arc::clone(&job_client))));
    registry.register(Arc::new(KnowledgeSearchTool::new(Arc::clone(&knowledge))));
    registry.register(Arc::new(AdminInfoTool::new()));
    registry.register(Arc::new(DocumentTool::new(Arc::clone(&generator))));
    let registry = Arc::new(registry);
    eprintln!("   Tools: {}", registry.list().join(", "));

    // ── Agent ───────────────────────────────────────────────────────
    let chains = SpecializedChains::new(
        Arc::clone(&llm),
        config.max_completion_tokens,
        config.temperature,
    );
    let agent = Arc::new(Agent::new(
        config,
        AgentDeps {
            llm,
            tools: registry,
            conversations,
            chains,
        },
    ));

    let _pruning_handle = agent.spawn_pruning_task();

    // ── HTTP shell ──────────────────────────────────────────────────
    let app = http::routes(Arc::clone(&agent));
    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", settings.http_port)).await?;
    tracing::info!("Emploi Assist listening on port {}", settings.http_port);
    axum::serve(listener, app).await?;

    Ok(())
}
