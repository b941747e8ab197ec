use std::sync::Arc;

use onboard_assist::agent::AgentRunner;
use onboard_assist::config::AppConfig;
use onboard_assist::directory::HttpDirectory;
use onboard_assist::llm::{LlmConfig, create_provider};
use onboard_assist::schema::HttpQuestionSource;
use onboard_assist::server::{AppState, router};
use onboard_assist::service::OnboardingService;
use onboard_assist::session::{MemoryStore, SessionManager, SessionStore};

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

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  required: ONBOARD_QUESTION_SOURCE_URL, ONBOARD_DIRECTORY_URL,");
        eprintln!("            ONBOARD_DIRECTORY_KEY, ONBOARD_LLM_API_KEY");
        std::process::exit(1);
    });

    eprintln!("🛎  Onboard Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm_model);
    eprintln!("   Question source: {}", config.question_source_url);
    eprintln!("   Listening on: http://{}\n", config.bind_addr);

    // ── LLM provider ─────────────────────────────────────────────────
    let llm_config = LlmConfig {
        backend: config.llm_backend,
        api_key: config.llm_api_key.clone(),
        model: config.llm_model.clone(),
    };
    let llm = create_provider(&llm_config)?;

    // ── Core services ────────────────────────────────────────────────
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let source = Arc::new(HttpQuestionSource::new(
        config.question_source_url.clone(),
        config.source_timeout,
    ));
    let directory = Arc::new(HttpDirectory::new(
        config.directory_url.clone(),
        config.directory_key.clone(),
        config.directory_timeout,
    ));
    let service = Arc::new(OnboardingService::new(source, Arc::clone(&store), directory));
    let sessions = Arc::new(SessionManager::new(store));
    let agent = Arc::new(AgentRunner::new(llm, Arc::clone(&service)));

    // Spawn session pruning task
    let session_mgr = Arc::clone(&sessions);
    let idle_timeout = config.session_idle_timeout;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600)); // Every 10 min
        interval.tick().await; // Skip immediate first tick
        loop {
            interval.tick().await;
            session_mgr.prune_stale(idle_timeout).await;
        }
    });

    // ── HTTP server ──────────────────────────────────────────────────
    let app = router(AppState {
        service,
        sessions,
        agent,
    });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Onboarding server started");
    axum::serve(listener, app).await?;

    Ok(())
}
