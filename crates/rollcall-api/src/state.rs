//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over repository/provider traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use rollcall_core::chat::service::ChatService;
use rollcall_core::gate::service::SessionGate;
use rollcall_core::gate::session::SessionStore;
use rollcall_core::llm::retry::RetryPolicy;
use rollcall_infra::config::{load_config, resolve_data_dir};
use rollcall_infra::export::DocxExporter;
use rollcall_infra::llm::openai::OpenAiProvider;
use rollcall_infra::sqlite::pool::DatabasePool;
use rollcall_infra::sqlite::roster::SqliteRosterRepository;
use rollcall_types::config::AppConfig;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteRosterRepository, OpenAiProvider>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub sessions: Arc<SessionStore>,
    pub exporter: Arc<DocxExporter>,
    pub config: AppConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to the store,
    /// wire the gate, provider, and exporter.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("rollcall.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let roster = SqliteRosterRepository::new(db_pool);
        let gate = SessionGate::new(roster);

        // The key itself never lives in the config file; only the name of
        // the environment variable holding it.
        let api_key = std::env::var(&config.llm.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!(
                env = %config.llm.api_key_env,
                "completion provider API key not set; chat turns will fail"
            );
        }
        let provider = OpenAiProvider::new(
            SecretString::from(api_key),
            config.llm.base_url.clone(),
            Duration::from_secs(config.llm.timeout_secs),
        );

        let retry = RetryPolicy::from(&config.retry);
        let chat_service = ChatService::new(gate, provider, config.llm.clone(), retry);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            sessions: Arc::new(SessionStore::new()),
            exporter: Arc::new(DocxExporter::new()),
            config,
            data_dir,
        })
    }
}
