//! Puddle API /v1: REST endpoints over the SPML import pipeline
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use puddle_store::{
    DictionaryService, DocumentStore, FileStore, MemorySignStore, MemoryStore, SignStore,
    SpmlService,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use metrics::Metrics;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub documents: SpmlService<dyn DocumentStore>,
    pub dictionaries: DictionaryService<dyn SignStore>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        signs: Arc<dyn SignStore>,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            documents: SpmlService::new(documents),
            dictionaries: DictionaryService::new(signs),
            metrics: Arc::new(Metrics::new()?),
        })
    }

    pub fn in_memory() -> Result<Self, prometheus::Error> {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemorySignStore::new()))
    }

    /// File-backed documents when `data_dir` is set, memory otherwise.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let documents: Arc<dyn DocumentStore> = match &config.data_dir {
            Some(dir) => {
                let store = FileStore::open(dir)
                    .with_context(|| format!("cannot open data dir {}", dir.display()))?;
                tracing::info!(dir = %dir.display(), "using file document store");
                Arc::new(store)
            }
            None => {
                tracing::info!("using in-memory document store");
                Arc::new(MemoryStore::new())
            }
        };
        let state = Self::new(documents, Arc::new(MemorySignStore::new()))
            .context("cannot register metrics")?;
        Ok(state)
    }
}

pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/v1/spml", get(handlers::list_documents))
        .route("/v1/spml/import", post(handlers::import_document))
        .route("/v1/spml/stats", get(handlers::document_stats))
        .route(
            "/v1/spml/{id}",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        .route("/v1/spml/{id}/export", get(handlers::export_document))
        .route("/v1/dictionaries", get(handlers::list_dictionaries))
        .route("/v1/dictionaries/import", post(handlers::import_dictionary))
        .route("/v1/dictionaries/{id}/signs", get(handlers::dictionary_signs))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors())
                .layer(axum::middleware::from_fn(middleware::log_requests)),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = create_app(state, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!("Puddle API listening on {}", config.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Puddle API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
