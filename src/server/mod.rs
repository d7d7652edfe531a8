//! HTTP server — JSON API under `/api/` plus a static landing page.
//!
//! `run()` drives the axum event loop; the [`CancellationToken`] passed in
//! is wired to axum's graceful shutdown.
//!
//! ## URL layout
//!
//! ```text
//! GET    /                                        landing page
//! GET    /api/health
//! GET    /api/tools
//! POST   /api/tools/{story|worksheet|explainer|planner|game|analyzer}
//! POST   /api/media/image
//! POST   /api/media/speech
//! POST   /api/notebooks
//! DELETE /api/notebooks/{id}
//! GET    /api/notebooks/{id}/sources
//! POST   /api/notebooks/{id}/sources/text
//! POST   /api/notebooks/{id}/sources/upload
//! POST   /api/notebooks/{id}/sources/{source_id}/toggle
//! DELETE /api/notebooks/{id}/sources/{source_id}
//! GET    /api/notebooks/{id}/messages
//! DELETE /api/notebooks/{id}/messages
//! POST   /api/notebooks/{id}/chat
//! GET    /favicon.ico                             → 204
//! ```

mod api;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::llm::LlmProvider;
use crate::notebook::NotebookStore;
use crate::prompt::PromptLibrary;
use crate::sources::Ingestor;
use crate::tools::{analyzer, explainer, game, planner, story, worksheet};

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — all fields are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub studio_name: Arc<str>,
    pub llm: Arc<LlmProvider>,
    pub prompts: Arc<PromptLibrary>,
    pub notebooks: Arc<NotebookStore>,
    pub ingestor: Arc<Ingestor>,
    /// Upper bound for one request, LLM round-trip included.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config, llm: LlmProvider, prompts: PromptLibrary) -> Self {
        Self {
            studio_name: Arc::from(config.studio_name.as_str()),
            llm: Arc::new(llm),
            prompts: Arc::new(prompts),
            notebooks: Arc::new(NotebookStore::new()),
            ingestor: Arc::new(Ingestor::new(config.ingest.clone())),
            request_timeout: Duration::from_secs(config.server.request_timeout_seconds),
        }
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

pub async fn run(
    bind_addr: &str,
    max_body_bytes: usize,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let studio = state.studio_name.clone();
    let router = build_router(state, max_body_bytes);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%studio, %bind_addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("axum server error: {e}")))?;

    info!(%studio, "http server shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        // Catalog & health
        .route("/api/health",                                    get(api::health))
        .route("/api/tools",                                     get(api::tools))
        // Tools
        .route("/api/tools/story",                               post(api::run_tool::<story::StoryTool>))
        .route("/api/tools/worksheet",                           post(api::run_tool::<worksheet::WorksheetTool>))
        .route("/api/tools/explainer",                           post(api::run_tool::<explainer::ExplainerTool>))
        .route("/api/tools/planner",                             post(api::run_tool::<planner::PlannerTool>))
        .route("/api/tools/game",                                post(api::run_tool::<game::GameTool>))
        .route("/api/tools/analyzer",                            post(api::run_tool::<analyzer::AnalyzerTool>))
        // Media
        .route("/api/media/image",                               post(api::media_image))
        .route("/api/media/speech",                              post(api::media_speech))
        // Notebooks
        .route("/api/notebooks",                                 post(api::create_notebook))
        .route("/api/notebooks/{id}",                            delete(api::delete_notebook))
        .route("/api/notebooks/{id}/sources",                    get(api::list_sources))
        .route("/api/notebooks/{id}/sources/text",               post(api::add_text_source))
        .route("/api/notebooks/{id}/sources/upload",             post(api::upload_source))
        .route("/api/notebooks/{id}/sources/{source_id}/toggle", post(api::toggle_source))
        .route("/api/notebooks/{id}/sources/{source_id}",        delete(api::remove_source))
        .route("/api/notebooks/{id}/messages",                   get(api::messages).delete(api::clear_messages))
        .route("/api/notebooks/{id}/chat",                       post(api::chat))
        // UI
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .route("/",            get(ui::root))
        .fallback(ui::not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
