mod archive;
mod config;
mod db;
mod errors;
mod evaluation;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::archive::{PgTranscriptArchive, TranscriptArchive};
use crate::config::Config;
use crate::db::create_pool;
use crate::evaluation::EvaluationPipeline;
use crate::interview::engine::Interviewer;
use crate::interview::question_bank::QuestionBank;
use crate::interview::store::SessionStore;
use crate::llm_client::{CompletionGateway, GigaChatClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let gateway: Arc<dyn CompletionGateway> = Arc::new(
        GigaChatClient::new(
            config.gigachat_auth_key.clone(),
            config.gigachat_scope.clone(),
            config.accept_invalid_certs,
        )?
        .with_endpoints(
            config.gigachat_oauth_url.clone(),
            config.gigachat_completions_url.clone(),
        ),
    );
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize the interview archive (optional)
    let archive = build_archive(&config).await;

    let interviewer = Interviewer::new(
        Arc::new(SessionStore::new()),
        QuestionBank::new(gateway.clone(), config.question_source),
        EvaluationPipeline::new(gateway, config.evaluation_mode),
        archive,
    );
    info!(
        "Interviewer ready: questions={:?}, evaluation={:?}",
        config.question_source, config.evaluation_mode
    );

    // Build app state
    let state = AppState {
        interviewer: Arc::new(interviewer),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects the PostgreSQL archive when `DATABASE_URL` is set. A database
/// that cannot be reached disables archival instead of aborting startup.
async fn build_archive(config: &Config) -> Option<Arc<dyn TranscriptArchive>> {
    let Some(database_url) = &config.database_url else {
        info!("DATABASE_URL not set; interview archive disabled");
        return None;
    };

    let archive = match create_pool(database_url).await {
        Ok(pool) => PgTranscriptArchive::new(pool),
        Err(e) => {
            warn!("Interview archive disabled, database unavailable: {e:#}");
            return None;
        }
    };
    if let Err(e) = archive.ensure_schema().await {
        warn!("Interview archive disabled: {e:#}");
        return None;
    }
    Some(Arc::new(archive))
}
