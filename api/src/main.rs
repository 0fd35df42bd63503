mod handlers;
mod query_payload;

use anyhow::{Context, Result};
use handlers::{create_router, AppState};
use nirmai_qa::{
    spawn_load, Config, Corpus, CorpusBudget, DocumentProcessor, OpenAIService, QueryService,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        log::error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    // The listener comes up immediately; queries are gated until the load finishes
    let corpus = Corpus::new();
    spawn_load(
        corpus.clone(),
        Arc::new(DocumentProcessor::new()),
        config.documents.clone(),
    );

    let chat_client = Arc::new(OpenAIService::new(&config));
    let mut query_service = QueryService::new(corpus, chat_client, config.verbose);
    if let Some(max_tokens) = config.max_corpus_tokens {
        log::info!("Corpus capped at {} tokens per prompt", max_tokens);
        query_service = query_service.with_budget(CorpusBudget::new(max_tokens)?);
    }

    let app = create_router(AppState {
        query_service: Arc::new(query_service),
        documents: Arc::new(config.documents.clone()),
        verbose: config.verbose,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("HTTP server error")?;
    Ok(())
}
