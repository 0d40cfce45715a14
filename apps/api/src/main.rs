mod config;
mod dataset;
mod errors;
mod matching;
mod models;
mod routes;
mod salary;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::dataset::load_postings;
use crate::matching::{MatchingPipeline, TfidfVectorizer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Search API v{}", env!("CARGO_PKG_VERSION"));

    // Load and annotate the postings table once; read-only from here on
    let postings = Arc::new(load_postings(&config.dataset_path).await?);

    // Initialize matching pipeline (TF-IDF vectorizer + seeded k-means)
    let clustering = config.clustering();
    let pipeline = MatchingPipeline::new(
        Arc::new(TfidfVectorizer::new(config.tfidf())),
        clustering.clone(),
    );
    info!(
        "Matching pipeline: max_clusters={} n_init={} seed={} max_features={}",
        clustering.max_clusters, clustering.n_init, clustering.seed, config.tfidf_max_features
    );

    let state = AppState { postings, pipeline };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
