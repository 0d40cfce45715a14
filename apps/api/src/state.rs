use std::sync::Arc;

use crate::matching::MatchingPipeline;
use crate::models::Posting;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup and never mutated; searches only borrow from it.
    pub postings: Arc<Vec<Posting>>,
    /// Vectorizer backend plus seeded clustering config.
    pub pipeline: MatchingPipeline,
}
