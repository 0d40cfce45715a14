pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers as jobs;
use crate::salary::handlers as salary;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs/search", post(jobs::handle_search))
        // Salary API
        .route("/api/v1/salary/normalize", get(salary::handle_normalize))
        .with_state(state)
}
