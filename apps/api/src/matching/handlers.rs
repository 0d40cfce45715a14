//! Axum route handlers for the Jobs API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::errors::AppError;
use crate::matching::pipeline::{SearchHit, StageReport};
use crate::models::query::split_keywords;
use crate::models::SearchQuery;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Keywords as a JSON array or a single comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KeywordsInput {
    List(Vec<String>),
    CommaSeparated(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Any JSON number; range and integrality are checked in `into_query`.
    #[serde(default)]
    pub min_salary: Option<Number>,
    #[serde(default)]
    pub keywords: Option<KeywordsInput>,
    /// Include per-stage counts in the response.
    #[serde(default)]
    pub debug: bool,
}

impl SearchRequest {
    /// Validates the request and builds the core query.
    pub fn into_query(self) -> Result<SearchQuery, AppError> {
        let min_salary = match self.min_salary {
            None => 0,
            Some(n) => match n.as_u64() {
                Some(v) => v,
                None if n.as_f64().is_some_and(|v| v < 0.0) => {
                    return Err(AppError::Validation(
                        "min_salary cannot be negative".to_string(),
                    ))
                }
                None => {
                    return Err(AppError::Validation(format!(
                        "min_salary must be a whole number of at most {}, got {n}",
                        u64::MAX
                    )))
                }
            },
        };

        let keywords = match self.keywords {
            Some(KeywordsInput::List(list)) => list,
            Some(KeywordsInput::CommaSeparated(raw)) => split_keywords(&raw),
            None => Vec::new(),
        };

        Ok(SearchQuery::new(
            self.title.as_deref().unwrap_or(""),
            self.location.as_deref().unwrap_or(""),
            min_salary,
            keywords,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub title: String,
    pub location: String,
    pub salary: Option<String>,
    pub canonical_salary: u64,
    pub description: String,
    pub cluster: Option<usize>,
}

impl From<&SearchHit<'_>> for SearchResultItem {
    fn from(hit: &SearchHit<'_>) -> Self {
        SearchResultItem {
            title: hit.posting.title().to_string(),
            location: hit.posting.location.clone(),
            salary: hit.posting.raw_salary().map(str::to_string),
            canonical_salary: hit.posting.canonical_salary(),
            description: hit.posting.description().to_string(),
            cluster: hit.cluster_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub query_cluster: Option<usize>,
    pub results: Vec<SearchResultItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<StageReport>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/search
///
/// Location → salary floor → keywords → title cluster. Returns survivors in dataset order.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let debug = request.debug;
    let query = request.into_query()?;

    let postings = state.postings.clone();
    let pipeline = state.pipeline.clone();

    // CPU-bound vectorization + clustering runs off the async executor.
    let response = tokio::task::spawn_blocking(move || {
        let outcome = pipeline.search(&postings, &query);
        SearchResponse {
            total: outcome.hits.len(),
            query_cluster: outcome.query_cluster,
            results: outcome.hits.iter().map(SearchResultItem::from).collect(),
            stages: debug.then_some(outcome.stages),
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in search: {e}")))?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_negative_min_salary_rejected() {
        let request = SearchRequest {
            min_salary: Some(Number::from(-1)),
            ..SearchRequest::default()
        };
        assert!(matches!(request.into_query(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_comma_separated_keywords_are_split() {
        let request: SearchRequest =
            serde_json::from_value(json!({ "keywords": "Python, SQL, ,machine learning" }))
                .unwrap();
        let query = request.into_query().unwrap();
        assert_eq!(query.keywords, vec!["Python", "SQL", "machine learning"]);
    }

    #[test]
    fn test_keyword_list_is_trimmed() {
        let request: SearchRequest =
            serde_json::from_value(json!({ "keywords": [" rust ", ""], "min_salary": 90000 }))
                .unwrap();
        let query = request.into_query().unwrap();
        assert_eq!(query.keywords, vec!["rust"]);
        assert_eq!(query.min_salary, 90_000);
    }

    #[test]
    fn test_min_salary_accepts_full_unsigned_range() {
        let request: SearchRequest =
            serde_json::from_value(json!({ "min_salary": u64::MAX })).unwrap();
        assert_eq!(request.into_query().unwrap().min_salary, u64::MAX);
    }

    #[test]
    fn test_fractional_or_oversized_min_salary_rejected() {
        for raw in [r#"{"min_salary": 1.5}"#, r#"{"min_salary": 1e30}"#] {
            let request: SearchRequest = serde_json::from_str(raw).unwrap();
            assert!(
                matches!(request.into_query(), Err(AppError::Validation(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_negative_fractional_min_salary_rejected() {
        let request: SearchRequest =
            serde_json::from_value(json!({ "min_salary": -0.5 })).unwrap();
        match request.into_query() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("negative")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_default_to_empty_query() {
        let request: SearchRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.into_query().unwrap(), SearchQuery::default());
    }
}
