//! Staged search over the loaded postings.
//!
//! Stages run in a fixed order and each one narrows a fresh view of the previous
//! one: location → salary floor → keywords (AND) → semantic cluster. The search
//! stops as soon as the working set is empty; clustering never sees an empty set.
//!
//! Postings are only ever borrowed. Survivors keep their dataset order.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::matching::kmeans::{self, ClusteringConfig};
use crate::matching::vectorizer::{VectorizeError, Vectorizer};
use crate::models::{Posting, SearchQuery};

/// A posting that survived the search, with its cluster when semantic narrowing ran.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub posting: &'a Posting,
    pub cluster_id: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Initial,
    Location,
    Salary,
    Keyword { keyword: String },
    Cluster,
}

/// How many postings remained after a stage ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    #[serde(flatten)]
    pub stage: Stage,
    pub remaining: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<'a> {
    pub hits: Vec<SearchHit<'a>>,
    /// Only stages that actually ran are reported.
    pub stages: Vec<StageReport>,
    pub query_cluster: Option<usize>,
}

/// Reasons semantic narrowing is skipped; the search then keeps the filtered set.
#[derive(Debug, Error)]
enum NarrowingError {
    #[error(transparent)]
    Vectorize(#[from] VectorizeError),
    #[error("vector space has {rows} rows for {postings} postings")]
    RowCountMismatch { rows: usize, postings: usize },
    #[error("clustering produced no fit")]
    NoFit,
}

#[derive(Clone)]
pub struct MatchingPipeline {
    vectorizer: Arc<dyn Vectorizer>,
    clustering: ClusteringConfig,
}

impl MatchingPipeline {
    pub fn new(vectorizer: Arc<dyn Vectorizer>, clustering: ClusteringConfig) -> Self {
        MatchingPipeline {
            vectorizer,
            clustering,
        }
    }

    pub fn search<'a>(&self, dataset: &'a [Posting], query: &SearchQuery) -> SearchOutcome<'a> {
        let mut working: Vec<&'a Posting> = dataset.iter().collect();
        let mut stages = vec![report(Stage::Initial, working.len())];

        if !query.location.is_empty() {
            let needle = query.location.to_lowercase();
            working.retain(|p| p.location.to_lowercase().contains(&needle));
            stages.push(report(Stage::Location, working.len()));
        }

        if query.min_salary > 0 {
            working.retain(|p| p.canonical_salary() >= query.min_salary);
            stages.push(report(Stage::Salary, working.len()));
        }

        for keyword in &query.keywords {
            if working.is_empty() {
                break;
            }
            let needle = keyword.to_lowercase();
            working.retain(|p| {
                p.description().to_lowercase().contains(&needle)
                    || p.title().to_lowercase().contains(&needle)
            });
            stages.push(report(
                Stage::Keyword {
                    keyword: keyword.clone(),
                },
                working.len(),
            ));
        }

        if working.is_empty() {
            debug!("No postings match the basic filters; skipping clustering");
            return SearchOutcome {
                hits: Vec::new(),
                stages,
                query_cluster: None,
            };
        }

        if query.title.is_empty() {
            return SearchOutcome {
                hits: unclustered(working),
                stages,
                query_cluster: None,
            };
        }

        match self.narrow_by_cluster(&working, &query.title) {
            Ok((hits, query_cluster)) => {
                stages.push(report(Stage::Cluster, hits.len()));
                debug!(query_cluster, remaining = hits.len(), "Query assigned to cluster");
                SearchOutcome {
                    hits,
                    stages,
                    query_cluster: Some(query_cluster),
                }
            }
            Err(e) => {
                warn!("Skipping semantic narrowing: {e}");
                SearchOutcome {
                    hits: unclustered(working),
                    stages,
                    query_cluster: None,
                }
            }
        }
    }

    fn narrow_by_cluster<'a>(
        &self,
        working: &[&'a Posting],
        title: &str,
    ) -> Result<(Vec<SearchHit<'a>>, usize), NarrowingError> {
        let documents: Vec<&str> = working.iter().map(|p| p.combined_text()).collect();
        let space = self.vectorizer.fit(&documents)?;
        if space.rows().len() != working.len() {
            return Err(NarrowingError::RowCountMismatch {
                rows: space.rows().len(),
                postings: working.len(),
            });
        }

        let clusters =
            kmeans::fit(space.rows(), &self.clustering).ok_or(NarrowingError::NoFit)?;

        let query_cluster = clusters.predict(&space.project(&title.to_lowercase()));

        let hits = working
            .iter()
            .zip(&clusters.labels)
            .filter(|(_, &label)| label == query_cluster)
            .map(|(&posting, &label)| SearchHit {
                posting,
                cluster_id: Some(label),
            })
            .collect();

        Ok((hits, query_cluster))
    }
}

fn report(stage: Stage, remaining: usize) -> StageReport {
    debug!(?stage, remaining, "Search stage applied");
    StageReport { stage, remaining }
}

fn unclustered(postings: Vec<&Posting>) -> Vec<SearchHit<'_>> {
    postings
        .into_iter()
        .map(|posting| SearchHit {
            posting,
            cluster_id: None,
        })
        .collect()
}
