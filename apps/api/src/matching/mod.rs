// Job matching: staged filters followed by TF-IDF + k-means semantic narrowing.
// Searches are CPU-bound and synchronous; handlers run them via spawn_blocking.

pub mod handlers;
pub mod kmeans;
pub mod pipeline;
pub mod stop_words;
pub mod vectorizer;

pub use kmeans::ClusteringConfig;
pub use pipeline::MatchingPipeline;
pub use vectorizer::{TfidfConfig, TfidfVectorizer};
