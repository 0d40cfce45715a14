use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::matching::{ClusteringConfig, TfidfConfig};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub kmeans_seed: u64,
    pub kmeans_n_init: usize,
    pub kmeans_max_clusters: usize,
    pub tfidf_max_features: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            dataset_path: PathBuf::from(require_env("DATASET_PATH")?),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            kmeans_seed: env_or("KMEANS_SEED", 42)?,
            kmeans_n_init: env_or("KMEANS_N_INIT", 10)?,
            kmeans_max_clusters: env_or("KMEANS_MAX_CLUSTERS", 5)?,
            tfidf_max_features: env_or("TFIDF_MAX_FEATURES", 1000)?,
        })
    }

    pub fn clustering(&self) -> ClusteringConfig {
        ClusteringConfig {
            max_clusters: self.kmeans_max_clusters,
            n_init: self.kmeans_n_init,
            seed: self.kmeans_seed,
            ..ClusteringConfig::default()
        }
    }

    pub fn tfidf(&self) -> TfidfConfig {
        TfidfConfig {
            max_features: Some(self.tfidf_max_features),
            ..TfidfConfig::default()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
