//! TF-IDF vector space over posting text.
//!
//! `Vectorizer` is the seam the pipeline depends on; `TfidfVectorizer` is the
//! default backend. A fit produces a `TermSpace` holding the document rows plus
//! the fitted vocabulary and IDF weights, so later projections never refit.
//!
//! Weighting: raw term counts × smoothed IDF `ln((1 + n) / (1 + df)) + 1`,
//! then each row is L2-normalized. Tokens are runs of 2+ word characters.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::matching::stop_words::is_stop_word;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern must compile"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorizeError {
    #[error("empty vocabulary: documents contain only stop words or no tokens")]
    EmptyVocabulary,
}

/// Builds a vector space from a batch of documents.
pub trait Vectorizer: Send + Sync {
    fn fit(&self, documents: &[&str]) -> Result<TermSpace, VectorizeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfidfConfig {
    /// Keep only the most frequent terms across the corpus. `None` keeps everything.
    pub max_features: Option<usize>,
    /// Inclusive `(min_n, max_n)`.
    pub ngram_range: (usize, usize),
    pub remove_stop_words: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        TfidfConfig {
            max_features: Some(1000),
            ngram_range: (1, 2),
            remove_stop_words: true,
        }
    }
}

/// Lower-cases, tokenizes, drops stop words and emits word n-grams.
#[derive(Debug, Clone)]
struct Analyzer {
    ngram_range: (usize, usize),
    remove_stop_words: bool,
}

impl Analyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !(self.remove_stop_words && is_stop_word(t)))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    fn counts(&self, text: &str) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for term in self.analyze(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
}

impl TfidfVectorizer {
    pub fn new(config: TfidfConfig) -> Self {
        TfidfVectorizer { config }
    }
}

impl Vectorizer for TfidfVectorizer {
    fn fit(&self, documents: &[&str]) -> Result<TermSpace, VectorizeError> {
        let analyzer = Analyzer {
            ngram_range: self.config.ngram_range,
            remove_stop_words: self.config.remove_stop_words,
        };

        let doc_counts: Vec<HashMap<String, u32>> =
            documents.iter().map(|d| analyzer.counts(d)).collect();

        // term -> (corpus frequency, document frequency)
        let mut stats: HashMap<&str, (u64, u64)> = HashMap::new();
        for counts in &doc_counts {
            for (term, &count) in counts {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += u64::from(count);
                entry.1 += 1;
            }
        }

        if stats.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        let mut ranked: Vec<(&str, u64, u64)> =
            stats.into_iter().map(|(t, (tf, df))| (t, tf, df)).collect();
        if let Some(limit) = self.config.max_features {
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            ranked.truncate(limit);
        }
        // Column order is alphabetical.
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = documents.len() as f64;
        let vocabulary: Vec<String> = ranked.iter().map(|(t, _, _)| t.to_string()).collect();
        let idf: Vec<f64> = ranked
            .iter()
            .map(|&(_, _, df)| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        let index: HashMap<String, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let mut space = TermSpace {
            analyzer,
            vocabulary,
            index,
            idf,
            rows: Vec::with_capacity(doc_counts.len()),
        };
        space.rows = doc_counts.iter().map(|c| space.weigh(c)).collect();

        Ok(space)
    }
}

/// A fitted vocabulary with the TF-IDF rows of the documents it was fit on.
#[derive(Debug, Clone)]
pub struct TermSpace {
    analyzer: Analyzer,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<Vec<f64>>,
}

impl TermSpace {
    /// One L2-normalized row per fitted document, in input order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[cfg(test)]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    #[cfg(test)]
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Maps unseen text into the fitted space. Out-of-vocabulary terms are ignored.
    pub fn project(&self, text: &str) -> Vec<f64> {
        self.weigh(&self.analyzer.counts(text))
    }

    fn weigh(&self, counts: &HashMap<String, u32>) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for (term, &count) in counts {
            if let Some(&col) = self.index.get(term) {
                row[col] = f64::from(count) * self.idf[col];
            }
        }

        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut row {
                *v /= norm;
            }
        }
        row
    }
}
