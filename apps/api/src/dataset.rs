//! Dataset loader: reads the postings table once at startup and annotates it.
//!
//! The table is either a CSV file with a `Title,Location,Salary,Description`
//! header or a JSON array of records with the same keys; the file extension
//! decides. Rows missing a title, location or description are dropped here, so
//! the matching pipeline can assume every posting is complete.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::Posting;

/// On-disk encoding of the postings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// Picks the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(DatasetFormat::Csv),
            Some("json") => Ok(DatasetFormat::Json),
            _ => bail!(
                "Unsupported dataset extension for {} (expected .csv or .json)",
                path.display()
            ),
        }
    }
}

/// One row of the source table, columns named as in the published dataset.
#[derive(Debug, Deserialize)]
struct PostingRecord {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Location")]
    location: Option<String>,
    #[serde(rename = "Salary", default)]
    salary: Option<Value>,
    #[serde(rename = "Description")]
    description: Option<String>,
}

/// Loads the postings table from disk.
pub async fn load_postings(path: &Path) -> Result<Vec<Posting>> {
    let format = DatasetFormat::from_path(path)?;
    info!(?format, "Loading postings from {}", path.display());
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read dataset at {}", path.display()))?;
    parse_postings(&raw, format)
}

/// Parses and annotates postings: drops incomplete rows, normalizes salaries.
pub fn parse_postings(raw: &str, format: DatasetFormat) -> Result<Vec<Posting>> {
    let records = match format {
        DatasetFormat::Csv => read_csv(raw)?,
        DatasetFormat::Json => {
            serde_json::from_str(raw).context("Dataset must be a JSON array of postings")?
        }
    };
    let total = records.len();

    let postings: Vec<Posting> = records.into_iter().filter_map(into_posting).collect();

    info!(
        "Loaded {} postings ({} dropped for missing fields)",
        postings.len(),
        total - postings.len()
    );
    for p in postings.iter().take(5) {
        debug!(
            raw_salary = p.raw_salary().unwrap_or("<none>"),
            canonical_salary = p.canonical_salary(),
            "Sample cleaned salary"
        );
    }

    Ok(postings)
}

fn read_csv(raw: &str) -> Result<Vec<PostingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(raw.as_bytes());

    reader
        .deserialize::<PostingRecord>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Malformed CSV record {}", i + 1)))
        .collect()
}

fn into_posting(record: PostingRecord) -> Option<Posting> {
    let title = non_blank(record.title)?;
    let location = non_blank(record.location)?;
    let description = non_blank(record.description)?;
    let salary = match record.salary {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Some(Posting::new(title, location, salary, description))
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"Title": "Data Scientist", "Location": "New York, NY", "Salary": "$120,000 - $150,000 a year", "Description": "Python and SQL"},
        {"Title": "Data Analyst", "Location": "Remote", "Salary": null, "Description": "Dashboards"},
        {"Title": "ML Engineer", "Location": "Boston, MA", "Salary": 95000, "Description": "PyTorch"},
        {"Title": "No Location", "Location": null, "Salary": "100k", "Description": "Dropped"},
        {"Title": "   ", "Location": "Remote", "Description": "Dropped"},
        {"Title": "Missing Description", "Location": "Remote"}
    ]"#;

    const SAMPLE_CSV: &str = "Title,Location,Salary,Description\n\
        Data Scientist,\"New York, NY\",\"$120,000 - $150,000 a year\",\"Python, SQL and statistics\"\n\
        Data Analyst,Remote,,Dashboards\n\
        ML Engineer,\"Boston, MA\",95000,PyTorch\n\
        No Location,,100k,Dropped\n";

    fn temp_dataset(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let postings = parse_postings(SAMPLE, DatasetFormat::Json).unwrap();
        let titles: Vec<&str> = postings.iter().map(|p| p.title()).collect();
        assert_eq!(titles, vec!["Data Scientist", "Data Analyst", "ML Engineer"]);
    }

    #[test]
    fn test_salaries_are_annotated() {
        let postings = parse_postings(SAMPLE, DatasetFormat::Json).unwrap();
        assert_eq!(postings[0].canonical_salary(), 135_000);
        assert_eq!(postings[1].canonical_salary(), 0);
        assert_eq!(postings[2].raw_salary(), Some("95000"));
        assert_eq!(postings[2].canonical_salary(), 95_000);
        assert_eq!(postings[0].combined_text(), "data scientist python and sql");
    }

    #[test]
    fn test_non_array_is_an_error() {
        assert!(parse_postings(r#"{"Title": "x"}"#, DatasetFormat::Json).is_err());
    }

    #[test]
    fn test_csv_quoted_fields_are_kept_whole() {
        let postings = parse_postings(SAMPLE_CSV, DatasetFormat::Csv).unwrap();
        let titles: Vec<&str> = postings.iter().map(|p| p.title()).collect();
        assert_eq!(titles, vec!["Data Scientist", "Data Analyst", "ML Engineer"]);

        assert_eq!(postings[0].location, "New York, NY");
        assert_eq!(postings[0].raw_salary(), Some("$120,000 - $150,000 a year"));
        assert_eq!(postings[0].canonical_salary(), 135_000);
        assert_eq!(postings[1].raw_salary(), None);
        assert_eq!(postings[1].canonical_salary(), 0);
        assert_eq!(postings[2].raw_salary(), Some("95000"));
        assert_eq!(postings[2].canonical_salary(), 95_000);
    }

    #[test]
    fn test_csv_extra_columns_are_ignored() {
        let raw = "Unnamed,Title,Location,Salary,Description,Company\n\
                   0,Welder,Houston TX,$25 an hour,MIG welding,Acme\n";
        let postings = parse_postings(raw, DatasetFormat::Csv).unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].canonical_salary(), 52_000);
    }

    #[test]
    fn test_csv_ragged_row_is_an_error() {
        let raw = "Title,Location,Salary,Description\nWelder,Houston\n";
        let err = parse_postings(raw, DatasetFormat::Csv).unwrap_err();
        assert!(err.to_string().contains("Malformed CSV record 1"));
    }

    #[test]
    fn test_format_follows_extension() {
        assert_eq!(
            DatasetFormat::from_path(Path::new("jobs.CSV")).unwrap(),
            DatasetFormat::Csv
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("data/jobs.json")).unwrap(),
            DatasetFormat::Json
        );
        assert!(DatasetFormat::from_path(Path::new("jobs.xlsx")).is_err());
        assert!(DatasetFormat::from_path(Path::new("jobs")).is_err());
    }

    #[tokio::test]
    async fn test_load_postings_from_json_file() {
        let file = temp_dataset(".json", SAMPLE);
        let postings = load_postings(file.path()).await.unwrap();
        assert_eq!(postings.len(), 3);
    }

    #[tokio::test]
    async fn test_load_postings_from_csv_file() {
        let file = temp_dataset(".csv", SAMPLE_CSV);
        let postings = load_postings(file.path()).await.unwrap();
        assert_eq!(postings.len(), 3);
        assert_eq!(postings[0].location, "New York, NY");
        assert_eq!(postings[0].canonical_salary(), 135_000);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let err = load_postings(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read dataset"));
    }
}
