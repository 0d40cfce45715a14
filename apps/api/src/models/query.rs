/// One search request against the loaded postings. Built per search, then dropped.
///
/// Fields are normalized on construction: title and location are trimmed,
/// keywords are trimmed and blank entries removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub location: String,
    pub min_salary: u64,
    pub keywords: Vec<String>,
}

impl SearchQuery {
    pub fn new<I, S>(title: &str, location: &str, min_salary: u64, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SearchQuery {
            title: title.trim().to_string(),
            location: location.trim().to_string(),
            min_salary,
            keywords: clean_keywords(keywords),
        }
    }
}

/// Splits a comma-separated keyword field, e.g. `"Python, SQL, machine learning"`.
pub fn split_keywords(raw: &str) -> Vec<String> {
    clean_keywords(raw.split(','))
}

fn clean_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}
