use serde::Serialize;

use crate::salary;

/// One job listing, annotated with its canonical salary.
///
/// Title and description are private so `combined_text` can never drift from them.
/// Cluster assignments live on the per-search hit, never on the shared posting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posting {
    title: String,
    pub location: String,
    raw_salary: Option<String>,
    description: String,
    canonical_salary: u64,
    #[serde(skip)]
    combined_text: String,
}

impl Posting {
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        raw_salary: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let description = description.into();
        let canonical_salary = salary::normalize(raw_salary.as_deref());
        let combined_text = combine(&title, &description);

        Posting {
            title,
            location: location.into(),
            raw_salary,
            description,
            canonical_salary,
            combined_text,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn raw_salary(&self) -> Option<&str> {
        self.raw_salary.as_deref()
    }

    /// Annualized salary; 0 means unknown.
    pub fn canonical_salary(&self) -> u64 {
        self.canonical_salary
    }

    /// Lower-cased title and description, the text the vector space is built from.
    pub fn combined_text(&self) -> &str {
        &self.combined_text
    }

    #[cfg(test)]
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.combined_text = combine(&self.title, &self.description);
    }

    #[cfg(test)]
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.combined_text = combine(&self.title, &self.description);
    }
}

fn combine(title: &str, description: &str) -> String {
    format!("{} {}", title.to_lowercase(), description.to_lowercase())
}
