pub mod posting;
pub mod query;

pub use posting::Posting;
pub use query::SearchQuery;
