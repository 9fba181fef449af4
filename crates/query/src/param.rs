use serde::{Deserialize, Serialize};

/// A recognised URL query parameter with its decoded, unvalidated value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryParam {
    Category(String),
    /// `q` or `search`.
    Search(String),
    Sort(String),
    Page(String),
    Product(String),
    /// `rating` or `minRating`.
    MinRating(String),
    Unknown { key: String, value: String },
}

impl QueryParam {
    pub fn from_pair(key: String, value: String) -> Self {
        match key.as_str() {
            "category" => QueryParam::Category(value),
            "q" | "search" => QueryParam::Search(value),
            "sort" => QueryParam::Sort(value),
            "page" => QueryParam::Page(value),
            "product" => QueryParam::Product(value),
            "rating" | "minRating" => QueryParam::MinRating(value),
            _ => QueryParam::Unknown { key, value },
        }
    }
}
