use std::fmt;

use serde::{Deserialize, Serialize};
use wasui_core::Category;

/// Category selection. Unknown categories degrade to [`CategoryFilter::All`]
/// at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// `"all"` and blank input select everything.
    pub fn parse(raw: &str) -> Self {
        match Category::new(raw) {
            Some(c) if c.as_str() != "all" => CategoryFilter::Only(c),
            _ => CategoryFilter::All,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    RatingHigh,
    RatingLow,
    FeaturedFirst,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" => Some(SortKey::Newest),
            "oldest" => Some(SortKey::Oldest),
            "rating-high" => Some(SortKey::RatingHigh),
            "rating-low" => Some(SortKey::RatingLow),
            "featured-first" | "featured" => Some(SortKey::FeaturedFirst),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::RatingHigh => "rating-high",
            SortKey::RatingLow => "rating-low",
            SortKey::FeaturedFirst => "featured-first",
        }
    }
}

/// The current filter/search/sort/page selection of one list view.
///
/// Owned by the page that displays the list and passed by value into
/// evaluation. Mutators that change what matches reset the page to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub category: CategoryFilter,
    search_term: String,
    pub sort_key: SortKey,
    page: usize,
    page_size: usize,
    /// Review-only: exact product name.
    pub product: Option<String>,
    /// Review-only: keep ratings at or above this value.
    pub min_rating: Option<u8>,
}

impl QuerySpec {
    /// A spec showing everything, newest first, on page 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            category: CategoryFilter::All,
            search_term: String::new(),
            sort_key: SortKey::default(),
            page: 1,
            page_size: page_size.max(1),
            product: None,
            min_rating: None,
        }
    }

    pub fn with_sort(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn with_category(mut self, raw: &str) -> Self {
        self.category = CategoryFilter::parse(raw);
        self
    }

    pub fn with_search(mut self, raw: &str) -> Self {
        self.search_term = normalize_search(raw);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Normalised (trimmed, case-folded) search term; empty matches everything.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Requested page, 1-based. Clamped against the result size at evaluation.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_category(&mut self, raw: &str) {
        self.category = CategoryFilter::parse(raw);
        self.page = 1;
    }

    pub fn set_search(&mut self, raw: &str) {
        self.search_term = normalize_search(raw);
        self.page = 1;
    }

    /// Unknown keys fall back to the default order.
    pub fn set_sort(&mut self, raw: &str) {
        self.sort_key = SortKey::parse(raw).unwrap_or_default();
        self.page = 1;
    }

    /// Empty input clears the product filter.
    pub fn set_product(&mut self, raw: &str) {
        let trimmed = raw.trim();
        self.product = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.page = 1;
    }

    /// Values outside 1..=5 clear the rating filter.
    pub fn set_min_rating(&mut self, raw: &str) {
        self.min_rating = raw
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|r| (1..=5).contains(r));
        self.page = 1;
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Advance one page unless already on the last one.
    pub fn next_page(&mut self, total_pages: usize) {
        if self.page < total_pages {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }
}

fn normalize_search(raw: &str) -> String {
    raw.trim().to_lowercase()
}
