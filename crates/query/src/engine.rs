// List evaluation: (records, QuerySpec) -> QueryResult.
// Pure and deterministic; the only time input is each record's createdAt.

use std::cmp::Ordering;

use serde::Serialize;
use wasui_core::{Category, ContentStore, Details, Record};

use crate::spec::{CategoryFilter, QuerySpec, SortKey};

/// One page of matching records plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub items: Vec<Record>,
    pub total_matches: usize,
    /// `ceil(total_matches / page_size)`, 0 when nothing matches.
    pub total_pages: usize,
    /// The page actually shown after clamping.
    pub current_page: usize,
    pub page_size: usize,
}

/// What a pagination control needs to draw itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_matches: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta {
            total_matches: self.total_matches,
            total_pages: self.total_pages,
            current_page: self.current_page,
            page_size: self.page_size,
            has_prev: self.current_page > 1,
            has_next: self.current_page < self.total_pages,
        }
    }
}

/// Evaluate a spec against a store's active records.
///
/// The store's category list is the known enumeration; a filter naming any
/// other category shows everything.
pub fn evaluate(store: &ContentStore, spec: &QuerySpec) -> QueryResult {
    evaluate_records(store.get_active(), &store.categories(), spec)
}

/// Evaluate a spec against an explicit record sequence.
///
/// Inactive records are skipped even if the caller passes them in.
pub fn evaluate_records<'a, I>(records: I, known: &[Category], spec: &QuerySpec) -> QueryResult
where
    I: IntoIterator<Item = &'a Record>,
{
    let category = resolve_category(&spec.category, known);
    let min_rating = spec.min_rating.filter(|r| (1..=5).contains(r));
    let term = spec.search_term();

    let mut matches: Vec<&Record> = records
        .into_iter()
        .filter(|r| r.active)
        .filter(|r| matches_category(r, category))
        .filter(|r| matches_product(r, spec.product.as_deref()))
        .filter(|r| matches_rating(r, min_rating))
        .filter(|r| matches_search(r, term))
        .collect();

    // `sort_by` is stable: ties keep collection order.
    matches.sort_by(|a, b| compare(spec.sort_key, a, b));

    paginate(&matches, spec.page(), spec.page_size())
}

fn resolve_category<'s>(filter: &'s CategoryFilter, known: &[Category]) -> Option<&'s Category> {
    match filter {
        CategoryFilter::All => None,
        CategoryFilter::Only(c) if known.contains(c) => Some(c),
        CategoryFilter::Only(c) => {
            tracing::debug!(category = %c, "unknown category filter, showing all");
            None
        }
    }
}

fn matches_category(record: &Record, category: Option<&Category>) -> bool {
    match category {
        None => true,
        Some(c) => record.category.as_ref() == Some(c),
    }
}

fn matches_product(record: &Record, product: Option<&str>) -> bool {
    let Some(wanted) = product else {
        return true;
    };
    match &record.details {
        Details::Review(r) => r.product.as_deref().map(str::trim) == Some(wanted),
        _ => false,
    }
}

fn matches_rating(record: &Record, min_rating: Option<u8>) -> bool {
    match min_rating {
        None => true,
        Some(min) => record.rating().is_some_and(|r| r >= min),
    }
}

fn matches_search(record: &Record, term: &str) -> bool {
    term.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(term))
}

fn compare(key: SortKey, a: &Record, b: &Record) -> Ordering {
    match key {
        SortKey::Newest => b.created_at.cmp(&a.created_at),
        SortKey::Oldest => a.created_at.cmp(&b.created_at),
        SortKey::RatingHigh => compare_ratings(a.rating(), b.rating(), |x, y| y.cmp(&x)),
        SortKey::RatingLow => compare_ratings(a.rating(), b.rating(), |x, y| x.cmp(&y)),
        SortKey::FeaturedFirst => b.featured.cmp(&a.featured),
    }
}

/// Unrated records sort last in either direction.
fn compare_ratings(a: Option<u8>, b: Option<u8>, order: fn(u8, u8) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => order(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn paginate(matches: &[&Record], page: usize, page_size: usize) -> QueryResult {
    let page_size = page_size.max(1);
    let total_matches = matches.len();
    let total_pages = total_matches.div_ceil(page_size);
    let current_page = if total_pages == 0 {
        1
    } else {
        page.clamp(1, total_pages)
    };

    let start = (current_page - 1) * page_size;
    let end = (start + page_size).min(total_matches);
    let items = matches
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|r| (*r).clone())
        .collect();

    QueryResult {
        items,
        total_matches,
        total_pages,
        current_page,
        page_size,
    }
}
