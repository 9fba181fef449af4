use url::form_urlencoded;

use crate::param::QueryParam;
use crate::spec::{QuerySpec, SortKey};

/// Parse a URL query string into its recognised parameters, in order.
///
/// Decoding is lenient: a malformed escape such as `100%` is kept as literal
/// text, so one bad value never costs the other parameters. Pairs with an
/// empty key are dropped.
pub fn parse(input: &str) -> Vec<QueryParam> {
    form_urlencoded::parse(input.trim_start_matches('?').as_bytes())
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| QueryParam::from_pair(key.into_owned(), value.into_owned()))
        .collect()
}

/// Build a list query from a URL query string.
///
/// Later parameters override earlier ones; values that do not parse leave the
/// default in place.
pub fn parse_spec(input: &str, page_size: usize, default_sort: SortKey) -> QuerySpec {
    let mut spec = QuerySpec::new(page_size).with_sort(default_sort);
    let mut page = 1;
    for param in parse(input) {
        match param {
            QueryParam::Category(v) => spec.set_category(&v),
            QueryParam::Search(v) => spec.set_search(&v),
            QueryParam::Sort(v) => spec.sort_key = SortKey::parse(&v).unwrap_or(default_sort),
            QueryParam::Page(v) => page = v.trim().parse().unwrap_or(1),
            QueryParam::Product(v) => spec.set_product(&v),
            QueryParam::MinRating(v) => spec.set_min_rating(&v),
            QueryParam::Unknown { key, .. } => {
                tracing::trace!(%key, "ignoring unknown query parameter");
            }
        }
    }
    spec.go_to_page(page);
    spec
}
