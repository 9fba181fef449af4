// Non-paginated preview lists for the home page widgets.

use wasui_core::Record;

/// Active featured records, then the rest, each group in collection order,
/// truncated to `limit`.
pub fn featured_first<'a, I>(records: I, limit: usize) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let (featured, regular): (Vec<&Record>, Vec<&Record>) = records
        .into_iter()
        .filter(|r| r.active)
        .partition(|r| r.featured);
    featured.into_iter().chain(regular).take(limit).collect()
}

/// The `limit` most recent active records.
pub fn newest_first<'a, I>(records: I, limit: usize) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut active: Vec<&Record> = records.into_iter().filter(|r| r.active).collect();
    active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    active.truncate(limit);
    active
}
