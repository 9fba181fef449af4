//! List queries over content records: filter, search, sort and paginate.

pub mod engine;
pub mod highlight;
pub mod param;
pub mod parser;
pub mod preview;
pub mod spec;

pub use engine::{evaluate, evaluate_records, PaginationMeta, QueryResult};
pub use highlight::{highlight, Segment};
pub use preview::{featured_first, newest_first};
pub use parser::parse_spec;
pub use spec::{CategoryFilter, QuerySpec, SortKey};
