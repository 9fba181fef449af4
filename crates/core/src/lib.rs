//! Content records, the per-type content store and its change notifications.

pub mod events;
pub mod mutation;
pub mod record;
pub mod snapshot;
pub mod store;

pub use record::{Category, ContentType, Details, Record, RecordId};
pub use store::ContentStore;
