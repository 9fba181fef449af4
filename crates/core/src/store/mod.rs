//! Per-type content store.
//!
//! A [`ContentStore`] owns every record of one content type, including
//! soft-deleted ones, and tells registered listeners when its content
//! changes. Loads replace the collection wholesale; a bad snapshot keeps the
//! previous collection.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use crate::events::{ChangeKind, StoreChange};
use crate::mutation::{Mutation, MutationError, MutationResult};
use crate::record::decode::decode_record;
use crate::record::{Category, ContentType, Details, Record, RecordId, ValidationError};
use crate::snapshot::{decode_section, fingerprint, SnapshotError};

/// Callback invoked after every successful load or mutation.
pub type Listener = Box<dyn Fn(&StoreChange) + Send + Sync>;

/// Handle returned by [`ContentStore::on_change`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What a call to [`ContentStore::load`] did.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The collection was replaced and listeners were notified.
    Replaced(StoreChange),
    /// The section is identical to the last accepted one; nothing happened.
    Unchanged,
    /// The section was malformed; the previous collection is still in place.
    Rejected(SnapshotError),
}

impl LoadOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, LoadOutcome::Replaced(_))
    }
}

pub struct ContentStore {
    kind: ContentType,
    records: Vec<Record>,
    revision: u64,
    fingerprint: Option<u64>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStore")
            .field("kind", &self.kind)
            .field("records", &self.records.len())
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ContentStore {
    /// Create an empty store for one content type.
    pub fn new(kind: ContentType) -> Self {
        Self {
            kind,
            records: Vec::new(),
            revision: 0,
            fingerprint: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn kind(&self) -> ContentType {
        self.kind
    }

    /// Incremented on every accepted load or mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the collection from a raw snapshot section.
    ///
    /// Never fails outward: a malformed section is logged and the previous
    /// collection kept. A section identical to the last accepted one is
    /// skipped without notifying listeners.
    pub fn load(&mut self, section: &Value) -> LoadOutcome {
        let hash = fingerprint(section);
        if self.fingerprint == Some(hash) {
            tracing::trace!(content_type = %self.kind, "snapshot unchanged, skipping reload");
            return LoadOutcome::Unchanged;
        }

        match decode_section(self.kind, section) {
            Ok(records) => {
                self.fingerprint = Some(hash);
                let change = self.replace(records);
                tracing::debug!(
                    content_type = %self.kind,
                    revision = change.revision,
                    total = change.total,
                    active = change.active,
                    "content reloaded"
                );
                LoadOutcome::Replaced(change)
            }
            Err(error) => {
                tracing::warn!(
                    content_type = %self.kind,
                    error = %error,
                    "malformed snapshot, keeping previous content"
                );
                LoadOutcome::Rejected(error)
            }
        }
    }

    /// Replace the collection with already-decoded records.
    pub fn load_records(&mut self, records: Vec<Record>) -> Result<StoreChange, MutationError> {
        for record in &records {
            self.check_type(record)?;
        }
        crate::record::validate::validate_unique_ids(&records)?;
        self.fingerprint = None;
        Ok(self.replace(records))
    }

    /// Every record, including soft-deleted ones.
    pub fn get_all(&self) -> &[Record] {
        &self.records
    }

    /// Records visible to queries, in collection order.
    pub fn get_active(&self) -> Vec<&Record> {
        self.records.iter().filter(|r| r.active).collect()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Distinct category tags across all records, sorted.
    pub fn categories(&self) -> Vec<Category> {
        self.records
            .iter()
            .filter_map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Register a change listener. Listeners run in registration order, but
    /// callers must not rely on that.
    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns false if it was already gone.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Apply a mutation and notify listeners.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, MutationError> {
        let operation = mutation.name();
        let id = match mutation {
            Mutation::Append { record } => {
                let record = decode_record(self.kind, record)?;
                self.insert(record)?
            }
            Mutation::SetActive { id, active } => {
                self.find_mut(&id)?.active = active;
                id
            }
            Mutation::MarkHelpful { id } => {
                let counter = self.helpful_mut(&id)?;
                *counter = counter.saturating_add(1);
                id
            }
            Mutation::UnmarkHelpful { id } => {
                let counter = self.helpful_mut(&id)?;
                *counter = counter.saturating_sub(1);
                id
            }
        };

        let change = self.commit(ChangeKind::Mutated);
        tracing::debug!(content_type = %self.kind, %id, operation, "mutation applied");
        Ok(MutationResult {
            id,
            operation: operation.to_string(),
            revision: change.revision,
        })
    }

    /// Append an already-built record.
    pub fn append(&mut self, record: Record) -> Result<MutationResult, MutationError> {
        let id = self.insert(record)?;
        let change = self.commit(ChangeKind::Mutated);
        Ok(MutationResult {
            id,
            operation: "append".to_string(),
            revision: change.revision,
        })
    }

    /// Soft-delete or restore a record.
    pub fn set_active(&mut self, id: &RecordId, active: bool) -> Result<MutationResult, MutationError> {
        self.apply(Mutation::SetActive {
            id: id.clone(),
            active,
        })
    }

    fn insert(&mut self, record: Record) -> Result<RecordId, MutationError> {
        self.check_type(&record)?;
        if self.get(&record.id).is_some() {
            return Err(ValidationError::DuplicateId(record.id).into());
        }
        let id = record.id.clone();
        self.records.push(record);
        Ok(id)
    }

    fn check_type(&self, record: &Record) -> Result<(), MutationError> {
        let found = record.content_type();
        if found != self.kind {
            return Err(MutationError::WrongType {
                expected: self.kind,
                found,
            });
        }
        Ok(())
    }

    fn find_mut(&mut self, id: &RecordId) -> Result<&mut Record, MutationError> {
        let kind = self.kind;
        self.records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| MutationError::NotFound {
                kind,
                id: id.clone(),
            })
    }

    fn helpful_mut(&mut self, id: &RecordId) -> Result<&mut u32, MutationError> {
        let kind = self.kind;
        match &mut self.find_mut(id)?.details {
            Details::Review(review) => Ok(&mut review.helpful),
            _ => Err(MutationError::NoHelpfulCounter { kind }),
        }
    }

    fn replace(&mut self, records: Vec<Record>) -> StoreChange {
        self.records = records;
        self.commit(ChangeKind::Loaded)
    }

    fn commit(&mut self, kind: ChangeKind) -> StoreChange {
        self.revision += 1;
        let change = StoreChange {
            content_type: self.kind,
            revision: self.revision,
            kind,
            total: self.records.len(),
            active: self.records.iter().filter(|r| r.active).count(),
        };
        for (_, listener) in &self.listeners {
            listener(&change);
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn reviews_section() -> Value {
        json!([
            {"id": "r1", "rating": 5, "content": "最高", "date": "2024-01-01", "product": "どら焼き"},
            {"id": "r2", "rating": 3, "content": "普通", "date": "2024-01-02", "active": false},
            {"id": "r3", "content": "評価なし", "date": "2024-01-03", "category": "Gift"}
        ])
    }

    fn loaded_reviews() -> ContentStore {
        let mut store = ContentStore::new(ContentType::Review);
        assert!(store.load(&reviews_section()).is_replaced());
        store
    }

    #[test]
    fn load_replaces_collection() {
        let store = loaded_reviews();
        assert_eq!(store.get_all().len(), 3);
        assert_eq!(store.get_active().len(), 2);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn malformed_load_keeps_previous_content() {
        let mut store = loaded_reviews();
        let outcome = store.load(&json!([{"id": "x", "rating": 7, "content": "?", "date": "2024-01-01"}]));
        assert!(matches!(outcome, LoadOutcome::Rejected(_)));
        assert_eq!(store.get_all().len(), 3);
        assert_eq!(store.revision(), 1);

        let outcome = store.load(&json!({"not": "an array"}));
        assert!(matches!(outcome, LoadOutcome::Rejected(SnapshotError::NotAnArray { .. })));
        assert_eq!(store.get_all().len(), 3);
    }

    #[test]
    fn identical_reload_is_skipped() {
        let mut store = loaded_reviews();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        store.on_change(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(matches!(store.load(&reviews_section()), LoadOutcome::Unchanged));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut changed = reviews_section();
        changed[0]["content"] = json!("とても最高");
        assert!(store.load(&changed).is_replaced());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn every_listener_is_notified() {
        let mut store = ContentStore::new(ContentType::Review);
        let changes = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let sink = Arc::clone(&changes);
            store.on_change(move |c| sink.lock().unwrap().push(c.clone()));
        }
        store.load(&reviews_section());

        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::Loaded);
        assert_eq!(changes[0].total, 3);
        assert_eq!(changes[0].active, 2);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let mut store = ContentStore::new(ContentType::Review);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = store.on_change(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.remove_listener(id));
        assert!(!store.remove_listener(id));
        store.load(&reviews_section());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn soft_delete_hides_from_active_but_keeps_record() {
        let mut store = loaded_reviews();
        store.set_active(&"r1".into(), false).unwrap();
        assert_eq!(store.get_all().len(), 3);
        assert_eq!(store.get_active().len(), 1);
        assert!(store.get_active().iter().all(|r| r.id.as_str() != "r1"));

        store.set_active(&"r2".into(), true).unwrap();
        assert_eq!(store.get_active().len(), 2);
    }

    #[test]
    fn helpful_counter_saturates_at_zero() {
        let mut store = loaded_reviews();
        let id: RecordId = "r1".into();
        store.apply(Mutation::MarkHelpful { id: id.clone() }).unwrap();
        store.apply(Mutation::MarkHelpful { id: id.clone() }).unwrap();
        assert_eq!(store.get(&id).unwrap().helpful(), Some(2));

        for _ in 0..3 {
            store.apply(Mutation::UnmarkHelpful { id: id.clone() }).unwrap();
        }
        assert_eq!(store.get(&id).unwrap().helpful(), Some(0));
    }

    #[test]
    fn helpful_on_products_is_rejected() {
        let mut store = ContentStore::new(ContentType::Product);
        store.load(&json!([{"id": "p1", "title": "羊羹"}]));
        let err = store
            .apply(Mutation::MarkHelpful { id: "p1".into() })
            .unwrap_err();
        assert!(matches!(err, MutationError::NoHelpfulCounter { .. }));
    }

    #[test]
    fn append_enforces_unique_ids() {
        let mut store = loaded_reviews();
        let result = store
            .apply(Mutation::Append {
                record: json!({"id": "r4", "rating": 4, "content": "新作", "date": "2024-02-01"}),
            })
            .unwrap();
        assert_eq!(result.id.as_str(), "r4");
        assert_eq!(result.revision, 2);
        assert_eq!(store.get_all().len(), 4);

        let err = store
            .apply(Mutation::Append {
                record: json!({"id": "r4", "content": "重複", "date": "2024-02-01"}),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            MutationError::Invalid(ValidationError::DuplicateId(_))
        ));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut store = loaded_reviews();
        let err = store.set_active(&"missing".into(), false).unwrap_err();
        assert!(matches!(err, MutationError::NotFound { .. }));
    }

    #[test]
    fn load_records_rejects_foreign_types() {
        let mut products = ContentStore::new(ContentType::Product);
        let reviews = loaded_reviews();
        let err = products
            .load_records(reviews.get_all().to_vec())
            .unwrap_err();
        assert!(matches!(err, MutationError::WrongType { .. }));
        assert!(products.get_all().is_empty());
    }

    #[test]
    fn categories_include_inactive_records() {
        let mut store = ContentStore::new(ContentType::News);
        store.load(&json!([
            {"id": "n1", "title": "a", "date": "2024-01-01", "category": "event"},
            {"id": "n2", "title": "b", "date": "2024-01-02", "category": "campaign", "active": false},
            {"id": "n3", "title": "c", "date": "2024-01-03", "category": "Event"}
        ]));
        let categories: Vec<String> = store
            .categories()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        assert_eq!(categories, vec!["campaign", "event"]);
    }
}
