use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use wasui_core::events::bus::EventBus;
use wasui_core::events::{ContentEvent, RejectedLoad};
use wasui_core::mutation::{Mutation, MutationResult};
use wasui_core::snapshot::{SiteSettings, Snapshot, SnapshotError, DATA_KEY, NEWS_KEY};
use wasui_core::{ContentStore, ContentType, Record};

use crate::cache::KeyValueCache;
use crate::config::SiteConfig;
use crate::content::{LoadReport, SiteContent};
use crate::error::{SiteError, SiteResult};

/// Shared runtime state, handed to the poller and every page controller.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct SiteState {
    inner: Arc<InnerState>,
}

struct InnerState {
    content: RwLock<SiteContent>,
    cache: Arc<dyn KeyValueCache>,
    config: SiteConfig,
    event_bus: EventBus,
}

impl SiteState {
    /// Build the state and forward every store change onto the event bus.
    pub fn new(config: SiteConfig, cache: Arc<dyn KeyValueCache>, event_bus: EventBus) -> Self {
        let mut content = SiteContent::new();
        for kind in ContentType::ALL {
            let bus = event_bus.clone();
            content.store_mut(kind).on_change(move |change| {
                bus.publish(ContentEvent::Changed(change.clone()));
            });
        }

        Self {
            inner: Arc::new(InnerState {
                content: RwLock::new(content),
                cache,
                config,
                event_bus,
            }),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn cache(&self) -> &Arc<dyn KeyValueCache> {
        &self.inner.cache
    }

    pub fn content(&self) -> SiteResult<RwLockReadGuard<'_, SiteContent>> {
        self.inner.content.read().map_err(|_| SiteError::LockPoisoned)
    }

    fn content_mut(&self) -> SiteResult<RwLockWriteGuard<'_, SiteContent>> {
        self.inner.content.write().map_err(|_| SiteError::LockPoisoned)
    }

    /// Run `f` against one store under the read lock.
    pub fn with_store<T>(&self, kind: ContentType, f: impl FnOnce(&ContentStore) -> T) -> SiteResult<T> {
        Ok(f(self.content()?.store(kind)))
    }

    pub fn settings(&self) -> SiteResult<SiteSettings> {
        Ok(self.content()?.settings().clone())
    }

    /// Re-read the cache and reload every store.
    ///
    /// A malformed blob is logged and announced on the bus; the stores keep
    /// their previous content. Only cache I/O failures are errors.
    pub fn reload_from_cache(&self) -> SiteResult<LoadReport> {
        let cache = &self.inner.cache;
        let data = cache.get(DATA_KEY)?;
        let news = cache.get(NEWS_KEY)?;
        if data.is_none() && news.is_none() {
            tracing::trace!("cache is empty, nothing to load");
            return Ok(LoadReport::default());
        }

        let snapshot = match data.as_deref().map(Snapshot::parse).transpose() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key = DATA_KEY, error = %e, "malformed content blob, keeping previous content");
                let report = LoadReport::blob_rejected(e.to_string());
                self.publish_rejections(&report);
                return Ok(report);
            }
        };
        let snapshot = match news {
            Some(raw) => apply_news_override(snapshot, &raw),
            None => snapshot,
        };

        self.load_snapshot(&snapshot)
    }

    /// Load an already-parsed snapshot into the stores.
    pub fn load_snapshot(&self, snapshot: &Snapshot) -> SiteResult<LoadReport> {
        let report = self.content_mut()?.load(snapshot);
        self.publish_rejections(&report);
        if report.settings_changed {
            self.inner.event_bus.publish(ContentEvent::SettingsUpdated);
        }
        if !report.is_noop() {
            tracing::debug!(
                replaced = report.replaced.len(),
                rejected = report.rejected.len(),
                settings_changed = report.settings_changed,
                "content refreshed from cache"
            );
        }
        Ok(report)
    }

    /// Apply a mutation to one store. Listeners publish the change.
    pub fn apply(&self, kind: ContentType, mutation: Mutation) -> SiteResult<MutationResult> {
        Ok(self.content_mut()?.store_mut(kind).apply(mutation)?)
    }

    /// Append a record built on the site (e.g. a submitted review).
    pub fn append(&self, record: Record) -> SiteResult<MutationResult> {
        let kind = record.content_type();
        Ok(self.content_mut()?.store_mut(kind).append(record)?)
    }

    fn publish_rejections(&self, report: &LoadReport) {
        for (content_type, reason) in &report.rejected {
            self.inner.event_bus.publish(ContentEvent::Rejected(RejectedLoad {
                content_type: *content_type,
                reason: reason.clone(),
                timestamp: Utc::now(),
            }));
        }
    }
}

/// A bad override is ignored in favour of the blob's own news section.
fn apply_news_override(snapshot: Snapshot, raw: &str) -> Snapshot {
    let parsed = serde_json::from_str::<serde_json::Value>(raw)
        .map_err(SnapshotError::from)
        .and_then(|news| snapshot.clone().with_news_override(news));
    match parsed {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(key = NEWS_KEY, error = %e, "malformed news override, ignoring");
            snapshot
        }
    }
}
