//! Periodic cache refresh.
//!
//! The editor writes the cache out-of-band, so the stores re-read it on a
//! fixed interval. Unchanged sections are skipped by the stores themselves.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::state::SiteState;

/// Handle to a running poll task.
pub struct Poller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn the poll loop. The first refresh happens immediately.
    pub fn spawn(state: SiteState, every: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = state.reload_from_cache() {
                            tracing::warn!(error = %e, "content refresh failed");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::debug!("poller stopped");
        });
        Self { shutdown, handle }
    }

    /// Stop polling and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "poller task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use wasui_core::events::EventBus;
    use wasui_core::snapshot::DATA_KEY;
    use wasui_core::ContentType;

    use crate::cache::{KeyValueCache, MemoryCache};
    use crate::config::SiteConfig;

    fn product_count(state: &SiteState) -> usize {
        state
            .with_store(ContentType::Product, |s| s.get_all().len())
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn picks_up_cache_writes_on_next_tick() {
        let cache = Arc::new(MemoryCache::new());
        let state = SiteState::new(SiteConfig::default(), cache.clone(), EventBus::new(16));
        let poller = Poller::spawn(state.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(product_count(&state), 0);

        cache
            .set(DATA_KEY, &json!({"products": [{"id": "p1", "title": "羊羹"}]}).to_string())
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(product_count(&state), 1);

        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_shutdown() {
        let cache = Arc::new(MemoryCache::new());
        let state = SiteState::new(SiteConfig::default(), cache.clone(), EventBus::new(16));
        let poller = Poller::spawn(state.clone(), Duration::from_secs(1));
        poller.shutdown().await;

        cache
            .set(DATA_KEY, &json!({"products": [{"id": "p1", "title": "羊羹"}]}).to_string())
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(product_count(&state), 0);
    }
}
