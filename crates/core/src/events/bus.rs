//! Fan-out of content events from the stores to the views showing them.
//!
//! Every store gets a listener that republishes its [`StoreChange`]s here,
//! and snapshot loads publish a [`RejectedLoad`] for each section they turn
//! down. Page controllers subscribe and re-render when their collection
//! changes. A controller that falls more than `capacity` events behind sees
//! `RecvError::Lagged` and re-renders from the store, so nothing is lost by
//! keeping the channel short.
//!
//! [`StoreChange`]: super::types::StoreChange
//! [`RejectedLoad`]: super::types::RejectedLoad

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ContentEvent;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<ContentEvent>>,
}

impl EventBus {
    /// `capacity` must be non-zero; the site config rejects zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns how many views were notified. Before any page is open this is
    /// zero and the event is dropped.
    pub fn publish(&self, event: ContentEvent) -> usize {
        match self.sender.send(event) {
            Ok(reached) => reached,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "no views listening, dropping content event");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::sync::broadcast::error::RecvError;

    use crate::events::types::{ChangeKind, RejectedLoad, StoreChange};
    use crate::record::ContentType;

    fn reviews_loaded(revision: u64) -> ContentEvent {
        ContentEvent::Changed(StoreChange {
            content_type: ContentType::Review,
            revision,
            kind: ChangeKind::Loaded,
            total: 3,
            active: 2,
        })
    }

    #[tokio::test]
    async fn reviews_page_sees_store_change() {
        let bus = EventBus::new(16);
        let mut reviews_page = bus.subscribe();

        assert_eq!(bus.publish(reviews_loaded(1)), 1);

        let event = reviews_page.recv().await.unwrap();
        assert!(matches!(
            event,
            ContentEvent::Changed(c) if c.content_type == ContentType::Review && c.revision == 1
        ));
    }

    #[tokio::test]
    async fn every_open_page_gets_the_rejection() {
        let bus = EventBus::new(16);
        let mut news_page = bus.subscribe();
        let mut gifts_page = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ContentEvent::Rejected(RejectedLoad {
            content_type: Some(ContentType::Gift),
            reason: "gift section must be an array".into(),
            timestamp: Utc::now(),
        }));

        for page in [&mut news_page, &mut gifts_page] {
            assert!(matches!(
                page.recv().await.unwrap(),
                ContentEvent::Rejected(r) if r.content_type == Some(ContentType::Gift)
            ));
        }
    }

    #[tokio::test]
    async fn slow_page_lags_then_catches_the_latest_revision() {
        let bus = EventBus::new(2);
        let mut slow_page = bus.subscribe();
        for revision in 1..=5 {
            bus.publish(reviews_loaded(revision));
        }

        assert!(matches!(slow_page.recv().await, Err(RecvError::Lagged(3))));
        let mut last = 0;
        while let Ok(ContentEvent::Changed(c)) = slow_page.try_recv() {
            last = c.revision;
        }
        assert_eq!(last, 5);
    }

    #[test]
    fn publishing_before_any_page_opens_is_not_an_error() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(ContentEvent::SettingsUpdated), 0);
    }
}
