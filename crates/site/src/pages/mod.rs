//! List page controllers.
//!
//! A [`PageController`] owns one page's [`QuerySpec`] and re-renders when the
//! user changes it or when the page's store changes. Both paths run on the
//! controller's task, so whichever is handled last is what stays on screen.

pub mod home;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use wasui_core::events::ContentEvent;
use wasui_core::mutation::Mutation;
use wasui_core::{ContentType, Record, RecordId};
use wasui_query::{evaluate, parse_spec, PaginationMeta, QuerySpec, SortKey};

use crate::config::SiteConfig;
use crate::error::SiteResult;
use crate::state::SiteState;
use crate::submit::ViewLifetime;

/// Draws one page of results. The runtime makes no assumption about markup.
pub trait Renderer: Send {
    fn render(&mut self, items: &[Record], meta: &PaginationMeta);
}

impl<F> Renderer for F
where
    F: FnMut(&[Record], &PaginationMeta) + Send,
{
    fn render(&mut self, items: &[Record], meta: &PaginationMeta) {
        self(items, meta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    News,
    Products,
    Gifts,
    Reviews,
}

impl PageKind {
    pub fn content_type(self) -> ContentType {
        match self {
            PageKind::News => ContentType::News,
            PageKind::Products => ContentType::Product,
            PageKind::Gifts => ContentType::Gift,
            PageKind::Reviews => ContentType::Review,
        }
    }

    pub fn default_sort(self) -> SortKey {
        match self {
            PageKind::News | PageKind::Reviews => SortKey::Newest,
            PageKind::Products | PageKind::Gifts => SortKey::FeaturedFirst,
        }
    }

    pub fn page_size(self, config: &SiteConfig) -> usize {
        match self {
            PageKind::News => config.news_page_size,
            PageKind::Products => config.products_page_size,
            PageKind::Gifts => config.gifts_page_size,
            PageKind::Reviews => config.reviews_page_size,
        }
    }
}

/// User input a page reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    SetCategory(String),
    Search(String),
    Sort(String),
    Product(String),
    MinRating(String),
    GoToPage(usize),
    NextPage,
    PrevPage,
    MarkHelpful(RecordId),
    UnmarkHelpful(RecordId),
}

pub struct PageController<R> {
    kind: PageKind,
    state: SiteState,
    spec: QuerySpec,
    renderer: R,
    generation: u64,
    last_meta: Option<PaginationMeta>,
}

impl<R: Renderer> PageController<R> {
    pub fn new(kind: PageKind, state: SiteState, renderer: R) -> Self {
        let spec = QuerySpec::new(kind.page_size(state.config())).with_sort(kind.default_sort());
        Self {
            kind,
            state,
            spec,
            renderer,
            generation: 0,
            last_meta: None,
        }
    }

    /// Start from the page URL's query string. Unusable values keep the
    /// page defaults.
    pub fn from_query_string(kind: PageKind, state: SiteState, renderer: R, query: &str) -> Self {
        let mut controller = Self::new(kind, state, renderer);
        controller.spec = parse_spec(query, controller.spec.page_size(), kind.default_sort());
        tracing::debug!(page = ?kind, spec = ?controller.spec, "seeded query from URL");
        controller
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Number of renders so far; each render gets the next value.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_meta(&self) -> Option<PaginationMeta> {
        self.last_meta
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Evaluate the current spec against the store and render the result.
    pub fn refresh(&mut self) -> SiteResult<PaginationMeta> {
        let result = self
            .state
            .with_store(self.kind.content_type(), |store| evaluate(store, &self.spec))?;
        // Keep the query on the page actually shown.
        self.spec.go_to_page(result.current_page);

        let meta = result.meta();
        self.generation += 1;
        self.renderer.render(&result.items, &meta);
        self.last_meta = Some(meta);
        tracing::trace!(
            page = ?self.kind,
            generation = self.generation,
            matches = meta.total_matches,
            current_page = meta.current_page,
            "page rendered"
        );
        Ok(meta)
    }

    /// Apply a user command and re-render.
    pub fn handle(&mut self, command: PageCommand) -> SiteResult<PaginationMeta> {
        match command {
            PageCommand::SetCategory(raw) => self.spec.set_category(&raw),
            PageCommand::Search(raw) => self.spec.set_search(&raw),
            PageCommand::Sort(raw) => {
                self.spec.sort_key = SortKey::parse(&raw).unwrap_or(self.kind.default_sort());
                self.spec.go_to_page(1);
            }
            PageCommand::Product(raw) => self.spec.set_product(&raw),
            PageCommand::MinRating(raw) => self.spec.set_min_rating(&raw),
            PageCommand::GoToPage(page) => self.spec.go_to_page(page),
            PageCommand::NextPage => {
                let total_pages = self.last_meta.map_or(0, |m| m.total_pages);
                self.spec.next_page(total_pages);
            }
            PageCommand::PrevPage => self.spec.prev_page(),
            PageCommand::MarkHelpful(id) => {
                self.state
                    .apply(self.kind.content_type(), Mutation::MarkHelpful { id })?;
            }
            PageCommand::UnmarkHelpful(id) => {
                self.state
                    .apply(self.kind.content_type(), Mutation::UnmarkHelpful { id })?;
            }
        }
        self.refresh()
    }

    /// Drive the page until the view closes or the command channel is dropped.
    ///
    /// Returns the renderer so callers can inspect what was drawn last.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<PageCommand>,
        lifetime: ViewLifetime,
    ) -> SiteResult<R> {
        // Subscribe before the first render so no change slips between them.
        let mut events = self.state.event_bus().subscribe();
        self.refresh()?;

        loop {
            tokio::select! {
                _ = lifetime.closed() => break,
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Err(e) = self.handle(command) {
                            tracing::warn!(page = ?self.kind, error = %e, "page command failed");
                        }
                    }
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(ContentEvent::Changed(change))
                        if change.content_type == self.kind.content_type() =>
                    {
                        self.refresh()?;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(page = ?self.kind, skipped, "missed content events, re-rendering");
                        self.refresh()?;
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        tracing::debug!(page = ?self.kind, generation = self.generation, "page closed");
        Ok(self.renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use wasui_core::events::EventBus;
    use wasui_core::snapshot::Snapshot;
    use wasui_query::CategoryFilter;

    use crate::cache::MemoryCache;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(Vec<String>, PaginationMeta)>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, items: &[Record], meta: &PaginationMeta) {
            let ids = items.iter().map(|r| r.id.to_string()).collect();
            self.frames.push((ids, *meta));
        }
    }

    impl Recorder {
        fn last_ids(&self) -> Vec<String> {
            self.frames.last().map(|(ids, _)| ids.clone()).unwrap_or_default()
        }
    }

    fn state_with(value: serde_json::Value) -> SiteState {
        let config = SiteConfig {
            reviews_page_size: 2,
            ..SiteConfig::default()
        };
        let state = SiteState::new(config, Arc::new(MemoryCache::new()), EventBus::new(64));
        state
            .load_snapshot(&Snapshot::from_value(value).unwrap())
            .unwrap();
        state
    }

    fn reviews() -> serde_json::Value {
        json!({"reviews": [
            {"id": "r1", "content": "a", "rating": 5, "product": "どら焼き", "date": "2024-01-01"},
            {"id": "r2", "content": "b", "rating": 3, "product": "最中", "date": "2024-01-02"},
            {"id": "r3", "content": "c", "rating": 4, "product": "どら焼き", "date": "2024-01-03"},
            {"id": "r4", "content": "d", "product": "どら焼き", "date": "2024-01-04"},
            {"id": "r5", "content": "e", "rating": 1, "active": false, "date": "2024-01-05"}
        ]})
    }

    #[test]
    fn refresh_renders_first_page() {
        let mut page = PageController::new(PageKind::Reviews, state_with(reviews()), Recorder::default());
        let meta = page.refresh().unwrap();
        assert_eq!(page.renderer().last_ids(), vec!["r4", "r3"]);
        assert_eq!(meta.total_matches, 4);
        assert_eq!(meta.total_pages, 2);
        assert_eq!(page.generation(), 1);
    }

    #[test]
    fn commands_reset_and_advance_pages() {
        let mut page = PageController::new(PageKind::Reviews, state_with(reviews()), Recorder::default());
        page.refresh().unwrap();

        page.handle(PageCommand::NextPage).unwrap();
        assert_eq!(page.renderer().last_ids(), vec!["r2", "r1"]);
        page.handle(PageCommand::NextPage).unwrap();
        assert_eq!(page.spec().page(), 2);

        page.handle(PageCommand::Product("どら焼き".into())).unwrap();
        assert_eq!(page.spec().page(), 1);
        page.handle(PageCommand::Sort("rating-high".into())).unwrap();
        assert_eq!(page.renderer().last_ids(), vec!["r1", "r3"]);
        page.handle(PageCommand::MinRating("4".into())).unwrap();
        assert_eq!(page.last_meta().unwrap().total_matches, 2);
    }

    #[test]
    fn out_of_range_page_is_clamped_into_the_spec() {
        let mut page = PageController::new(PageKind::Reviews, state_with(reviews()), Recorder::default());
        let meta = page.handle(PageCommand::GoToPage(9)).unwrap();
        assert_eq!(meta.current_page, 2);
        assert_eq!(page.spec().page(), 2);
    }

    #[test]
    fn unknown_sort_falls_back_to_page_default() {
        let mut page = PageController::new(
            PageKind::Products,
            state_with(json!({"products": []})),
            Recorder::default(),
        );
        page.handle(PageCommand::Sort("cheapest".into())).unwrap();
        assert_eq!(page.spec().sort_key, SortKey::FeaturedFirst);
    }

    #[test]
    fn query_string_seeds_the_spec() {
        let page = PageController::from_query_string(
            PageKind::Reviews,
            state_with(reviews()),
            Recorder::default(),
            "?product=%E6%9C%80%E4%B8%AD&page=2",
        );
        assert_eq!(page.spec().product.as_deref(), Some("最中"));
        assert_eq!(page.spec().page(), 2);

        let lenient = PageController::from_query_string(
            PageKind::News,
            state_with(json!({})),
            Recorder::default(),
            "category=campaign&q=%ZZ",
        );
        assert_eq!(lenient.spec().search_term(), "%zz");
        assert_eq!(lenient.spec().category, CategoryFilter::parse("campaign"));
    }

    #[test]
    fn helpful_marks_update_the_store() {
        let state = state_with(reviews());
        let mut page = PageController::new(PageKind::Reviews, state.clone(), Recorder::default());
        page.handle(PageCommand::MarkHelpful("r3".into())).unwrap();
        page.handle(PageCommand::MarkHelpful("r3".into())).unwrap();
        page.handle(PageCommand::UnmarkHelpful("r3".into())).unwrap();

        let helpful = state
            .with_store(ContentType::Review, |s| s.get(&"r3".into()).and_then(Record::helpful))
            .unwrap();
        assert_eq!(helpful, Some(1));
        assert!(page.handle(PageCommand::MarkHelpful("missing".into())).is_err());
    }

    struct ChannelRenderer(mpsc::UnboundedSender<Vec<String>>);

    impl Renderer for ChannelRenderer {
        fn render(&mut self, items: &[Record], _meta: &PaginationMeta) {
            let _ = self.0.send(items.iter().map(|r| r.id.to_string()).collect());
        }
    }

    #[tokio::test]
    async fn run_rerenders_on_store_change_and_stops_on_close() {
        let state = state_with(reviews());
        let (tx, rx) = mpsc::channel(8);
        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        let lifetime = ViewLifetime::new();
        let page = PageController::new(PageKind::Reviews, state.clone(), ChannelRenderer(frames_tx));
        let task = tokio::spawn(page.run(rx, lifetime.clone()));

        assert_eq!(frames.recv().await.unwrap(), vec!["r4", "r3"]);

        state
            .apply(
                ContentType::Review,
                Mutation::SetActive {
                    id: "r4".into(),
                    active: false,
                },
            )
            .unwrap();
        assert_eq!(frames.recv().await.unwrap(), vec!["r3", "r2"]);

        // A change to another collection must not re-render this page.
        state
            .load_snapshot(&Snapshot::from_value(json!({"products": [{"id": "p", "title": "t"}]})).unwrap())
            .unwrap();
        tx.send(PageCommand::GoToPage(2)).await.unwrap();
        assert_eq!(frames.recv().await.unwrap(), vec!["r1"]);

        lifetime.close();
        task.await.unwrap().unwrap();
    }
}
