// Home page widgets: short, non-paginated previews of each collection.

use serde::Serialize;
use wasui_core::{ContentType, Record};
use wasui_query::{featured_first, newest_first};

use crate::error::SiteResult;
use crate::state::SiteState;

pub const NEWS_PREVIEW: usize = 3;
pub const PRODUCT_PREVIEW: usize = 6;
pub const GIFT_PREVIEW: usize = 4;
pub const REVIEW_PREVIEW: usize = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePreview {
    pub news: Vec<Record>,
    pub products: Vec<Record>,
    pub gifts: Vec<Record>,
    pub reviews: Vec<Record>,
    /// Announcement banner, when the editor set one.
    pub notice: Option<String>,
}

impl HomePreview {
    pub fn build(state: &SiteState) -> SiteResult<Self> {
        let content = state.content()?;
        let owned = |records: Vec<&Record>| records.into_iter().cloned().collect::<Vec<_>>();

        Ok(Self {
            news: owned(newest_first(
                content.store(ContentType::News).get_all(),
                NEWS_PREVIEW,
            )),
            products: owned(featured_first(
                content.store(ContentType::Product).get_all(),
                PRODUCT_PREVIEW,
            )),
            gifts: owned(featured_first(
                content.store(ContentType::Gift).get_all(),
                GIFT_PREVIEW,
            )),
            reviews: owned(featured_first(
                content.store(ContentType::Review).get_all(),
                REVIEW_PREVIEW,
            )),
            notice: content.settings().notice().map(str::to_string),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.news.is_empty()
            && self.products.is_empty()
            && self.gifts.is_empty()
            && self.reviews.is_empty()
    }
}
