//! The four content stores plus site settings, loaded together from one
//! snapshot.

use wasui_core::snapshot::{SiteSettings, Snapshot};
use wasui_core::store::LoadOutcome;
use wasui_core::{ContentStore, ContentType};

/// What one snapshot load changed.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub replaced: Vec<ContentType>,
    pub unchanged: Vec<ContentType>,
    /// Sections that failed validation. Entries without a type concern the
    /// settings section or, when it is the only entry, the whole blob.
    pub rejected: Vec<(Option<ContentType>, String)>,
    pub settings_changed: bool,
}

impl LoadReport {
    pub fn blob_rejected(reason: impl Into<String>) -> Self {
        Self {
            rejected: vec![(None, reason.into())],
            ..Self::default()
        }
    }

    pub fn is_noop(&self) -> bool {
        self.replaced.is_empty() && self.rejected.is_empty() && !self.settings_changed
    }
}

#[derive(Debug)]
pub struct SiteContent {
    news: ContentStore,
    products: ContentStore,
    gifts: ContentStore,
    reviews: ContentStore,
    settings: SiteSettings,
}

impl Default for SiteContent {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteContent {
    pub fn new() -> Self {
        Self {
            news: ContentStore::new(ContentType::News),
            products: ContentStore::new(ContentType::Product),
            gifts: ContentStore::new(ContentType::Gift),
            reviews: ContentStore::new(ContentType::Review),
            settings: SiteSettings::default(),
        }
    }

    pub fn store(&self, kind: ContentType) -> &ContentStore {
        match kind {
            ContentType::News => &self.news,
            ContentType::Product => &self.products,
            ContentType::Gift => &self.gifts,
            ContentType::Review => &self.reviews,
        }
    }

    pub fn store_mut(&mut self, kind: ContentType) -> &mut ContentStore {
        match kind {
            ContentType::News => &mut self.news,
            ContentType::Product => &mut self.products,
            ContentType::Gift => &mut self.gifts,
            ContentType::Review => &mut self.reviews,
        }
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    /// Load every section the snapshot carries. Sections it omits keep
    /// their current content.
    pub fn load(&mut self, snapshot: &Snapshot) -> LoadReport {
        let mut report = LoadReport::default();
        for kind in ContentType::ALL {
            let Some(section) = snapshot.section(kind) else {
                continue;
            };
            match self.store_mut(kind).load(section) {
                LoadOutcome::Replaced(_) => report.replaced.push(kind),
                LoadOutcome::Unchanged => report.unchanged.push(kind),
                LoadOutcome::Rejected(e) => report.rejected.push((Some(kind), e.to_string())),
            }
        }

        report.rejected.extend(
            snapshot
                .settings_rejections()
                .iter()
                .map(|reason| (None, reason.clone())),
        );
        if let Some(settings) = snapshot.settings() {
            if settings != &self.settings {
                self.settings = settings.clone();
                report.settings_changed = true;
            }
        }
        report
    }
}
