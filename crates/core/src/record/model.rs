use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// Number of characters of body text used for a news excerpt when no summary is set.
const EXCERPT_CHARS: usize = 100;

/// Display name used for reviews submitted without a name.
pub const ANONYMOUS_REVIEWER: &str = "匿名";

/// The content collections published on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    News,
    Product,
    Gift,
    Review,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::News,
        ContentType::Product,
        ContentType::Gift,
        ContentType::Review,
    ];

    /// Key of this collection inside the snapshot blob.
    pub fn snapshot_key(self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Product => "products",
            ContentType::Gift => "gifts",
            ContentType::Review => "reviews",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Product => "product",
            ContentType::Gift => "gift",
            ContentType::Review => "review",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category tag, trimmed and case-folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Normalise a raw tag. Blank input has no category.
    pub fn new(raw: &str) -> Option<Self> {
        let folded = raw.trim().to_lowercase();
        if folded.is_empty() {
            None
        } else {
            Some(Self(folded))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display label for a news category, as shown on the news badges.
    /// Editors may also store the Japanese label itself, which is shown as is.
    pub fn news_label(category: Option<&Category>) -> &str {
        match category.map(Category::as_str) {
            Some("campaign") => "キャンペーン",
            Some("event") => "イベント",
            Some("product") => "新商品",
            Some("important") => "重要",
            Some(label @ ("お知らせ" | "キャンペーン" | "イベント" | "新商品" | "重要")) => label,
            _ => "お知らせ",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One content item. The common shape is shared by every content type;
/// type-specific fields live in [`Details`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub category: Option<Category>,
    pub active: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub details: Details,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Details {
    News(NewsDetails),
    Product(ProductDetails),
    Gift(GiftDetails),
    Review(ReviewDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDetails {
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftDetails {
    pub title: String,
    pub gift_type: Option<String>,
    pub contents: Option<String>,
    pub price: Option<String>,
    pub noshi: bool,
    pub wrapping: bool,
    pub message: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetails {
    pub customer_name: Option<String>,
    /// Always within 1..=5 when present.
    pub rating: Option<u8>,
    pub content: String,
    pub product: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub helpful: u32,
}

impl Record {
    pub fn content_type(&self) -> ContentType {
        match self.details {
            Details::News(_) => ContentType::News,
            Details::Product(_) => ContentType::Product,
            Details::Gift(_) => ContentType::Gift,
            Details::Review(_) => ContentType::Review,
        }
    }

    /// Headline text. Reviews have none.
    pub fn title(&self) -> Option<&str> {
        match &self.details {
            Details::News(n) => Some(&n.title),
            Details::Product(p) => Some(&p.title),
            Details::Gift(g) => Some(&g.title),
            Details::Review(_) => None,
        }
    }

    pub fn rating(&self) -> Option<u8> {
        match &self.details {
            Details::Review(r) => r.rating,
            _ => None,
        }
    }

    pub fn helpful(&self) -> Option<u32> {
        match &self.details {
            Details::Review(r) => Some(r.helpful),
            _ => None,
        }
    }

    pub fn tags(&self) -> &[String] {
        match &self.details {
            Details::News(n) => &n.tags,
            _ => &[],
        }
    }

    /// Text fields searched by free-text queries: title, body/summary, and tags.
    pub fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        match &self.details {
            Details::News(n) => {
                fields.push(n.title.as_str());
                fields.extend(n.summary.as_deref());
                fields.push(n.content.as_str());
                fields.extend(n.tags.iter().map(String::as_str));
            }
            Details::Product(p) => {
                fields.push(p.title.as_str());
                fields.extend(p.description.as_deref());
            }
            Details::Gift(g) => {
                fields.push(g.title.as_str());
                fields.extend(g.gift_type.as_deref());
                fields.extend(g.contents.as_deref());
            }
            Details::Review(r) => {
                fields.push(r.content.as_str());
                fields.extend(r.product.as_deref());
                fields.extend(r.customer_name.as_deref());
            }
        }
        fields
    }

    /// Date as printed on listings, `YYYY.MM.DD`.
    pub fn display_date(&self) -> String {
        self.created_at.format("%Y.%m.%d").to_string()
    }
}

impl NewsDetails {
    /// The summary if one was written, otherwise the head of the body text.
    pub fn excerpt(&self) -> String {
        if let Some(summary) = self.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            return summary.to_string();
        }
        let head: String = self.content.chars().take(EXCERPT_CHARS).collect();
        format!("{head}...")
    }
}

impl GiftDetails {
    /// Service labels in fixed display order.
    pub fn services(&self) -> Vec<&'static str> {
        let mut services = Vec::new();
        if self.noshi {
            services.push("のし対応");
        }
        if self.wrapping {
            services.push("包装対応");
        }
        if self.message {
            services.push("メッセージカード");
        }
        services
    }
}

impl ReviewDetails {
    /// Filled and empty stars for the rating, e.g. `★★★☆☆`.
    pub fn stars(&self) -> String {
        let filled = usize::from(self.rating.unwrap_or(0).min(5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }

    pub fn display_name(&self) -> &str {
        self.customer_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(ANONYMOUS_REVIEWER)
    }

    /// Age and gender joined for the reviewer line, if either is known.
    pub fn customer_info(&self) -> Option<String> {
        let parts: Vec<&str> = [self.age.as_deref(), self.gender.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn news(summary: Option<&str>, content: &str) -> NewsDetails {
        NewsDetails {
            title: "春の新作".into(),
            summary: summary.map(str::to_string),
            content: content.into(),
            tags: vec!["桜".into()],
        }
    }

    #[test]
    fn category_is_trimmed_and_folded() {
        assert_eq!(Category::new("  Campaign ").unwrap().as_str(), "campaign");
        assert!(Category::new("   ").is_none());
    }

    #[test]
    fn news_label_falls_back_to_notice() {
        let campaign = Category::new("campaign");
        assert_eq!(Category::news_label(campaign.as_ref()), "キャンペーン");
        let unknown = Category::new("misc");
        assert_eq!(Category::news_label(unknown.as_ref()), "お知らせ");
        assert_eq!(Category::news_label(None), "お知らせ");
    }

    #[test]
    fn news_label_passes_japanese_labels_through() {
        for label in ["キャンペーン", "イベント", "新商品", "重要", "お知らせ"] {
            let category = Category::new(label);
            assert_eq!(Category::news_label(category.as_ref()), label);
        }
        let important = Category::new("important");
        assert_eq!(Category::news_label(important.as_ref()), "重要");
    }

    #[test]
    fn excerpt_prefers_summary() {
        assert_eq!(news(Some("要約"), "本文").excerpt(), "要約");
    }

    #[test]
    fn excerpt_truncates_content_by_chars() {
        let body = "あ".repeat(150);
        let excerpt = news(None, &body).excerpt();
        assert_eq!(excerpt.chars().count(), 103);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn stars_render_rating() {
        let review = ReviewDetails {
            customer_name: None,
            rating: Some(3),
            content: "美味しい".into(),
            product: None,
            age: Some("30代".into()),
            gender: None,
            helpful: 0,
        };
        assert_eq!(review.stars(), "★★★☆☆");
        assert_eq!(review.display_name(), ANONYMOUS_REVIEWER);
        assert_eq!(review.customer_info().as_deref(), Some("30代"));
    }

    #[test]
    fn gift_services_keep_display_order() {
        let gift = GiftDetails {
            title: "詰め合わせ".into(),
            gift_type: None,
            contents: None,
            price: None,
            noshi: true,
            wrapping: false,
            message: true,
        };
        assert_eq!(gift.services(), vec!["のし対応", "メッセージカード"]);
    }

    #[test]
    fn search_fields_cover_title_body_and_tags() {
        let record = Record {
            id: RecordId::from("n1"),
            category: None,
            active: true,
            featured: false,
            created_at: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            image: None,
            details: Details::News(news(Some("要約"), "本文")),
        };
        assert_eq!(record.search_fields(), vec!["春の新作", "要約", "本文", "桜"]);
        assert_eq!(record.display_date(), "2024.04.01");
        assert_eq!(record.content_type(), ContentType::News);
    }
}
