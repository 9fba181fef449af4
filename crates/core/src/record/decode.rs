//! Decoding of snapshot entries into [`Record`]s.
//!
//! The snapshot is written by an external editor, so every entry is read
//! through a lenient per-type shape first and then checked field by field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::id::RecordId;
use super::model::{
    Category, ContentType, Details, GiftDetails, NewsDetails, ProductDetails, Record,
    ReviewDetails,
};
use super::validate::{validate_rating, validate_required_text, ValidationError};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonFields {
    id: Option<Value>,
    category: Option<String>,
    active: Option<bool>,
    featured: Option<bool>,
    #[serde(alias = "date")]
    created_at: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsShape {
    #[serde(flatten)]
    common: CommonFields,
    title: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductShape {
    #[serde(flatten)]
    common: CommonFields,
    title: Option<String>,
    description: Option<String>,
    price: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GiftShape {
    #[serde(flatten)]
    common: CommonFields,
    title: Option<String>,
    #[serde(rename = "type")]
    gift_type: Option<String>,
    contents: Option<String>,
    price: Option<Value>,
    #[serde(default)]
    noshi: bool,
    #[serde(default)]
    wrapping: bool,
    #[serde(default)]
    message: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewShape {
    #[serde(flatten)]
    common: CommonFields,
    #[serde(alias = "name")]
    customer_name: Option<String>,
    rating: Option<Value>,
    content: Option<String>,
    product: Option<String>,
    age: Option<String>,
    gender: Option<String>,
    #[serde(default)]
    helpful: u32,
}

/// Decode one snapshot entry as a record of the given type.
pub fn decode_record(kind: ContentType, value: Value) -> Result<Record, ValidationError> {
    match kind {
        ContentType::News => {
            let shape: NewsShape = serde_json::from_value(value)?;
            let title = validate_required_text(shape.title.as_deref(), || {
                ValidationError::MissingTitle
            })?;
            let details = Details::News(NewsDetails {
                title,
                summary: non_blank(shape.summary),
                content: shape.content,
                tags: shape.tags,
            });
            finish(shape.common, details, true)
        }
        ContentType::Product => {
            let shape: ProductShape = serde_json::from_value(value)?;
            let title = validate_required_text(shape.title.as_deref(), || {
                ValidationError::MissingTitle
            })?;
            let details = Details::Product(ProductDetails {
                title,
                description: non_blank(shape.description),
                price: display_price(shape.price),
            });
            finish(shape.common, details, false)
        }
        ContentType::Gift => {
            let shape: GiftShape = serde_json::from_value(value)?;
            let title = validate_required_text(shape.title.as_deref(), || {
                ValidationError::MissingTitle
            })?;
            let details = Details::Gift(GiftDetails {
                title,
                gift_type: non_blank(shape.gift_type),
                contents: non_blank(shape.contents),
                price: display_price(shape.price),
                noshi: shape.noshi,
                wrapping: shape.wrapping,
                message: shape.message,
            });
            finish(shape.common, details, false)
        }
        ContentType::Review => {
            let shape: ReviewShape = serde_json::from_value(value)?;
            let content = validate_required_text(shape.content.as_deref(), || {
                ValidationError::MissingContent
            })?;
            let details = Details::Review(ReviewDetails {
                customer_name: non_blank(shape.customer_name),
                rating: validate_rating(shape.rating.as_ref())?,
                content,
                product: non_blank(shape.product),
                age: non_blank(shape.age),
                gender: non_blank(shape.gender),
                helpful: shape.helpful,
            });
            finish(shape.common, details, true)
        }
    }
}

fn finish(
    common: CommonFields,
    details: Details,
    date_required: bool,
) -> Result<Record, ValidationError> {
    let id = RecordId::from_value(common.id.as_ref())?;
    let created_at = match common.created_at.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_date(raw)?,
        _ if date_required => return Err(ValidationError::MissingDate),
        _ => DateTime::<Utc>::UNIX_EPOCH,
    };
    Ok(Record {
        id,
        category: common.category.as_deref().and_then(Category::new),
        active: common.active.unwrap_or(true),
        featured: common.featured.unwrap_or(false),
        created_at,
        image: non_blank(common.image),
        details,
    })
}

/// Parse an RFC 3339 timestamp, a naive timestamp (UTC), or a bare date (midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc());
            }
        }
    }
    Err(ValidationError::InvalidDate(raw.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn display_price(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_blank(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decode_news_with_date_alias() {
        let record = decode_record(
            ContentType::News,
            json!({
                "id": "n1",
                "category": "Campaign",
                "date": "2024-03-01",
                "title": "ひな祭りフェア",
                "content": "期間限定",
                "tags": ["季節"]
            }),
        )
        .unwrap();
        assert_eq!(record.id.as_str(), "n1");
        assert_eq!(record.category.as_ref().unwrap().as_str(), "campaign");
        assert!(record.active);
        assert!(!record.featured);
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(record.tags(), ["季節".to_string()]);
    }

    #[test]
    fn decode_review_with_string_rating() {
        let record = decode_record(
            ContentType::Review,
            json!({
                "id": 17,
                "customerName": "田中",
                "rating": "4",
                "content": "上品な甘さ",
                "createdAt": "2024-05-02T09:30:00+09:00",
                "active": false
            }),
        )
        .unwrap();
        assert_eq!(record.rating(), Some(4));
        assert_eq!(record.helpful(), Some(0));
        assert!(!record.active);
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn products_without_date_sort_as_epoch() {
        let record = decode_record(
            ContentType::Product,
            json!({"id": "p1", "title": "どら焼き", "price": 350, "featured": true}),
        )
        .unwrap();
        assert_eq!(record.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert!(record.featured);
        match &record.details {
            Details::Product(p) => assert_eq!(p.price.as_deref(), Some("350")),
            other => panic!("expected product, got {other:?}"),
        }
    }

    #[test]
    fn gift_type_field_is_read() {
        let record = decode_record(
            ContentType::Gift,
            json!({"id": "g1", "title": "詰め合わせ", "type": "お中元", "noshi": true}),
        )
        .unwrap();
        match &record.details {
            Details::Gift(g) => {
                assert_eq!(g.gift_type.as_deref(), Some("お中元"));
                assert!(g.noshi);
            }
            other => panic!("expected gift, got {other:?}"),
        }
    }

    #[test]
    fn news_without_date_is_rejected() {
        let err = decode_record(ContentType::News, json!({"id": "n1", "title": "x"}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingDate));
    }

    #[test]
    fn review_out_of_range_rating_is_rejected() {
        let err = decode_record(
            ContentType::Review,
            json!({"id": "r1", "rating": 9, "content": "x", "date": "2024-01-01"}),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::RatingOutOfRange(9)));
    }

    #[test]
    fn non_object_entries_are_malformed() {
        let err = decode_record(ContentType::Product, json!("just a string")).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn parse_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-01-15").unwrap(), midnight);
        assert_eq!(parse_date("2024/01/15").unwrap(), midnight);
        assert_eq!(parse_date("2024.01.15").unwrap(), midnight);
        assert_eq!(
            parse_date("2024-01-15T08:00:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_date("next tuesday"),
            Err(ValidationError::InvalidDate(_))
        ));
    }
}
