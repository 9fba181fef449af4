/// Record validation utilities.
use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use super::id::RecordId;
use super::model::Record;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("record is not an object: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("record id is required")]
    MissingId,
    #[error("record id cannot be empty")]
    EmptyId,
    #[error("record id must be a string or number, got {0}")]
    InvalidId(String),
    #[error("duplicate record id {0}")]
    DuplicateId(RecordId),
    #[error("record title is required")]
    MissingTitle,
    #[error("review content is required")]
    MissingContent,
    #[error("record date is required")]
    MissingDate,
    #[error("unparseable date {0:?}")]
    InvalidDate(String),
    #[error("rating must be a whole number, got {0}")]
    InvalidRating(String),
    #[error("rating {0} is outside 1..=5")]
    RatingOutOfRange(i64),
}

/// Validate that the human-facing text a record cannot be shown without is present.
pub fn validate_required_text(
    text: Option<&str>,
    missing: fn() -> ValidationError,
) -> Result<String, ValidationError> {
    match text.map(str::trim) {
        None | Some("") => Err(missing()),
        Some(t) => Ok(t.to_string()),
    }
}

/// Parse a rating given as an integer or a numeric string and check its range.
pub fn validate_rating(raw: Option<&Value>) -> Result<Option<u8>, ValidationError> {
    let n = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ValidationError::InvalidRating(n.to_string()))?,
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidRating(s.clone()))?,
        Some(other) => return Err(ValidationError::InvalidRating(other.to_string())),
    };
    match u8::try_from(n) {
        Ok(r @ 1..=5) => Ok(Some(r)),
        _ => Err(ValidationError::RatingOutOfRange(n)),
    }
}

/// Ensure no two records in one collection share an ID.
pub fn validate_unique_ids(records: &[Record]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(&record.id) {
            return Err(ValidationError::DuplicateId(record.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rating_accepts_numbers_and_numeric_strings() {
        assert_eq!(validate_rating(Some(&json!(4))).unwrap(), Some(4));
        assert_eq!(validate_rating(Some(&json!(" 5 "))).unwrap(), Some(5));
        assert_eq!(validate_rating(None).unwrap(), None);
        assert_eq!(validate_rating(Some(&json!(""))).unwrap(), None);
    }

    #[test]
    fn rating_rejects_out_of_range() {
        assert!(matches!(
            validate_rating(Some(&json!(0))),
            Err(ValidationError::RatingOutOfRange(0))
        ));
        assert!(matches!(
            validate_rating(Some(&json!(6))),
            Err(ValidationError::RatingOutOfRange(6))
        ));
        assert!(matches!(
            validate_rating(Some(&json!(4.5))),
            Err(ValidationError::InvalidRating(_))
        ));
        assert!(matches!(
            validate_rating(Some(&json!("great"))),
            Err(ValidationError::InvalidRating(_))
        ));
    }

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(
            validate_required_text(Some("  柏餅 "), || ValidationError::MissingTitle).unwrap(),
            "柏餅"
        );
        assert!(matches!(
            validate_required_text(Some("  "), || ValidationError::MissingTitle),
            Err(ValidationError::MissingTitle)
        ));
    }
}
