/// Record ID utilities.
///
/// IDs are opaque and unique within one content type. The CMS editor writes
/// them either as strings or as numeric timestamps, so both are accepted and
/// normalised to their string form. IDs minted by the site itself follow
/// `{type}-{uuid}`.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::model::ContentType;
use super::validate::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Parse an ID from its textual form. Surrounding whitespace is dropped.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse an ID from a snapshot value (string or integer).
    pub fn from_value(value: Option<&Value>) -> Result<Self, ValidationError> {
        match value {
            None | Some(Value::Null) => Err(ValidationError::MissingId),
            Some(Value::String(s)) => Self::parse(s),
            Some(Value::Number(n)) => Self::parse(&n.to_string()),
            Some(other) => Err(ValidationError::InvalidId(other.to_string())),
        }
    }

    /// Mint a fresh ID for a record created on the site (e.g. a submitted review).
    pub fn generate(kind: ContentType) -> Self {
        Self(format!("{}-{}", kind.as_str(), Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_trims_whitespace() {
        let id = RecordId::parse("  news-1 ").unwrap();
        assert_eq!(id.as_str(), "news-1");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(matches!(RecordId::parse("   "), Err(ValidationError::EmptyId)));
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let id = RecordId::from_value(Some(&json!(1712345678901_i64))).unwrap();
        assert_eq!(id.as_str(), "1712345678901");
    }

    #[test]
    fn missing_and_structured_ids_are_rejected() {
        assert!(matches!(
            RecordId::from_value(None),
            Err(ValidationError::MissingId)
        ));
        assert!(matches!(
            RecordId::from_value(Some(&json!(null))),
            Err(ValidationError::MissingId)
        ));
        assert!(matches!(
            RecordId::from_value(Some(&json!({"a": 1}))),
            Err(ValidationError::InvalidId(_))
        ));
    }

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = RecordId::generate(ContentType::Review);
        let b = RecordId::generate(ContentType::Review);
        assert!(a.as_str().starts_with("review-"));
        assert_ne!(a, b);
    }
}
