/// Store mutations. Collections are append/soft-delete only: besides
/// appending, the only in-place edits are the `active` flag and a review's
/// helpful counter.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::record::{ContentType, RecordId, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Append a record given in snapshot form.
    Append { record: Value },
    /// Soft-delete (`active: false`) or restore a record.
    SetActive { id: RecordId, active: bool },
    MarkHelpful { id: RecordId },
    /// Undo a helpful mark; the counter never drops below zero.
    UnmarkHelpful { id: RecordId },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Append { .. } => "append",
            Mutation::SetActive { .. } => "setActive",
            Mutation::MarkHelpful { .. } => "markHelpful",
            Mutation::UnmarkHelpful { .. } => "unmarkHelpful",
        }
    }
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("no {kind} record with id {id}")]
    NotFound { kind: ContentType, id: RecordId },
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),
    #[error("expected a {expected} record, got {found}")]
    WrongType {
        expected: ContentType,
        found: ContentType,
    },
    #[error("{kind} records have no helpful counter")]
    NoHelpfulCounter { kind: ContentType },
}

/// Result of an applied mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    pub id: RecordId,
    pub operation: String,
    pub revision: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mutations_use_tagged_wire_form() {
        let m: Mutation = serde_json::from_value(json!({"op": "setActive", "id": "r1", "active": false}))
            .unwrap();
        assert!(matches!(&m, Mutation::SetActive { id, active: false } if id.as_str() == "r1"));
        assert_eq!(m.name(), "setActive");

        let encoded = serde_json::to_value(Mutation::MarkHelpful { id: "r2".into() }).unwrap();
        assert_eq!(encoded, json!({"op": "markHelpful", "id": "r2"}));
    }
}
