use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::ContentType;

/// Events emitted when content changes, consumed by page controllers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    Changed(StoreChange),
    Rejected(RejectedLoad),
    SettingsUpdated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Loaded,
    Mutated,
}

/// Notice passed to store listeners after a successful load or mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreChange {
    pub content_type: ContentType,
    pub revision: u64,
    pub kind: ChangeKind,
    pub total: usize,
    pub active: usize,
}

/// A snapshot section that failed validation; the previous content was kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedLoad {
    pub content_type: Option<ContentType>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
