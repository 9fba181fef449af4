//! The externally supplied content blob.
//!
//! The blob is a JSON object keyed by collection (`news`, `products`,
//! `gifts`, `reviews`) plus a `settings` object. It is written by an
//! uncontrolled editor, so parsing only checks that the blob is an object.
//! Each section is judged on its own when it is loaded into a store, and a bad
//! section never costs the others their update.

pub mod settings;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde_json::Value;
use thiserror::Error;

use crate::record::decode::decode_record;
use crate::record::validate::validate_unique_ids;
use crate::record::{ContentType, Record, ValidationError};

pub use settings::SiteSettings;

/// Cache key of the full content blob.
pub const DATA_KEY: &str = "wasui_data";
/// Cache key of a bare news array that takes precedence over the blob's news section.
pub const NEWS_KEY: &str = "wasui_news";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("snapshot must be a JSON object")]
    NotAnObject,
    #[error("{kind} section must be an array")]
    NotAnArray { kind: ContentType },
    #[error("{kind} entry {index}: {source}")]
    InvalidRecord {
        kind: ContentType,
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("{kind} section: {source}")]
    InvalidCollection {
        kind: ContentType,
        #[source]
        source: ValidationError,
    },
    #[error("settings section must be an object")]
    SettingsNotAnObject,
    #[error("settings field {field} must be text, ignoring it")]
    SettingsField { field: &'static str },
}

/// A parsed, shape-checked content blob.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    sections: HashMap<ContentType, Value>,
    settings: Option<SiteSettings>,
    settings_rejections: Vec<String>,
}

impl Snapshot {
    /// Parse a raw blob as read from the cache.
    pub fn parse(raw: &str) -> Result<Self, SnapshotError> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let Value::Object(mut map) = value else {
            return Err(SnapshotError::NotAnObject);
        };

        // A section of the wrong shape is kept so the store rejects it on
        // load, leaving the other sections free to update.
        let mut sections = HashMap::new();
        for kind in ContentType::ALL {
            match map.remove(kind.snapshot_key()) {
                None | Some(Value::Null) => {}
                Some(section) => {
                    sections.insert(kind, section);
                }
            }
        }

        let mut settings_rejections = Vec::new();
        let settings = match map.remove("settings") {
            None | Some(Value::Null) => None,
            Some(Value::Object(fields)) => {
                let (settings, dropped) = SiteSettings::from_map_lenient(&fields);
                settings_rejections.extend(
                    dropped
                        .into_iter()
                        .map(|field| SnapshotError::SettingsField { field }.to_string()),
                );
                Some(settings)
            }
            Some(_) => {
                settings_rejections.push(SnapshotError::SettingsNotAnObject.to_string());
                None
            }
        };

        Ok(Self {
            sections,
            settings,
            settings_rejections,
        })
    }

    /// Replace the news section with a standalone news array.
    pub fn with_news_override(mut self, news: Value) -> Result<Self, SnapshotError> {
        if !news.is_array() {
            return Err(SnapshotError::NotAnArray {
                kind: ContentType::News,
            });
        }
        self.sections.insert(ContentType::News, news);
        Ok(self)
    }

    /// The raw section for a collection, if the blob carries one.
    pub fn section(&self, kind: ContentType) -> Option<&Value> {
        self.sections.get(&kind)
    }

    pub fn settings(&self) -> Option<&SiteSettings> {
        self.settings.as_ref()
    }

    /// Why the settings section, or some of its fields, were not used.
    pub fn settings_rejections(&self) -> &[String] {
        &self.settings_rejections
    }
}

/// Decode every entry of a section. Any bad entry rejects the whole section.
pub fn decode_section(kind: ContentType, section: &Value) -> Result<Vec<Record>, SnapshotError> {
    let entries = section
        .as_array()
        .ok_or(SnapshotError::NotAnArray { kind })?;

    let records = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            decode_record(kind, entry.clone())
                .map_err(|source| SnapshotError::InvalidRecord { kind, index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    validate_unique_ids(&records)
        .map_err(|source| SnapshotError::InvalidCollection { kind, source })?;
    Ok(records)
}

/// Content hash of a section, used to skip redundant reloads.
///
/// Object keys serialise in sorted order, so equal content hashes equally.
pub fn fingerprint(section: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    section.to_string().hash(&mut hasher);
    hasher.finish()
}
