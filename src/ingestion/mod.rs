//! Batch importers that normalize external game listings into the catalog.
//!
//! Each source (`listado1` XML, `listado2` JSON) owns a namespace: records are
//! stored under `"<tag>-<external id>"`, so two sources reusing the same local
//! numbering never collide.

pub mod driver;
pub mod listado1;
pub mod listado2;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use driver::{run_import, CommitPolicy, ImportSummary};
pub use listado1::Listado1File;
pub use listado2::Listado2Api;

/// Origin of an imported record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    #[serde(rename = "LIS1")]
    Lis1,
    #[serde(rename = "LIS2")]
    Lis2,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::Lis1 => "LIS1",
            SourceTag::Lis2 => "LIS2",
        }
    }

    /// Catalog primary key for a source-local id.
    pub fn composite_id(self, external_id: &str) -> String {
        format!("{}-{}", self.as_str(), external_id)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A game normalized out of any source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub external_id: String,
    pub title: String,
    pub platform: String,
    pub genre: String,
    pub developer: String,
    pub publisher: String,
    pub release_date: NaiveDate,
    pub description: String,
    pub image_url: String,
    pub source_tag: SourceTag,
}

impl GameRecord {
    pub fn composite_id(&self) -> String {
        self.source_tag.composite_id(&self.external_id)
    }
}

/// Why a single source element was not imported. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("Skipping game ID '{}': Missing fields: {}", .id.as_deref().filter(|id| !id.is_empty()).unwrap_or("UNKNOWN"), .fields.join(", "))]
    MissingFields {
        id: Option<String>,
        fields: Vec<&'static str>,
    },
    #[error("Error processing game: missing key '{key}'")]
    MissingKey { id: Option<String>, key: &'static str },
    #[error("Error processing game: invalid value for '{key}'")]
    InvalidValue { id: Option<String>, key: &'static str },
    #[error("Skipping game ID '{id}': Invalid date format '{raw}'")]
    InvalidDate { id: String, raw: String },
    #[error("Error saving game ID '{game_id}': {detail}")]
    SaveFailed { game_id: String, detail: String },
}

impl SkipReason {
    /// Best-known identifier of the skipped element, if any.
    pub fn game_id(&self) -> Option<&str> {
        match self {
            SkipReason::MissingFields { id, .. }
            | SkipReason::MissingKey { id, .. }
            | SkipReason::InvalidValue { id, .. } => id.as_deref(),
            SkipReason::InvalidDate { id, .. } => Some(id),
            SkipReason::SaveFailed { game_id, .. } => Some(game_id),
        }
    }
}

/// Failures that end a run before anything is written (or roll back what was).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Invalid document at {location}: {detail}")]
    ParseError { location: String, detail: String },
    #[error("Error fetching data from API: {0}")]
    FetchFailed(String),
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Parsed = Result<GameRecord, SkipReason>;

/// A source that yields one parse outcome per game element.
///
/// `load` reads and parses the whole document before returning, so a fatal
/// error always surfaces before the driver performs any write.
#[async_trait]
pub trait GameSource: Send + Sync {
    fn tag(&self) -> SourceTag;

    /// Human-readable location (path or URL) for log lines.
    fn location(&self) -> &str;

    async fn load(&self) -> Result<Vec<Parsed>, IngestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_ids_are_namespaced_per_source() {
        assert_eq!(SourceTag::Lis1.composite_id("42"), "LIS1-42");
        assert_eq!(SourceTag::Lis2.composite_id("42"), "LIS2-42");
        assert_ne!(
            SourceTag::Lis1.composite_id("42"),
            SourceTag::Lis2.composite_id("42")
        );
    }

    #[test]
    fn skip_messages_name_the_element() {
        let missing = SkipReason::MissingFields {
            id: None,
            fields: vec!["id", "genre"],
        };
        assert_eq!(
            missing.to_string(),
            "Skipping game ID 'UNKNOWN': Missing fields: id, genre"
        );
        let bad_date = SkipReason::InvalidDate {
            id: "7".into(),
            raw: "2024/01/01".into(),
        };
        assert_eq!(
            bad_date.to_string(),
            "Skipping game ID '7': Invalid date format '2024/01/01'"
        );
        assert_eq!(bad_date.game_id(), Some("7"));
    }
}
