//! `listado1`: a local XML file of `<game>` elements.

use async_trait::async_trait;
use roxmltree::{Document, Node};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{GameRecord, GameSource, IngestError, Parsed, SkipReason, SourceTag};
use crate::normalization::parse_release_date;

pub const DEFAULT_PATH: &str = "listado1.xml";

/// Child element names in source order, paired with the field they feed.
const FIELDS: [(&str, &str); 9] = [
    ("id", "id"),
    ("title", "title"),
    ("platform", "platform"),
    ("genre", "genre"),
    ("developer", "developer"),
    ("publisher", "publisher"),
    ("release_date", "release_date"),
    ("short_description", "description"),
    ("thumbnail", "image_url"),
];

pub struct Listado1File {
    path: PathBuf,
    display: String,
}

impl Listado1File {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl GameSource for Listado1File {
    fn tag(&self) -> SourceTag {
        SourceTag::Lis1
    }

    fn location(&self) -> &str {
        &self.display
    }

    async fn load(&self) -> Result<Vec<Parsed>, IngestError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IngestError::FileNotFound(self.display.clone()))
            }
            Err(source) => {
                return Err(IngestError::Io {
                    path: self.display.clone(),
                    source,
                })
            }
        };
        let parsed = parse_document(&text).map_err(|detail| IngestError::ParseError {
            location: self.display.clone(),
            detail,
        })?;
        info!(path = %self.display, elements = parsed.len(), "listado1 parsed");
        Ok(parsed)
    }
}

/// Parse every `<game>` element found anywhere below the root element.
///
/// Returns `Err` with the parser's message when the text is not well-formed XML.
pub fn parse_document(text: &str) -> Result<Vec<Parsed>, String> {
    let doc = Document::parse(text).map_err(|e| e.to_string())?;
    Ok(doc
        .root_element()
        .descendants()
        .skip(1)
        .filter(|n| n.has_tag_name("game"))
        .map(parse_game)
        .collect())
}

fn child_text<'a>(game: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    game.children()
        .find(|c| c.has_tag_name(tag))
        .map(|c| c.text().unwrap_or(""))
}

fn parse_game(game: Node<'_, '_>) -> Parsed {
    let mut values: Vec<Option<&str>> =
        FIELDS.iter().map(|(tag, _)| child_text(game, tag)).collect();
    // A blank id cannot form a catalog key.
    if values[0].is_some_and(|id| id.trim().is_empty()) {
        values[0] = None;
    }
    let id = values[0].map(str::to_string);

    let missing: Vec<&'static str> = FIELDS
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_none())
        .map(|((_, field), _)| *field)
        .collect();
    if !missing.is_empty() {
        debug!(id = ?id, ?missing, "listado1 element incomplete");
        return Err(SkipReason::MissingFields {
            id,
            fields: missing,
        });
    }

    let field = |i: usize| values[i].unwrap_or_default();
    let (id, raw_date) = (field(0), field(6));
    let Some(release_date) = parse_release_date(raw_date) else {
        return Err(SkipReason::InvalidDate {
            id: id.to_string(),
            raw: raw_date.to_string(),
        });
    };

    Ok(GameRecord {
        external_id: id.to_string(),
        title: field(1).to_string(),
        platform: field(2).to_string(),
        genre: field(3).to_string(),
        developer: field(4).to_string(),
        publisher: field(5).to_string(),
        release_date,
        description: field(7).to_string(),
        image_url: field(8).to_string(),
        source_tag: SourceTag::Lis1,
    })
}
