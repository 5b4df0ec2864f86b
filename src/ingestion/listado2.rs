//! `listado2`: a remote JSON array of game objects.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{GameRecord, GameSource, IngestError, Parsed, SkipReason, SourceTag};
use crate::normalization::parse_release_date;

pub const DEFAULT_URL: &str = "https://api.example.com/listado2.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const REQUIRED_KEYS: [&str; 9] = [
    "id",
    "title",
    "platform",
    "genre",
    "developer",
    "publisher",
    "release_date",
    "description",
    "image_url",
];

pub struct Listado2Api {
    url: String,
    client: reqwest::Client,
}

impl Listado2Api {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gamerank/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestError::FetchFailed(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    async fn fetch_body(&self) -> Result<String, IngestError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| IngestError::FetchFailed(e.to_string()))?;
        resp.text()
            .await
            .map_err(|e| IngestError::FetchFailed(e.to_string()))
    }
}

#[async_trait]
impl GameSource for Listado2Api {
    fn tag(&self) -> SourceTag {
        SourceTag::Lis2
    }

    fn location(&self) -> &str {
        &self.url
    }

    async fn load(&self) -> Result<Vec<Parsed>, IngestError> {
        let body = self.fetch_body().await?;
        let parsed = parse_body(&body).map_err(|detail| IngestError::ParseError {
            location: self.url.clone(),
            detail,
        })?;
        info!(url = %self.url, elements = parsed.len(), "listado2 fetched");
        Ok(parsed)
    }
}

/// Parse a response body that must be a top-level JSON array.
pub fn parse_body(body: &str) -> Result<Vec<Parsed>, String> {
    let value: Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let Value::Array(items) = value else {
        return Err("expected a top-level JSON array".to_string());
    };
    Ok(items.iter().map(parse_item).collect())
}

fn parse_item(item: &Value) -> Parsed {
    let Some(obj) = item.as_object() else {
        return Err(SkipReason::InvalidValue { id: None, key: "id" });
    };
    let id = external_id(obj);

    let mut fields: Vec<&str> = Vec::with_capacity(REQUIRED_KEYS.len());
    for key in REQUIRED_KEYS {
        let Some(value) = obj.get(key) else {
            debug!(id = ?id, key, "listado2 element missing key");
            return Err(SkipReason::MissingKey { id, key });
        };
        if key == "id" {
            continue;
        }
        let Some(text) = value.as_str() else {
            return Err(SkipReason::InvalidValue { id, key });
        };
        fields.push(text);
    }
    let Some(id) = id else {
        return Err(SkipReason::InvalidValue { id: None, key: "id" });
    };

    // fields: title, platform, genre, developer, publisher, release_date, description, image_url
    let raw_date = fields[5];
    let Some(release_date) = parse_release_date(raw_date) else {
        return Err(SkipReason::InvalidDate {
            id,
            raw: raw_date.to_string(),
        });
    };

    Ok(GameRecord {
        external_id: id,
        title: fields[0].to_string(),
        platform: fields[1].to_string(),
        genre: fields[2].to_string(),
        developer: fields[3].to_string(),
        publisher: fields[4].to_string(),
        release_date,
        description: fields[6].to_string(),
        image_url: fields[7].to_string(),
        source_tag: SourceTag::Lis2,
    })
}

/// `id` may arrive as a string or an integer.
fn external_id(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
