// API request/response models (DTOs)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::database_ops::activity::{Comment, FollowState};
use crate::database_ops::games::{CatalogOrder, Game, GameStats};
use crate::database_ops::users::{UserProfile, UserStats};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(detail: ErrorDetail) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(detail),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error details for clients; `field` names the offending form field.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CatalogQuery {
    pub page: Option<u32>,
    #[serde(default)]
    pub order: CatalogOrder,
}

impl CatalogQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

impl NextQuery {
    /// Local redirect target; anything that could leave the site falls back to `/`.
    pub fn target(&self) -> String {
        match self.next.as_deref() {
            Some(next) if next.starts_with('/') && !next.starts_with("//") => next.to_string(),
            _ => "/".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub next: String,
}

#[derive(Debug, Serialize)]
pub struct GameDetail {
    pub game: Game,
    pub stats: GameStats,
    pub comments: Vec<Comment>,
    pub user_vote: Option<i64>,
    pub user_follow: bool,
}

/// Flat per-game document served at `/game/{id}.json`.
#[derive(Debug, Serialize)]
pub struct GameJson {
    pub id: String,
    pub title: String,
    pub platform: String,
    pub genre: String,
    pub developer: String,
    pub publisher: String,
    pub release_date: NaiveDate,
    pub description: String,
    pub image_url: String,
    pub source: String,
    pub average_score: f64,
    pub votes_count: i64,
    pub comment_count: i64,
}

impl GameJson {
    pub fn new(game: Game, stats: &GameStats) -> Self {
        Self {
            id: game.id,
            title: game.title,
            platform: game.platform,
            genre: game.genre,
            developer: game.developer,
            publisher: game.publisher,
            release_date: game.release_date,
            description: game.description,
            image_url: game.image_url,
            source: game.source,
            average_score: stats.average_score,
            votes_count: stats.votes_count,
            comment_count: stats.comments_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum GameAction {
    Vote { score: i64 },
    Follow,
    Comment { body: String },
}

#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow: Option<FollowState>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub username: String,
    pub display_name: String,
    pub stats: UserStats,
}

#[derive(Debug, Serialize)]
pub struct Settings {
    pub display_name: String,
    pub profile: UserProfile,
}
