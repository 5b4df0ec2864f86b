use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use tracing::debug;

use super::db::Db;
use super::Page;
use crate::ingestion::GameRecord;
use crate::normalization::{mean_score, VoteScore};

/// Persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Game {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Figures derived from a game's votes, follows and comments at read time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct GameStats {
    pub average_score: f64,
    pub votes_count: i64,
    pub followers_count: i64,
    pub comments_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RankedGame {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub game: Game,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub stats: GameStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Insert `record` under `id`, or overwrite the existing row in place.
///
/// The primary key and `created_at` of an existing row are never touched;
/// `updated_at` is refreshed on every call. Errors are returned untouched so
/// the caller decides whether they skip a record or abort a run.
pub async fn upsert_game(
    conn: &mut SqliteConnection,
    id: &str,
    record: &GameRecord,
    now: DateTime<Utc>,
) -> Result<UpsertOutcome, sqlx::Error> {
    let existing: Option<String> = sqlx::query_scalar("SELECT id FROM games WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let outcome = if existing.is_some() {
        sqlx::query(
            "UPDATE games SET title = ?, platform = ?, genre = ?, developer = ?, publisher = ?, \
                 release_date = ?, description = ?, image_url = ?, source = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&record.title)
        .bind(&record.platform)
        .bind(&record.genre)
        .bind(&record.developer)
        .bind(&record.publisher)
        .bind(record.release_date)
        .bind(&record.description)
        .bind(&record.image_url)
        .bind(record.source_tag.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        UpsertOutcome::Updated
    } else {
        sqlx::query(
            "INSERT INTO games (id, title, platform, genre, developer, publisher, release_date, \
                 description, image_url, source, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.platform)
        .bind(&record.genre)
        .bind(&record.developer)
        .bind(&record.publisher)
        .bind(record.release_date)
        .bind(&record.description)
        .bind(&record.image_url)
        .bind(record.source_tag.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        UpsertOutcome::Created
    };
    debug!(game_id = id, ?outcome, "game upserted");
    Ok(outcome)
}

pub async fn get_game(db: &Db, id: &str) -> Result<Option<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = ?")
        .bind(id)
        .fetch_optional(&db.pool)
        .await
}

/// Aggregate votes, follows and comments for one game.
pub async fn game_stats(db: &Db, id: &str) -> Result<GameStats, sqlx::Error> {
    let scores: Vec<i64> = sqlx::query_scalar("SELECT score FROM votes WHERE game_id = ?")
        .bind(id)
        .fetch_all(&db.pool)
        .await?;
    let followers_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE game_id = ?")
        .bind(id)
        .fetch_one(&db.pool)
        .await?;
    let comments_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE game_id = ?")
            .bind(id)
            .fetch_one(&db.pool)
            .await?;

    Ok(GameStats {
        average_score: mean_score(scores.iter().filter_map(|s| VoteScore::new(*s))),
        votes_count: scores.len() as i64,
        followers_count,
        comments_count,
    })
}

pub async fn count_games(db: &Db) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM games")
        .fetch_one(&db.pool)
        .await
}

/// Sort orders offered for catalog listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrder {
    /// Average score descending (unvoted games last), then title.
    #[default]
    Ranked,
    /// Release date descending, then title.
    Recent,
}

impl CatalogOrder {
    fn order_by(self) -> &'static str {
        match self {
            CatalogOrder::Ranked => "raw_avg IS NULL, raw_avg DESC, title ASC",
            CatalogOrder::Recent => "release_date DESC, title ASC",
        }
    }
}

/// One page of the catalog with read-time statistics.
pub async fn list_games(
    db: &Db,
    order: CatalogOrder,
    page: u32,
    per_page: u32,
) -> Result<Page<RankedGame>, sqlx::Error> {
    let total = count_games(db).await?;
    let page = page.max(1);
    let offset = (page as i64 - 1) * per_page as i64;

    let sql = format!(
        "SELECT * FROM ( \
             SELECT g.*, \
                 (SELECT AVG(v.score) FROM votes v WHERE v.game_id = g.id) AS raw_avg, \
                 COALESCE((SELECT AVG(v.score) FROM votes v WHERE v.game_id = g.id), 0.0) AS average_score, \
                 (SELECT COUNT(*) FROM votes v WHERE v.game_id = g.id) AS votes_count, \
                 (SELECT COUNT(*) FROM follows f WHERE f.game_id = g.id) AS followers_count, \
                 (SELECT COUNT(*) FROM comments c WHERE c.game_id = g.id) AS comments_count \
             FROM games g \
         ) ORDER BY {} \
         LIMIT ? OFFSET ?",
        order.order_by()
    );
    let items = sqlx::query_as::<_, RankedGame>(&sql)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&db.pool)
        .await?;

    Ok(Page::new(items, page, per_page, total))
}

/// Catalog ranked by average score (unvoted games last), then title.
pub async fn ranked_games(
    db: &Db,
    page: u32,
    per_page: u32,
) -> Result<Page<RankedGame>, sqlx::Error> {
    list_games(db, CatalogOrder::Ranked, page, per_page).await
}
