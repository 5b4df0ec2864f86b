//! Votes, follows and comments users attach to catalog games.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::db::Db;
use super::Page;
use crate::normalization::VoteScore;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Vote {
    pub user_id: i64,
    pub game_id: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub game_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A vote or follow listed from the user's side, with the game title joined in.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserActivity {
    pub game_id: String,
    pub game_title: String,
    pub score: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    Following,
    Unfollowed,
}

/// Record or replace the user's score for a game.
pub async fn cast_vote(
    db: &Db,
    user_id: i64,
    game_id: &str,
    score: VoteScore,
) -> Result<Vote, sqlx::Error> {
    sqlx::query_as::<_, Vote>(
        "INSERT INTO votes (user_id, game_id, score, created_at) VALUES (?, ?, ?, ?) \
         ON CONFLICT (user_id, game_id) DO UPDATE SET score = excluded.score \
         RETURNING *",
    )
    .bind(user_id)
    .bind(game_id)
    .bind(i64::from(score))
    .bind(Utc::now())
    .fetch_one(&db.pool)
    .await
}

pub async fn user_vote(db: &Db, user_id: i64, game_id: &str) -> Result<Option<Vote>, sqlx::Error> {
    sqlx::query_as::<_, Vote>("SELECT * FROM votes WHERE user_id = ? AND game_id = ?")
        .bind(user_id)
        .bind(game_id)
        .fetch_optional(&db.pool)
        .await
}

/// Follow the game, or unfollow it when already following.
pub async fn toggle_follow(db: &Db, user_id: i64, game_id: &str) -> Result<FollowState, sqlx::Error> {
    let mut tx = db.pool.begin().await?;
    let removed = sqlx::query("DELETE FROM follows WHERE user_id = ? AND game_id = ?")
        .bind(user_id)
        .bind(game_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let state = if removed > 0 {
        FollowState::Unfollowed
    } else {
        sqlx::query("INSERT INTO follows (user_id, game_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(game_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        FollowState::Following
    };
    tx.commit().await?;
    Ok(state)
}

pub async fn is_following(db: &Db, user_id: i64, game_id: &str) -> Result<bool, sqlx::Error> {
    let n: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ? AND game_id = ?")
            .bind(user_id)
            .bind(game_id)
            .fetch_one(&db.pool)
            .await?;
    Ok(n > 0)
}

/// Attach a comment. Callers reject blank bodies beforehand.
pub async fn add_comment(
    db: &Db,
    user_id: i64,
    game_id: &str,
    body: &str,
) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_scalar(
        "INSERT INTO comments (user_id, game_id, body, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(game_id)
    .bind(body)
    .bind(now)
    .bind(now)
    .fetch_one(&db.pool)
    .await
}

/// Newest comments on a game.
pub async fn recent_comments(
    db: &Db,
    game_id: &str,
    limit: u32,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT c.id, c.user_id, u.username, c.game_id, c.body, c.created_at, c.updated_at \
         FROM comments c JOIN users u ON u.id = c.user_id \
         WHERE c.game_id = ? ORDER BY c.created_at DESC, c.id DESC LIMIT ?",
    )
    .bind(game_id)
    .bind(limit as i64)
    .fetch_all(&db.pool)
    .await
}

pub async fn user_votes(
    db: &Db,
    user_id: i64,
    page: u32,
    per_page: u32,
) -> Result<Page<UserActivity>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&db.pool)
        .await?;
    let page = page.max(1);
    let items = sqlx::query_as::<_, UserActivity>(
        "SELECT v.game_id, g.title AS game_title, v.score, v.created_at \
         FROM votes v JOIN games g ON g.id = v.game_id \
         WHERE v.user_id = ? ORDER BY v.created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(user_id)
    .bind(per_page as i64)
    .bind((page as i64 - 1) * per_page as i64)
    .fetch_all(&db.pool)
    .await?;
    Ok(Page::new(items, page, per_page, total))
}

pub async fn user_follows(
    db: &Db,
    user_id: i64,
    page: u32,
    per_page: u32,
) -> Result<Page<UserActivity>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&db.pool)
        .await?;
    let page = page.max(1);
    let items = sqlx::query_as::<_, UserActivity>(
        "SELECT f.game_id, g.title AS game_title, NULL AS score, f.created_at \
         FROM follows f JOIN games g ON g.id = f.game_id \
         WHERE f.user_id = ? ORDER BY f.created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(user_id)
    .bind(per_page as i64)
    .bind((page as i64 - 1) * per_page as i64)
    .fetch_all(&db.pool)
    .await?;
    Ok(Page::new(items, page, per_page, total))
}
