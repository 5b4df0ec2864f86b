use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::db::Db;
use crate::accounts::password::{hash_password, verify_password};
use crate::normalization::{mean_score, VoteScore};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub alias: String,
    pub font_family: String,
    pub font_size: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Alias when set, otherwise the account name.
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        if self.alias.trim().is_empty() {
            username
        } else {
            &self.alias
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub alias: String,
    pub font_family: String,
    pub font_size: FontSize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub votes_count: i64,
    pub average_score: f64,
    pub follows_count: i64,
    pub comments_count: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub auth: bool,
    pub created_at: DateTime<Utc>,
}

/// Register an account and its profile in one transaction.
pub async fn create_user(db: &Db, username: &str, password: &str) -> Result<User, sqlx::Error> {
    let now = Utc::now();
    let mut tx = db.pool.begin().await?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(username)
    .bind(hash_password(password))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query("INSERT INTO user_profiles (user_id, created_at, updated_at) VALUES (?, ?, ?)")
        .bind(user.id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    info!(user_id = user.id, username, "user registered");
    Ok(user)
}

pub async fn find_user_by_username(db: &Db, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&db.pool)
        .await
}

pub async fn find_user(db: &Db, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&db.pool)
        .await
}

pub async fn get_profile(db: &Db, user_id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&db.pool)
        .await
}

pub async fn update_profile(
    db: &Db,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        "UPDATE user_profiles SET alias = ?, font_family = ?, font_size = ?, updated_at = ? \
         WHERE user_id = ? RETURNING *",
    )
    .bind(update.alias.trim())
    .bind(update.font_family.trim())
    .bind(update.font_size.as_str())
    .bind(Utc::now())
    .bind(user_id)
    .fetch_optional(&db.pool)
    .await
}

pub async fn user_stats(db: &Db, user_id: i64) -> Result<UserStats, sqlx::Error> {
    let scores: Vec<i64> = sqlx::query_scalar("SELECT score FROM votes WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(&db.pool)
        .await?;
    let follows_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&db.pool)
        .await?;
    let comments_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&db.pool)
            .await?;
    Ok(UserStats {
        votes_count: scores.len() as i64,
        average_score: mean_score(scores.iter().filter_map(|s| VoteScore::new(*s))),
        follows_count,
        comments_count,
    })
}

/// Store an additional value that unlocks the site.
pub async fn add_site_password(db: &Db, value: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query("INSERT INTO site_passwords (value_hash, created_at, updated_at) VALUES (?, ?, ?)")
        .bind(hash_password(value))
        .bind(now)
        .bind(now)
        .execute(&db.pool)
        .await?;
    info!("site password added");
    Ok(())
}

/// Drop every stored site password and keep only `value`.
pub async fn replace_site_passwords(db: &Db, value: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let mut tx = db.pool.begin().await?;
    sqlx::query("DELETE FROM site_passwords")
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO site_passwords (value_hash, created_at, updated_at) VALUES (?, ?, ?)")
        .bind(hash_password(value))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    info!("site password replaced");
    Ok(())
}

/// Whether `value` matches any stored site password.
pub async fn site_password_matches(db: &Db, value: &str) -> Result<bool, sqlx::Error> {
    let hashes: Vec<String> = sqlx::query_scalar("SELECT value_hash FROM site_passwords")
        .fetch_all(&db.pool)
        .await?;
    Ok(hashes.iter().any(|h| verify_password(value, h)))
}

pub async fn create_session(db: &Db, user_id: i64, auth: bool) -> Result<Session, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "INSERT INTO sessions (token, user_id, auth, created_at) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(auth)
    .bind(Utc::now())
    .fetch_one(&db.pool)
    .await
}

/// Sessions older than this are dropped on lookup.
pub const SESSION_TTL_DAYS: i64 = 14;

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > chrono::Duration::days(SESSION_TTL_DAYS)
    }
}

/// Live session for `token`. An expired row is deleted and reported as absent.
pub async fn find_session(db: &Db, token: &str) -> Result<Option<Session>, sqlx::Error> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(&db.pool)
        .await?;
    match session {
        Some(s) if s.is_expired(Utc::now()) => {
            delete_session(db, token).await?;
            info!(user_id = s.user_id, "expired session removed");
            Ok(None)
        }
        other => Ok(other),
    }
}

pub async fn delete_session(db: &Db, token: &str) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(&db.pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registration_creates_default_profile() {
        let db = Db::in_memory().await.unwrap();
        let user = create_user(&db, "ana", "pw").await.unwrap();
        let profile = get_profile(&db, user.id).await.unwrap().unwrap();
        assert_eq!(profile.font_family, "Arial");
        assert_eq!(profile.font_size, "medium");
        assert_eq!(profile.display_name(&user.username), "ana");
    }

    #[tokio::test]
    async fn duplicate_username_rolls_back_profile() {
        let db = Db::in_memory().await.unwrap();
        create_user(&db, "ana", "pw").await.unwrap();
        assert!(create_user(&db, "ana", "other").await.is_err());
        let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_profiles")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(profiles, 1);
    }

    #[tokio::test]
    async fn profile_update_sets_alias() {
        let db = Db::in_memory().await.unwrap();
        let user = create_user(&db, "ana", "pw").await.unwrap();
        let update = ProfileUpdate {
            alias: " Annie ".into(),
            font_family: "Georgia".into(),
            font_size: FontSize::Large,
        };
        let profile = update_profile(&db, user.id, &update).await.unwrap().unwrap();
        assert_eq!(profile.display_name(&user.username), "Annie");
        assert_eq!(profile.font_size, "large");
    }

    #[tokio::test]
    async fn site_passwords_any_match_and_replace() {
        let db = Db::in_memory().await.unwrap();
        assert!(!site_password_matches(&db, "alpha").await.unwrap());
        add_site_password(&db, "alpha").await.unwrap();
        add_site_password(&db, "beta").await.unwrap();
        assert!(site_password_matches(&db, "beta").await.unwrap());
        replace_site_passwords(&db, "gamma").await.unwrap();
        assert!(!site_password_matches(&db, "alpha").await.unwrap());
        assert!(site_password_matches(&db, "gamma").await.unwrap());
    }

    #[tokio::test]
    async fn sessions_round_trip_and_delete() {
        let db = Db::in_memory().await.unwrap();
        let user = create_user(&db, "ana", "pw").await.unwrap();
        let session = create_session(&db, user.id, true).await.unwrap();
        let found = find_session(&db, &session.token).await.unwrap().unwrap();
        assert!(found.auth);
        assert_eq!(found.user_id, user.id);
        assert!(delete_session(&db, &session.token).await.unwrap());
        assert!(find_session(&db, &session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_sessions_are_not_found_and_get_deleted() {
        let db = Db::in_memory().await.unwrap();
        let user = create_user(&db, "ana", "pw").await.unwrap();
        let stale = create_session(&db, user.id, true).await.unwrap();
        let fresh = create_session(&db, user.id, true).await.unwrap();
        sqlx::query("UPDATE sessions SET created_at = ? WHERE token = ?")
            .bind(Utc::now() - chrono::Duration::days(SESSION_TTL_DAYS + 1))
            .bind(&stale.token)
            .execute(&db.pool)
            .await
            .unwrap();

        assert!(find_session(&db, &stale.token).await.unwrap().is_none());
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE token = ?")
            .bind(&stale.token)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(left, 0);
        assert!(find_session(&db, &fresh.token).await.unwrap().is_some());
    }
}
