use anyhow::{bail, Context, Result};
use tracing::info;

use crate::api::models::GameJson;
use crate::database_ops::db::Db;
use crate::database_ops::games::{game_stats, get_game};
use crate::database_ops::users::{
    add_site_password, create_user, find_user_by_username, replace_site_passwords,
};

/// Report the schema versions present after connecting (which applies any
/// pending migrations).
pub async fn migrate(db: &Db) -> Result<Vec<i64>> {
    let versions = db.applied_versions().await?;
    println!("Schema up to date ({} migrations applied).", versions.len());
    Ok(versions)
}

pub async fn set_site_password(db: &Db, value: &str, keep_existing: bool) -> Result<()> {
    if value.is_empty() {
        bail!("site password must not be empty");
    }
    if keep_existing {
        add_site_password(db, value).await?;
        println!("Site password added.");
    } else {
        replace_site_passwords(db, value).await?;
        println!("Site password set.");
    }
    Ok(())
}

/// Register an account; the profile is created alongside it.
pub async fn register_user(db: &Db, username: &str, password: &str) -> Result<i64> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        bail!("username and password are required");
    }
    if find_user_by_username(db, username).await?.is_some() {
        bail!("user '{username}' already exists");
    }
    let user = create_user(db, username, password)
        .await
        .with_context(|| format!("creating user '{username}'"))?;
    info!(user_id = user.id, "user registered");
    println!("Created user {} (id {}).", user.username, user.id);
    Ok(user.id)
}

/// Print one game with its derived statistics as pretty JSON.
pub async fn show_game_stats(db: &Db, id: &str) -> Result<GameJson> {
    let Some(game) = get_game(db, id).await? else {
        bail!("Game not found: {id}");
    };
    let stats = game_stats(db, id).await?;
    let doc = GameJson::new(game, &stats);
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(doc)
}
