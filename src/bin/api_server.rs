// HTTP API server binary for GameRank

use anyhow::Result;
use gamerank::api::ApiServer;
use gamerank::database_ops::db::Db;
use gamerank::logging::init_tracing;
use gamerank::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing("info,sqlx=warn")?;

    tracing::info!("Initializing GameRank API server");

    env_util::init_env();
    env_util::preflight_check(
        "api_server",
        &[],
        &["DATABASE_URL", "API_HOST", "API_PORT", "ALLOWED_ORIGINS", "SESSION_COOKIE_SECURE"],
    )?;

    let server = ApiServer::from_env()?;

    let database_url = env_util::db_url();
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let db = Db::connect(&database_url, max_connections).await?;

    tracing::info!("Database connected successfully");

    server.run(db).await?;

    Ok(())
}
