// API server implementation using actix-web

use crate::api::auth::{CookieConfig, SessionGate};
use crate::api::{middleware, routes};
use crate::database_ops::db::Db;
use crate::util::env::{env_flag, env_opt};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub cookie_secure: bool,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match env_opt("API_PORT") {
            Some(raw) => raw.trim().parse().context("Invalid API_PORT")?,
            None => DEFAULT_PORT,
        };
        let allowed_origins =
            env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());
        let cookie_secure = env_flag("SESSION_COOKIE_SECURE", false);

        Ok(Self {
            host,
            port,
            allowed_origins,
            cookie_secure,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, db: Db) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            cookie_secure = self.cookie_secure,
            "Starting GameRank API server"
        );

        let db_data = web::Data::new(db);
        let cookie_data = web::Data::new(CookieConfig {
            secure: self.cookie_secure,
        });
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(db_data.clone())
                .app_data(cookie_data.clone())
                .wrap(SessionGate)
                .wrap(cors)
                .wrap(compress)
                .wrap(logger)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
