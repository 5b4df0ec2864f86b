use std::time::Duration;

use anyhow::{Context, Result};

use crate::database_ops::db::Db;
use crate::ingestion::{
    listado2, run_import, CommitPolicy, GameSource, ImportSummary, IngestError, Listado1File,
    Listado2Api,
};
use crate::util::env as env_util;

#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Overrides `DATABASE_URL`.
    pub database_url: Option<String>,
    /// Overrides the source's default commit policy.
    pub commit: Option<CommitPolicy>,
}

impl ImportConfig {
    async fn open_db(&self) -> Result<Db> {
        env_util::init_env();
        let url = self.database_url.clone().unwrap_or_else(env_util::db_url);
        let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
        Db::connect(&url, max_connections).await
    }
}

/// Announce the run, import, then print skip warnings to stderr and the
/// summary line to stdout.
pub async fn import_with_report<S>(
    db: &Db,
    source: &S,
    commit: Option<CommitPolicy>,
) -> Result<ImportSummary, IngestError>
where
    S: GameSource + ?Sized,
{
    let policy = commit.unwrap_or_else(|| CommitPolicy::default_for(source.tag()));
    println!("Importing games from {}...", source.location());
    let summary = run_import(db, source, policy).await?;
    for warning in &summary.warnings {
        eprintln!("{warning}");
    }
    println!("{}", summary.report_line());
    Ok(summary)
}

pub async fn run_xml(file: &str, cfg: &ImportConfig) -> Result<ImportSummary> {
    let db = cfg.open_db().await?;
    let source = Listado1File::new(file);
    Ok(import_with_report(&db, &source, cfg.commit).await?)
}

pub async fn run_json(url: &str, timeout: Option<Duration>, cfg: &ImportConfig) -> Result<ImportSummary> {
    let timeout = timeout.unwrap_or_else(|| {
        Duration::from_secs(env_util::env_parse(
            "LISTADO2_TIMEOUT_SECS",
            listado2::DEFAULT_TIMEOUT_SECS,
        ))
    });
    let db = cfg.open_db().await?;
    let source = Listado2Api::new(url, timeout).context("building listado2 client")?;
    Ok(import_with_report(&db, &source, cfg.commit).await?)
}
