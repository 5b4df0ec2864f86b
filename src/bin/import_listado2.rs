//! Import the `listado2` JSON catalog from its HTTP endpoint.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use gamerank::cli::import::{run_json, ImportConfig};
use gamerank::ingestion::{listado2, CommitPolicy};
use gamerank::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "import_listado2", version, about = "Import games from the listado2 JSON API")]
struct Cli {
    /// Endpoint serving the JSON array
    #[arg(long, default_value = listado2::DEFAULT_URL)]
    url: String,
    /// Request timeout in seconds (falls back to LISTADO2_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Commit boundary: per-record (default) or per-run
    #[arg(long)]
    commit: Option<CommitPolicy>,
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("warn")?;
    gamerank::util::env::bootstrap_cli("import_listado2");
    let cli = Cli::parse();

    let cfg = ImportConfig {
        database_url: cli.database_url,
        commit: cli.commit,
    };
    run_json(&cli.url, cli.timeout_secs.map(Duration::from_secs), &cfg).await?;
    Ok(())
}
