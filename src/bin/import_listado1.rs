//! Import the `listado1` XML catalog file.

use anyhow::Result;
use clap::Parser;
use gamerank::cli::import::{run_xml, ImportConfig};
use gamerank::ingestion::{listado1, CommitPolicy};
use gamerank::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "import_listado1", version, about = "Import games from the listado1 XML file")]
struct Cli {
    /// Path to the XML file
    #[arg(long, default_value = listado1::DEFAULT_PATH)]
    file: String,
    /// Commit boundary: per-run (default) or per-record
    #[arg(long)]
    commit: Option<CommitPolicy>,
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("warn")?;
    gamerank::util::env::bootstrap_cli("import_listado1");
    let cli = Cli::parse();

    let cfg = ImportConfig {
        database_url: cli.database_url,
        commit: cli.commit,
    };
    run_xml(&cli.file, &cfg).await?;
    Ok(())
}
