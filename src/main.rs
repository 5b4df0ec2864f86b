use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use gamerank::cli::{admin, import};
use gamerank::database_ops::db::Db;
use gamerank::ingestion::{listado1, listado2, CommitPolicy};
use gamerank::logging::init_tracing;
use gamerank::util::env as env_util;

#[derive(Parser, Debug)]
#[command(name = "gamerank", version, about = "GameRank catalog administration")]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Set the shared site password
    SetSitePassword {
        value: String,
        /// Keep the passwords already stored instead of replacing them
        #[arg(long, action = ArgAction::SetTrue)]
        add: bool,
    },
    /// Register a user account (its profile is created with it)
    CreateUser { username: String, password: String },
    /// Import the listado1 XML file
    ImportXml(XmlArgs),
    /// Import the listado2 JSON API
    ImportJson(JsonArgs),
    /// Print a game with its votes, follows and comments aggregates
    GameStats { id: String },
}

#[derive(Debug, Args)]
struct XmlArgs {
    #[arg(long, default_value = listado1::DEFAULT_PATH)]
    file: String,
    #[arg(long)]
    commit: Option<CommitPolicy>,
}

#[derive(Debug, Args)]
struct JsonArgs {
    #[arg(long, default_value = listado2::DEFAULT_URL)]
    url: String,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    commit: Option<CommitPolicy>,
}

async fn open_db(database_url: Option<String>) -> Result<Db> {
    let url = database_url.unwrap_or_else(env_util::db_url);
    Db::connect(&url, env_util::env_parse("DB_MAX_CONNS", 5u32)).await
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("warn")?;
    env_util::bootstrap_cli("gamerank");
    let cli = Cli::parse();

    match cli.command {
        Command::ImportXml(args) => {
            let cfg = import::ImportConfig {
                database_url: cli.database_url,
                commit: args.commit,
            };
            import::run_xml(&args.file, &cfg).await?;
        }
        Command::ImportJson(args) => {
            let cfg = import::ImportConfig {
                database_url: cli.database_url,
                commit: args.commit,
            };
            import::run_json(&args.url, args.timeout_secs.map(Duration::from_secs), &cfg).await?;
        }
        Command::Migrate => {
            admin::migrate(&open_db(cli.database_url).await?).await?;
        }
        Command::SetSitePassword { value, add } => {
            admin::set_site_password(&open_db(cli.database_url).await?, &value, add).await?;
        }
        Command::CreateUser { username, password } => {
            admin::register_user(&open_db(cli.database_url).await?, &username, &password).await?;
        }
        Command::GameStats { id } => {
            admin::show_game_stats(&open_db(cli.database_url).await?, &id).await?;
        }
    }
    Ok(())
}
