//! Compile the gazetteer into a bincode data file
//!
//! Reads every row from Postgres (or a YAML seed), validates it by building
//! a full snapshot, and writes the data file the file store can serve from.
//!
//! Usage:
//!   cargo run --bin compile_snapshot -- --output data/gazetteer.bin
//!   cargo run --bin compile_snapshot -- --seed data/gazetteer_seed.yaml --languages vi,ja

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use location_gateway::{
    config::GatewayConfig, EngineSettings, FileGazetteerStore, GazetteerSnapshot, GazetteerStore,
    InvalidAliasPolicy, LanguageScope, PgGazetteerStore,
};

#[derive(Parser)]
#[command(name = "compile_snapshot")]
#[command(about = "Compile the gazetteer into a snapshot data file")]
struct Args {
    /// Postgres connection string (ignored when --seed is given)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Read a YAML seed file instead of Postgres
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Schema holding the gazetteer tables
    #[arg(long, default_value = "gazetteer")]
    schema: String,

    /// Comma-separated languages to include (default: all)
    #[arg(long, value_delimiter = ',')]
    languages: Vec<String>,

    /// Gateway config supplying district alias rules and script families
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Fail on the first invalid translation instead of skipping it
    #[arg(long)]
    reject_invalid: bool,

    /// Output data file
    #[arg(short = 'o', long, default_value = "data/gazetteer.bin")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "location_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => {
            let path = path.to_string_lossy();
            let config = GatewayConfig::from_file(&path)
                .with_context(|| format!("failed to load {}", path))?;
            EngineSettings::from_config(&config)?
        }
        None => EngineSettings::default(),
    };

    if !args.languages.is_empty() {
        settings.snapshot.scope = LanguageScope::from_languages(&args.languages);
    }
    if args.reject_invalid {
        settings.snapshot.invalid_alias_policy = InvalidAliasPolicy::RejectSnapshot;
    }

    let store: Box<dyn GazetteerStore> = match (&args.seed, &args.database_url) {
        (Some(seed), _) => Box::new(FileGazetteerStore::new(seed)),
        (None, Some(url)) => Box::new(
            PgGazetteerStore::connect(url, args.schema.clone())
                .await
                .context("failed to connect to database")?,
        ),
        (None, None) => anyhow::bail!("either --database-url (or DATABASE_URL) or --seed is required"),
    };

    println!("Loading gazetteer from {}...", store.describe());
    let data = store
        .load_snapshot(&settings.snapshot.scope)
        .await
        .context("failed to load gazetteer")?;

    // Building the snapshot validates hierarchy and aliases
    let snapshot = GazetteerSnapshot::build(data.clone(), 1, &settings.snapshot)
        .context("gazetteer data failed validation")?;

    data.save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("Wrote {}", args.output.display());
    println!("{}", snapshot.stats());

    Ok(())
}
