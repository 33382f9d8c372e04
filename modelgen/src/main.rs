//! modelgen CLI - generate go-pg models from a PostgreSQL schema

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use modelgen::config::{self, Config, Layout, LoggingConfig};
use modelgen::utils::logging::init_logging;
use modelgen::{ModelGenerator, PostgresAnalyzer, StaticProvider};

#[derive(Parser)]
#[command(name = "modelgen")]
#[command(about = "Generate go-pg models from a PostgreSQL schema")]
#[command(version)]
struct Cli {
    /// Path to a TOML or YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connection string to the postgres database
    #[arg(short, long)]
    conn: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output: Option<String>,

    /// Table patterns, use 'schema_name.*' for every table in a schema
    #[arg(short, long, value_delimiter = ',')]
    tables: Vec<String>,

    /// Generate models for tables referenced by foreign keys
    #[arg(short, long)]
    follow_fk: bool,

    /// Package for model files
    #[arg(short, long)]
    pkg: Option<String>,

    /// Keep primary key names as is instead of converting them to 'ID'
    #[arg(short, long)]
    keep_pk: bool,

    /// Column receiving the soft_delete tag
    #[arg(short, long)]
    soft_delete: Option<String>,

    /// Do not set the 'alias' tag
    #[arg(short = 'w', long)]
    no_alias: bool,

    /// Do not use the 'discard_unknown_columns' tag
    #[arg(short = 'd', long)]
    no_discard: bool,

    /// Type for json columns as pattern=type, e.g. public.users.settings=UserSettings
    #[arg(short, long, value_delimiter = ',')]
    json: Vec<String>,

    /// go-pg version (8 and 9 supported)
    #[arg(short, long)]
    gopg: Option<u8>,

    /// Write one file per entity
    #[arg(long)]
    per_entity: bool,

    /// Read schema facts from a JSON file instead of the database
    #[arg(long)]
    facts: Option<PathBuf>,

    /// Log verbosity: trace, debug, info, warn, error
    #[arg(long)]
    verbosity: Option<String>,
}

impl Cli {
    /// Overlay command line flags on the file configuration
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(conn) = &self.conn {
            config.database.url = conn.clone();
        }
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }

        let generation = &mut config.generation;
        if !self.tables.is_empty() {
            generation.tables = self.tables.clone();
        }
        if let Some(pkg) = &self.pkg {
            generation.package = pkg.clone();
        }
        if let Some(soft_delete) = &self.soft_delete {
            generation.soft_delete = Some(soft_delete.clone());
        }
        if let Some(version) = self.gopg {
            generation.dialect_version = version;
        }
        generation.follow_fks |= self.follow_fk;
        generation.keep_pk |= self.keep_pk;
        generation.no_alias |= self.no_alias;
        generation.no_discard |= self.no_discard;
        if self.per_entity {
            generation.layout = Layout::PerEntity;
        }

        for entry in &self.json {
            let Some((pattern, target)) = entry.split_once('=') else {
                bail!("invalid --json value '{}': expected pattern=type", entry);
            };
            config.json_types.insert(pattern.trim(), target.trim());
        }

        if let Some(level) = &self.verbosity {
            config.logging.get_or_insert_with(LoggingConfig::default).level = level.clone();
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_from_file(&path.to_string_lossy())?,
        None => Config::default(),
    };
    cli.apply(&mut config)?;

    init_logging(&config.logging)?;

    let generator = ModelGenerator::new(config)?;

    let written = match &cli.facts {
        Some(path) => {
            let provider = StaticProvider::from_file(path)
                .with_context(|| format!("reading schema facts from {}", path.display()))?;
            generator.run(&provider).await?
        }
        None => {
            if generator.config().database.url.is_empty() {
                bail!("either --conn or --facts is required");
            }
            let provider = PostgresAnalyzer::connect(&generator.config().database).await?;
            generator.run(&provider).await?
        }
    };

    info!(files = written.len(), "generation finished");
    for path in &written {
        println!("{}", path.display());
    }

    Ok(())
}
