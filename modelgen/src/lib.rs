//! modelgen: compiles a PostgreSQL schema into go-pg model sources
//!
//! Schema facts are compiled into a collision-free entity model, enriched with struct
//! tags and emitted through replaceable text templates.

pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod schema;
pub mod utils;

use std::path::{Path, PathBuf};

// Re-export main types for easier access
pub use config::Config;
pub use error::{Error, Result};
pub use generator::{Artifact, EmissionReport, Emitter, Package, TemplateSet};
pub use model::{Entity, EntityBuilder};
pub use schema::{PostgresAnalyzer, SchemaFactProvider, StaticProvider, TableFacts};

/// Initialize modelgen with the specified configuration file
pub fn init(config_path: &str) -> Result<ModelGenerator> {
    let config = config::load_from_file(config_path)?;
    ModelGenerator::new(config)
}

/// The main entry point: compiles schema facts and emits artifacts
pub struct ModelGenerator {
    config: Config,
    templates: TemplateSet,
}

impl ModelGenerator {
    /// Create a generator, loading any configured template programs
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let templates = TemplateSet::load(config.templates.as_ref())?;

        Ok(Self { config, templates })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile facts into linked entities, in the given order
    pub fn compile(&self, tables: &[TableFacts]) -> Result<Vec<Entity>> {
        EntityBuilder::new(&self.config).build_batch(tables)
    }

    /// Emit every artifact of the configured layout
    pub fn emit(&self, entities: &[Entity]) -> Result<EmissionReport> {
        Emitter::new(&self.templates, &self.config.generation).emit_all(entities)
    }

    /// Collect facts from the provider, compile them and emit artifacts
    ///
    /// Fails if any emission failed; partial output is never returned.
    pub async fn generate<P>(&self, provider: &P) -> Result<Vec<Artifact>>
    where
        P: SchemaFactProvider + ?Sized,
    {
        let facts = schema::collect_facts(
            provider,
            &self.config.generation.tables,
            self.config.generation.follow_fks,
        )
        .await?;

        let entities = self.compile(&facts)?;
        self.emit(&entities)?.into_result()
    }

    /// Complete workflow: generate and write artifacts to the output directory
    pub async fn run<P>(&self, provider: &P) -> Result<Vec<PathBuf>>
    where
        P: SchemaFactProvider + ?Sized,
    {
        let artifacts = self.generate(provider).await?;
        generator::output::write_artifacts(Path::new(&self.config.output.directory), &artifacts)
    }
}
