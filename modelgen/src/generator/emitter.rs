//! Template emission of compiled packages into named text artifacts

use serde::Serialize;
use std::fs;
use tracing::{debug, error, info};

use crate::config::{GenerationConfig, Layout, TemplatesConfig};
use crate::error::{Error, Result};
use crate::generator::package::Package;
use crate::generator::template::Template;
use crate::generator::templates;
use crate::model::entity::Entity;

pub const ENUMS_ARTIFACT: &str = "constant/enums.go";
pub const MODEL_ARTIFACT: &str = "model/model.go";
pub const BASE_ARTIFACT: &str = "models/base.go";
const ENTITY_DIR: &str = "models";

/// A named text blob ready for the file writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the output directory
    pub name: String,
    pub contents: String,
}

/// Template programs used for one run
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub model: Template,
    pub entity: Template,
    pub enums: Template,
    pub columns: Template,
}

impl TemplateSet {
    pub fn builtin() -> Result<Self> {
        Self::load(None)
    }

    /// Built-in programs, each replaced by the configured file if one is set
    pub fn load(config: Option<&TemplatesConfig>) -> Result<Self> {
        let config = config.cloned().unwrap_or_default();

        Ok(Self {
            model: load_template("model", config.model.as_deref(), templates::MODEL)?,
            entity: load_template("entity", config.entity.as_deref(), templates::ENTITY)?,
            enums: load_template("enums", config.enums.as_deref(), templates::ENUMS)?,
            columns: load_template("columns", config.columns.as_deref(), templates::COLUMNS)?,
        })
    }
}

fn load_template(name: &str, path: Option<&str>, builtin: &str) -> Result<Template> {
    match path {
        Some(path) => {
            debug!(template = name, path, "loading template");
            let source = fs::read_to_string(path).map_err(|e| {
                Error::ConfigError(format!("Failed to read template {}: {}", path, e))
            })?;
            Template::parse(path, &source)
        }
        None => Template::parse(name, builtin),
    }
}

/// A failed emission call
#[derive(Debug)]
pub struct EmissionFailure {
    pub artifact: String,
    pub error: Error,
}

/// Outcome of emitting every artifact of a layout
#[derive(Debug, Default)]
pub struct EmissionReport {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<EmissionFailure>,
}

impl EmissionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// All artifacts, or the first failure
    pub fn into_result(self) -> Result<Vec<Artifact>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.artifacts),
        }
    }

    fn record(&mut self, name: String, result: Result<Artifact>) {
        match result {
            Ok(artifact) => self.artifacts.push(artifact),
            Err(e) => {
                error!(artifact = %name, "emission failed: {}", e);
                self.failures.push(EmissionFailure {
                    artifact: name,
                    error: e,
                });
            }
        }
    }
}

/// Binds packages to template programs
pub struct Emitter<'a> {
    templates: &'a TemplateSet,
    options: &'a GenerationConfig,
}

impl<'a> Emitter<'a> {
    pub fn new(templates: &'a TemplateSet, options: &'a GenerationConfig) -> Self {
        Self { templates, options }
    }

    /// Render one model through one template
    pub fn emit<T: Serialize>(&self, name: &str, template: &Template, model: &T) -> Result<Artifact> {
        let contents = template.render_model(model)?;
        debug!(artifact = name, bytes = contents.len(), "emitted artifact");

        Ok(Artifact {
            name: name.to_string(),
            contents,
        })
    }

    /// Emit every artifact of the configured layout
    ///
    /// Packaging errors abort; a failing template only fails its own artifact.
    pub fn emit_all(&self, entities: &[Entity]) -> Result<EmissionReport> {
        let package = Package::assemble(entities, self.options)?;
        let mut report = EmissionReport::default();

        report.record(
            ENUMS_ARTIFACT.to_string(),
            self.emit(ENUMS_ARTIFACT, &self.templates.enums, &package),
        );

        match self.options.layout {
            Layout::Single => {
                report.record(
                    MODEL_ARTIFACT.to_string(),
                    self.emit(MODEL_ARTIFACT, &self.templates.model, &package),
                );
            }
            Layout::PerEntity => {
                report.record(
                    BASE_ARTIFACT.to_string(),
                    self.emit(BASE_ARTIFACT, &self.templates.columns, &package),
                );

                for entity in entities {
                    let name = entity_artifact_name(entity);
                    let subset =
                        Package::assemble(std::slice::from_ref(entity), self.options)?
                            .with_import("time");
                    let result = self.emit(&name, &self.templates.entity, &subset);
                    report.record(name, result);
                }
            }
        }

        info!(
            artifacts = report.artifacts.len(),
            failures = report.failures.len(),
            "generated {} models",
            entities.len()
        );
        Ok(report)
    }
}

/// Artifact path of an entity in the per-entity layout
pub fn entity_artifact_name(entity: &Entity) -> String {
    format!("{}/{}.go", ENTITY_DIR, entity.name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::builder::EntityBuilder;
    use crate::schema::types::{ColumnFacts, ForeignKeyFacts, TableFacts};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn entities(config: &Config) -> Vec<Entity> {
        let tables = vec![
            TableFacts::new("public", "users")
                .column(ColumnFacts::new("id", "int4").primary_key())
                .column(ColumnFacts::new("status", "text").allowed_values(None, &["active", "banned"]))
                .column(ColumnFacts::new("update_dt", "timestamptz").nullable(true)),
            TableFacts::new("public", "posts")
                .column(ColumnFacts::new("id", "int4").primary_key())
                .column(ColumnFacts::new("user_id", "int4"))
                .foreign_key(ForeignKeyFacts::new(&["user_id"], "public", "users")),
        ];
        EntityBuilder::new(config).build_batch(&tables).unwrap()
    }

    fn names(artifacts: &[Artifact]) -> Vec<&str> {
        artifacts.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_single_layout() {
        let config = Config::default();
        let templates = TemplateSet::builtin().unwrap();
        let report = Emitter::new(&templates, &config.generation)
            .emit_all(&entities(&config))
            .unwrap();

        assert!(report.is_success());
        let artifacts = report.into_result().unwrap();
        assert_eq!(names(&artifacts), vec![ENUMS_ARTIFACT, MODEL_ARTIFACT]);

        let enums = &artifacts[0].contents;
        assert!(enums.contains("package constant"));
        assert!(enums.contains("\tStatusActive = \"active\"\n\tStatusBanned = \"banned\"\n)"));

        let model = &artifacts[1].contents;
        assert!(model.contains("package model\n\nimport (\n\t\"time\"\n)"));
        assert!(model.contains("type User struct {"));
        assert!(model.contains(
            "\tID int `sql:\"id,pk\" json:\"id\" form:\"id\" validate:\"required\"`"
        ));
        assert!(model.contains("\tUser *User `sql:\"fk:user_id\" json:\"-\"`"));
        assert!(!model.contains("BeforeInsert"));
    }

    #[test]
    fn test_per_entity_layout() {
        let mut config = Config::default();
        config.generation.layout = Layout::PerEntity;
        let templates = TemplateSet::builtin().unwrap();
        let artifacts = Emitter::new(&templates, &config.generation)
            .emit_all(&entities(&config))
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(
            names(&artifacts),
            vec![ENUMS_ARTIFACT, BASE_ARTIFACT, "models/user.go", "models/post.go"]
        );

        let base = &artifacts[1].contents;
        assert!(base.contains("\t\tUserID: \"user_id\","));
        assert!(base.contains("\t\tName: \"users\",\n\t\tAlias: \"users\","));

        let user = &artifacts[2].contents;
        assert!(user.contains("\t\"time\""));
        assert!(user.contains("type User struct {"));
        assert!(!user.contains("type Post struct {"));
        assert!(user.contains("func (m *User) BeforeUpdate(u Int64Str, now *time.Time) {\n\tm.UpdateDt = now\n}"));
    }

    #[test]
    fn test_failing_template_is_isolated() {
        let config = Config::default();
        let mut templates = TemplateSet::builtin().unwrap();
        templates.model = Template::parse("model", "{{.Missing}}").unwrap();

        let report = Emitter::new(&templates, &config.generation)
            .emit_all(&entities(&config))
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(names(&report.artifacts), vec![ENUMS_ARTIFACT]);
        assert_eq!(report.failures[0].artifact, MODEL_ARTIFACT);
        assert!(matches!(report.failures[0].error, Error::BindingError { .. }));
    }

    #[test]
    fn test_load_external_template() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "package {{{{.Package}}}} // {{{{len}}}}").unwrap();

        let config = TemplatesConfig {
            model: Some(file.path().to_string_lossy().to_string()),
            ..Default::default()
        };
        assert!(matches!(
            TemplateSet::load(Some(&config)),
            Err(Error::TemplateError { .. })
        ));

        let missing = TemplatesConfig {
            enums: Some("/nonexistent/enums.tmpl".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            TemplateSet::load(Some(&missing)),
            Err(Error::ConfigError(_))
        ));
    }
}
