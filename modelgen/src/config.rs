//! Configuration handling for modelgen

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::naming::PUBLIC_SCHEMA;

/// Wildcard accepted in override patterns and table patterns
pub const WILDCARD: &str = "*";

/// Default Go type for JSON-like columns without an override
pub const DEFAULT_JSON_TYPE: &str = "map[string]interface{}";

static EXPORTED_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*$").expect("valid identifier regex"));

static PATTERN_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*|[A-Za-z_][A-Za-z0-9_$-]*)$").expect("valid segment regex"));

/// Load configuration from a TOML or YAML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let is_yaml = Path::new(path)
        .extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml");

    // Format follows the extension, TOML otherwise
    let config: Config = if is_yaml {
        serde_yaml::from_str(&config_str)?
    } else {
        toml::from_str(&config_str)?
    };

    // Settings serde cannot judge on its own
    config.validate()?;
    Ok(config)
}

/// Represents the complete modelgen configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub generation: GenerationConfig,
    pub json_types: TypeOverrides,
    pub templates: Option<TemplatesConfig>,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Check every setting that can only be judged after parsing
    pub fn validate(&self) -> Result<()> {
        self.generation.dialect()?;
        self.generation.validate_pk_field_name()?;
        self.json_types.validate()?;
        Ok(())
    }
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Artifact layout produced by one run
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One enum constants file and one model file holding every entity
    #[default]
    Single,
    /// One enum constants file, one shared base file, one file per entity
    PerEntity,
}

/// Model generation behavior configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub tables: Vec<String>,
    pub follow_fks: bool,
    pub package: String,
    pub keep_pk: bool,
    pub pk_field_name: String,
    pub soft_delete: Option<String>,
    pub no_alias: bool,
    pub no_discard: bool,
    pub dialect_version: u8,
    pub layout: Layout,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            tables: vec![format!("{}.{}", PUBLIC_SCHEMA, WILDCARD)],
            follow_fks: false,
            package: "model".to_string(),
            keep_pk: false,
            pk_field_name: "ID".to_string(),
            soft_delete: None,
            no_alias: false,
            no_discard: false,
            dialect_version: 8,
            layout: Layout::Single,
        }
    }
}

impl GenerationConfig {
    /// Resolve the configured dialect version
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_version(self.dialect_version)
    }

    /// The renamed key field must be an exported Go identifier
    fn validate_pk_field_name(&self) -> Result<()> {
        if EXPORTED_IDENTIFIER.is_match(&self.pk_field_name) {
            Ok(())
        } else {
            Err(Error::ConfigError(format!(
                "pk_field_name '{}' is not an exported identifier",
                self.pk_field_name
            )))
        }
    }
}

/// go-pg dialect the emitted tags target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    V8,
    V9,
}

impl Dialect {
    pub fn from_version(version: u8) -> Result<Self> {
        match version {
            8 => Ok(Dialect::V8),
            9 => Ok(Dialect::V9),
            other => Err(Error::ConfigError(format!(
                "dialect version {} not supported (8 and 9 are)",
                other
            ))),
        }
    }

    /// Struct tag namespace carrying the ORM markers
    pub fn tag_namespace(self) -> &'static str {
        match self {
            Dialect::V8 => "sql",
            Dialect::V9 => "pg",
        }
    }

    /// Marker for non-nullable, non-key columns
    pub fn not_null_token(self) -> &'static str {
        match self {
            Dialect::V8 => "notnull",
            Dialect::V9 => "use_zero",
        }
    }
}

/// Type overrides for JSON-like columns, keyed by `schema.table.column` patterns
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct TypeOverrides(pub IndexMap<String, String>);

impl Default for TypeOverrides {
    fn default() -> Self {
        let mut map = IndexMap::new();
        map.insert(WILDCARD.to_string(), DEFAULT_JSON_TYPE.to_string());
        Self(map)
    }
}

impl TypeOverrides {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, pattern: &str, target: &str) {
        self.0.insert(pattern.to_string(), target.to_string());
    }

    /// Reject patterns that could never match a column
    pub fn validate(&self) -> Result<()> {
        for pattern in self.0.keys() {
            let segments: Vec<&str> = pattern.split('.').collect();
            if segments.len() > 3 || !segments.iter().all(|s| PATTERN_SEGMENT.is_match(s)) {
                return Err(Error::ConfigError(format!(
                    "malformed type override pattern '{}': expected schema.table.column",
                    pattern
                )));
            }
        }
        Ok(())
    }

    /// Find the override for a column, most specific pattern first
    pub fn resolve(&self, schema: &str, table: &str, column: &str) -> Option<&str> {
        if self.0.is_empty() {
            return None;
        }

        let levels = [
            (table, column),
            (WILDCARD, column),
            (table, WILDCARD),
            (WILDCARD, WILDCARD),
        ];

        let mut names = Vec::with_capacity(levels.len() * 2 + 3);
        for (t, c) in levels {
            names.push(format!("{}.{}.{}", schema, t, c));
            if schema == PUBLIC_SCHEMA {
                names.push(format!("{}.{}", t, c));
            }
        }
        names.push(format!("{}.{}", schema, table));
        if schema == PUBLIC_SCHEMA {
            names.push(table.to_string());
        }
        names.push(WILDCARD.to_string());

        names
            .iter()
            .find_map(|name| self.0.get(name.as_str()).map(String::as_str))
    }
}

/// External template programs replacing the built-in ones
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TemplatesConfig {
    pub model: Option<String>,
    pub entity: Option<String>,
    pub enums: Option<String>,
    pub columns: Option<String>,
}

/// Output location configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./generated".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn overrides(pairs: &[(&str, &str)]) -> TypeOverrides {
        let mut map = TypeOverrides::new();
        for (pattern, target) in pairs {
            map.insert(pattern, target);
        }
        map
    }

    #[test]
    fn test_config_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/app"

            [generation]
            tables = ["public.*", "billing.invoices"]
            soft_delete = "deleted_at"
            dialect_version = 9
            layout = "per_entity"

            [json_types]
            "public.users.settings" = "UserSettings"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url, "postgres://localhost/app");
        assert_eq!(config.generation.tables.len(), 2);
        assert_eq!(config.generation.package, "model");
        assert_eq!(config.generation.layout, Layout::PerEntity);
        assert_eq!(config.generation.dialect().unwrap(), Dialect::V9);
        assert_eq!(config.json_types.0.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.generation.tables, vec!["public.*".to_string()]);
        assert_eq!(config.generation.pk_field_name, "ID");
        assert_eq!(config.json_types.resolve("public", "a", "b"), Some(DEFAULT_JSON_TYPE));
    }

    #[test]
    fn test_unsupported_dialect() {
        let mut config = Config::default();
        config.generation.dialect_version = 10;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[rstest]
    #[case("")]
    #[case("id")]
    #[case("Primary Key")]
    #[case("1ID")]
    fn test_invalid_pk_field_name(#[case] name: &str) {
        let mut config = Config::default();
        config.generation.pk_field_name = name.to_string();
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modelgen.toml");
        fs::write(
            &path,
            r#"
            [generation]
            package = "db"
            dialect_version = 9

            [output]
            directory = "out"
            "#,
        )
        .unwrap();

        let config = load_from_file(&path.to_string_lossy()).unwrap();
        assert_eq!(config.generation.package, "db");
        assert_eq!(config.generation.dialect().unwrap(), Dialect::V9);
        assert_eq!(config.output.directory, "out");
    }

    #[rstest]
    #[case("modelgen.yaml")]
    #[case("modelgen.yml")]
    fn test_load_yaml_file(#[case] file_name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        fs::write(
            &path,
            "generation:\n  package: db\n  layout: per_entity\njson_types:\n  public.users.settings: UserSettings\n",
        )
        .unwrap();

        let config = load_from_file(&path.to_string_lossy()).unwrap();
        assert_eq!(config.generation.package, "db");
        assert_eq!(config.generation.layout, Layout::PerEntity);
        assert_eq!(
            config.json_types.resolve("public", "users", "settings"),
            Some("UserSettings")
        );
    }

    #[rstest]
    #[case("modelgen.toml", "[generation]\ndialect_version = 7\n")]
    #[case("modelgen.toml", "[json_types]\n\"a.b.c.d\" = \"T\"\n")]
    #[case("modelgen.toml", "[generation]\npk_field_name = \"\"\n")]
    #[case("modelgen.toml", "[generation\n")]
    #[case("modelgen.yaml", "generation: [\n")]
    fn test_load_rejects_bad_file(#[case] file_name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        fs::write(&path, contents).unwrap();

        assert!(matches!(
            load_from_file(&path.to_string_lossy()),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            load_from_file(&path.to_string_lossy()),
            Err(Error::ConfigError(_))
        ));
    }

    #[rstest]
    #[case("public.users.settings")]
    #[case("*")]
    #[case("billing.*")]
    #[case("users.*")]
    fn test_valid_patterns(#[case] pattern: &str) {
        assert!(overrides(&[(pattern, "T")]).validate().is_ok());
    }

    #[rstest]
    #[case("a.b.c.d")]
    #[case("public..settings")]
    #[case("public.us ers")]
    #[case("")]
    fn test_malformed_patterns(#[case] pattern: &str) {
        assert!(matches!(
            overrides(&[(pattern, "T")]).validate(),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_override_precedence() {
        let map = overrides(&[
            ("*", "Any"),
            ("public.*.*", "SchemaWide"),
            ("users.*", "TableWide"),
            ("public.*.settings", "SettingsEverywhere"),
            ("public.users.settings", "UserSettings"),
        ]);

        assert_eq!(map.resolve("public", "users", "settings"), Some("UserSettings"));
        assert_eq!(map.resolve("public", "orders", "settings"), Some("SettingsEverywhere"));
        assert_eq!(map.resolve("public", "users", "payload"), Some("TableWide"));
        assert_eq!(map.resolve("public", "orders", "payload"), Some("SchemaWide"));
        assert_eq!(map.resolve("billing", "users", "payload"), Some("Any"));
    }

    #[test]
    fn test_override_table_level() {
        let map = overrides(&[("billing.invoices", "InvoiceData")]);
        assert_eq!(map.resolve("billing", "invoices", "data"), Some("InvoiceData"));
        assert_eq!(map.resolve("billing", "payments", "data"), None);
    }
}
