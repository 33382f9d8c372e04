//! Type definitions for introspected schema facts

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DEFAULT_JSON_TYPE;
use crate::utils::naming::PUBLIC_SCHEMA;

/// Identity of a table: schema plus table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }

    /// Parse `schema.table`, defaulting to the public schema
    pub fn parse(name: &str) -> Self {
        match name.split_once('.') {
            Some((schema, table)) => Self::new(schema, table),
            None => Self::new(PUBLIC_SCHEMA, name),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Everything the provider reports about one table or view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFacts {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub is_view: bool,
    pub columns: Vec<ColumnFacts>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyFacts>,
}

impl TableFacts {
    /// Create a new table with no columns
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            is_view: false,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.name)
    }

    /// Add a column to the table
    pub fn column(mut self, column: ColumnFacts) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a foreign key to the table
    pub fn foreign_key(mut self, fk: ForeignKeyFacts) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn view(mut self) -> Self {
        self.is_view = true;
        self
    }
}

/// One column as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFacts {
    pub name: String,
    /// Source type tag, element type for arrays (`int4`, `varchar`, `timestamptz`, ...)
    pub source_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub enum_name: Option<String>,
    #[serde(default)]
    pub enum_values: Vec<String>,
}

impl ColumnFacts {
    /// Create a new non-nullable column with the given name and type
    pub fn new(name: &str, source_type: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type: source_type.to_string(),
            nullable: false,
            is_primary_key: false,
            is_foreign_key: false,
            is_array: false,
            max_length: None,
            enum_name: None,
            enum_values: Vec::new(),
        }
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Declare the allowed values, optionally under a named enum type
    pub fn allowed_values(mut self, enum_name: Option<&str>, values: &[&str]) -> Self {
        self.enum_name = enum_name.map(str::to_string);
        self.enum_values = values.iter().map(|v| v.to_string()).collect();
        self
    }
}

/// A foreign key from the described table to a target table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyFacts {
    pub source_columns: Vec<String>,
    pub target_schema: String,
    pub target_table: String,
}

impl ForeignKeyFacts {
    pub fn new(source_columns: &[&str], target_schema: &str, target_table: &str) -> Self {
        Self {
            source_columns: source_columns.iter().map(|c| c.to_string()).collect(),
            target_schema: target_schema.to_string(),
            target_table: target_table.to_string(),
        }
    }

    pub fn target(&self) -> TableRef {
        TableRef::new(&self.target_schema, &self.target_table)
    }
}

/// Semantic classification of a source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Numeric,
    String,
    Bytes,
    Time,
    Duration,
    Uuid,
    Json,
    Hstore,
    Inet,
    Cidr,
    Unknown,
}

impl ScalarKind {
    /// Classify a source type tag; accepts udt names and SQL spellings
    pub fn from_source_type(source_type: &str) -> Self {
        let normalized = source_type.trim().to_lowercase();
        let base = normalized
            .trim_start_matches('_')
            .trim_end_matches("[]")
            .split('(')
            .next()
            .unwrap_or_default()
            .trim();

        match base {
            "bool" | "boolean" => ScalarKind::Bool,
            "int2" | "smallint" | "smallserial" | "serial2" => ScalarKind::Int16,
            "int4" | "int" | "integer" | "serial" | "serial4" => ScalarKind::Int32,
            "int8" | "bigint" | "bigserial" | "serial8" => ScalarKind::Int64,
            "float4" | "real" => ScalarKind::Float32,
            "float8" | "double precision" => ScalarKind::Float64,
            "numeric" | "decimal" | "money" => ScalarKind::Numeric,
            "text" | "varchar" | "character varying" | "char" | "character" | "bpchar"
            | "citext" | "name" => ScalarKind::String,
            "bytea" => ScalarKind::Bytes,
            "timestamp"
            | "timestamptz"
            | "timestamp without time zone"
            | "timestamp with time zone"
            | "date"
            | "time"
            | "timetz"
            | "time without time zone"
            | "time with time zone" => ScalarKind::Time,
            "interval" => ScalarKind::Duration,
            "uuid" => ScalarKind::Uuid,
            "json" | "jsonb" => ScalarKind::Json,
            "hstore" => ScalarKind::Hstore,
            "inet" => ScalarKind::Inet,
            "cidr" => ScalarKind::Cidr,
            _ => ScalarKind::Unknown,
        }
    }

    /// Go type of a single, non-null value
    pub fn go_type(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int16 | ScalarKind::Int32 => "int",
            ScalarKind::Int64 => "int64",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 | ScalarKind::Numeric => "float64",
            ScalarKind::String | ScalarKind::Uuid => "string",
            ScalarKind::Bytes => "[]byte",
            ScalarKind::Time => "time.Time",
            ScalarKind::Duration => "time.Duration",
            ScalarKind::Json => DEFAULT_JSON_TYPE,
            ScalarKind::Hstore => "map[string]string",
            ScalarKind::Inet => "net.IP",
            ScalarKind::Cidr => "net.IPNet",
            ScalarKind::Unknown => "interface{}",
        }
    }

    /// Package the Go type lives in, if not builtin
    pub fn import(self) -> Option<&'static str> {
        match self {
            ScalarKind::Time | ScalarKind::Duration => Some("time"),
            ScalarKind::Inet | ScalarKind::Cidr => Some("net"),
            _ => None,
        }
    }

    /// Whether a null value is expressed through a pointer
    pub fn is_pointable(self) -> bool {
        !matches!(
            self,
            ScalarKind::Bytes | ScalarKind::Json | ScalarKind::Hstore | ScalarKind::Unknown
        )
    }

    pub fn is_time_like(self) -> bool {
        matches!(self, ScalarKind::Time)
    }
}
