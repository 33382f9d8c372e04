//! Table selection patterns such as `public.*` or `billing.invoices`

use glob::Pattern;
use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::schema::types::TableRef;
use crate::utils::naming::PUBLIC_SCHEMA;

/// A schema-qualified table pattern; the table part may contain wildcards
#[derive(Debug, Clone)]
pub struct TablePattern {
    pub schema: String,
    table: Pattern,
}

impl TablePattern {
    /// Parse `schema.table` or `table` (public schema)
    pub fn parse(raw: &str) -> Result<Self> {
        let (schema, table) = raw.split_once('.').unwrap_or((PUBLIC_SCHEMA, raw));

        if schema.is_empty() || table.is_empty() || schema.contains('*') {
            return Err(Error::ConfigError(format!(
                "invalid table pattern '{}': expected schema.table or schema.*",
                raw
            )));
        }

        let table = Pattern::new(table)
            .map_err(|e| Error::ConfigError(format!("invalid table pattern '{}': {}", raw, e)))?;

        Ok(Self {
            schema: schema.to_string(),
            table,
        })
    }

    pub fn matches(&self, table: &TableRef) -> bool {
        self.schema == table.schema && self.table.matches(&table.table)
    }
}

/// Parse every pattern, failing on the first malformed one
pub fn parse_patterns(raw: &[String]) -> Result<Vec<TablePattern>> {
    raw.iter().map(|p| TablePattern::parse(p)).collect()
}

/// Schemas named by the patterns, in first-mention order
pub fn pattern_schemas(patterns: &[TablePattern]) -> Vec<String> {
    let schemas: IndexSet<&str> = patterns.iter().map(|p| p.schema.as_str()).collect();
    schemas.into_iter().map(str::to_string).collect()
}

/// Select matching tables: pattern order first, then the provider's order
pub fn select_tables(patterns: &[TablePattern], available: &[TableRef]) -> Vec<TableRef> {
    let mut selected = IndexSet::new();

    for pattern in patterns {
        for table in available.iter().filter(|t| pattern.matches(t)) {
            selected.insert(table.clone());
        }
    }

    selected.into_iter().collect()
}
