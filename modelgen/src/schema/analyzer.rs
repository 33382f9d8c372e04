//! Database schema analyzer
//!
//! Providers produce raw table facts; [`collect_facts`] turns table patterns into an
//! ordered batch of facts ready for the model builder.

use async_trait::async_trait;
use futures::future::try_join_all;
use indexmap::{IndexMap, IndexSet};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::path::Path;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::schema::pattern::{parse_patterns, pattern_schemas, select_tables};
use crate::schema::types::{ColumnFacts, ForeignKeyFacts, TableFacts, TableRef};

/// Source of introspected schema facts
#[async_trait]
pub trait SchemaFactProvider: Send + Sync {
    /// Every table and view in the given schemas, in a stable order
    async fn list_tables(&self, schemas: &[String]) -> Result<Vec<TableRef>>;

    /// Columns and foreign keys of one table
    async fn describe_table(&self, table: &TableRef) -> Result<TableFacts>;
}

/// Resolve table patterns into facts, in request order
///
/// Per-table descriptions are fetched concurrently; the returned order only depends on
/// the patterns and the provider's listing. With `follow_fks`, referenced tables in the
/// requested schemas are appended breadth-first in discovery order.
pub async fn collect_facts<P>(
    provider: &P,
    patterns: &[String],
    follow_fks: bool,
) -> Result<Vec<TableFacts>>
where
    P: SchemaFactProvider + ?Sized,
{
    // Resolve patterns against the tables the provider knows
    let patterns = parse_patterns(patterns)?;
    let schemas = pattern_schemas(&patterns);

    let available = provider.list_tables(&schemas).await?;
    let selected = select_tables(&patterns, &available);
    if selected.is_empty() {
        tracing::warn!(?schemas, "no tables matched the requested patterns");
    }

    let mut seen: IndexSet<TableRef> = selected.iter().cloned().collect();
    let mut facts = describe_all(provider, &selected).await?;

    if follow_fks {
        // Breadth-first: only tables added in the last round can reveal new targets
        let mut frontier = 0;
        loop {
            let discovered: Vec<TableRef> = facts[frontier..]
                .iter()
                .flat_map(|table| table.foreign_keys.iter().map(ForeignKeyFacts::target))
                .filter(|target| schemas.contains(&target.schema))
                .filter(|target| seen.insert(target.clone()))
                .collect();

            if discovered.is_empty() {
                break;
            }

            tracing::debug!(count = discovered.len(), "following foreign keys");
            frontier = facts.len();
            facts.extend(describe_all(provider, &discovered).await?);
        }
    }

    tracing::info!(tables = facts.len(), "collected schema facts");
    Ok(facts)
}

async fn describe_all<P>(provider: &P, tables: &[TableRef]) -> Result<Vec<TableFacts>>
where
    P: SchemaFactProvider + ?Sized,
{
    try_join_all(tables.iter().map(|table| async move {
        provider
            .describe_table(table)
            .await
            .map_err(|e| e.with_table(&table.to_string()))
    }))
    .await
}

/// Provider serving facts held in memory, e.g. loaded from a JSON dump
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    tables: IndexMap<TableRef, TableFacts>,
}

impl StaticProvider {
    pub fn new(tables: Vec<TableFacts>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.table_ref(), t)).collect(),
        }
    }

    /// Parse a JSON array of table facts
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: Vec<TableFacts> = serde_json::from_str(json)?;
        Ok(Self::new(tables))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[async_trait]
impl SchemaFactProvider for StaticProvider {
    async fn list_tables(&self, schemas: &[String]) -> Result<Vec<TableRef>> {
        Ok(self
            .tables
            .keys()
            .filter(|t| schemas.contains(&t.schema))
            .cloned()
            .collect())
    }

    async fn describe_table(&self, table: &TableRef) -> Result<TableFacts> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| Error::schema_fact(table.to_string(), "table not found"))
    }
}

// Row types for PostgreSQL queries
#[derive(FromRow)]
struct TableRow {
    table_schema: String,
    table_name: String,
}

#[derive(FromRow)]
struct ViewRow {
    is_view: bool,
}

#[derive(FromRow)]
struct ColumnRow {
    column_name: String,
    data_type: String,
    udt_name: String,
    is_nullable: bool,
    character_maximum_length: Option<i32>,
}

#[derive(FromRow)]
struct KeyColumnRow {
    column_name: String,
}

#[derive(FromRow)]
struct ForeignKeyRow {
    columns: Vec<String>,
    ref_schema: String,
    ref_table: String,
}

#[derive(FromRow)]
struct EnumRow {
    enum_name: String,
    value: String,
}

/// PostgreSQL schema analyzer
#[derive(Debug, Clone)]
pub struct PostgresAnalyzer {
    pool: PgPool,
}

impl PostgresAnalyzer {
    /// Create a new schema analyzer over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the database configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(Error::ConfigError("database url is empty".to_string()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.unwrap_or(4))
            .acquire_timeout(Duration::from_secs(config.timeout_seconds.unwrap_or(30)))
            .connect(&config.url)
            .await?;

        Ok(Self::new(pool))
    }

    async fn is_view(&self, table: &TableRef) -> Result<bool> {
        let sql = r#"
            SELECT table_type = 'VIEW' AS is_view
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_name = $2
        "#;

        let row = sqlx::query_as::<_, ViewRow>(sql)
            .bind(&table.schema)
            .bind(&table.table)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.is_view)
            .ok_or_else(|| Error::schema_fact(table.to_string(), "table not found"))
    }

    async fn primary_keys(&self, table: &TableRef) -> Result<Vec<String>> {
        let sql = r#"
            SELECT
                kcu.column_name::text AS column_name
            FROM
                information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE
                tc.constraint_type = 'PRIMARY KEY'
                AND tc.table_schema = $1
                AND tc.table_name = $2
            ORDER BY kcu.ordinal_position
        "#;

        let rows = sqlx::query_as::<_, KeyColumnRow>(sql)
            .bind(&table.schema)
            .bind(&table.table)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.column_name).collect())
    }

    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKeyFacts>> {
        let sql = r#"
            SELECT
                ARRAY(
                    SELECT a.attname::text
                    FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                    JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                    ORDER BY k.ord
                ) AS columns,
                tn.nspname::text AS ref_schema,
                tc.relname::text AS ref_table
            FROM
                pg_constraint con
            JOIN pg_class c ON c.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_class tc ON tc.oid = con.confrelid
            JOIN pg_namespace tn ON tn.oid = tc.relnamespace
            WHERE
                con.contype = 'f'
                AND n.nspname = $1
                AND c.relname = $2
            ORDER BY con.conname
        "#;

        let rows = sqlx::query_as::<_, ForeignKeyRow>(sql)
            .bind(&table.schema)
            .bind(&table.table)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| ForeignKeyFacts {
                source_columns: r.columns,
                target_schema: r.ref_schema,
                target_table: r.ref_table,
            })
            .collect())
    }

    async fn enum_values(&self, type_names: &[String]) -> Result<IndexMap<String, Vec<String>>> {
        let mut values: IndexMap<String, Vec<String>> = IndexMap::new();
        if type_names.is_empty() {
            return Ok(values);
        }

        let sql = r#"
            SELECT
                t.typname::text AS enum_name,
                e.enumlabel::text AS value
            FROM pg_type t
            JOIN pg_enum e ON e.enumtypid = t.oid
            WHERE t.typname = ANY($1)
            ORDER BY t.typname, e.enumsortorder
        "#;

        let rows = sqlx::query_as::<_, EnumRow>(sql)
            .bind(type_names)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            values.entry(row.enum_name).or_default().push(row.value);
        }

        Ok(values)
    }
}

/// Turn an information_schema column row into column facts
fn column_facts(
    row: ColumnRow,
    primary_keys: &[String],
    foreign_keys: &[ForeignKeyFacts],
    enums: &IndexMap<String, Vec<String>>,
) -> ColumnFacts {
    // Array columns report their element type with a leading underscore
    let is_array = row.data_type == "ARRAY";
    let source_type = if is_array {
        row.udt_name.trim_start_matches('_').to_string()
    } else {
        row.udt_name
    };

    let mut facts = ColumnFacts::new(&row.column_name, &source_type).nullable(row.is_nullable);
    facts.is_array = is_array;
    facts.is_primary_key = primary_keys.contains(&row.column_name);
    facts.is_foreign_key = foreign_keys
        .iter()
        .any(|fk| fk.source_columns.contains(&row.column_name));
    facts.max_length = row
        .character_maximum_length
        .and_then(|len| u32::try_from(len).ok());

    if let Some(values) = enums.get(&source_type) {
        facts.enum_name = Some(source_type.clone());
        facts.enum_values = values.clone();
    }

    facts
}

#[async_trait]
impl SchemaFactProvider for PostgresAnalyzer {
    async fn list_tables(&self, schemas: &[String]) -> Result<Vec<TableRef>> {
        let sql = r#"
            SELECT table_schema::text AS table_schema, table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = ANY($1) AND table_type IN ('BASE TABLE', 'VIEW')
            ORDER BY table_schema, table_name
        "#;

        let rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(schemas)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TableRef::new(&r.table_schema, &r.table_name))
            .collect())
    }

    async fn describe_table(&self, table: &TableRef) -> Result<TableFacts> {
        let is_view = self.is_view(table).await?;

        let sql = r#"
            SELECT
                column_name::text AS column_name,
                data_type::text AS data_type,
                udt_name::text AS udt_name,
                is_nullable = 'YES' AS is_nullable,
                character_maximum_length::int4 AS character_maximum_length
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(&table.schema)
            .bind(&table.table)
            .fetch_all(&self.pool)
            .await?;

        // Key and enum facts come from separate catalog queries
        let primary_keys = self.primary_keys(table).await?;
        let foreign_keys = self.foreign_keys(table).await?;

        let udt_names: Vec<String> = rows
            .iter()
            .map(|r| r.udt_name.trim_start_matches('_').to_string())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let enums = self.enum_values(&udt_names).await?;

        let mut facts = TableFacts::new(&table.schema, &table.table);
        facts.is_view = is_view;
        facts.columns = rows
            .into_iter()
            .map(|row| column_facts(row, &primary_keys, &foreign_keys, &enums))
            .collect();
        facts.foreign_keys = foreign_keys;

        tracing::debug!(
            table = %table,
            columns = facts.columns.len(),
            foreign_keys = facts.foreign_keys.len(),
            "described table"
        );

        Ok(facts)
    }
}
