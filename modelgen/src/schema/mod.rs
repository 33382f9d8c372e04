//! Schema module for modelgen
//!
//! This module handles schema introspection and table selection.

pub mod analyzer;
pub mod pattern;
pub mod types;

// Re-export key types
pub use analyzer::{collect_facts, PostgresAnalyzer, SchemaFactProvider, StaticProvider};
pub use pattern::TablePattern;
pub use types::{ColumnFacts, ForeignKeyFacts, ScalarKind, TableFacts, TableRef};
