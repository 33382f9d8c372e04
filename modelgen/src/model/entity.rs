//! Compiled entity model: entities, columns and relations

use indexmap::IndexSet;

use crate::error::Result;
use crate::model::enums::{EnumSet, Enumeration};
use crate::model::resolver::NameScope;
use crate::schema::types::{ScalarKind, TableRef};
use crate::utils::naming::{self, PUBLIC_SCHEMA};

/// One table field
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Generated field name, unique within the entity
    pub name: String,
    pub source_name: String,
    pub source_type: String,
    pub kind: ScalarKind,
    /// Go type of the field, after nullability, arrays and overrides
    pub field_type: String,
    pub import: Option<String>,
    pub nullable: bool,
    pub is_array: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub max_length: Option<u32>,
    pub enum_name: Option<String>,
    pub values: Vec<String>,
    /// Index into the owning entity's relations of a relation covering this column
    pub relation: Option<usize>,
    /// Set when a supported relation covers this column
    pub covered: bool,
}

impl Column {
    pub fn is_enum(&self) -> bool {
        !self.values.is_empty()
    }

    /// No safe target type exists for this column
    pub fn is_unsupported(&self) -> bool {
        self.kind == ScalarKind::Unknown && !self.is_enum()
    }

    pub fn is_string(&self) -> bool {
        self.kind == ScalarKind::String
    }

    pub fn has_relation(&self) -> bool {
        self.relation.is_some()
    }
}

/// A foreign key from the owning entity to a target entity
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub fk_columns: Vec<String>,
    /// Generated field name, unique within the entity
    pub name: String,
    /// Generated type name of the target entity
    pub type_name: String,
    pub target: TableRef,
    pub target_full_name: String,
    /// Position of the target in the compiled batch, once linked
    pub target_index: Option<usize>,
}

impl Relation {
    /// Relation from the foreign-key columns and target identity; name not yet reserved
    pub fn new(fk_columns: &[String], target: TableRef) -> Self {
        Self {
            fk_columns: fk_columns.to_vec(),
            name: naming::relation_name(fk_columns),
            type_name: naming::entity_name(&target.schema, &target.table),
            target_full_name: naming::full_name(&target.schema, &target.table),
            target,
            target_index: None,
        }
    }

    pub fn is_multi_column(&self) -> bool {
        self.fk_columns.len() > 1
    }

    pub fn is_linked(&self) -> bool {
        self.target_index.is_some()
    }
}

/// One compiled table or view
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub plural_name: String,
    pub source_schema: String,
    pub source_name: String,
    pub full_name: String,
    pub is_view: bool,
    pub columns: Vec<Column>,
    pub relations: Vec<Relation>,
    pub imports: IndexSet<String>,
    pub enums: EnumSet,
    scope: NameScope,
}

impl Entity {
    /// Create an empty entity for a table
    pub fn new(schema: &str, table: &str, is_view: bool) -> Self {
        let schema = if schema.is_empty() { PUBLIC_SCHEMA } else { schema };

        Self {
            name: naming::entity_name(schema, table),
            plural_name: naming::entity_plural_name(schema, table),
            source_schema: schema.to_string(),
            source_name: table.to_string(),
            full_name: naming::full_name(schema, table),
            is_view,
            columns: Vec::new(),
            relations: Vec::new(),
            imports: IndexSet::new(),
            enums: EnumSet::new(),
            scope: NameScope::new(),
        }
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.source_schema, &self.source_name)
    }

    /// Add a column; `column.name` is the candidate and is replaced by the reserved name
    pub fn add_column(&mut self, mut column: Column) -> Result<()> {
        column.name = self.scope.reserve(&column.name)?;

        if let Some(import) = &column.import {
            self.imports.insert(import.clone());
        }

        if column.is_enum() {
            let enum_name = column
                .enum_name
                .clone()
                .unwrap_or_else(|| column.source_name.clone());
            self.enums.add(Enumeration::new(&enum_name, &column.values))?;
        }

        self.columns.push(column);
        Ok(())
    }

    /// Add a relation and back-link it onto every column it covers
    pub fn add_relation(&mut self, mut relation: Relation) -> Result<()> {
        let candidate = if relation.name.is_empty() {
            relation.type_name.clone()
        } else {
            relation.name.clone()
        };
        relation.name = self.scope.reserve_relation(&candidate)?;

        let index = self.relations.len();
        let covers = !relation.is_multi_column();
        for column in self
            .columns
            .iter_mut()
            .filter(|c| relation.fk_columns.contains(&c.source_name))
        {
            column.relation = Some(index);
            column.is_foreign_key = true;
            // ignored multi-column relations cover nothing
            column.covered |= covers;
        }

        self.relations.push(relation);
        Ok(())
    }

    pub fn column(&self, source_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.source_name == source_name)
    }

    pub fn primary_key_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_primary_key).count()
    }

    pub fn has_multiple_pks(&self) -> bool {
        self.primary_key_count() > 1
    }

    /// Whether a column with the given generated name exists
    pub fn has_field(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}
