//! Package assembly: the data a template program is rendered against

use indexmap::IndexSet;
use serde::Serialize;

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::generator::annotation::{AnnotationSynthesizer, ValidationCheck};
use crate::model::entity::{Column, Entity, Relation};
use crate::model::enums::{EnumSet, Enumeration};

/// One emission unit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    pub package: String,
    pub has_imports: bool,
    pub imports: Vec<String>,
    pub has_enums: bool,
    pub enums: Vec<Enumeration>,
    pub entities: Vec<TemplateEntity>,
}

impl Package {
    /// Union imports and enumerations of the entities, first seen first
    pub fn assemble(entities: &[Entity], options: &GenerationConfig) -> Result<Self> {
        let synthesizer = AnnotationSynthesizer::new(options)?;

        let mut imports = IndexSet::new();
        let mut enums = EnumSet::new();

        for entity in entities {
            imports.extend(entity.imports.iter().cloned());
            for enumeration in entity.enums.elements() {
                enums.add(enumeration.clone())?;
            }
        }

        let entities = entities
            .iter()
            .map(|entity| TemplateEntity::new(entity, &synthesizer))
            .collect();

        Ok(Self {
            package: options.package.clone(),
            has_imports: !imports.is_empty(),
            imports: imports.into_iter().collect(),
            has_enums: !enums.is_empty(),
            enums: enums.into_elements(),
            entities,
        })
    }

    /// Add an import required by the template itself
    pub fn with_import(mut self, import: &str) -> Self {
        if !self.imports.iter().any(|i| i == import) {
            self.imports.push(import.to_string());
        }
        self.has_imports = true;
        self
    }
}

/// Entity as seen by templates
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateEntity {
    pub name: String,
    pub plural_name: String,
    pub source_schema: String,
    pub source_name: String,
    pub full_name: String,
    pub is_view: bool,
    pub tag: String,
    pub no_alias: bool,
    pub alias: String,
    pub columns: Vec<TemplateColumn>,
    pub has_relations: bool,
    pub relations: Vec<TemplateRelation>,
    pub has_create_by: bool,
    pub has_create_dt: bool,
    pub has_update_by: bool,
    pub has_update_dt: bool,
    pub has_archive_by: bool,
    pub has_archive_dt: bool,
}

impl TemplateEntity {
    pub fn new(entity: &Entity, synthesizer: &AnnotationSynthesizer) -> Self {
        let has = |name: &str| entity.has_field(name);
        let entity_tags = synthesizer.entity_tags(entity);
        let no_alias = entity_tags
            .get(synthesizer.namespace())
            .map_or(true, |values| !values.iter().any(|v| v.starts_with("alias:")));

        let columns = entity
            .columns
            .iter()
            .map(|column| TemplateColumn::new(column, synthesizer))
            .collect();
        let relations: Vec<TemplateRelation> = entity
            .relations
            .iter()
            .map(|relation| TemplateRelation::new(relation, synthesizer))
            .collect();

        Self {
            name: entity.name.clone(),
            plural_name: entity.plural_name.clone(),
            source_schema: entity.source_schema.clone(),
            source_name: entity.source_name.clone(),
            full_name: entity.full_name.clone(),
            is_view: entity.is_view,
            tag: entity_tags.quoted(),
            no_alias,
            alias: entity.source_name.clone(),
            columns,
            has_relations: !relations.is_empty(),
            relations,
            has_create_by: has("CreateBy"),
            has_create_dt: has("CreateDt"),
            has_update_by: has("UpdateBy"),
            has_update_dt: has("UpdateDt"),
            has_archive_by: has("ArchiveBy"),
            has_archive_dt: has("ArchiveDt"),
        }
    }
}

/// Column as seen by templates
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateColumn {
    pub name: String,
    pub source_name: String,
    pub source_type: String,
    #[serde(rename = "Type")]
    pub field_type: String,
    pub nullable: bool,
    pub is_array: bool,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub is_enum: bool,
    pub has_relation: bool,
    pub max_length: Option<u32>,
    pub values: Vec<String>,
    pub check: String,
    pub tag: String,
    pub comment: String,
}

impl TemplateColumn {
    pub fn new(column: &Column, synthesizer: &AnnotationSynthesizer) -> Self {
        let tags = synthesizer.column_tags(column);

        Self {
            name: column.name.clone(),
            source_name: column.source_name.clone(),
            source_type: column.source_type.clone(),
            field_type: column.field_type.clone(),
            nullable: column.nullable,
            is_array: column.is_array,
            is_primary_key: column.is_primary_key,
            is_foreign_key: column.is_foreign_key,
            is_enum: column.is_enum(),
            has_relation: column.has_relation(),
            max_length: column.max_length,
            values: column.values.clone(),
            check: ValidationCheck::of(column)
                .map(ValidationCheck::as_str)
                .unwrap_or_default()
                .to_string(),
            tag: tags.annotation.quoted(),
            comment: tags.comment,
        }
    }
}

/// Relation as seen by templates
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateRelation {
    pub name: String,
    #[serde(rename = "Type")]
    pub type_name: String,
    pub fk_columns: Vec<String>,
    pub target_full_name: String,
    pub linked: bool,
    pub tag: String,
    pub comment: String,
}

impl TemplateRelation {
    pub fn new(relation: &Relation, synthesizer: &AnnotationSynthesizer) -> Self {
        let tags = synthesizer.relation_tags(relation);

        Self {
            name: relation.name.clone(),
            type_name: relation.type_name.clone(),
            fk_columns: relation.fk_columns.clone(),
            target_full_name: relation.target_full_name.clone(),
            linked: relation.is_linked(),
            tag: tags.annotation.quoted(),
            comment: tags.comment,
        }
    }
}
