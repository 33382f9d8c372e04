//! Struct tag synthesis for columns, relations and entities

use indexmap::IndexMap;
use std::fmt;

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::model::entity::{Column, Entity, Relation};
use crate::schema::types::ScalarKind;
use crate::utils::naming::serialization_name;

const JSON: &str = "json";
const FORM: &str = "form";
const VALIDATE: &str = "validate";
const IGNORE: &str = "-";

/// Ordered struct tags, one entry per namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    tags: IndexMap<String, Vec<String>>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a namespace, creating the namespace at the end if new
    pub fn add(&mut self, namespace: &str, value: impl Into<String>) -> &mut Self {
        self.tags
            .entry(namespace.to_string())
            .or_default()
            .push(value.into());
        self
    }

    pub fn get(&self, namespace: &str) -> Option<&[String]> {
        self.tags.get(namespace).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Rendered tag wrapped in backticks, ready for a struct field
    pub fn quoted(&self) -> String {
        format!("`{}`", self)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (namespace, values)) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}:\"{}\"", namespace, values.join(","))?;
        }
        Ok(())
    }
}

/// Tags and trailing comment of one generated field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTags {
    pub annotation: Annotation,
    pub comment: String,
}

/// Check classification used by validation templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCheck {
    Nil,
    Zero,
    PZero,
    Len,
    PLen,
    Enum,
    PEnum,
}

impl ValidationCheck {
    /// Classify a column, `None` when nothing needs validating
    pub fn of(column: &Column) -> Option<Self> {
        let complex = matches!(column.kind, ScalarKind::Json | ScalarKind::Hstore);
        let bounded = column.is_string() && column.max_length.unwrap_or(0) > 0;

        let collection = column.is_array || complex;

        let validatable = column.is_foreign_key
            || (collection && !column.nullable)
            || bounded
            || column.is_enum();
        if !validatable {
            return None;
        }

        let pick = |plain, pointer| if column.nullable { pointer } else { plain };

        if collection {
            Some(ValidationCheck::Nil)
        } else if column.is_foreign_key {
            Some(pick(ValidationCheck::Zero, ValidationCheck::PZero))
        } else if bounded {
            Some(pick(ValidationCheck::Len, ValidationCheck::PLen))
        } else if column.is_enum() {
            Some(pick(ValidationCheck::Enum, ValidationCheck::PEnum))
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCheck::Nil => "nil",
            ValidationCheck::Zero => "zero",
            ValidationCheck::PZero => "pzero",
            ValidationCheck::Len => "len",
            ValidationCheck::PLen => "plen",
            ValidationCheck::Enum => "enum",
            ValidationCheck::PEnum => "penum",
        }
    }
}

type ColumnRule = fn(&AnnotationSynthesizer, &Column, &mut FieldTags);

/// Column rules in application order; later rules may override earlier ones
const COLUMN_RULES: &[(&str, ColumnRule)] = &[
    ("identity", identity_rule),
    ("primary_key", primary_key_rule),
    ("structural", structural_rule),
    ("nullability", nullability_rule),
    ("soft_delete", soft_delete_rule),
    ("unsupported", unsupported_rule),
    ("serialization", serialization_rule),
    ("validation", validation_rule),
];

fn identity_rule(s: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    tags.annotation.add(s.namespace, column.source_name.clone());
}

fn primary_key_rule(s: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    if column.is_primary_key {
        tags.annotation.add(s.namespace, "pk");
    }
}

fn structural_rule(s: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    if column.kind == ScalarKind::Hstore {
        tags.annotation.add(s.namespace, "hstore");
    } else if column.is_array {
        tags.annotation.add(s.namespace, "array");
    }

    if column.kind == ScalarKind::Uuid {
        tags.annotation.add(s.namespace, "type:uuid");
    }
}

fn nullability_rule(s: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    if !column.nullable && !column.is_primary_key {
        tags.annotation.add(s.namespace, s.not_null);
    }
}

fn soft_delete_rule(s: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    let configured = s.soft_delete.as_deref() == Some(column.source_name.as_str());
    if configured && column.nullable && column.kind.is_time_like() && !column.is_array {
        tags.annotation.add(s.namespace, "soft_delete");
    }
}

fn unsupported_rule(s: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    if column.is_unsupported() {
        tags.annotation.clear();
        tags.annotation.add(s.namespace, IGNORE);
        tags.comment = format!("// unsupported: {}", column.source_type);
    }
}

fn serialization_rule(_: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    let name = serialization_name(&column.name);
    tags.annotation.add(JSON, name.clone());
    tags.annotation.add(FORM, name);
}

fn validation_rule(_: &AnnotationSynthesizer, column: &Column, tags: &mut FieldTags) {
    if !column.nullable {
        tags.annotation.add(VALIDATE, "required");
    }

    if column.covered {
        return;
    }

    if column.is_enum() {
        if column.nullable {
            tags.annotation.add(VALIDATE, "omitempty");
        }
        if column.is_array {
            tags.annotation.add(VALIDATE, "dive");
        }
        tags.annotation
            .add(VALIDATE, format!("oneof='{}'", column.values.join("' '")));
    }

    if column.is_string() && !column.is_array {
        if let Some(max) = column.max_length.filter(|max| *max > 0) {
            tags.annotation.add(VALIDATE, format!("lte={}", max));
        }
    }
}

/// Derives struct tags from generation options
#[derive(Debug, Clone)]
pub struct AnnotationSynthesizer {
    namespace: &'static str,
    not_null: &'static str,
    soft_delete: Option<String>,
    no_alias: bool,
    no_discard: bool,
}

impl AnnotationSynthesizer {
    pub fn new(options: &GenerationConfig) -> Result<Self> {
        let dialect = options.dialect()?;

        Ok(Self {
            namespace: dialect.tag_namespace(),
            not_null: dialect.not_null_token(),
            soft_delete: options.soft_delete.clone().filter(|c| !c.is_empty()),
            no_alias: options.no_alias,
            no_discard: options.no_discard,
        })
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn column_tags(&self, column: &Column) -> FieldTags {
        let mut tags = FieldTags::default();
        for (_, rule) in COLUMN_RULES {
            rule(self, column, &mut tags);
        }
        tags
    }

    pub fn relation_tags(&self, relation: &Relation) -> FieldTags {
        let mut tags = FieldTags::default();
        tags.annotation
            .add(self.namespace, format!("fk:{}", relation.fk_columns.join(",")));

        if relation.is_multi_column() {
            tags.annotation.add(self.namespace, IGNORE);
            tags.comment = "// unsupported: multi-column foreign key".to_string();
        }

        tags.annotation.add(JSON, IGNORE);
        tags
    }

    pub fn entity_tags(&self, entity: &Entity) -> Annotation {
        let mut annotation = Annotation::new();
        annotation.add(self.namespace, entity.full_name.clone());

        if !self.no_alias {
            annotation.add(self.namespace, format!("alias:{}", entity.source_name));
        }
        if !self.no_discard {
            annotation.add(self.namespace, "discard_unknown_columns");
        }
        annotation
    }
}

/// Names of the column rules in the order they run
pub fn column_rule_names() -> impl Iterator<Item = &'static str> {
    COLUMN_RULES.iter().map(|(name, _)| *name)
}
