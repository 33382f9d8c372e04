//! Entity/Relation model builder
//!
//! Entities are built in two phases: every table of the batch is compiled with
//! relation targets held by identity, then relations are linked by lookup across
//! the finished batch.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::config::{Config, GenerationConfig, TypeOverrides, DEFAULT_JSON_TYPE};
use crate::error::Result;
use crate::model::entity::{Column, Entity, Relation};
use crate::schema::types::{ColumnFacts, ScalarKind, TableFacts, TableRef};
use crate::utils::naming::column_name;

/// Compiles schema facts into entities
pub struct EntityBuilder<'a> {
    generation: &'a GenerationConfig,
    json_types: &'a TypeOverrides,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            generation: &config.generation,
            json_types: &config.json_types,
        }
    }

    /// Build and link every table of one generation run, in the given order
    pub fn build_batch(&self, tables: &[TableFacts]) -> Result<Vec<Entity>> {
        let mut seen = IndexSet::new();
        let mut entities = Vec::with_capacity(tables.len());

        for facts in tables {
            if !seen.insert(facts.table_ref()) {
                debug!(table = %facts.table_ref(), "skipping duplicate table");
                continue;
            }
            entities.push(self.build_entity(facts)?);
        }

        link_relations(&mut entities);
        Ok(entities)
    }

    /// Build one entity; its relations are left unlinked
    pub fn build_entity(&self, facts: &TableFacts) -> Result<Entity> {
        let mut entity = Entity::new(&facts.schema, &facts.name, facts.is_view);

        let rename_pk = !self.generation.keep_pk
            && facts.columns.iter().filter(|c| c.is_primary_key).count() == 1;

        for column in &facts.columns {
            entity.add_column(self.build_column(&entity, column, rename_pk))?;
        }

        for fk in &facts.foreign_keys {
            let relation = Relation::new(&fk.source_columns, fk.target());
            if relation.is_multi_column() {
                warn!(
                    table = %entity.full_name,
                    columns = ?relation.fk_columns,
                    "multi-column foreign key is not supported"
                );
            }
            entity.add_relation(relation)?;
        }

        debug!(
            entity = %entity.name,
            columns = entity.columns.len(),
            relations = entity.relations.len(),
            "built entity"
        );
        Ok(entity)
    }

    fn build_column(&self, entity: &Entity, facts: &ColumnFacts, rename_pk: bool) -> Column {
        let kind = ScalarKind::from_source_type(&facts.source_type);

        let name = if facts.is_primary_key && rename_pk {
            self.generation.pk_field_name.clone()
        } else {
            column_name(&facts.name)
        };

        let (field_type, import) = if !facts.enum_values.is_empty() {
            (self.wrap("string", facts, true), None)
        } else if kind == ScalarKind::Json {
            let target = self
                .json_types
                .resolve(&entity.source_schema, &entity.source_name, &facts.name)
                .unwrap_or(DEFAULT_JSON_TYPE);
            (target.to_string(), None)
        } else {
            if kind == ScalarKind::Unknown {
                warn!(
                    table = %entity.full_name,
                    column = %facts.name,
                    source_type = %facts.source_type,
                    "unsupported column type"
                );
            }
            (
                self.wrap(kind.go_type(), facts, kind.is_pointable()),
                kind.import().map(str::to_string),
            )
        };

        Column {
            name,
            source_name: facts.name.clone(),
            source_type: facts.source_type.clone(),
            kind,
            field_type,
            import,
            nullable: facts.nullable,
            is_array: facts.is_array,
            is_primary_key: facts.is_primary_key,
            is_foreign_key: facts.is_foreign_key,
            max_length: facts.max_length,
            enum_name: facts.enum_name.clone(),
            values: facts.enum_values.clone(),
            relation: None,
            covered: false,
        }
    }

    fn wrap(&self, base: &str, facts: &ColumnFacts, pointable: bool) -> String {
        if facts.is_array {
            format!("[]{}", base)
        } else if facts.nullable && pointable {
            format!("*{}", base)
        } else {
            base.to_string()
        }
    }
}

/// Resolve every relation's target by lookup across the batch
pub fn link_relations(entities: &mut [Entity]) {
    let index: IndexMap<TableRef, usize> = entities
        .iter()
        .enumerate()
        .map(|(i, entity)| (entity.table_ref(), i))
        .collect();

    for entity in entities.iter_mut() {
        for relation in &mut entity.relations {
            relation.target_index = index.get(&relation.target).copied();
            if relation.target_index.is_none() {
                debug!(
                    entity = %entity.name,
                    target = %relation.target,
                    "relation target is outside the batch"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::ForeignKeyFacts;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn names(entity: &Entity) -> Vec<&str> {
        entity.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn users() -> TableFacts {
        TableFacts::new("public", "users")
            .column(ColumnFacts::new("id", "int4").primary_key())
            .column(ColumnFacts::new("email", "text").max_length(100))
            .column(ColumnFacts::new("status", "text").allowed_values(None, &["active", "banned"]))
    }

    #[rstest]
    #[case(false, "ID")]
    #[case(true, "ID")]
    fn test_pk_naming(#[case] keep_pk: bool, #[case] expected: &str) {
        let mut config = Config::default();
        config.generation.keep_pk = keep_pk;
        config.generation.pk_field_name = "ID".to_string();

        let entity = EntityBuilder::new(&config).build_entity(&users()).unwrap();
        assert_eq!(entity.columns[0].name, expected);
        assert_eq!(entity.columns[0].source_name, "id");
    }

    #[test]
    fn test_pk_renamed_to_configured_name() {
        let facts = TableFacts::new("public", "accounts")
            .column(ColumnFacts::new("account_id", "int8").primary_key());

        let mut config = Config::default();
        config.generation.pk_field_name = "Key".to_string();
        let renamed = EntityBuilder::new(&config).build_entity(&facts).unwrap();
        assert_eq!(renamed.columns[0].name, "Key");
        assert_eq!(renamed.columns[0].source_name, "account_id");

        config.generation.keep_pk = true;
        let kept = EntityBuilder::new(&config).build_entity(&facts).unwrap();
        assert_eq!(kept.columns[0].name, "AccountID");
    }

    #[test]
    fn test_multiple_pks_keep_names() {
        let facts = TableFacts::new("public", "memberships")
            .column(ColumnFacts::new("user_id", "int4").primary_key())
            .column(ColumnFacts::new("team_id", "int4").primary_key());

        let config = Config::default();
        let entity = EntityBuilder::new(&config).build_entity(&facts).unwrap();
        assert_eq!(names(&entity), vec!["UserID", "TeamID"]);
        assert!(entity.has_multiple_pks());
    }

    #[test]
    fn test_renamed_pk_still_collision_checked() {
        let facts = TableFacts::new("public", "legacy")
            .column(ColumnFacts::new("legacy_key", "int4").primary_key())
            .column(ColumnFacts::new("id", "text"));

        let config = Config::default();
        let entity = EntityBuilder::new(&config).build_entity(&facts).unwrap();
        assert_eq!(names(&entity), vec!["ID", "ID1"]);
    }

    #[test]
    fn test_field_types_and_imports() {
        let facts = TableFacts::new("public", "events")
            .column(ColumnFacts::new("id", "int8").primary_key())
            .column(ColumnFacts::new("happened_at", "timestamptz").nullable(true))
            .column(ColumnFacts::new("tags", "text").array())
            .column(ColumnFacts::new("source_ip", "inet"))
            .column(ColumnFacts::new("blob", "bytea").nullable(true))
            .column(ColumnFacts::new("payload", "jsonb").nullable(true));

        let config = Config::default();
        let entity = EntityBuilder::new(&config).build_entity(&facts).unwrap();
        let types: Vec<&str> = entity.columns.iter().map(|c| c.field_type.as_str()).collect();

        assert_eq!(
            types,
            vec!["int64", "*time.Time", "[]string", "net.IP", "[]byte", DEFAULT_JSON_TYPE]
        );
        assert_eq!(entity.imports.iter().collect::<Vec<_>>(), vec!["time", "net"]);
    }

    #[test]
    fn test_json_override_replaces_type() {
        let facts = TableFacts::new("public", "users")
            .column(ColumnFacts::new("settings", "jsonb").nullable(true))
            .column(ColumnFacts::new("meta", "json"));

        let mut config = Config::default();
        config.json_types.insert("public.users.settings", "UserSettings");

        let entity = EntityBuilder::new(&config).build_entity(&facts).unwrap();
        assert_eq!(entity.columns[0].field_type, "UserSettings");
        assert_eq!(entity.columns[1].field_type, DEFAULT_JSON_TYPE);
    }

    #[test]
    fn test_enumerations_collected_once() {
        let facts = TableFacts::new("public", "orders")
            .column(
                ColumnFacts::new("state", "order_state")
                    .allowed_values(Some("order_state"), &["new", "paid"]),
            )
            .column(
                ColumnFacts::new("previous_state", "order_state")
                    .nullable(true)
                    .allowed_values(Some("order_state"), &["new", "paid"]),
            );

        let config = Config::default();
        let entity = EntityBuilder::new(&config).build_entity(&facts).unwrap();

        assert_eq!(entity.enums.len(), 1);
        assert_eq!(entity.columns[0].field_type, "string");
        assert_eq!(entity.columns[1].field_type, "*string");
    }

    #[test]
    fn test_relation_back_links_columns() {
        let facts = TableFacts::new("public", "posts")
            .column(ColumnFacts::new("id", "int4").primary_key())
            .column(ColumnFacts::new("author_id", "int4"))
            .column(ColumnFacts::new("owner", "int4"))
            .foreign_key(ForeignKeyFacts::new(&["author_id"], "public", "users"))
            .foreign_key(ForeignKeyFacts::new(&["owner"], "public", "users"));

        let config = Config::default();
        let entity = EntityBuilder::new(&config).build_entity(&facts).unwrap();
        let relations: Vec<&str> = entity.relations.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(relations, vec!["Author", "OwnerRel"]);
        assert_eq!(entity.column("author_id").unwrap().relation, Some(0));
        assert_eq!(entity.column("owner").unwrap().relation, Some(1));
        assert!(entity.column("owner").unwrap().is_foreign_key);
        assert_eq!(entity.column("id").unwrap().relation, None);
        assert!(entity.column("author_id").unwrap().covered);
        assert_eq!(entity.relations[0].type_name, "User");
    }

    #[test]
    fn test_batch_links_self_and_forward_references() {
        let employees = TableFacts::new("public", "employees")
            .column(ColumnFacts::new("id", "int4").primary_key())
            .column(ColumnFacts::new("manager_id", "int4").nullable(true))
            .column(ColumnFacts::new("department_id", "int4"))
            .foreign_key(ForeignKeyFacts::new(&["manager_id"], "public", "employees"))
            .foreign_key(ForeignKeyFacts::new(&["department_id"], "public", "departments"))
            .foreign_key(ForeignKeyFacts::new(&["id"], "audit", "people"));
        let departments = TableFacts::new("public", "departments")
            .column(ColumnFacts::new("id", "int4").primary_key());

        let config = Config::default();
        let entities = EntityBuilder::new(&config)
            .build_batch(&[employees, departments.clone(), departments])
            .unwrap();

        assert_eq!(entities.len(), 2);
        let targets: Vec<Option<usize>> = entities[0]
            .relations
            .iter()
            .map(|r| r.target_index)
            .collect();
        assert_eq!(targets, vec![Some(0), Some(1), None]);
    }
}
