use modelgen::config::{Config, Layout};
use modelgen::schema::{ColumnFacts, ForeignKeyFacts, TableFacts};
use modelgen::{Error, ModelGenerator, StaticProvider};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn users() -> TableFacts {
    TableFacts::new("public", "users")
        .column(ColumnFacts::new("id", "integer").primary_key())
        .column(ColumnFacts::new("email", "text").max_length(100))
        .column(
            ColumnFacts::new("status", "text")
                .nullable(true)
                .allowed_values(None, &["active", "banned"]),
        )
}

fn generator(config: Config) -> ModelGenerator {
    ModelGenerator::new(config).unwrap()
}

#[test]
fn test_users_end_to_end() {
    let generator = generator(Config::default());
    let entities = generator.compile(&[users()]).unwrap();

    assert_eq!(entities.len(), 1);
    let user = &entities[0];
    assert_eq!(user.name, "User");
    assert_eq!(user.plural_name, "Users");
    assert_eq!(user.columns.len(), 3);
    assert!(user.relations.is_empty());

    let enums: Vec<_> = user.enums.elements().collect();
    assert_eq!(enums.len(), 1);
    assert_eq!(enums[0].name, "status");
    let entries: Vec<(&str, &str)> = enums[0]
        .entries
        .iter()
        .map(|e| (e.constant.as_str(), e.value.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![("StatusActive", "active"), ("StatusBanned", "banned")]
    );

    let package = modelgen::Package::assemble(&entities, &generator.config().generation).unwrap();
    let tags: Vec<&str> = package.entities[0]
        .columns
        .iter()
        .map(|c| c.tag.as_str())
        .collect();
    assert_eq!(
        tags,
        vec![
            r#"`sql:"id,pk" json:"id" form:"id" validate:"required"`"#,
            r#"`sql:"email,notnull" json:"email" form:"email" validate:"required,lte=100"`"#,
            r#"`sql:"status" json:"status" form:"status" validate:"omitempty,oneof='active' 'banned'"`"#,
        ]
    );
}

#[test]
fn test_output_is_deterministic() {
    let tables = vec![
        users(),
        TableFacts::new("public", "posts")
            .column(ColumnFacts::new("id", "int8").primary_key())
            .column(ColumnFacts::new("user_id", "int4"))
            .column(ColumnFacts::new("userId", "int4"))
            .column(ColumnFacts::new("User", "text"))
            .foreign_key(ForeignKeyFacts::new(&["user_id"], "public", "users")),
    ];

    let run = || {
        let generator = generator(Config::default());
        let entities = generator.compile(&tables).unwrap();
        generator.emit(&entities).unwrap().into_result().unwrap()
    };

    let first = run();
    assert_eq!(first, run());

    let model = &first[1].contents;
    assert!(model.contains("\tUserID int "));
    assert!(model.contains("\tUserID1 int "));
    assert!(model.contains("\tUser string "));
    assert!(model.contains("\tUserRel *User `sql:\"fk:user_id\" json:\"-\"`"));
}

#[test]
fn test_multi_column_foreign_key_is_unsupported() {
    let tables = vec![TableFacts::new("public", "addresses")
        .column(ColumnFacts::new("country", "text"))
        .column(ColumnFacts::new("region", "text"))
        .foreign_key(ForeignKeyFacts::new(&["country", "region"], "geo", "regions"))];

    let generator = generator(Config::default());
    let entities = generator.compile(&tables).unwrap();
    assert!(entities[0].relations[0].is_multi_column());

    let artifacts = generator.emit(&entities).unwrap().into_result().unwrap();
    assert!(artifacts[1].contents.contains(
        "\tCountryRegion *GeoRegion `sql:\"fk:country,region,-\" json:\"-\"` // unsupported: multi-column foreign key"
    ));
}

#[test]
fn test_self_reference_is_linked() {
    let tables = vec![TableFacts::new("public", "categories")
        .column(ColumnFacts::new("id", "int4").primary_key())
        .column(ColumnFacts::new("parent_id", "int4").nullable(true))
        .foreign_key(ForeignKeyFacts::new(&["parent_id"], "public", "categories"))];

    let entities = generator(Config::default()).compile(&tables).unwrap();
    let relation = &entities[0].relations[0];

    assert_eq!(relation.name, "Parent");
    assert_eq!(relation.type_name, "Category");
    assert_eq!(relation.target_index, Some(0));
}

#[rstest]
#[case(Layout::Single, vec!["constant/enums.go", "model/model.go"])]
#[case(
    Layout::PerEntity,
    vec!["constant/enums.go", "models/base.go", "models/user.go", "models/billinginvoice.go"]
)]
fn test_artifact_names(#[case] layout: Layout, #[case] expected: Vec<&str>) {
    let mut config = Config::default();
    config.generation.layout = layout;

    let tables = vec![users(), TableFacts::new("billing", "invoices")];
    let generator = generator(config);
    let entities = generator.compile(&tables).unwrap();
    let artifacts = generator.emit(&entities).unwrap().into_result().unwrap();

    let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_run_with_static_provider() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.output.directory = dir.path().to_string_lossy().to_string();
    config.generation.tables = vec!["posts".to_string()];
    config.generation.follow_fks = true;
    config.generation.package = "db".to_string();

    let provider = StaticProvider::new(vec![
        users(),
        TableFacts::new("public", "posts")
            .column(ColumnFacts::new("id", "int4").primary_key())
            .column(ColumnFacts::new("user_id", "int4"))
            .foreign_key(ForeignKeyFacts::new(&["user_id"], "public", "users")),
    ]);

    let written = generator(config).run(&provider).await.unwrap();
    assert_eq!(written.len(), 2);

    let model = std::fs::read_to_string(dir.path().join("model/model.go")).unwrap();
    assert!(model.contains("package db"));
    let post = model.find("type Post struct").unwrap();
    let user = model.find("type User struct").unwrap();
    assert!(post < user);

    let enums = std::fs::read_to_string(dir.path().join("constant/enums.go")).unwrap();
    assert!(enums.contains("StatusActive = \"active\""));
}

#[tokio::test]
async fn test_failed_emission_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("model.tmpl");
    std::fs::write(&template, "{{range .Entities}}{{.Unknown}}{{end}}").unwrap();

    let mut config = Config::default();
    config.output.directory = dir.path().join("out").to_string_lossy().to_string();
    config.templates = Some(modelgen::config::TemplatesConfig {
        model: Some(template.to_string_lossy().to_string()),
        ..Default::default()
    });

    let provider = StaticProvider::new(vec![users()]);
    let err = generator(config).run(&provider).await.unwrap_err();

    assert!(matches!(err, Error::BindingError { .. }));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut config = Config::default();
    config.json_types.insert("a.b.c.d", "T");
    assert!(matches!(ModelGenerator::new(config), Err(Error::ConfigError(_))));
}

#[test]
fn test_init_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modelgen.toml");
    std::fs::write(&path, "[generation]\npackage = \"db\"\nlayout = \"per_entity\"\n").unwrap();

    let generator = modelgen::init(&path.to_string_lossy()).unwrap();
    assert_eq!(generator.config().generation.package, "db");
    assert_eq!(generator.config().generation.layout, Layout::PerEntity);

    std::fs::write(&path, "[generation]\ndialect_version = 7\n").unwrap();
    assert!(matches!(
        modelgen::init(&path.to_string_lossy()),
        Err(Error::ConfigError(_))
    ));
}
