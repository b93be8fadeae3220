// tests/inference/discovery_test.rs
use std::sync::Arc;

use schema_intel::metadata::*;
use schema_intel::semantic::inference::*;
use schema_intel::semantic::DiagnosticKind;

fn users() -> TableMetadata {
    TableMetadata::new("users")
        .with_column("id", "int")
        .with_column("region", "text")
        .with_primary_key(&["id"])
}

#[test]
fn test_fk_with_n_pairs_yields_n_explicit_relationships() {
    let snapshot = SchemaSnapshot::new(vec![
        users(),
        TableMetadata::new("sessions")
            .with_column("id", "int")
            .with_column("user_id", "int")
            .with_column("user_region", "text")
            .with_primary_key(&["id"])
            .with_foreign_key(ForeignKeyInfo::new(
                "fk_sessions_user",
                &["user_id", "user_region"],
                "users",
                &["id", "region"],
            )),
    ]);

    let mut diagnostics = Vec::new();
    let rels = discover_explicit(&snapshot, &mut diagnostics);

    assert!(diagnostics.is_empty());
    assert_eq!(rels.len(), 2);
    for rel in &rels {
        assert_eq!(rel.confidence, 1.0);
        assert_eq!(rel.multiplicity, Multiplicity::ManyToOne);
        assert_eq!(rel.constraint_name(), Some("fk_sessions_user"));
    }
}

#[test]
fn test_cascade_only_for_explicit_cascade_action() {
    let snapshot = SchemaSnapshot::new(vec![
        users(),
        TableMetadata::new("orders")
            .with_column("user_id", "int")
            .with_column("approver_id", "int")
            .with_foreign_key(
                ForeignKeyInfo::new("fk_orders_user", &["user_id"], "users", &["id"])
                    .on_delete("cascade")
                    .on_update("CASCADE"),
            )
            .with_foreign_key(
                ForeignKeyInfo::new("fk_orders_approver", &["approver_id"], "users", &["id"])
                    .on_delete("SET NULL")
                    .on_update("NO_ACTION"),
            ),
    ]);

    let mut diagnostics = Vec::new();
    let rels = discover_explicit(&snapshot, &mut diagnostics);

    assert!(rels[0].cascade_on_delete && rels[0].cascade_on_update);
    assert!(!rels[1].cascade_on_delete && !rels[1].cascade_on_update);
}

#[test]
fn test_fk_into_filtered_table_is_skipped_with_diagnostic() {
    let snapshot = SchemaSnapshot::new(vec![TableMetadata::new("posts")
        .with_column("id", "int")
        .with_column("user_id", "int")
        .with_foreign_key(ForeignKeyInfo::new("fk", &["user_id"], "users", &["id"]))]);

    let mut diagnostics = Vec::new();
    let rels = discover_explicit(&snapshot, &mut diagnostics);

    assert!(rels.is_empty());
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingReference);
}

#[test]
fn test_inferrer_finds_posts_user_id() {
    let snapshot = SchemaSnapshot::new(vec![
        users(),
        TableMetadata::new("posts")
            .with_column("id", "int")
            .with_column("user_id", "int")
            .with_primary_key(&["id"]),
    ]);

    let rels = NamingInferrer::default().infer(&snapshot, &[]);

    assert_eq!(rels.len(), 1);
    let rel = &rels[0];
    assert_eq!(
        (rel.from_table.as_str(), rel.from_column.as_str(), rel.to_table.as_str(), rel.to_column.as_str()),
        ("posts", "user_id", "users", "id")
    );
    assert!(rel.confidence >= 0.90);
    assert!(rel.confidence < 1.0);
    assert_eq!(rel.kind, RelationshipKind::Inferred);
}

#[test]
fn test_inferrer_skips_column_covered_by_explicit_fk() {
    let snapshot = SchemaSnapshot::new(vec![
        users(),
        TableMetadata::new("posts")
            .with_column("id", "int")
            .with_column("user_id", "int")
            .with_primary_key(&["id"])
            .with_foreign_key(ForeignKeyInfo::new("fk_posts_user", &["user_id"], "users", &["id"])),
    ]);

    let mut diagnostics = Vec::new();
    let explicit = discover_explicit(&snapshot, &mut diagnostics);
    let inferred = NamingInferrer::default().infer(&snapshot, &explicit);

    assert!(inferred.is_empty());
}

#[test]
fn test_irregular_plural_resolves() {
    let snapshot = SchemaSnapshot::new(vec![
        TableMetadata::new("people").with_column("id", "int").with_primary_key(&["id"]),
        TableMetadata::new("addresses")
            .with_column("id", "int")
            .with_column("person_id", "int")
            .with_primary_key(&["id"]),
    ]);

    let rels = NamingInferrer::default().infer(&snapshot, &[]);

    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].to_table, "people");
    assert_eq!(rels[0].confidence, 0.90);
}

#[test]
fn test_custom_inflector_is_used() {
    let snapshot = SchemaSnapshot::new(vec![
        TableMetadata::new("schemata").with_column("id", "int"),
        TableMetadata::new("migrations").with_column("schema_id", "int"),
    ]);

    assert!(NamingInferrer::default().infer(&snapshot, &[]).is_empty());

    let inflector = Arc::new(EnglishInflector::new().with_irregular("schema", "schemata"));
    let rels = NamingInferrer::new(inflector).infer(&snapshot, &[]);
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].to_table, "schemata");
    assert_eq!(rels[0].confidence, 0.90);
}

#[test]
fn test_merge_explicit_first_and_wins() {
    let explicit = vec![Relationship::explicit("fk", "posts", "author_id", "accounts", "id")];
    let inferred = vec![
        Relationship::inferred("posts", "author_id", "authors", "id", 0.95),
        Relationship::inferred("posts", "topic_id", "topics", "id", 0.90),
    ];

    let merged = merge(explicit, inferred);

    assert_eq!(merged.len(), 2);
    assert!(merged[0].is_explicit());
    assert_eq!(merged[0].to_table, "accounts");
    assert_eq!(merged[1].to_table, "topics");
}

#[test]
fn test_snapshot_from_json_and_validate() {
    let json = r#"{
        "tables": [
            {
                "name": "users",
                "columns": [{"name": "id", "data_type": "int"}],
                "primary_key": {"columns": ["id"]}
            },
            {
                "name": "posts",
                "columns": [
                    {"name": "id", "data_type": "int"},
                    {"name": "user_id", "data_type": "int", "is_nullable": true}
                ],
                "foreign_keys": [{
                    "name": "fk_posts_user",
                    "columns": ["user_id"],
                    "referenced_table": "users",
                    "referenced_columns": ["id"],
                    "on_delete": "CASCADE"
                }],
                "row_count": 42
            }
        ]
    }"#;

    let snapshot = SchemaSnapshot::from_json(json).unwrap();
    assert!(snapshot.validate().is_ok());
    assert_eq!(snapshot.get_table("POSTS").unwrap().row_count, Some(42));

    let mut diagnostics = Vec::new();
    let rels = discover_explicit(&snapshot, &mut diagnostics);
    assert_eq!(rels.len(), 1);
    assert!(rels[0].cascade_on_delete);
}

#[test]
fn test_duplicate_table_names_rejected() {
    let snapshot = SchemaSnapshot::new(vec![
        TableMetadata::new("users").with_column("id", "int"),
        TableMetadata::new("Users").with_column("id", "int"),
    ]);

    assert_eq!(
        snapshot.validate(),
        Err(SnapshotError::DuplicateTable("Users".into()))
    );
}
