// tests/inference/junction_test.rs
use schema_intel::metadata::*;
use schema_intel::semantic::inference::*;

fn entity(name: &str) -> TableMetadata {
    TableMetadata::new(name).with_column("id", "int").with_primary_key(&["id"])
}

/// `enrollments(student_id -> students, course_id -> courses)` plus `extra` columns.
fn snapshot_with(extra: &[&str]) -> SchemaSnapshot {
    let mut enrollments = TableMetadata::new("enrollments")
        .with_column("student_id", "int")
        .with_column("course_id", "int")
        .with_column("created_at", "timestamp")
        .with_primary_key(&["student_id", "course_id"])
        .with_foreign_key(ForeignKeyInfo::new("fk_student", &["student_id"], "students", &["id"]))
        .with_foreign_key(ForeignKeyInfo::new("fk_course", &["course_id"], "courses", &["id"]));
    for column in extra {
        enrollments = enrollments.with_column(column, "text");
    }
    SchemaSnapshot::new(vec![entity("students"), entity("courses"), enrollments])
}

fn detect(snapshot: &SchemaSnapshot) -> Vec<JunctionTable> {
    let mut diagnostics = Vec::new();
    let rels = discover_explicit(snapshot, &mut diagnostics);
    detect_junction_tables(snapshot, &rels)
}

#[test]
fn test_pure_junction_scores_095() {
    let junctions = detect(&snapshot_with(&[]));

    assert_eq!(junctions.len(), 1);
    let j = &junctions[0];
    assert_eq!(j.table_name, "enrollments");
    assert_eq!((j.left_table.as_str(), j.left_column.as_str()), ("students", "id"));
    assert_eq!((j.right_table.as_str(), j.right_column.as_str()), ("courses", "id"));
    assert!(j.additional_columns.is_empty());
    assert_eq!(j.confidence, 0.95);
}

#[test]
fn test_one_extra_column_scores_080() {
    let junctions = detect(&snapshot_with(&["grade"]));
    assert_eq!(junctions[0].confidence, 0.80);
    assert_eq!(junctions[0].additional_columns, vec!["grade".to_string()]);
}

#[test]
fn test_two_extra_columns_score_065() {
    let junctions = detect(&snapshot_with(&["grade", "notes"]));
    assert_eq!(junctions[0].confidence, 0.65);
}

#[test]
fn test_three_extra_columns_rejected() {
    assert!(detect(&snapshot_with(&["grade", "notes", "status"])).is_empty());
}

#[test]
fn test_timestamp_columns_ignored_case_insensitively() {
    let snapshot = snapshot_with(&["Updated_At", "TIMESTAMP"]);
    let junctions = detect(&snapshot);
    assert_eq!(junctions[0].confidence, 0.95);
}

#[test]
fn test_four_outgoing_relationships_is_not_a_junction() {
    let snapshot = SchemaSnapshot::new(vec![
        entity("a"),
        entity("b"),
        entity("c"),
        entity("d"),
        TableMetadata::new("hub")
            .with_column("a_id", "int")
            .with_column("b_id", "int")
            .with_column("c_id", "int")
            .with_column("d_id", "int")
            .with_foreign_key(ForeignKeyInfo::new("fk_a", &["a_id"], "a", &["id"]))
            .with_foreign_key(ForeignKeyInfo::new("fk_b", &["b_id"], "b", &["id"]))
            .with_foreign_key(ForeignKeyInfo::new("fk_c", &["c_id"], "c", &["id"]))
            .with_foreign_key(ForeignKeyInfo::new("fk_d", &["d_id"], "d", &["id"])),
    ]);

    assert!(detect(&snapshot).is_empty());
}

#[test]
fn test_inferred_relationships_do_not_count() {
    let snapshot = SchemaSnapshot::new(vec![
        entity("students"),
        entity("courses"),
        TableMetadata::new("enrollments")
            .with_column("student_id", "int")
            .with_column("course_id", "int"),
    ]);

    let inferred = NamingInferrer::default().infer(&snapshot, &[]);
    assert_eq!(inferred.len(), 2);
    assert!(detect_junction_tables(&snapshot, &inferred).is_empty());
}
