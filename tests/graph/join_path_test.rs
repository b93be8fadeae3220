// tests/graph/join_path_test.rs
use schema_intel::metadata::*;
use schema_intel::semantic::inference::{discover_explicit, Relationship};
use schema_intel::semantic::*;

/// users(id); posts(id, user_id -> users); tags(id);
/// post_tags(post_id -> posts, tag_id -> tags, composite PK); audit_log(id) unrelated.
fn blog() -> SchemaSnapshot {
    SchemaSnapshot::new(vec![
        TableMetadata::new("users").with_column("id", "int").with_primary_key(&["id"]),
        TableMetadata::new("posts")
            .with_column("id", "int")
            .with_column("user_id", "int")
            .with_primary_key(&["id"])
            .with_foreign_key(ForeignKeyInfo::new("fk_posts_user", &["user_id"], "users", &["id"])),
        TableMetadata::new("tags").with_column("id", "int").with_primary_key(&["id"]),
        TableMetadata::new("post_tags")
            .with_column("post_id", "int")
            .with_column("tag_id", "int")
            .with_primary_key(&["post_id", "tag_id"])
            .with_foreign_key(ForeignKeyInfo::new("fk_pt_post", &["post_id"], "posts", &["id"]))
            .with_foreign_key(ForeignKeyInfo::new("fk_pt_tag", &["tag_id"], "tags", &["id"])),
        TableMetadata::new("audit_log").with_column("id", "int").with_primary_key(&["id"]),
    ])
}

fn graph_of(snapshot: &SchemaSnapshot) -> RelationshipGraph {
    let mut diagnostics = Vec::new();
    let rels = discover_explicit(snapshot, &mut diagnostics);
    RelationshipGraph::build(snapshot, &rels, &EdgeWeights::default()).0
}

#[test]
fn test_users_to_tags_is_three_hops() {
    let graph = graph_of(&blog());
    let outcome = graph.find_join_path("users", "tags", 4).unwrap();
    let path = outcome.path().expect("path should exist");

    assert_eq!(path.hops(), 3);
    assert_eq!(path.tables(), vec!["users", "posts", "post_tags", "tags"]);
    assert_eq!(path.estimated_cost, 3.0);

    let clauses: Vec<&str> = path.steps.iter().map(|s| s.on_clause.as_str()).collect();
    assert_eq!(
        clauses,
        vec![
            "users.id = posts.user_id",
            "posts.id = post_tags.post_id",
            "post_tags.tag_id = tags.id",
        ]
    );
    assert!(path.steps.iter().all(|s| s.join_type == JoinType::Inner));
    assert_eq!(path.steps[2].relationship.constraint_name(), Some("fk_pt_tag"));
}

#[test]
fn test_suggested_indexes_skip_leading_index_columns() {
    let graph = graph_of(&blog());
    let outcome = graph.find_join_path("users", "tags", 4).unwrap();

    assert_eq!(
        outcome.path().unwrap().suggested_indexes,
        vec![
            IndexSuggestion {
                table: "posts".into(),
                column: "user_id".into()
            },
            IndexSuggestion {
                table: "post_tags".into(),
                column: "tag_id".into()
            },
        ]
    );
}

#[test]
fn test_beyond_hop_limit_is_distinct_from_unreachable() {
    let graph = graph_of(&blog());

    assert_eq!(
        graph.find_join_path("users", "tags", 2).unwrap(),
        JoinPathOutcome::BeyondHopLimit {
            required_hops: 3,
            max_hops: 2
        }
    );
    assert!(graph.find_join_path("users", "tags", 3).unwrap().is_found());
    assert_eq!(
        graph.find_join_path("users", "audit_log", 10).unwrap(),
        JoinPathOutcome::Unreachable
    );
}

#[test]
fn test_unknown_table_and_self_path() {
    let graph = graph_of(&blog());

    assert_eq!(
        graph.find_join_path("users", "comments", 4),
        Err(PathError::UnknownTable("comments".into()))
    );

    let outcome = graph.find_join_path("Users", "users", 4).unwrap();
    assert_eq!(outcome.path().unwrap().hops(), 0);
}

#[test]
fn test_equal_cost_ties_break_on_table_names() {
    // Two 2-hop routes a -> b -> d and a -> c -> d with equal weights.
    let entity = |name: &str| TableMetadata::new(name).with_column("id", "int").with_primary_key(&["id"]);
    let bridge = |name: &str| {
        entity(name)
            .with_column("a_id", "int")
            .with_column("d_id", "int")
            .with_foreign_key(ForeignKeyInfo::new(&format!("fk_{}_a", name), &["a_id"], "a", &["id"]))
            .with_foreign_key(ForeignKeyInfo::new(&format!("fk_{}_d", name), &["d_id"], "d", &["id"]))
    };
    let snapshot = SchemaSnapshot::new(vec![bridge("c"), entity("a"), bridge("b"), entity("d")]);
    let graph = graph_of(&snapshot);

    for _ in 0..3 {
        let outcome = graph.find_join_path("a", "d", 4).unwrap();
        assert_eq!(outcome.path().unwrap().tables(), vec!["a", "b", "d"]);
    }
}

#[test]
fn test_low_confidence_and_large_tables_cost_more() {
    let snapshot = SchemaSnapshot::new(vec![
        TableMetadata::new("customers")
            .with_column("id", "int")
            .with_primary_key(&["id"])
            .with_row_count(10_000_000),
        TableMetadata::new("orders")
            .with_column("id", "int")
            .with_column("customer_id", "int"),
    ]);
    let explicit = vec![Relationship::explicit("fk", "orders", "customer_id", "customers", "id")];
    let inferred = vec![Relationship::inferred("orders", "customer_id", "customers", "id", 0.75)];

    let (g1, _) = RelationshipGraph::build(&snapshot, &explicit, &EdgeWeights::default());
    let (g2, _) = RelationshipGraph::build(&snapshot, &inferred, &EdgeWeights::default());

    let c1 = g1.find_join_path("orders", "customers", 4).unwrap().path().unwrap().estimated_cost;
    let c2 = g2.find_join_path("orders", "customers", 4).unwrap().path().unwrap().estimated_cost;
    assert!(c1 > 1.0);
    assert!(c1 < c2);
}

#[test]
fn test_related_tables() {
    let graph = graph_of(&blog());
    assert_eq!(graph.related_tables("posts").unwrap(), vec!["post_tags", "users"]);
    assert!(graph.related_tables("audit_log").unwrap().is_empty());
    assert!(graph.related_tables("nope").is_err());
}
