//! Graph construction from a snapshot and a relationship set.

use crate::metadata::SchemaSnapshot;
use crate::semantic::diagnostic::{Diagnostic, DiagnosticKind};
use crate::semantic::inference::Relationship;

use super::{EdgeWeights, RelationshipEdge, RelationshipGraph, TableNode};

impl RelationshipGraph {
    /// Build the graph.
    ///
    /// Construction happens in two phases:
    /// - Phase 1: one node per snapshot table, in snapshot order
    /// - Phase 2: one edge per relationship, direction preserved
    ///
    /// Relationships whose endpoints are not tables of the snapshot are
    /// dropped and reported as [`DiagnosticKind::DanglingEdge`].
    pub fn build(
        snapshot: &SchemaSnapshot,
        relationships: &[Relationship],
        weights: &EdgeWeights,
    ) -> (Self, Vec<Diagnostic>) {
        let mut graph = Self::default();
        let mut diagnostics = Vec::new();

        // Phase 1: nodes
        for table in &snapshot.tables {
            let key = table.name.to_lowercase();
            if graph.table_index.contains_key(&key) {
                continue;
            }
            let idx = graph.graph.add_node(TableNode::from_metadata(table));
            graph.table_index.insert(key, idx);
        }

        // Phase 2: edges
        for rel in relationships {
            let (Some(from), Some(to)) = (graph.node_index(&rel.from_table), graph.node_index(&rel.to_table))
            else {
                diagnostics.push(Diagnostic::logged(
                    DiagnosticKind::DanglingEdge,
                    format!(
                        "relationship '{}' connects '{}' and '{}', which are not both in the graph",
                        rel.id, rel.from_table, rel.to_table
                    ),
                ));
                continue;
            };

            let weight = weights.weight(
                rel.confidence,
                graph.graph[from].row_count,
                graph.graph[to].row_count,
            );

            if let Some(column) = graph.graph[from]
                .columns
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(&rel.from_column))
            {
                column.foreign_key = true;
            }

            graph.graph.add_edge(
                from,
                to,
                RelationshipEdge {
                    relationship: rel.clone(),
                    weight,
                },
            );
        }

        tracing::debug!(
            tables = graph.table_count(),
            edges = graph.edge_count(),
            dropped = diagnostics.len(),
            "built relationship graph"
        );
        (graph, diagnostics)
    }
}
