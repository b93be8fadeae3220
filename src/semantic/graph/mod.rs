//! Relationship graph - one node per table, one directed edge per relationship.
//!
//! The graph is built once from a snapshot and its relationship set and is
//! read-only afterwards. Rebuilds produce a new instance; see [`GraphStore`]
//! for swapping instances under concurrent readers.

mod builder;
mod export;
mod path;
mod store;
pub mod types;

pub use export::{to_dot, to_mermaid};
pub use store::GraphStore;
pub use types::*;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// The relationship graph.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    /// The underlying directed graph
    graph: DiGraph<TableNode, RelationshipEdge>,

    /// Index: lowercase table name → NodeIndex
    table_index: HashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    /// Look up a table by name (case-insensitive).
    pub fn table(&self, name: &str) -> Option<&TableNode> {
        self.node_index(name).map(|idx| &self.graph[idx])
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table_index.contains_key(&name.to_lowercase())
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Tables sorted by name.
    pub fn sorted_tables(&self) -> Vec<&TableNode> {
        let mut tables: Vec<&TableNode> = self.graph.node_weights().collect();
        tables.sort_by(|a, b| a.id.cmp(&b.id));
        tables
    }

    /// Edges sorted by relationship id.
    pub fn sorted_edges(&self) -> Vec<&RelationshipEdge> {
        let mut edges: Vec<&RelationshipEdge> = self.graph.edge_weights().collect();
        edges.sort_by(|a, b| a.relationship.id.cmp(&b.relationship.id));
        edges
    }

    /// SHA-256 over the sorted node and edge sets, as lowercase hex.
    ///
    /// Equal fingerprints mean the exporters produce identical output.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Canonical<'a> {
            tables: Vec<&'a TableNode>,
            edges: Vec<&'a RelationshipEdge>,
        }

        let json = serde_json::to_string(&Canonical {
            tables: self.sorted_tables(),
            edges: self.sorted_edges(),
        })?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub(crate) fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.table_index.get(&name.to_lowercase()).copied()
    }
}
