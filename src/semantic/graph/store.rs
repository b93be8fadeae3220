//! Shared handle to the current graph.
//!
//! Readers take an `Arc` snapshot and traverse it without holding the lock.
//! A rebuild swaps in a new graph; graphs already handed out never change.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::RelationshipGraph;

/// Swappable holder for the current [`RelationshipGraph`].
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    inner: Arc<RwLock<Arc<RelationshipGraph>>>,
}

impl GraphStore {
    pub fn new(graph: RelationshipGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(graph))),
        }
    }

    /// The graph current at the time of the call.
    pub async fn current(&self) -> Arc<RelationshipGraph> {
        Arc::clone(&*self.inner.read().await)
    }

    /// Install `graph` and return the one it replaces.
    pub async fn replace(&self, graph: RelationshipGraph) -> Arc<RelationshipGraph> {
        let mut guard = self.inner.write().await;
        let previous = std::mem::replace(&mut *guard, Arc::new(graph));
        tracing::debug!(
            tables = guard.table_count(),
            edges = guard.edge_count(),
            "graph replaced"
        );
        previous
    }
}
