//! Semantic layer - relationships, junction tables, and the join graph.
//!
//! Everything here is derived from an immutable [`SchemaSnapshot`]. A new
//! snapshot means a full recompute, never an incremental patch.
//!
//! The pipeline runs in four phases:
//!
//! 1. **Discover** - declared foreign keys become explicit relationships
//! 2. **Infer** - naming conventions add candidates the database never declared
//! 3. **Classify** - junction tables are detected and multiplicity optionally sampled
//! 4. **Graph** - relationships become weighted edges for join path search and export
//!
//! [`SchemaSnapshot`]: crate::metadata::SchemaSnapshot

pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod graph;
pub mod inference;

// Re-export the facade (primary entry point)
pub use engine::{Analysis, RelationshipEngine};

// Re-export error types
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{EngineError, EngineResult, PathError, PathResult};

// Re-export graph types
pub use graph::{
    to_dot, to_mermaid, EdgeWeights, GraphStore, IndexSuggestion, JoinPath, JoinPathOutcome,
    JoinStep, JoinType, RelationshipGraph,
};

// Re-export inference types
pub use inference::{
    JunctionTable, Multiplicity, NameInflector, Relationship, RelationshipKind,
};
