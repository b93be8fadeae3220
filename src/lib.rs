//! # schema-intel
//!
//! Relationship intelligence for relational schemas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SchemaSnapshot (metadata)               │
//! │   tables, columns, primary keys, foreign keys, indexes   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [discover + infer + merge]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Relationships (explicit, then inferred)           │
//! │        + Junction tables + sampled multiplicity          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  RelationshipGraph                       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [path finder / exporters]
//! ┌─────────────────────────────────────────────────────────┐
//! │          JoinPath, Mermaid erDiagram, Graphviz DOT       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Only multiplicity sampling performs I/O, through a caller-supplied
//! [`QueryExecutor`](metadata::QueryExecutor). Everything else is a pure
//! transform over the snapshot.

pub mod config;
pub mod metadata;
pub mod semantic;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::metadata::{QueryExecutor, SchemaSnapshot, TableMetadata};
    pub use crate::semantic::{
        Analysis, JoinPathOutcome, Multiplicity, Relationship, RelationshipEngine,
        RelationshipGraph,
    };
}

// Also export at crate root for convenience
pub use config::Settings;
pub use metadata::SchemaSnapshot;
pub use semantic::{Analysis, RelationshipEngine};
