//! Schema metadata module.
//!
//! This module holds the schema snapshot the engine consumes and the
//! boundary trait for the read-only query executor used by sampling.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Schema extractor (external)                   │
//! │        per-backend introspection → SchemaSnapshot (JSON)        │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Relationship engine (this crate)               │
//! │   pure transforms over SchemaSnapshot                           │
//! │   + multiplicity sampling through QueryExecutor (async)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod provider;
mod types;

pub use error::{ExecutorError, ExecutorResult};
pub use provider::{QueryExecutor, Row};
pub use types::*;
