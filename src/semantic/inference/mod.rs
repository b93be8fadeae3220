//! Relationship discovery and inference.
//!
//! This module turns the declared constraints of a [`SchemaSnapshot`] into
//! [`Relationship`] records and adds candidates the database never declared.
//!
//! # Architecture
//!
//! The pipeline runs in fixed order:
//!
//! 1. **Explicit discovery** - one relationship per declared FK column pair
//! 2. **Naming inference** - `_id` / `...Id` columns matched to tables
//! 3. **Merge** - explicit always wins for the same source column
//! 4. **Junction detection** - tables with exactly two explicit FKs
//! 5. **Multiplicity sampling** - optional, async, best-effort
//!
//! # Example
//!
//! ```ignore
//! use schema_intel::semantic::inference::{discover_explicit, merge, NamingInferrer};
//!
//! let mut diagnostics = Vec::new();
//! let explicit = discover_explicit(&snapshot, &mut diagnostics);
//! let inferred = NamingInferrer::default().infer(&snapshot, &explicit);
//! let relationships = merge(explicit, inferred);
//! ```
//!
//! [`SchemaSnapshot`]: crate::metadata::SchemaSnapshot

mod explicit;
mod inflection;
mod junction;
mod merge;
mod multiplicity;
mod naming;

pub use explicit::discover_explicit;
pub use inflection::{pluralize, singularize, EnglishInflector, NameInflector};
pub use junction::{detect_junction_tables, junction_confidence, JunctionTable};
pub use merge::merge;
pub use multiplicity::{
    classify_multiplicity, MultiplicityCalculator, RefinementOutcome, RefinementReport,
    SampleCounts, SampleDialect, SamplingConfig,
};
pub use naming::{naming_candidate, naming_confidence, NamingInferrer, NamingMatch, NamingPattern};

use serde::{Deserialize, Serialize};

/// Centralized confidence thresholds and tuning values.
///
/// These are heuristic tuning values, not statistically derived. They are
/// kept stable so results stay comparable across runs; change them here
/// rather than at call sites.
pub mod thresholds {
    /// Confidence levels for relationship sources.
    pub mod confidence {
        /// Relationships backed by a declared FK constraint.
        pub const EXPLICIT: f64 = 1.0;
        /// Maximum confidence for inferred relationships (never certain).
        pub const INFERENCE_CAP: f64 = 0.95;
        /// Stripped column base equals the target table name.
        pub const EXACT_NAME: f64 = 0.95;
        /// Base and table name agree after plural/singular normalization.
        pub const NORMALIZED_NAME: f64 = 0.90;
        /// One name contains the other.
        pub const CONTAINMENT: f64 = 0.75;
        /// Floor for any resolved naming match.
        pub const FLOOR: f64 = 0.70;
    }

    /// Junction table detection.
    pub mod junction {
        /// No payload columns beyond keys and timestamps.
        pub const NO_EXTRA: f64 = 0.95;
        /// One payload column.
        pub const ONE_EXTRA: f64 = 0.80;
        /// Two payload columns.
        pub const TWO_EXTRA: f64 = 0.65;
        /// More payload columns than this disqualifies the table.
        pub const MAX_EXTRA: usize = 2;
        /// Column names ignored when counting payload columns.
        pub const TIMESTAMP_COLUMNS: &[&str] = &["created_at", "updated_at", "timestamp"];
    }

    /// Multiplicity sampling.
    pub mod sampling {
        /// Ratio at or below which a side counts as "one".
        pub const RATIO_TOLERANCE: f64 = 1.1;
        /// Default number of rows sampled per side.
        pub const DEFAULT_SAMPLE_SIZE: u32 = 10_000;
        /// Default number of concurrent sampling queries.
        pub const DEFAULT_CONCURRENCY: usize = 4;
        /// Default per-query timeout.
        pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
    }

    /// Graph edge weighting.
    pub mod weight {
        /// Cost of every traversed edge.
        pub const BASE: f64 = 1.0;
        /// Added cost per unit of missing confidence.
        pub const CONFIDENCE_PENALTY: f64 = 4.0;
        /// Added cost per order of magnitude of the larger table's row count.
        pub const SIZE_FACTOR: f64 = 0.25;
    }
}

/// Multiplicity of a relationship, read from the source side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Multiplicity {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[default]
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "N:N")]
    ManyToMany,
}

impl Multiplicity {
    /// Reverse the multiplicity (swap left/right sides).
    pub fn reverse(self) -> Self {
        match self {
            Multiplicity::OneToMany => Multiplicity::ManyToOne,
            Multiplicity::ManyToOne => Multiplicity::OneToMany,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Multiplicity::OneToOne => "1:1",
            Multiplicity::OneToMany => "1:N",
            Multiplicity::ManyToOne => "N:1",
            Multiplicity::ManyToMany => "N:N",
        }
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a relationship was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Declared by a foreign-key constraint.
    Explicit { constraint_name: String },
    /// Guessed from naming conventions.
    Inferred,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit { .. } => write!(f, "explicit"),
            Self::Inferred => write!(f, "inferred"),
        }
    }
}

/// A directed link from one column of a source table to one column of a
/// target table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Stable identifier, unique within a relationship set.
    pub id: String,
    #[serde(flatten)]
    pub kind: RelationshipKind,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub multiplicity: Multiplicity,
    pub cascade_on_delete: bool,
    pub cascade_on_update: bool,
    /// 1.0 for explicit relationships, always below 1.0 for inferred ones.
    pub confidence: f64,
}

impl Relationship {
    /// Create a relationship for one column pair of a declared foreign key.
    pub fn explicit(
        constraint_name: &str,
        from_table: &str,
        from_column: &str,
        to_table: &str,
        to_column: &str,
    ) -> Self {
        Self {
            id: format!("fk:{}.{}->{}.{}", from_table, from_column, to_table, to_column),
            kind: RelationshipKind::Explicit {
                constraint_name: constraint_name.to_string(),
            },
            from_table: from_table.to_string(),
            from_column: from_column.to_string(),
            to_table: to_table.to_string(),
            to_column: to_column.to_string(),
            multiplicity: Multiplicity::ManyToOne,
            cascade_on_delete: false,
            cascade_on_update: false,
            confidence: thresholds::confidence::EXPLICIT,
        }
    }

    /// Create an inferred relationship. Confidence is capped below 1.0.
    pub fn inferred(
        from_table: &str,
        from_column: &str,
        to_table: &str,
        to_column: &str,
        confidence: f64,
    ) -> Self {
        Self {
            id: format!(
                "inferred:{}.{}->{}.{}",
                from_table, from_column, to_table, to_column
            ),
            kind: RelationshipKind::Inferred,
            from_table: from_table.to_string(),
            from_column: from_column.to_string(),
            to_table: to_table.to_string(),
            to_column: to_column.to_string(),
            multiplicity: Multiplicity::ManyToOne,
            cascade_on_delete: false,
            cascade_on_update: false,
            confidence: confidence.clamp(0.0, thresholds::confidence::INFERENCE_CAP),
        }
    }

    /// Builder: set cascade flags.
    pub fn with_cascade(mut self, on_delete: bool, on_update: bool) -> Self {
        self.cascade_on_delete = on_delete;
        self.cascade_on_update = on_update;
        self
    }

    /// Builder: set multiplicity.
    pub fn with_multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self.kind, RelationshipKind::Explicit { .. })
    }

    /// Constraint name, present only on explicit relationships.
    pub fn constraint_name(&self) -> Option<&str> {
        match &self.kind {
            RelationshipKind::Explicit { constraint_name } => Some(constraint_name),
            RelationshipKind::Inferred => None,
        }
    }

    /// Key of the source column.
    pub fn source_key(&self) -> ColumnKey {
        ColumnKey::new(&self.from_table, &self.from_column)
    }

    /// Key of both endpoints.
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey::new(
            &self.from_table,
            &self.from_column,
            &self.to_table,
            &self.to_column,
        )
    }
}

/// A `(table, column)` pair used as a map or set key.
///
/// Names are stored lowercase for case-insensitive comparison.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ColumnKey {
    pub table: String,
    pub column: String,
}

impl ColumnKey {
    #[must_use]
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_lowercase(),
            column: column.to_lowercase(),
        }
    }
}

/// A unique key identifying a relationship by its endpoints.
///
/// All table/column names are stored in lowercase for case-insensitive
/// comparison.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct RelationshipKey {
    pub from: ColumnKey,
    pub to: ColumnKey,
}

impl RelationshipKey {
    /// Create a new relationship key with normalized (lowercase) names.
    #[must_use]
    pub fn new(from_table: &str, from_column: &str, to_table: &str, to_column: &str) -> Self {
        Self {
            from: ColumnKey::new(from_table, from_column),
            to: ColumnKey::new(to_table, to_column),
        }
    }

    /// Get the reversed key (swapping from/to).
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}
