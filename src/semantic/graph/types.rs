//! Node, edge, and join path types for the relationship graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::metadata::TableMetadata;
use crate::semantic::inference::{thresholds, Relationship};

// ============================================================================
// Nodes
// ============================================================================

/// A column as seen by the graph and its exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    /// Source column of at least one relationship in the graph.
    pub foreign_key: bool,
}

/// One table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    /// Table name as declared in the snapshot.
    pub id: String,
    pub schema: Option<String>,
    pub row_count: Option<u64>,
    pub columns: Vec<ColumnSummary>,
    /// Lowercase names of columns that lead the primary key or an index.
    pub leading_index_columns: BTreeSet<String>,
}

impl TableNode {
    pub(crate) fn from_metadata(table: &TableMetadata) -> Self {
        let columns = table
            .columns
            .iter()
            .map(|c| ColumnSummary {
                name: c.name.clone(),
                data_type: c.data_type.clone(),
                nullable: c.is_nullable,
                primary_key: table.is_primary_key_column(&c.name),
                foreign_key: false,
            })
            .collect();

        let leading_index_columns = table
            .columns
            .iter()
            .filter(|c| table.has_leading_index(&c.name))
            .map(|c| c.name.to_lowercase())
            .collect();

        Self {
            id: table.name.clone(),
            schema: table.schema.clone(),
            row_count: table.row_count,
            columns,
            leading_index_columns,
        }
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether joining on `column` would already hit an index.
    pub fn is_indexed(&self, column: &str) -> bool {
        self.leading_index_columns.contains(&column.to_lowercase())
    }

    /// Unknown columns are treated as nullable.
    pub fn is_nullable(&self, column: &str) -> bool {
        self.column(column).map(|c| c.nullable).unwrap_or(true)
    }
}

// ============================================================================
// Edges
// ============================================================================

/// One relationship and its traversal cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub relationship: Relationship,
    pub weight: f64,
}

/// Tunable coefficients of the edge weight function.
///
/// `weight = 1 + confidence_penalty * (1 - confidence)
///         + size_factor * log10(1 + max(rows(from), rows(to)))`
///
/// Unknown row counts count as zero. Both coefficients must be non-negative
/// so the weight stays positive and monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeights {
    pub confidence_penalty: f64,
    pub size_factor: f64,
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            confidence_penalty: thresholds::weight::CONFIDENCE_PENALTY,
            size_factor: thresholds::weight::SIZE_FACTOR,
        }
    }
}

impl EdgeWeights {
    /// Edge cost, never below the base cost of 1.0.
    ///
    /// Negative or NaN coefficients count as zero, so path search always
    /// sees positive weights.
    pub fn weight(&self, confidence: f64, from_rows: Option<u64>, to_rows: Option<u64>) -> f64 {
        let rows = from_rows.unwrap_or(0).max(to_rows.unwrap_or(0)) as f64;
        let penalty = self.confidence_penalty.max(0.0);
        let size_factor = self.size_factor.max(0.0);
        thresholds::weight::BASE
            + penalty * (1.0 - confidence.clamp(0.0, 1.0))
            + size_factor * (1.0 + rows).log10()
    }
}

// ============================================================================
// Join paths
// ============================================================================

/// SQL join type for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
            JoinType::Full => write!(f, "FULL"),
        }
    }
}

/// One traversal of a relationship, in path order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinStep {
    pub from_table: String,
    pub to_table: String,
    pub join_type: JoinType,
    /// `from_table.col = to_table.col`, written in traversal order.
    pub on_clause: String,
    /// The relationship this step follows, in its declared direction.
    pub relationship: Relationship,
}

/// A join column with no index leading on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSuggestion {
    pub table: String,
    pub column: String,
}

/// An ordered sequence of joins connecting two tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPath {
    pub from: String,
    pub to: String,
    pub steps: Vec<JoinStep>,
    /// Sum of the traversed edge weights.
    pub estimated_cost: f64,
    pub suggested_indexes: Vec<IndexSuggestion>,
}

impl JoinPath {
    pub fn hops(&self) -> usize {
        self.steps.len()
    }

    /// Tables in traversal order, endpoints included.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables = vec![self.from.as_str()];
        tables.extend(self.steps.iter().map(|s| s.to_table.as_str()));
        tables
    }
}

/// Result of a join path search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JoinPathOutcome {
    /// The cheapest path within the hop limit.
    Found(JoinPath),
    /// The tables are in different components.
    Unreachable,
    /// A path exists but needs more hops than allowed.
    BeyondHopLimit { required_hops: usize, max_hops: usize },
}

impl JoinPathOutcome {
    pub fn path(&self) -> Option<&JoinPath> {
        match self {
            JoinPathOutcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, JoinPathOutcome::Found(_))
    }
}
