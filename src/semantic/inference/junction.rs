//! Junction (many-to-many association) table detection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::metadata::SchemaSnapshot;

use super::{thresholds, Relationship};

/// A table believed to mediate a many-to-many association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionTable {
    pub table_name: String,
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
    /// Payload columns beyond the two foreign keys, the primary key and timestamps.
    pub additional_columns: Vec<String>,
    pub confidence: f64,
}

/// Confidence for a junction candidate with `extra` payload columns.
///
/// Returns `None` when the table carries too much payload to be a junction.
pub fn junction_confidence(extra: usize) -> Option<f64> {
    use thresholds::junction;

    match extra {
        0 => Some(junction::NO_EXTRA),
        1 => Some(junction::ONE_EXTRA),
        2 => Some(junction::TWO_EXTRA),
        _ => None,
    }
}

/// Detect junction tables among the snapshot's tables.
///
/// A table qualifies only with exactly two explicit outgoing relationships.
/// Left/right sides follow the order the relationships were discovered in.
#[must_use]
pub fn detect_junction_tables(
    snapshot: &SchemaSnapshot,
    relationships: &[Relationship],
) -> Vec<JunctionTable> {
    let mut junctions = Vec::new();

    for table in &snapshot.tables {
        let outgoing: Vec<&Relationship> = relationships
            .iter()
            .filter(|r| r.is_explicit() && r.from_table.eq_ignore_ascii_case(&table.name))
            .collect();

        let [left, right] = outgoing.as_slice() else {
            continue;
        };

        let excluded: HashSet<String> = table
            .primary_key_columns()
            .into_iter()
            .chain([left.from_column.as_str(), right.from_column.as_str()])
            .chain(thresholds::junction::TIMESTAMP_COLUMNS.iter().copied())
            .map(str::to_lowercase)
            .collect();

        let additional_columns: Vec<String> = table
            .columns
            .iter()
            .filter(|c| !excluded.contains(&c.name.to_lowercase()))
            .map(|c| c.name.clone())
            .collect();

        let Some(confidence) = junction_confidence(additional_columns.len()) else {
            tracing::debug!(
                table = %table.name,
                extra = additional_columns.len(),
                "too many payload columns for a junction table"
            );
            continue;
        };

        junctions.push(JunctionTable {
            table_name: table.name.clone(),
            left_table: left.to_table.clone(),
            left_column: left.to_column.clone(),
            right_table: right.to_table.clone(),
            right_column: right.to_column.clone(),
            additional_columns,
            confidence,
        });
    }

    junctions
}
