//! Merging explicit and inferred relationship sets.

use std::collections::HashSet;

use super::{ColumnKey, Relationship};

/// Merge explicit and inferred relationships into one set.
///
/// Precedence: an explicit relationship always wins over an inferred one
/// for the same `(from_table, from_column)`. Among inferred relationships
/// for the same source column the first one is kept. Explicit entries are
/// kept verbatim, so composite keys keep all of their pairs.
///
/// Result order is all explicit relationships, then surviving inferred ones.
#[must_use]
pub fn merge(explicit: Vec<Relationship>, inferred: Vec<Relationship>) -> Vec<Relationship> {
    let mut claimed: HashSet<ColumnKey> = explicit.iter().map(Relationship::source_key).collect();
    let mut merged = explicit;

    for rel in inferred {
        if claimed.insert(rel.source_key()) {
            merged.push(rel);
        } else {
            tracing::debug!(id = %rel.id, "dropping inferred relationship shadowed by an earlier one");
        }
    }

    merged
}
