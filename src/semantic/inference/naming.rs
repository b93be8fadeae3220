//! Implicit relationship inference from naming conventions.
//!
//! A column named `user_id` or `userId` is taken as a reference to a table
//! named `user`, `users` (pluralized) or the singular of the base, provided
//! that table has an `id` column. Ambiguous candidates are dropped rather
//! than guessed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use inflector::Inflector as _;
use regex::Regex;

use crate::metadata::{SchemaSnapshot, TableMetadata};

use super::{thresholds, ColumnKey, EnglishInflector, NameInflector, Relationship};

static CAMEL_ID_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_]*[a-z0-9])Id$").unwrap());

/// The naming pattern that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingPattern {
    /// `customer_id`, `Customer_ID` (case-insensitive).
    SnakeIdSuffix,
    /// `customerId`.
    CamelIdSuffix,
}

/// A column whose name looks like a reference to another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingMatch {
    pub pattern: NamingPattern,
    /// Lowercase snake_case base name with the id suffix stripped.
    pub base: String,
}

/// Extract the candidate base name from a column name, if any pattern matches.
pub fn naming_candidate(column: &str) -> Option<NamingMatch> {
    if let Some(split) = column.len().checked_sub(3) {
        if let (Some(base), Some(suffix)) = (column.get(..split), column.get(split..)) {
            if suffix.eq_ignore_ascii_case("_id") && !base.is_empty() {
                return Some(NamingMatch {
                    pattern: NamingPattern::SnakeIdSuffix,
                    base: base.to_lowercase(),
                });
            }
        }
    }

    let caps = CAMEL_ID_SUFFIX.captures(column)?;
    let base = caps.get(1)?.as_str().to_snake_case();
    (!base.is_empty()).then_some(NamingMatch {
        pattern: NamingPattern::CamelIdSuffix,
        base,
    })
}

/// Score how well a base name matches the resolved table name.
///
/// 0.95 for an exact match, 0.90 after plural/singular normalization,
/// 0.75 when one contains the other, otherwise the 0.70 floor.
pub fn naming_confidence(base: &str, table: &str, inflector: &dyn NameInflector) -> f64 {
    use thresholds::confidence;

    let base = base.to_lowercase();
    let table = table.to_lowercase();

    if base == table {
        confidence::EXACT_NAME
    } else if inflector.singularize(&base) == inflector.singularize(&table)
        || inflector.pluralize(&base) == inflector.pluralize(&table)
    {
        confidence::NORMALIZED_NAME
    } else if base.contains(&table) || table.contains(&base) {
        confidence::CONTAINMENT
    } else {
        confidence::FLOOR
    }
}

/// Infers undeclared relationships from column naming conventions.
#[derive(Debug, Clone)]
pub struct NamingInferrer {
    inflector: Arc<dyn NameInflector>,
    min_confidence: f64,
}

impl Default for NamingInferrer {
    fn default() -> Self {
        Self {
            inflector: Arc::new(EnglishInflector::default()),
            min_confidence: thresholds::confidence::FLOOR,
        }
    }
}

impl NamingInferrer {
    pub fn new(inflector: Arc<dyn NameInflector>) -> Self {
        Self {
            inflector,
            ..Default::default()
        }
    }

    /// Builder: drop candidates below this confidence.
    pub fn with_min_confidence(mut self, threshold: f64) -> Self {
        self.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    /// Infer relationships for every column not already covered by `explicit`.
    ///
    /// Output order follows table and column order of the snapshot.
    #[must_use]
    pub fn infer(&self, snapshot: &SchemaSnapshot, explicit: &[Relationship]) -> Vec<Relationship> {
        let covered: HashSet<ColumnKey> = explicit.iter().map(Relationship::source_key).collect();
        let tables: HashMap<String, &TableMetadata> = snapshot
            .tables
            .iter()
            .map(|t| (t.name.to_lowercase(), t))
            .collect();

        let mut relationships = Vec::new();

        for table in &snapshot.tables {
            for column in &table.columns {
                if covered.contains(&ColumnKey::new(&table.name, &column.name)) {
                    continue;
                }
                let Some(candidate) = naming_candidate(&column.name) else {
                    continue;
                };
                let Some(target) = self.resolve_target(&candidate.base, &tables) else {
                    tracing::debug!(
                        table = %table.name,
                        column = %column.name,
                        base = %candidate.base,
                        "no table matches naming candidate"
                    );
                    continue;
                };
                let Some(id_column) = target.get_column("id") else {
                    continue;
                };

                let confidence =
                    naming_confidence(&candidate.base, &target.name, self.inflector.as_ref());
                if confidence < self.min_confidence {
                    continue;
                }

                relationships.push(Relationship::inferred(
                    &table.name,
                    &column.name,
                    &target.name,
                    &id_column.name,
                    confidence,
                ));
            }
        }

        tracing::debug!(count = relationships.len(), "inferred relationships");
        relationships
    }

    /// Resolve a base name to a table: exact, then pluralized, then singularized.
    fn resolve_target<'a>(
        &self,
        base: &str,
        tables: &HashMap<String, &'a TableMetadata>,
    ) -> Option<&'a TableMetadata> {
        [
            base.to_lowercase(),
            self.inflector.pluralize(base),
            self.inflector.singularize(base),
        ]
        .iter()
        .find_map(|name| tables.get(name).copied())
    }
}
