//! Explicit relationship discovery from declared foreign keys.

use crate::metadata::{ForeignKeyInfo, SchemaSnapshot, TableMetadata};
use crate::semantic::diagnostic::{Diagnostic, DiagnosticKind};

use super::Relationship;

/// Emit one relationship per ordinal column pair of every declared FK.
///
/// Pairs whose referenced table or columns are absent from the snapshot
/// (for example when extraction filtered tables) are skipped and reported
/// in `diagnostics`. Output order follows table and constraint order.
pub fn discover_explicit(
    snapshot: &SchemaSnapshot,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Relationship> {
    let mut relationships = Vec::new();

    for table in &snapshot.tables {
        for fk in &table.foreign_keys {
            discover_constraint(snapshot, table, fk, &mut relationships, diagnostics);
        }
    }

    tracing::debug!(count = relationships.len(), "discovered explicit relationships");
    relationships
}

fn discover_constraint(
    snapshot: &SchemaSnapshot,
    table: &TableMetadata,
    fk: &ForeignKeyInfo,
    out: &mut Vec<Relationship>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if fk.columns.len() != fk.referenced_columns.len() {
        diagnostics.push(Diagnostic::logged(
            DiagnosticKind::ColumnCountMismatch,
            format!(
                "constraint '{}' on '{}' has {} local and {} referenced columns",
                fk.name,
                table.name,
                fk.columns.len(),
                fk.referenced_columns.len()
            ),
        ));
    }

    let Some(target) = snapshot.get_table(&fk.referenced_table) else {
        diagnostics.push(Diagnostic::logged(
            DiagnosticKind::MissingReference,
            format!(
                "constraint '{}' on '{}' references unknown table '{}'",
                fk.name, table.name, fk.referenced_table
            ),
        ));
        return;
    };

    let cascade_delete = fk.delete_action().is_cascade();
    let cascade_update = fk.update_action().is_cascade();

    for (from_column, to_column) in fk.columns.iter().zip(&fk.referenced_columns) {
        let Some(from_col) = table.get_column(from_column) else {
            diagnostics.push(Diagnostic::logged(
                DiagnosticKind::MissingReference,
                format!(
                    "constraint '{}' uses unknown column '{}.{}'",
                    fk.name, table.name, from_column
                ),
            ));
            continue;
        };
        let Some(to_col) = target.get_column(to_column) else {
            diagnostics.push(Diagnostic::logged(
                DiagnosticKind::MissingReference,
                format!(
                    "constraint '{}' references unknown column '{}.{}'",
                    fk.name, target.name, to_column
                ),
            ));
            continue;
        };

        out.push(
            Relationship::explicit(
                &fk.name,
                &table.name,
                &from_col.name,
                &target.name,
                &to_col.name,
            )
            .with_cascade(cascade_delete, cascade_update),
        );
    }
}
