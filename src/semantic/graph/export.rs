//! Diagram export: Mermaid `erDiagram` and Graphviz DOT.
//!
//! Output is deterministic. Tables are sorted by name and edges by
//! relationship id, so an unchanged graph always renders the same bytes.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::semantic::inference::Multiplicity;

use super::RelationshipGraph;

/// Generate a Mermaid erDiagram.
///
/// Entities list their primary and foreign key columns. Inferred
/// relationships are drawn with a dashed (non-identifying) line.
pub fn to_mermaid(graph: &RelationshipGraph) -> String {
    let mut output = String::from("erDiagram\n");
    let ids = mermaid_entity_ids(graph);
    let entity = |table: &str| {
        ids.get(&table.to_lowercase())
            .cloned()
            .unwrap_or_else(|| escape_mermaid_id(table))
    };

    for table in graph.sorted_tables() {
        let name = entity(&table.id);
        let keys: Vec<_> = table
            .columns
            .iter()
            .filter(|c| c.primary_key || c.foreign_key)
            .collect();

        if keys.is_empty() {
            let _ = writeln!(output, "    {}", name);
            continue;
        }

        let _ = writeln!(output, "    {} {{", name);
        for col in keys {
            let marker = match (col.primary_key, col.foreign_key) {
                (true, true) => "PK, FK",
                (true, false) => "PK",
                _ => "FK",
            };
            let _ = writeln!(
                output,
                "        {} {} {}",
                escape_mermaid_type(&col.data_type),
                escape_mermaid_id(&col.name),
                marker
            );
        }
        output.push_str("    }\n");
    }

    let edges = graph.sorted_edges();
    if !edges.is_empty() {
        output.push('\n');
    }

    for edge in edges {
        let rel = &edge.relationship;
        let (left, right) = mermaid_cardinality(rel.multiplicity);
        let line = if rel.is_explicit() { "--" } else { ".." };
        let _ = writeln!(
            output,
            "    {} {}{}{} {} : \"{}\"",
            entity(&rel.from_table),
            left,
            line,
            right,
            entity(&rel.to_table),
            rel.from_column.replace('"', "'")
        );
    }

    output
}

/// Generate a Graphviz digraph.
///
/// Nodes carry the row count when known. Edges carry multiplicity,
/// confidence and weight; inferred edges are dashed.
pub fn to_dot(graph: &RelationshipGraph) -> String {
    let mut output = String::from("digraph relationships {\n");
    output.push_str("  rankdir=LR;\n");
    output.push_str("  node [shape=box];\n");

    let tables = graph.sorted_tables();
    if !tables.is_empty() {
        output.push('\n');
    }

    for table in tables {
        let id = escape_dot_id(&table.id);
        match table.row_count {
            Some(rows) => {
                let _ = writeln!(
                    output,
                    "  {} [label=\"{}\\n{} rows\", rows={}];",
                    id,
                    escape_dot_label(&table.id),
                    rows,
                    rows
                );
            }
            None => {
                let _ = writeln!(output, "  {} [label=\"{}\"];", id, escape_dot_label(&table.id));
            }
        }
    }

    let edges = graph.sorted_edges();
    if !edges.is_empty() {
        output.push('\n');
    }

    for edge in edges {
        let rel = &edge.relationship;
        let style = if rel.is_explicit() { "" } else { ", style=dashed" };
        let _ = writeln!(
            output,
            "  {} -> {} [label=\"{} -> {}\", multiplicity=\"{}\", confidence=\"{:.2}\", weight=\"{:.3}\"{}];",
            escape_dot_id(&rel.from_table),
            escape_dot_id(&rel.to_table),
            escape_dot_label(&rel.from_column),
            escape_dot_label(&rel.to_column),
            rel.multiplicity,
            rel.confidence,
            edge.weight,
            style
        );
    }

    output.push_str("}\n");
    output
}

/// Crow's-foot ends for the source and target side.
fn mermaid_cardinality(multiplicity: Multiplicity) -> (&'static str, &'static str) {
    match multiplicity {
        Multiplicity::ManyToOne => ("}o", "||"),
        Multiplicity::OneToMany => ("||", "o{"),
        Multiplicity::OneToOne => ("||", "||"),
        Multiplicity::ManyToMany => ("}o", "o{"),
    }
}

/// Assign every table a distinct Mermaid entity name, keyed by lowercase table name.
///
/// Names that are already valid identifiers keep their spelling. Others are
/// escaped, and an escaped name that collides gets a numeric suffix.
fn mermaid_entity_ids(graph: &RelationshipGraph) -> HashMap<String, String> {
    let tables = graph.sorted_tables();
    let mut used = HashSet::new();
    let mut ids = HashMap::new();

    for table in &tables {
        if escape_mermaid_id(&table.id) == table.id && used.insert(table.id.clone()) {
            ids.insert(table.id.to_lowercase(), table.id.clone());
        }
    }

    for table in &tables {
        let key = table.id.to_lowercase();
        if ids.contains_key(&key) {
            continue;
        }
        let base = escape_mermaid_id(&table.id);
        let mut candidate = base.clone();
        let mut n = 2;
        while !used.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        if candidate != base {
            tracing::debug!(table = %table.id, entity = %candidate, "renamed colliding mermaid entity");
        }
        ids.insert(key, candidate);
    }

    ids
}

/// Mermaid IDs are alphanumeric with underscores.
fn escape_mermaid_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Strip length/precision arguments and non-identifier characters.
fn escape_mermaid_type(s: &str) -> String {
    let base = s.split('(').next().unwrap_or(s).trim();
    if base.is_empty() {
        return "unknown".to_string();
    }
    escape_mermaid_id(base)
}

/// Bare DOT IDs must not start with a digit.
fn escape_dot_id(s: &str) -> String {
    let mut chars = s.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        s.to_string()
    } else {
        format!("\"{}\"", escape_dot_label(s))
    }
}

fn escape_dot_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
