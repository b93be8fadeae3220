//! schema-intel CLI - Relationship discovery over a schema snapshot
//!
//! Usage:
//!   schema-intel relationships <snapshot.json> [--output json]
//!   schema-intel junctions <snapshot.json>
//!   schema-intel path <snapshot.json> <from> <to> [--max-hops <n>]
//!   schema-intel export <snapshot.json> [--format mermaid|dot]
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand, ValueEnum};
use schema_intel::config::Settings;
use schema_intel::metadata::SchemaSnapshot;
use schema_intel::semantic::{to_dot, to_mermaid, Analysis, JoinPathOutcome, RelationshipEngine};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "schema-intel")]
#[command(about = "schema-intel - Discover, infer, and traverse table relationships")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List explicit and inferred relationships
    Relationships {
        /// Path to the snapshot JSON file
        snapshot: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// List detected junction tables
    Junctions {
        /// Path to the snapshot JSON file
        snapshot: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Find the cheapest join path between two tables
    Path {
        /// Path to the snapshot JSON file
        snapshot: PathBuf,

        /// Starting table
        from: String,

        /// Target table
        to: String,

        /// Maximum number of joins (overrides the config file)
        #[arg(long)]
        max_hops: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Export the relationship graph as a diagram
    Export {
        /// Path to the snapshot JSON file
        snapshot: PathBuf,

        /// Diagram format
        #[arg(short, long, default_value = "mermaid")]
        format: DiagramFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

#[derive(Clone, ValueEnum)]
enum DiagramFormat {
    /// Mermaid erDiagram
    Mermaid,
    /// Graphviz DOT
    Dot,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let mut settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Relationships { snapshot, output } => {
            run(&snapshot, settings, |analysis| cmd_relationships(analysis, output))
        }
        Commands::Junctions { snapshot, output } => {
            run(&snapshot, settings, |analysis| cmd_junctions(analysis, output))
        }
        Commands::Path {
            snapshot,
            from,
            to,
            max_hops,
            output,
        } => {
            if let Some(max_hops) = max_hops {
                settings.paths.max_hops = max_hops;
            }
            let max_hops = settings.paths.max_hops;
            run(&snapshot, settings, |analysis| {
                cmd_path(analysis, &from, &to, max_hops, output)
            })
        }
        Commands::Export { snapshot, format } => run(&snapshot, settings, |analysis| {
            match format {
                DiagramFormat::Mermaid => print!("{}", to_mermaid(&analysis.graph)),
                DiagramFormat::Dot => print!("{}", to_dot(&analysis.graph)),
            }
            ExitCode::SUCCESS
        }),
    }
}

/// Load the snapshot, analyze it, print diagnostics, then hand off to `command`.
fn run(path: &Path, settings: Settings, command: impl FnOnce(&Analysis) -> ExitCode) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let snapshot = match SchemaSnapshot::from_json(&source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid snapshot '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let analysis = match RelationshipEngine::new(settings).analyze(&snapshot) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for diag in &analysis.diagnostics {
        eprintln!("warning: {}", diag);
    }

    command(&analysis)
}

fn cmd_relationships(analysis: &Analysis, output: OutputFormat) -> ExitCode {
    match output {
        OutputFormat::Json => print_json(&analysis.relationships),
        OutputFormat::Text => {
            for rel in &analysis.relationships {
                println!(
                    "{}.{} -> {}.{}  {}  {}  confidence={:.2}",
                    rel.from_table,
                    rel.from_column,
                    rel.to_table,
                    rel.to_column,
                    rel.multiplicity,
                    rel.kind,
                    rel.confidence
                );
            }
            println!();
            println!(
                "{} explicit, {} inferred",
                analysis.explicit_count(),
                analysis.inferred_count()
            );
            ExitCode::SUCCESS
        }
    }
}

fn cmd_junctions(analysis: &Analysis, output: OutputFormat) -> ExitCode {
    match output {
        OutputFormat::Json => print_json(&analysis.junction_tables),
        OutputFormat::Text => {
            if analysis.junction_tables.is_empty() {
                println!("No junction tables found.");
            }
            for junction in &analysis.junction_tables {
                println!(
                    "{}: {}.{} <-> {}.{}  confidence={:.2}",
                    junction.table_name,
                    junction.left_table,
                    junction.left_column,
                    junction.right_table,
                    junction.right_column,
                    junction.confidence
                );
                if !junction.additional_columns.is_empty() {
                    println!("  extra columns: {}", junction.additional_columns.join(", "));
                }
            }
            ExitCode::SUCCESS
        }
    }
}

fn cmd_path(analysis: &Analysis, from: &str, to: &str, max_hops: usize, output: OutputFormat) -> ExitCode {
    let outcome = match analysis.graph.find_join_path(from, to, max_hops) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let OutputFormat::Json = output {
        return print_json(&outcome);
    }

    match outcome {
        JoinPathOutcome::Found(path) => {
            println!("FROM {}", path.from);
            for step in &path.steps {
                println!("{} JOIN {} ON {}", step.join_type, step.to_table, step.on_clause);
            }
            println!();
            println!("-- {} hop(s), estimated cost {:.3}", path.hops(), path.estimated_cost);
            for index in &path.suggested_indexes {
                println!("-- consider an index on {}.{}", index.table, index.column);
            }
            ExitCode::SUCCESS
        }
        JoinPathOutcome::Unreachable => {
            eprintln!("No path between '{}' and '{}': the tables are unrelated", from, to);
            ExitCode::FAILURE
        }
        JoinPathOutcome::BeyondHopLimit {
            required_hops,
            max_hops,
        } => {
            eprintln!(
                "Shortest path between '{}' and '{}' needs {} hops (limit {}); retry with --max-hops {}",
                from, to, required_hops, max_hops, required_hops
            );
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}
