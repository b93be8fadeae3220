//! Engine facade tying the discovery pipeline together.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::{Settings, SettingsError};
use crate::metadata::{QueryExecutor, SchemaSnapshot};

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::error::EngineResult;
use super::graph::{JoinPathOutcome, RelationshipGraph};
use super::inference::{
    detect_junction_tables, discover_explicit, merge, EnglishInflector, JunctionTable,
    MultiplicityCalculator, NameInflector, NamingInferrer, RefinementOutcome, RefinementReport,
    Relationship,
};

/// Everything derived from one snapshot.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Explicit relationships first, then surviving inferred ones.
    pub relationships: Vec<Relationship>,
    pub junction_tables: Vec<JunctionTable>,
    pub graph: Arc<RelationshipGraph>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn explicit_count(&self) -> usize {
        self.relationships.iter().filter(|r| r.is_explicit()).count()
    }

    pub fn inferred_count(&self) -> usize {
        self.relationships.len() - self.explicit_count()
    }
}

/// Runs discovery, inference, junction detection and graph construction.
#[derive(Debug, Clone)]
pub struct RelationshipEngine {
    settings: Settings,
    inflector: Arc<dyn NameInflector>,
}

impl Default for RelationshipEngine {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl RelationshipEngine {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            inflector: Arc::new(EnglishInflector::default()),
        }
    }

    /// Builder: replace the pluralization rules used by naming inference.
    pub fn with_inflector(mut self, inflector: Arc<dyn NameInflector>) -> Self {
        self.inflector = inflector;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the synchronous pipeline over a snapshot.
    ///
    /// Fails only when the snapshot itself is invalid. Every other problem
    /// ends up in [`Analysis::diagnostics`].
    pub fn analyze(&self, snapshot: &SchemaSnapshot) -> EngineResult<Analysis> {
        snapshot.validate()?;

        let mut diagnostics = Vec::new();
        let explicit = discover_explicit(snapshot, &mut diagnostics);

        let inferred = if self.settings.inference.enabled {
            NamingInferrer::new(Arc::clone(&self.inflector))
                .with_min_confidence(self.settings.inference.min_confidence)
                .infer(snapshot, &explicit)
        } else {
            Vec::new()
        };

        let relationships = merge(explicit, inferred);
        let junction_tables = detect_junction_tables(snapshot, &relationships);
        let (graph, graph_diagnostics) =
            RelationshipGraph::build(snapshot, &relationships, &self.settings.graph.edge_weights());
        diagnostics.extend(graph_diagnostics);

        let analysis = Analysis {
            relationships,
            junction_tables,
            graph: Arc::new(graph),
            diagnostics,
        };

        tracing::info!(
            tables = snapshot.tables.len(),
            explicit = analysis.explicit_count(),
            inferred = analysis.inferred_count(),
            junctions = analysis.junction_tables.len(),
            diagnostics = analysis.diagnostics.len(),
            "analysis complete"
        );
        Ok(analysis)
    }

    /// Refine multiplicity by sampling live data, returning a new analysis.
    ///
    /// When sampling is disabled the analysis is returned unchanged with an
    /// empty report. Failed or timed-out samples keep their prior
    /// multiplicity and are added to the diagnostics.
    pub async fn refine(
        &self,
        analysis: &Analysis,
        snapshot: &SchemaSnapshot,
        executor: Arc<dyn QueryExecutor>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<(Analysis, RefinementReport), SettingsError> {
        if !self.settings.sampling.enabled {
            tracing::debug!("sampling disabled, skipping multiplicity refinement");
            return Ok((analysis.clone(), RefinementReport::default()));
        }

        let calculator = MultiplicityCalculator::with_config(executor, self.settings.sampling.to_config()?);
        let (relationships, report) = match cancel {
            Some(cancel) => {
                calculator
                    .refine_all_with_cancel(&analysis.relationships, cancel)
                    .await
            }
            None => calculator.refine_all(&analysis.relationships).await,
        };

        let mut diagnostics = analysis.diagnostics.clone();
        for (id, outcome) in report.failures() {
            let detail = match outcome {
                RefinementOutcome::Failed { reason } => reason.clone(),
                _ => "timed out".to_string(),
            };
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::SamplingFailed,
                format!("relationship '{}': {}", id, detail),
            ));
        }

        // Rebuilding from the same snapshot cannot produce new dangling edges.
        let (graph, _) =
            RelationshipGraph::build(snapshot, &relationships, &self.settings.graph.edge_weights());

        let refined = Analysis {
            relationships,
            junction_tables: analysis.junction_tables.clone(),
            graph: Arc::new(graph),
            diagnostics,
        };
        Ok((refined, report))
    }

    /// Join path search using the configured hop limit.
    pub fn find_join_path(&self, analysis: &Analysis, from: &str, to: &str) -> EngineResult<JoinPathOutcome> {
        Ok(analysis
            .graph
            .find_join_path(from, to, self.settings.paths.max_hops)?)
    }
}
