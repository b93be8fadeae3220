//! Multiplicity refinement by sampling live data.
//!
//! This is the only part of the engine that performs I/O. Each relationship
//! is sampled with one read-only aggregate query through a
//! [`QueryExecutor`]; any failure leaves the relationship's multiplicity
//! unchanged.
//!
//! Batches run through a semaphore-bounded pool with a per-query timeout,
//! so one slow or locked table cannot stall the rest.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Semaphore};

use crate::metadata::{ExecutorError, ExecutorResult, QueryExecutor, Row};

use super::{thresholds, Multiplicity, Relationship};

/// SQL flavor used to render the sampling query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleDialect {
    /// Double-quoted identifiers, `$n` placeholders, `LIMIT`.
    #[default]
    Postgres,
    /// Backtick identifiers, `?` placeholders, `LIMIT`.
    MySql,
    /// Double-quoted identifiers, `?` placeholders, `LIMIT`.
    Sqlite,
    /// Double-quoted identifiers, `?` placeholders, `LIMIT`.
    DuckDb,
    /// Bracketed identifiers, `@Pn` placeholders, `TOP (n)`.
    TSql,
}

impl SampleDialect {
    /// Parse a dialect name. Accepts common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            "duckdb" | "duck" => Some(Self::DuckDb),
            "tsql" | "mssql" | "sqlserver" | "sql_server" => Some(Self::TSql),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::DuckDb => "duckdb",
            Self::TSql => "tsql",
        }
    }

    pub fn quote_identifier(self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::TSql => format!("[{}]", ident.replace(']', "]]")),
            Self::Postgres | Self::Sqlite | Self::DuckDb => {
                format!("\"{}\"", ident.replace('"', "\"\""))
            }
        }
    }

    /// Placeholder for the 1-based parameter `n`.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${}", n),
            Self::TSql => format!("@P{}", n),
            Self::MySql | Self::Sqlite | Self::DuckDb => "?".to_string(),
        }
    }

    /// Render `SELECT <column> AS <alias> FROM <table>` bounded by parameter `n`.
    fn bounded_select(self, column: &str, alias: &str, table: &str, n: usize) -> String {
        let column = self.quote_identifier(column);
        let table = self.quote_identifier(table);
        let bound = self.placeholder(n);
        match self {
            Self::TSql => format!("SELECT TOP ({}) {} AS {} FROM {}", bound, column, alias, table),
            _ => format!("SELECT {} AS {} FROM {} LIMIT {}", column, alias, table, bound),
        }
    }
}

/// Sampling configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Rows sampled from each side of a relationship.
    pub sample_size: u32,
    /// Maximum number of sampling queries in flight.
    pub concurrency: usize,
    /// Per-query timeout.
    pub timeout: Duration,
    pub dialect: SampleDialect,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_size: thresholds::sampling::DEFAULT_SAMPLE_SIZE,
            concurrency: thresholds::sampling::DEFAULT_CONCURRENCY,
            timeout: Duration::from_millis(thresholds::sampling::DEFAULT_TIMEOUT_MS),
            dialect: SampleDialect::default(),
        }
    }
}

/// Aggregate counts returned by one sampling query.
///
/// The target ratio is `target_rows / unique_to`. It equals
/// `total_rows / unique_to` only when the target sample has as many rows as
/// the source sample, which is what [`SampleCounts::new`] assumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCounts {
    /// Rows sampled from the source table.
    pub total_rows: u64,
    /// Distinct non-null `from_column` values in the source sample.
    pub unique_from: u64,
    /// Rows sampled from the target table.
    pub target_rows: u64,
    /// Distinct `to_column` values in the target sample.
    pub unique_to: u64,
}

impl SampleCounts {
    /// Counts where both distinct values were taken over the same sampled rows.
    pub fn new(total_rows: u64, unique_from: u64, unique_to: u64) -> Self {
        Self {
            total_rows,
            unique_from,
            target_rows: total_rows,
            unique_to,
        }
    }

    /// Builder: set the target-side sample size when it differs from the source's.
    pub fn with_target_rows(mut self, target_rows: u64) -> Self {
        self.target_rows = target_rows;
        self
    }

    /// Parse the counts from a result row. Aliases match case-insensitively.
    pub fn from_row(row: &Row) -> ExecutorResult<Self> {
        Ok(Self {
            total_rows: count_field(row, "total_rows")?,
            unique_from: count_field(row, "unique_from")?,
            target_rows: count_field(row, "target_rows")?,
            unique_to: count_field(row, "unique_to")?,
        })
    }

    /// `(from_ratio, to_ratio)`, or `None` when any count is zero.
    pub fn ratios(&self) -> Option<(f64, f64)> {
        if self.total_rows == 0 || self.unique_from == 0 || self.target_rows == 0 || self.unique_to == 0 {
            return None;
        }
        Some((
            self.total_rows as f64 / self.unique_from as f64,
            self.target_rows as f64 / self.unique_to as f64,
        ))
    }
}

fn count_field(row: &Row, name: &str) -> ExecutorResult<u64> {
    let value = row
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
        .ok_or_else(|| ExecutorError::MalformedRow(format!("missing column '{}'", name)))?;

    let parsed = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ExecutorError::MalformedRow(format!("column '{}' is not a count: {}", name, value))
    })
}

/// Classify multiplicity from sampled counts.
///
/// A side whose ratio is at or below 1.1 counts as "one", absorbing minor
/// sampling noise. Returns `None` when the sample is empty.
pub fn classify_multiplicity(counts: &SampleCounts) -> Option<Multiplicity> {
    let tolerance = thresholds::sampling::RATIO_TOLERANCE;
    let (from_ratio, to_ratio) = counts.ratios()?;

    Some(match (from_ratio <= tolerance, to_ratio <= tolerance) {
        (true, true) => Multiplicity::OneToOne,
        (false, true) => Multiplicity::ManyToOne,
        (true, false) => Multiplicity::OneToMany,
        (false, false) => Multiplicity::ManyToMany,
    })
}

/// What happened to one relationship during batch refinement.
#[derive(Debug, Clone, PartialEq)]
pub enum RefinementOutcome {
    /// Sampling changed the multiplicity.
    Refined {
        from: Multiplicity,
        to: Multiplicity,
    },
    /// Sampling agreed with the prior multiplicity, or the sample was empty.
    Unchanged,
    /// The query failed; prior multiplicity kept.
    Failed { reason: String },
    /// The query exceeded its timeout; prior multiplicity kept.
    TimedOut,
    /// The batch was cancelled before this relationship was sampled.
    Cancelled,
}

impl RefinementOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::TimedOut)
    }
}

/// Per-relationship outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefinementReport {
    pub entries: Vec<(String, RefinementOutcome)>,
}

impl RefinementReport {
    pub fn refined_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, RefinementOutcome::Refined { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &RefinementOutcome)> {
        self.entries
            .iter()
            .filter(|(_, o)| o.is_failure())
            .map(|(id, o)| (id.as_str(), o))
    }

    pub fn outcome(&self, relationship_id: &str) -> Option<&RefinementOutcome> {
        self.entries
            .iter()
            .find(|(id, _)| id == relationship_id)
            .map(|(_, o)| o)
    }
}

/// Samples live data to refine relationship multiplicity.
#[derive(Clone)]
pub struct MultiplicityCalculator {
    executor: Arc<dyn QueryExecutor>,
    config: SamplingConfig,
}

impl std::fmt::Debug for MultiplicityCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplicityCalculator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MultiplicityCalculator {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_config(executor, SamplingConfig::default())
    }

    pub fn with_config(executor: Arc<dyn QueryExecutor>, config: SamplingConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Render the sampling query and its bind parameters.
    pub fn build_query(&self, rel: &Relationship) -> (String, Vec<serde_json::Value>) {
        let dialect = self.config.dialect;
        let source = dialect.bounded_select(&rel.from_column, "from_value", &rel.from_table, 1);
        let target = dialect.bounded_select(&rel.to_column, "to_value", &rel.to_table, 2);

        let sql = format!(
            "SELECT s.total_rows, s.unique_from, t.target_rows, t.unique_to \
             FROM (SELECT COUNT(*) AS total_rows, COUNT(DISTINCT from_value) AS unique_from \
             FROM ({}) source_sample) s \
             CROSS JOIN (SELECT COUNT(*) AS target_rows, COUNT(DISTINCT to_value) AS unique_to \
             FROM ({}) target_sample) t",
            source, target
        );
        let bound = serde_json::Value::from(self.config.sample_size);
        (sql, vec![bound.clone(), bound])
    }

    /// Run the sampling query for one relationship, bounded by the timeout.
    pub async fn sample(&self, rel: &Relationship) -> ExecutorResult<SampleCounts> {
        let (sql, params) = self.build_query(rel);
        let rows = tokio::time::timeout(self.config.timeout, self.executor.query(&sql, &params))
            .await
            .map_err(|_| ExecutorError::Timeout(self.config.timeout.as_millis() as u64))??;

        let row = rows
            .first()
            .ok_or_else(|| ExecutorError::MalformedRow("sampling query returned no rows".into()))?;
        SampleCounts::from_row(row)
    }

    /// Multiplicity for one relationship. Never fails: on any error the
    /// relationship's current multiplicity is returned.
    pub async fn calculate(&self, rel: &Relationship) -> Multiplicity {
        self.refine_one(rel).await.0
    }

    async fn refine_one(&self, rel: &Relationship) -> (Multiplicity, RefinementOutcome) {
        let prior = rel.multiplicity;
        match self.sample(rel).await {
            Ok(counts) => match classify_multiplicity(&counts) {
                Some(sampled) if sampled != prior => (
                    sampled,
                    RefinementOutcome::Refined {
                        from: prior,
                        to: sampled,
                    },
                ),
                _ => (prior, RefinementOutcome::Unchanged),
            },
            Err(ExecutorError::Timeout(ms)) => {
                tracing::warn!(id = %rel.id, timeout_ms = ms, "multiplicity sample timed out");
                (prior, RefinementOutcome::TimedOut)
            }
            Err(e) => {
                tracing::warn!(id = %rel.id, error = %e, "multiplicity sample failed");
                (
                    prior,
                    RefinementOutcome::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// Refine every relationship in the batch.
    pub async fn refine_all(&self, relationships: &[Relationship]) -> (Vec<Relationship>, RefinementReport) {
        // The sender is kept alive for the whole batch so the signal never fires.
        let (_keep, cancel) = watch::channel(false);
        self.refine_all_with_cancel(relationships, cancel).await
    }

    /// Refine every relationship, stopping early when `cancel` turns `true`.
    ///
    /// Relationships not yet sampled at cancellation keep their prior
    /// multiplicity and are reported as [`RefinementOutcome::Cancelled`].
    /// Queries already in flight run to completion or timeout.
    pub async fn refine_all_with_cancel(
        &self,
        relationships: &[Relationship],
        cancel: watch::Receiver<bool>,
    ) -> (Vec<Relationship>, RefinementReport) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let tasks = relationships.iter().map(|rel| {
            let semaphore = Arc::clone(&semaphore);
            let mut cancel = cancel.clone();
            async move {
                if *cancel.borrow() {
                    return (rel.multiplicity, RefinementOutcome::Cancelled);
                }
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit,
                    _ = cancelled(&mut cancel) => {
                        return (rel.multiplicity, RefinementOutcome::Cancelled);
                    }
                };
                let Ok(_permit) = permit else {
                    return (rel.multiplicity, RefinementOutcome::Cancelled);
                };
                if *cancel.borrow() {
                    return (rel.multiplicity, RefinementOutcome::Cancelled);
                }
                self.refine_one(rel).await
            }
        });

        let results = futures::future::join_all(tasks).await;

        let mut refined = Vec::with_capacity(relationships.len());
        let mut report = RefinementReport::default();
        for (rel, (multiplicity, outcome)) in relationships.iter().zip(results) {
            refined.push(rel.clone().with_multiplicity(multiplicity));
            report.entries.push((rel.id.clone(), outcome));
        }

        tracing::info!(
            total = relationships.len(),
            refined = report.refined_count(),
            failed = report.failures().count(),
            "multiplicity refinement finished"
        );
        (refined, report)
    }
}

/// Resolve once the cancel signal is `true`; never resolves if the sender is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
