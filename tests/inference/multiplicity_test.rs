// tests/inference/multiplicity_test.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::watch;

use schema_intel::metadata::*;
use schema_intel::semantic::inference::*;

fn counts_row(total_rows: u64, unique_from: u64, target_rows: u64, unique_to: u64) -> Row {
    match json!({
        "total_rows": total_rows,
        "unique_from": unique_from,
        "target_rows": target_rows,
        "unique_to": unique_to,
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Answers every query with the same result.
struct FixedExecutor(ExecutorResult<Vec<Row>>);

#[async_trait]
impl QueryExecutor for FixedExecutor {
    async fn query(&self, _sql: &str, _params: &[Value]) -> ExecutorResult<Vec<Row>> {
        self.0.clone()
    }
}

/// Sleeps before answering and records the peak number of queries in flight.
struct SlowExecutor {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowExecutor {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QueryExecutor for SlowExecutor {
    async fn query(&self, _sql: &str, _params: &[Value]) -> ExecutorResult<Vec<Row>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![counts_row(100, 100, 100, 100)])
    }
}

/// Raises the cancel signal from inside the first query it answers.
struct CancellingExecutor {
    cancel: watch::Sender<bool>,
    queries: AtomicUsize,
}

#[async_trait]
impl QueryExecutor for CancellingExecutor {
    async fn query(&self, _sql: &str, _params: &[Value]) -> ExecutorResult<Vec<Row>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.cancel.send_replace(true);
        Ok(vec![counts_row(100, 100, 100, 100)])
    }
}

fn posts_users() -> Relationship {
    Relationship::explicit("fk_posts_user", "posts", "user_id", "users", "id")
}

#[test]
fn test_classification_table() {
    assert_eq!(
        classify_multiplicity(&SampleCounts::new(100, 100, 10)),
        Some(Multiplicity::OneToMany)
    );
    assert_eq!(
        classify_multiplicity(&SampleCounts::new(100, 10, 100)),
        Some(Multiplicity::ManyToOne)
    );
    assert_eq!(
        classify_multiplicity(&SampleCounts::new(100, 99, 98)),
        Some(Multiplicity::OneToOne)
    );
}

#[test]
fn test_separate_target_sample() {
    // 1000 posts by 50 users; 50 users with unique ids.
    let counts = SampleCounts::new(1000, 50, 50).with_target_rows(50);
    assert_eq!(classify_multiplicity(&counts), Some(Multiplicity::ManyToOne));
}

#[test]
fn test_query_rendering_per_dialect() {
    let executor: Arc<dyn QueryExecutor> = Arc::new(FixedExecutor(Ok(vec![])));

    let postgres = MultiplicityCalculator::new(Arc::clone(&executor));
    let (sql, params) = postgres.build_query(&posts_users());
    assert!(sql.contains(r#"SELECT "user_id" AS from_value FROM "posts" LIMIT $1"#));
    assert!(sql.contains(r#"SELECT "id" AS to_value FROM "users" LIMIT $2"#));
    assert_eq!(params, vec![json!(10_000), json!(10_000)]);

    let tsql = MultiplicityCalculator::with_config(
        executor,
        SamplingConfig {
            dialect: SampleDialect::TSql,
            sample_size: 500,
            ..Default::default()
        },
    );
    let (sql, params) = tsql.build_query(&posts_users());
    assert!(sql.contains("SELECT TOP (@P1) [user_id] AS from_value FROM [posts]"));
    assert!(!sql.contains("LIMIT"));
    assert_eq!(params, vec![json!(500), json!(500)]);
}

#[tokio::test]
async fn test_calculate_uses_sampled_counts() {
    let executor = Arc::new(FixedExecutor(Ok(vec![counts_row(100, 100, 100, 100)])));
    let calculator = MultiplicityCalculator::new(executor);

    assert_eq!(calculator.calculate(&posts_users()).await, Multiplicity::OneToOne);
}

#[tokio::test]
async fn test_failure_keeps_prior_multiplicity() {
    let executor = Arc::new(FixedExecutor(Err(ExecutorError::Blocked("table locked".into()))));
    let calculator = MultiplicityCalculator::new(executor);
    let rel = posts_users().with_multiplicity(Multiplicity::OneToMany);

    assert_eq!(calculator.calculate(&rel).await, Multiplicity::OneToMany);

    let (refined, report) = calculator.refine_all(&[rel]).await;
    assert_eq!(refined[0].multiplicity, Multiplicity::OneToMany);
    assert!(matches!(
        report.outcome("fk:posts.user_id->users.id"),
        Some(RefinementOutcome::Failed { .. })
    ));
}

#[tokio::test]
async fn test_malformed_and_empty_samples_keep_prior() {
    let malformed = MultiplicityCalculator::new(Arc::new(FixedExecutor(Ok(vec![]))));
    assert_eq!(malformed.calculate(&posts_users()).await, Multiplicity::ManyToOne);

    let empty = MultiplicityCalculator::new(Arc::new(FixedExecutor(Ok(vec![counts_row(0, 0, 0, 0)]))));
    let (_, report) = empty.refine_all(&[posts_users()]).await;
    assert_eq!(report.entries[0].1, RefinementOutcome::Unchanged);
}

#[tokio::test]
async fn test_timeout_keeps_prior_and_reports() {
    let executor = Arc::new(SlowExecutor::new(Duration::from_millis(500)));
    let calculator = MultiplicityCalculator::with_config(
        executor,
        SamplingConfig {
            timeout: Duration::from_millis(20),
            ..Default::default()
        },
    );

    let (refined, report) = calculator.refine_all(&[posts_users()]).await;

    assert_eq!(refined[0].multiplicity, Multiplicity::ManyToOne);
    assert_eq!(report.entries[0].1, RefinementOutcome::TimedOut);
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn test_batch_respects_concurrency_and_order() {
    let executor = Arc::new(SlowExecutor::new(Duration::from_millis(10)));
    let calculator = MultiplicityCalculator::with_config(
        Arc::clone(&executor) as Arc<dyn QueryExecutor>,
        SamplingConfig {
            concurrency: 2,
            ..Default::default()
        },
    );

    let rels: Vec<Relationship> = (0..8)
        .map(|i| Relationship::inferred(&format!("t{}", i), "parent_id", "parents", "id", 0.9))
        .collect();

    let (refined, report) = calculator.refine_all(&rels).await;

    assert!(executor.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(refined.len(), 8);
    for (i, rel) in refined.iter().enumerate() {
        assert_eq!(rel.from_table, format!("t{}", i));
        assert_eq!(rel.multiplicity, Multiplicity::OneToOne);
    }
    assert_eq!(report.refined_count(), 8);
}

#[tokio::test]
async fn test_cancelled_batch_keeps_prior_multiplicity() {
    let executor = Arc::new(SlowExecutor::new(Duration::from_millis(10)));
    let calculator = MultiplicityCalculator::new(executor);
    let (tx, rx) = watch::channel(true);

    let (refined, report) = calculator
        .refine_all_with_cancel(&[posts_users(), posts_users()], rx)
        .await;

    assert!(refined.iter().all(|r| r.multiplicity == Multiplicity::ManyToOne));
    assert!(report
        .entries
        .iter()
        .all(|(_, outcome)| *outcome == RefinementOutcome::Cancelled));
    drop(tx);
}

#[tokio::test]
async fn test_cancel_mid_batch_stops_remaining_samples() {
    let (tx, rx) = watch::channel(false);
    let executor = Arc::new(CancellingExecutor {
        cancel: tx,
        queries: AtomicUsize::new(0),
    });
    let calculator = MultiplicityCalculator::with_config(
        Arc::clone(&executor) as Arc<dyn QueryExecutor>,
        SamplingConfig {
            concurrency: 1,
            ..Default::default()
        },
    );

    let rels: Vec<Relationship> = (0..4)
        .map(|i| Relationship::inferred(&format!("t{}", i), "parent_id", "parents", "id", 0.9))
        .collect();

    let (refined, report) = calculator.refine_all_with_cancel(&rels, rx).await;

    assert_eq!(executor.queries.load(Ordering::SeqCst), 1);
    assert!(matches!(
        report.entries[0].1,
        RefinementOutcome::Refined { .. } | RefinementOutcome::Unchanged
    ));
    assert_eq!(refined[0].multiplicity, Multiplicity::OneToOne);
    for (i, (_, outcome)) in report.entries.iter().enumerate().skip(1) {
        assert_eq!(*outcome, RefinementOutcome::Cancelled);
        assert_eq!(refined[i].multiplicity, Multiplicity::ManyToOne);
    }
}
