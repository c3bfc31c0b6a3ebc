//! Batch execution: many independent queries, one pipeline each, results in
//! submission order.
//!
//! Each query's resolve → plan → fetch → assemble pipeline runs to
//! completion inside its own spawned task; a semaphore caps how many run at
//! once. Workers share nothing mutable: the catalog and source travel as
//! `Arc`s, the query by value. Fetch units within one query run
//! sequentially; parallelism exists only between queries.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::Semaphore;

use crate::assemble::{RowAssembler, UnifiedRow};
use crate::catalog::StationCatalog;
use crate::error::NoaahistError;
use crate::plan::build_fetch_plan;
use crate::query::Query;
use crate::resolve::{resolve, CoverageSpan};
use crate::source::RawLineSource;

/// How one query's execution ended.
#[derive(Debug)]
pub enum QueryStatus {
    /// Every requested (date, field) pair resolved and was fetched.
    Complete,
    /// Some (date, field) pairs had no qualifying station and stayed
    /// missing.
    Partial { unresolved: usize },
    /// The pipeline failed outright; no rows were produced.
    Failed(NoaahistError),
}

impl QueryStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, QueryStatus::Complete)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryStatus::Failed(_))
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Complete => f.write_str("complete"),
            QueryStatus::Partial { unresolved } => {
                write!(f, "partial ({unresolved} unresolved date-field pairs)")
            }
            QueryStatus::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// One query's result: its rows, its status, and (when requested) its
/// coverage report.
#[derive(Debug)]
pub struct QueryOutcome {
    pub query: Query,
    pub status: QueryStatus,
    pub rows: Vec<UnifiedRow>,
    pub coverage: Vec<CoverageSpan>,
}

/// Every outcome of one batch run, in submission order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<QueryOutcome>,
}

impl BatchReport {
    /// One status line per query, in submission order.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            out.push_str(&format!("{}: {}\n", outcome.query.name, outcome.status));
        }
        out
    }
}

/// Default worker count: one less than available parallelism, at least one.
pub(crate) fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Runs one query's whole pipeline.
///
/// Returns `Err` only for the abort-batch unresolved policy; every other
/// failure is captured in the outcome so sibling queries are unaffected.
pub(crate) async fn execute_query(
    catalog: Arc<StationCatalog>,
    source: Arc<dyn RawLineSource>,
    query: Query,
) -> Result<QueryOutcome, NoaahistError> {
    let assignment = match resolve(catalog.as_ref(), source.as_ref(), &query).await {
        Ok(assignment) => assignment,
        Err(e @ NoaahistError::UnresolvedField { .. }) => return Err(e),
        Err(e) => {
            return Ok(QueryOutcome {
                query,
                status: QueryStatus::Failed(e),
                rows: Vec::new(),
                coverage: Vec::new(),
            })
        }
    };

    let plan = build_fetch_plan(&assignment);
    debug!("query '{}': {} fetch units", query.name, plan.len());

    let mut assembler = RowAssembler::new(&query, &assignment);
    for unit in &plan {
        match source.fetch(unit.station.clone(), unit.year).await {
            Ok(lines) => assembler.absorb(unit, &lines),
            Err(e) => {
                return Ok(QueryOutcome {
                    query,
                    status: QueryStatus::Failed(e.into()),
                    rows: Vec::new(),
                    coverage: Vec::new(),
                })
            }
        }
    }
    let rows = assembler.finish();

    let coverage = if query.coverage_report {
        assignment.coverage_spans(&query.name)
    } else {
        Vec::new()
    };

    let status = match assignment.unresolved_len() {
        0 => QueryStatus::Complete,
        unresolved => QueryStatus::Partial { unresolved },
    };
    Ok(QueryOutcome {
        query,
        status,
        rows,
        coverage,
    })
}

/// Runs a batch: validates every query up front, executes them concurrently,
/// and gathers outcomes in submission order regardless of completion order.
pub(crate) async fn run_batch(
    catalog: Arc<StationCatalog>,
    source: Arc<dyn RawLineSource>,
    queries: Vec<Query>,
    workers: usize,
) -> Result<BatchReport, NoaahistError> {
    for query in &queries {
        query.validate()?;
    }

    info!("Running {} queries on {} workers", queries.len(), workers);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::with_capacity(queries.len());
    for query in queries {
        let catalog = catalog.clone();
        let source = source.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            // The semaphore is never closed, so a permit always arrives.
            let _permit = semaphore.acquire_owned().await.ok();
            execute_query(catalog, source, query).await
        }));
    }

    // Awaiting handles in spawn order re-establishes submission order no
    // matter which worker finished first.
    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Ok(outcome)) => outcomes.push(outcome),
            Ok(Err(abort)) => return Err(abort),
            Err(join) => return Err(NoaahistError::TaskJoin(join)),
        }
    }
    Ok(BatchReport { outcomes })
}
