use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;

/// Why a query failed to produce rows. Timeouts carry their own tag so
/// failure statistics can separate slow queries from broken ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// No database file exists for the db_id.
    DatabaseMissing(String),
    /// SQLite rejected or aborted the query (syntax error, missing object).
    Query(String),
    /// The query exceeded the configured execution timeout.
    Timeout(Duration),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::DatabaseMissing(db_id) => write!(f, "Database {db_id} not found"),
            ExecutionError::Query(message) => write!(f, "SQLite error: {message}"),
            ExecutionError::Timeout(limit) => {
                write!(f, "Query timeout after {:.2}s", limit.as_secs_f64())
            }
        }
    }
}

/// One result cell. REAL values are stored as raw f64 bits so rows are
/// hashable; bit-exact identity is sound when both queries ran on the same
/// database and engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellValue {
    /// SQL NULL.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// Float, stored as its bit pattern.
    Real(u64),
    /// Text value.
    Text(String),
    /// Binary value.
    Blob(Vec<u8>),
}

impl CellValue {
    /// Wrap a float value.
    pub fn real(value: f64) -> Self {
        CellValue::Real(value.to_bits())
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f.to_bits()),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

/// One fetched row.
pub type ResultRow = Vec<CellValue>;

/// Outcome of executing one query. Failures are captured here, never raised,
/// so batch evaluation continues past individual queries.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// True when the query ran to completion.
    pub success: bool,
    /// Fetched rows, in engine order.
    pub rows: Vec<ResultRow>,
    /// Failure reason when `success` is false.
    pub error: Option<ExecutionError>,
    /// Wall-clock execution time.
    pub elapsed: Duration,
}

impl ExecutionResult {
    fn failure(error: ExecutionError, elapsed: Duration) -> Self {
        ExecutionResult {
            success: false,
            rows: Vec::new(),
            error: Some(error),
            elapsed,
        }
    }
}

/// Order-independent row-set comparison of two results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowComparison {
    /// True when both row sets are identical.
    pub exact_match: bool,
    /// Shared rows over predicted rows.
    pub precision: f64,
    /// Shared rows over gold rows.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of distinct rows present on both sides.
    pub common_rows: usize,
}

/// Compare two results as row sets: duplicates collapse, order is ignored.
/// Two empty sets agree vacuously (all metrics 1.0, matching the convention
/// for clauses absent on both sides); exactly one empty set scores 0.0.
pub fn compare_results(predicted: &[ResultRow], gold: &[ResultRow]) -> RowComparison {
    let predicted_set: HashSet<&ResultRow> = predicted.iter().collect();
    let gold_set: HashSet<&ResultRow> = gold.iter().collect();

    if predicted_set.is_empty() && gold_set.is_empty() {
        return RowComparison {
            exact_match: true,
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
            common_rows: 0,
        };
    }
    if predicted_set.is_empty() || gold_set.is_empty() {
        return RowComparison {
            exact_match: false,
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            common_rows: 0,
        };
    }

    let common = predicted_set.intersection(&gold_set).count();
    let precision = common as f64 / predicted_set.len() as f64;
    let recall = common as f64 / gold_set.len() as f64;
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    RowComparison {
        exact_match: predicted_set == gold_set,
        precision,
        recall,
        f1,
        common_rows: common,
    }
}

/// Executions of a (predicted, gold) pair with their row comparison, present
/// only when both sides succeeded.
#[derive(Debug, Clone)]
pub struct PairExecution {
    /// Predicted-query execution.
    pub predicted: ExecutionResult,
    /// Gold-query execution.
    pub gold: ExecutionResult,
    /// Row-set comparison, when both executions succeeded.
    pub comparison: Option<RowComparison>,
}

impl PairExecution {
    /// True when both sides ran to completion.
    pub fn both_succeeded(&self) -> bool {
        self.predicted.success && self.gold.success
    }
}

/// Runs queries against pre-materialized SQLite databases. One connection is
/// opened per execution and closed before returning; a per-query timeout
/// bounds worst-case latency.
pub struct SqlExecutor {
    db_dir: PathBuf,
    timeout: Duration,
}

impl SqlExecutor {
    /// Executor over `<db_dir>/<db_id>.sqlite` files with the given timeout.
    pub fn new(db_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        SqlExecutor {
            db_dir: db_dir.into(),
            timeout,
        }
    }

    /// Resolve the database file for a db_id (`.sqlite`, falling back to `.db`).
    pub fn database_path(&self, db_id: &str) -> Option<PathBuf> {
        for extension in ["sqlite", "db"] {
            let path = self.db_dir.join(format!("{db_id}.{extension}"));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Execute one query. Failures (missing database, SQLite errors,
    /// timeouts) come back inside the result, never as a panic or `Err`.
    pub fn execute(&self, query: &str, db_id: &str) -> ExecutionResult {
        let started = Instant::now();
        let Some(path) = self.database_path(db_id) else {
            return ExecutionResult::failure(
                ExecutionError::DatabaseMissing(db_id.to_string()),
                started.elapsed(),
            );
        };

        let conn = match Connection::open(&path) {
            Ok(conn) => conn,
            Err(e) => {
                return ExecutionResult::failure(
                    ExecutionError::Query(e.to_string()),
                    started.elapsed(),
                )
            }
        };

        let limit = self.timeout;
        let armed = Instant::now();
        conn.progress_handler(1_000, Some(move || armed.elapsed() > limit));

        match fetch_rows(&conn, query) {
            Ok(rows) => ExecutionResult {
                success: true,
                rows,
                error: None,
                elapsed: started.elapsed(),
            },
            Err(e) => {
                let elapsed = started.elapsed();
                let error = if elapsed > self.timeout {
                    ExecutionError::Timeout(self.timeout)
                } else {
                    ExecutionError::Query(e.to_string())
                };
                ExecutionResult::failure(error, elapsed)
            }
        }
    }

    /// Execute predicted and gold against the same database and compare
    /// their row sets when both succeed.
    pub fn execute_and_compare(&self, predicted: &str, gold: &str, db_id: &str) -> PairExecution {
        let predicted = self.execute(predicted, db_id);
        let gold = self.execute(gold, db_id);
        let comparison = (predicted.success && gold.success)
            .then(|| compare_results(&predicted.rows, &gold.rows));
        PairExecution {
            predicted,
            gold,
            comparison,
        }
    }
}

fn fetch_rows(conn: &Connection, query: &str) -> rusqlite::Result<Vec<ResultRow>> {
    let mut statement = conn.prepare(query)?;
    let column_count = statement.column_count();
    let mut rows = statement.query([])?;
    let mut collected = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for index in 0..column_count {
            cells.push(CellValue::from(row.get_ref(index)?));
        }
        collected.push(cells);
    }
    Ok(collected)
}

/// Aggregate execution statistics over a batch of pair executions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionStats {
    /// Pairs attempted.
    pub total_pairs: usize,
    /// Pairs where both sides executed; the execution-accuracy denominator.
    pub both_succeeded: usize,
    /// Pairs whose row sets matched exactly.
    pub exact_matches: usize,
    /// exact_matches / both_succeeded (0 when nothing executed).
    pub execution_accuracy: f64,
    /// Mean row precision over compared pairs.
    pub avg_precision: f64,
    /// Mean row recall over compared pairs.
    pub avg_recall: f64,
    /// Mean row F1 over compared pairs.
    pub avg_f1: f64,
    /// Executions (either side) that timed out.
    pub timeouts: usize,
    /// Executions (either side) rejected by SQLite.
    pub query_errors: usize,
    /// Executions (either side) with no database file.
    pub missing_databases: usize,
}

/// Summarize a batch of pair executions.
pub fn comparison_stats(results: &[PairExecution]) -> ExecutionStats {
    let mut stats = ExecutionStats {
        total_pairs: results.len(),
        ..ExecutionStats::default()
    };

    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;

    for pair in results {
        for side in [&pair.predicted, &pair.gold] {
            match side.error {
                Some(ExecutionError::Timeout(_)) => stats.timeouts += 1,
                Some(ExecutionError::Query(_)) => stats.query_errors += 1,
                Some(ExecutionError::DatabaseMissing(_)) => stats.missing_databases += 1,
                None => {}
            }
        }
        if let Some(comparison) = &pair.comparison {
            stats.both_succeeded += 1;
            if comparison.exact_match {
                stats.exact_matches += 1;
            }
            precision_sum += comparison.precision;
            recall_sum += comparison.recall;
            f1_sum += comparison.f1;
        }
    }

    if stats.both_succeeded > 0 {
        let compared = stats.both_succeeded as f64;
        stats.execution_accuracy = stats.exact_matches as f64 / compared;
        stats.avg_precision = precision_sum / compared;
        stats.avg_recall = recall_sum / compared;
        stats.avg_f1 = f1_sum / compared;
    }
    stats
}
