use std::time::Duration;

use sqleval::executor::{comparison_stats, ExecutionError, SqlExecutor};

mod support;

fn executor(dir: &std::path::PathBuf) -> SqlExecutor {
    SqlExecutor::new(dir.clone(), Duration::from_secs(30))
}

#[test]
fn identical_count_queries_match_exactly() {
    let dir = support::unique_dir("sqleval_exec_count");
    support::build_student_db(&dir);
    let executor = executor(&dir);

    let pair = executor.execute_and_compare(
        "SELECT COUNT(*) FROM hoc_sinh",
        "SELECT COUNT(*) FROM hoc_sinh",
        "truong_hoc",
    );
    assert!(pair.both_succeeded());
    assert_eq!(pair.predicted.rows.len(), 1);

    let comparison = pair.comparison.expect("both sides executed");
    assert!(comparison.exact_match);
    assert_eq!(comparison.f1, 1.0);
}

#[test]
fn row_order_and_duplicates_do_not_affect_comparison() {
    let dir = support::unique_dir("sqleval_exec_order");
    support::build_student_db(&dir);
    let executor = executor(&dir);

    let pair = executor.execute_and_compare(
        "SELECT lop_id FROM hoc_sinh ORDER BY tuoi DESC",
        "SELECT DISTINCT lop_id FROM hoc_sinh ORDER BY lop_id",
        "truong_hoc",
    );
    let comparison = pair.comparison.expect("both sides executed");
    assert!(comparison.exact_match);
}

#[test]
fn nonexistent_table_fails_without_aborting_the_batch() {
    let dir = support::unique_dir("sqleval_exec_missing_table");
    support::build_student_db(&dir);
    let executor = executor(&dir);

    let failing = executor.execute_and_compare(
        "SELECT * FROM khong_ton_tai",
        "SELECT COUNT(*) FROM hoc_sinh",
        "truong_hoc",
    );
    assert!(!failing.predicted.success);
    assert!(matches!(
        failing.predicted.error,
        Some(ExecutionError::Query(_))
    ));
    assert!(failing.gold.success);
    assert!(failing.comparison.is_none());

    let passing = executor.execute_and_compare(
        "SELECT COUNT(*) FROM hoc_sinh",
        "SELECT COUNT(*) FROM hoc_sinh",
        "truong_hoc",
    );

    // The failed pair is excluded from the execution-accuracy denominator.
    let stats = comparison_stats(&[failing, passing]);
    assert_eq!(stats.total_pairs, 2);
    assert_eq!(stats.both_succeeded, 1);
    assert_eq!(stats.exact_matches, 1);
    assert_eq!(stats.execution_accuracy, 1.0);
    assert_eq!(stats.query_errors, 1);
}

#[test]
fn missing_database_is_tagged_distinctly() {
    let dir = support::unique_dir("sqleval_exec_missing_db");
    std::fs::create_dir_all(&dir).expect("should create temp directory");
    let executor = executor(&dir);

    let result = executor.execute("SELECT 1", "khong_co_db");
    assert!(!result.success);
    assert!(matches!(
        result.error,
        Some(ExecutionError::DatabaseMissing(_))
    ));
}

#[test]
fn empty_result_sets_agree_vacuously() {
    let dir = support::unique_dir("sqleval_exec_empty");
    support::build_student_db(&dir);
    let executor = executor(&dir);

    let pair = executor.execute_and_compare(
        "SELECT ten_hoc_sinh FROM hoc_sinh WHERE tuoi > 100",
        "SELECT ten_hoc_sinh FROM hoc_sinh WHERE tuoi > 200",
        "truong_hoc",
    );
    let comparison = pair.comparison.expect("both sides executed");
    assert!(comparison.exact_match);
    assert_eq!(comparison.precision, 1.0);
    assert_eq!(comparison.recall, 1.0);
    assert_eq!(comparison.f1, 1.0);
}

#[test]
fn one_empty_result_set_scores_zero() {
    let dir = support::unique_dir("sqleval_exec_one_empty");
    support::build_student_db(&dir);
    let executor = executor(&dir);

    let pair = executor.execute_and_compare(
        "SELECT ten_hoc_sinh FROM hoc_sinh WHERE tuoi > 100",
        "SELECT ten_hoc_sinh FROM hoc_sinh",
        "truong_hoc",
    );
    let comparison = pair.comparison.expect("both sides executed");
    assert!(!comparison.exact_match);
    assert_eq!(comparison.f1, 0.0);
}
