//! Score machine-generated SQL against gold references for a Vietnamese
//! text-to-SQL benchmark.
#![warn(missing_docs)]

/// Dataset loading: gold examples and newline-delimited predictions.
pub mod dataset;
/// Batch evaluation pipeline, per-pair records, and summary statistics.
pub mod evaluator;
/// Query execution against materialized SQLite databases and result-set comparison.
pub mod executor;
/// Result file output and markdown report generation.
pub mod output;
/// Text-level SQL heuristics: normalization, alias resolution, clause and component extraction.
pub mod parser;
/// Schema catalog loading, column binding, and SQLite materialization.
pub mod schema;
/// Component F1 scoring and structural difficulty classification.
pub mod scorer;
