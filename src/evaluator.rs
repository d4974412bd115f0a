use std::collections::BTreeMap;

use serde::Serialize;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::executor::{comparison_stats, ExecutionStats, PairExecution, RowComparison, SqlExecutor};
use crate::parser::alias;
use crate::parser::clauses::{self, ClauseKind};
use crate::parser::components::{self, ComponentSets};
use crate::parser::normalize;
use crate::schema::binder::SchemaBinder;
use crate::schema::catalog::{Schema, SchemaCatalog};
use crate::scorer::component::{ClauseStats, ComponentScorer};
use crate::scorer::difficulty::{self, Difficulty};

/// One query run through the normalize → alias → clause → bind pipeline.
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    /// Normalized query text (the exact-match comparison form).
    pub normalized: String,
    /// Component sets per clause.
    pub components: ComponentSets,
    /// Alias prefixes that could not be resolved against the schema.
    pub unresolved_aliases: Vec<String>,
    /// True when the extractor found no SELECT/FROM in a non-empty query.
    pub degraded: bool,
}

/// Analyze a single query against a schema. The alias map is produced here
/// and threaded through rewriting and binding; nothing is shared between
/// calls.
pub fn analyze_query(sql: &str, schema: &Schema) -> QueryAnalysis {
    let normalized = normalize::normalize(sql);
    let aliases = alias::extract_aliases(&normalized);
    let rewrite = alias::rewrite_aliases(&normalized, &aliases, schema);
    let clause_map = clauses::extract_clauses(&rewrite.query);
    let degraded = !normalized.is_empty()
        && (!clause_map.contains_key(&ClauseKind::Select)
            || !clause_map.contains_key(&ClauseKind::From));
    let binder = SchemaBinder::new(schema);
    let component_sets = components::extract_components(&clause_map, &rewrite.query, &binder);
    QueryAnalysis {
        normalized,
        components: component_sets,
        unresolved_aliases: rewrite.unresolved,
        degraded,
    }
}

/// True when the query parses as SQL at all (go/no-go syntax gate; clause
/// scoring stays heuristic either way).
pub fn syntax_valid(sql: &str) -> bool {
    !sql.trim().is_empty() && Parser::parse_sql(&SQLiteDialect {}, sql).is_ok()
}

/// Distilled execution outcome for one pair, shaped for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct PairExecutionRecord {
    /// Rows the predicted query returned, when it succeeded.
    pub predicted_rows: Option<usize>,
    /// Rows the gold query returned, when it succeeded.
    pub gold_rows: Option<usize>,
    /// Predicted-side failure, if any.
    pub predicted_error: Option<String>,
    /// Gold-side failure, if any.
    pub gold_error: Option<String>,
    /// Row-set comparison, when both sides executed.
    pub comparison: Option<RowComparison>,
}

impl PairExecutionRecord {
    fn from_pair(pair: &PairExecution) -> Self {
        PairExecutionRecord {
            predicted_rows: pair.predicted.success.then_some(pair.predicted.rows.len()),
            gold_rows: pair.gold.success.then_some(pair.gold.rows.len()),
            predicted_error: pair.predicted.error.as_ref().map(ToString::to_string),
            gold_error: pair.gold.error.as_ref().map(ToString::to_string),
            comparison: pair.comparison,
        }
    }
}

/// Everything recorded about one (predicted, gold) comparison.
#[derive(Debug, Clone, Serialize)]
pub struct PairRecord {
    /// Position in the batch.
    pub index: usize,
    /// Database the pair belongs to.
    pub db_id: String,
    /// Raw predicted SQL.
    pub predicted_sql: String,
    /// Raw gold SQL.
    pub gold_sql: String,
    /// Normalized string equality, with no alias or schema awareness.
    pub exact_match: bool,
    /// Whether the predicted query parses as SQL.
    pub syntax_valid: bool,
    /// Structural difficulty of the gold query.
    pub difficulty: Difficulty,
    /// Per-clause F1 for this pair alone.
    pub clause_f1: BTreeMap<String, f64>,
    /// Alias prefixes (either side) that could not be resolved.
    pub unresolved_aliases: Vec<String>,
    /// True when clause extraction degraded on either side.
    pub parse_degraded: bool,
    /// Execution outcome, when execution comparison ran.
    pub execution: Option<PairExecutionRecord>,
}

/// Batch counters and F1 for one clause.
#[derive(Debug, Clone, Serialize)]
pub struct ClauseSummary {
    /// Micro-averaged F1 (1.0 when the clause never appeared on any side).
    pub f1: f64,
    /// Components present on both sides.
    pub true_positive: usize,
    /// Components only predictions produced.
    pub false_positive: usize,
    /// Components only gold queries produced.
    pub false_negative: usize,
}

/// Metrics for one difficulty stratum.
#[derive(Debug, Clone, Serialize)]
pub struct DifficultySlice {
    /// Pairs in this stratum.
    pub count: usize,
    /// Exact-match rate within the stratum.
    pub exact_match_rate: f64,
    /// Fraction of the whole batch.
    pub share: f64,
}

/// Aggregate metrics over a batch. Degraded/failed counts are reported
/// beside the scores so a consumer can tell "truly wrong" from "nothing
/// executed".
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    /// Pairs evaluated.
    pub total_pairs: usize,
    /// Fraction of pairs matching exactly after normalization.
    pub exact_match_rate: f64,
    /// Fraction of predictions that parse as SQL.
    pub syntax_validity_rate: f64,
    /// Per-clause F1 with its counters.
    pub clause_scores: BTreeMap<String, ClauseSummary>,
    /// Metrics stratified by gold-query difficulty.
    pub difficulty_breakdown: BTreeMap<String, DifficultySlice>,
    /// Pairs with at least one unresolved alias prefix.
    pub pairs_with_unresolved_aliases: usize,
    /// Pairs where clause extraction degraded on either side.
    pub parse_degradations: usize,
    /// Pairs whose db_id had no catalog entry.
    pub missing_schemas: usize,
    /// Execution statistics, when execution comparison ran.
    pub execution: Option<ExecutionStats>,
}

/// A full evaluation: summary plus per-pair records.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEvaluation {
    /// Aggregate metrics.
    pub summary: EvaluationSummary,
    /// One record per (predicted, gold) pair, in input order.
    pub pairs: Vec<PairRecord>,
}

/// Drives the comparison pipeline over a batch. The catalog is read-only and
/// shared; each pair is scored independently.
pub struct Evaluator<'a> {
    catalog: &'a SchemaCatalog,
    executor: Option<SqlExecutor>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator without execution comparison.
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Evaluator {
            catalog,
            executor: None,
        }
    }

    /// Enable execution comparison through the given executor.
    pub fn with_executor(mut self, executor: SqlExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Evaluate aligned batches of predicted and gold queries.
    ///
    /// Mismatched sequence lengths violate the input contract and fail the
    /// whole call; every per-query problem is recovered locally and counted.
    pub fn evaluate(
        &self,
        predicted: &[String],
        gold: &[String],
        db_ids: &[String],
    ) -> Result<BatchEvaluation, String> {
        if predicted.len() != gold.len() || predicted.len() != db_ids.len() {
            return Err(format!(
                "Predicted, gold, and db_id sequences must have the same length (got {}, {}, {})",
                predicted.len(),
                gold.len(),
                db_ids.len()
            ));
        }

        let mut scorer = ComponentScorer::new();
        let mut pairs = Vec::with_capacity(predicted.len());
        let mut executions = Vec::new();
        let mut missing_schemas = 0usize;

        for (index, ((predicted_sql, gold_sql), db_id)) in
            predicted.iter().zip(gold).zip(db_ids).enumerate()
        {
            let fallback;
            let schema = match self.catalog.get(db_id) {
                Some(schema) => schema,
                None => {
                    missing_schemas += 1;
                    fallback = Schema::empty(db_id);
                    &fallback
                }
            };

            let predicted_analysis = analyze_query(predicted_sql, schema);
            let gold_analysis = analyze_query(gold_sql, schema);

            scorer.accumulate(&predicted_analysis.components, &gold_analysis.components);
            let clause_f1 =
                ComponentScorer::pair_f1(&predicted_analysis.components, &gold_analysis.components)
                    .into_iter()
                    .map(|(kind, f1)| (kind.name().to_string(), f1))
                    .collect();

            let mut unresolved = predicted_analysis.unresolved_aliases;
            for prefix in gold_analysis.unresolved_aliases {
                if !unresolved.contains(&prefix) {
                    unresolved.push(prefix);
                }
            }

            let execution = self.executor.as_ref().map(|executor| {
                let pair = executor.execute_and_compare(predicted_sql, gold_sql, db_id);
                let record = PairExecutionRecord::from_pair(&pair);
                executions.push(pair);
                record
            });

            pairs.push(PairRecord {
                index,
                db_id: db_id.clone(),
                predicted_sql: predicted_sql.clone(),
                gold_sql: gold_sql.clone(),
                exact_match: predicted_analysis.normalized == gold_analysis.normalized,
                syntax_valid: syntax_valid(predicted_sql),
                difficulty: difficulty::classify(&gold_analysis.normalized),
                clause_f1,
                unresolved_aliases: unresolved,
                parse_degraded: predicted_analysis.degraded || gold_analysis.degraded,
                execution,
            });
        }

        let execution_stats = self
            .executor
            .as_ref()
            .map(|_| comparison_stats(&executions));
        let summary = build_summary(&pairs, &scorer, missing_schemas, execution_stats);
        Ok(BatchEvaluation { summary, pairs })
    }
}

/// Convenience wrapper for pure component scoring: per-clause F1 over a
/// batch, without execution comparison.
pub fn score_components(
    predicted: &[String],
    gold: &[String],
    db_ids: &[String],
    catalog: &SchemaCatalog,
) -> Result<BTreeMap<String, f64>, String> {
    let evaluation = Evaluator::new(catalog).evaluate(predicted, gold, db_ids)?;
    Ok(evaluation
        .summary
        .clause_scores
        .into_iter()
        .map(|(clause, summary)| (clause, summary.f1))
        .collect())
}

fn build_summary(
    pairs: &[PairRecord],
    scorer: &ComponentScorer,
    missing_schemas: usize,
    execution: Option<ExecutionStats>,
) -> EvaluationSummary {
    let total = pairs.len();
    let exact_matches = pairs.iter().filter(|pair| pair.exact_match).count();
    let syntax_valid = pairs.iter().filter(|pair| pair.syntax_valid).count();

    let clause_scores = scorer
        .stats()
        .iter()
        .map(|(kind, stats): (&ClauseKind, &ClauseStats)| {
            (
                kind.name().to_string(),
                ClauseSummary {
                    f1: stats.f1(),
                    true_positive: stats.true_positive,
                    false_positive: stats.false_positive,
                    false_negative: stats.false_negative,
                },
            )
        })
        .collect();

    let mut difficulty_breakdown: BTreeMap<String, DifficultySlice> = BTreeMap::new();
    for difficulty in [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Extra,
    ] {
        let stratum: Vec<&PairRecord> = pairs
            .iter()
            .filter(|pair| pair.difficulty == difficulty)
            .collect();
        if stratum.is_empty() {
            continue;
        }
        let stratum_exact = stratum.iter().filter(|pair| pair.exact_match).count();
        difficulty_breakdown.insert(
            difficulty.to_string(),
            DifficultySlice {
                count: stratum.len(),
                exact_match_rate: stratum_exact as f64 / stratum.len() as f64,
                share: stratum.len() as f64 / total as f64,
            },
        );
    }

    EvaluationSummary {
        total_pairs: total,
        exact_match_rate: rate(exact_matches, total),
        syntax_validity_rate: rate(syntax_valid, total),
        clause_scores,
        difficulty_breakdown,
        pairs_with_unresolved_aliases: pairs
            .iter()
            .filter(|pair| !pair.unresolved_aliases.is_empty())
            .count(),
        parse_degradations: pairs.iter().filter(|pair| pair.parse_degraded).count(),
        missing_schemas,
        execution,
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
