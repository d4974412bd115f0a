use std::fmt::Write;

use crate::evaluator::BatchEvaluation;

/// Build a markdown report: overall rates, per-clause table, difficulty
/// breakdown, and the issue counts that qualify the scores.
pub fn build_report(evaluation: &BatchEvaluation) -> String {
    let summary = &evaluation.summary;
    let mut report = String::new();

    writeln!(report, "# sqleval Evaluation Report").unwrap();
    writeln!(report).unwrap();

    writeln!(report, "## Summary").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "| Metric | Value |").unwrap();
    writeln!(report, "|--------|-------|").unwrap();
    writeln!(report, "| Total pairs | {} |", summary.total_pairs).unwrap();
    writeln!(
        report,
        "| Exact match | {} |",
        percent(summary.exact_match_rate)
    )
    .unwrap();
    writeln!(
        report,
        "| Syntax validity | {} |",
        percent(summary.syntax_validity_rate)
    )
    .unwrap();
    if let Some(execution) = &summary.execution {
        writeln!(
            report,
            "| Execution accuracy | {} ({} of {} executed pairs) |",
            percent(execution.execution_accuracy),
            execution.exact_matches,
            execution.both_succeeded
        )
        .unwrap();
        writeln!(report, "| Row F1 | {:.3} |", execution.avg_f1).unwrap();
    }

    writeln!(report).unwrap();
    writeln!(report, "## Component F1").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "| Clause | F1 | TP | FP | FN |").unwrap();
    writeln!(report, "|--------|----|----|----|----|").unwrap();
    for (clause, scores) in &summary.clause_scores {
        writeln!(
            report,
            "| {} | {:.3} | {} | {} | {} |",
            clause,
            scores.f1,
            scores.true_positive,
            scores.false_positive,
            scores.false_negative
        )
        .unwrap();
    }

    if !summary.difficulty_breakdown.is_empty() {
        writeln!(report).unwrap();
        writeln!(report, "## Difficulty Breakdown").unwrap();
        writeln!(report).unwrap();
        writeln!(report, "| Difficulty | Count | Exact match | Share |").unwrap();
        writeln!(report, "|------------|-------|-------------|-------|").unwrap();
        for (difficulty, slice) in &summary.difficulty_breakdown {
            writeln!(
                report,
                "| {} | {} | {} | {} |",
                difficulty,
                slice.count,
                percent(slice.exact_match_rate),
                percent(slice.share)
            )
            .unwrap();
        }
    }

    writeln!(report).unwrap();
    writeln!(report, "## Issues").unwrap();
    writeln!(report).unwrap();
    writeln!(
        report,
        "- Pairs with unresolved aliases: {}",
        summary.pairs_with_unresolved_aliases
    )
    .unwrap();
    writeln!(
        report,
        "- Parse degradations: {}",
        summary.parse_degradations
    )
    .unwrap();
    writeln!(report, "- Missing schemas: {}", summary.missing_schemas).unwrap();
    if let Some(execution) = &summary.execution {
        writeln!(report, "- Query errors: {}", execution.query_errors).unwrap();
        writeln!(report, "- Timeouts: {}", execution.timeouts).unwrap();
        writeln!(
            report,
            "- Missing databases: {}",
            execution.missing_databases
        )
        .unwrap();
    }

    report
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
