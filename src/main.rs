//! CLI entry point for `sqleval`.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use sqleval::dataset;
use sqleval::evaluator::{EvaluationSummary, Evaluator};
use sqleval::executor::SqlExecutor;
use sqleval::output::formatter;
use sqleval::schema::catalog::SchemaCatalog;
use sqleval::schema::materialize;

#[derive(Parser)]
#[command(
    name = "sqleval",
    about = "Score predicted SQL against gold references for a text-to-SQL benchmark"
)]
struct Cli {
    /// Predicted SQL queries, one per line, aligned with the dataset order
    predictions: PathBuf,

    /// Gold dataset JSON (a list of {question, query, db_id} records)
    #[arg(long)]
    dataset: PathBuf,

    /// Schema catalog JSON (tables.json)
    #[arg(long)]
    tables: PathBuf,

    /// Directory of SQLite databases; enables execution comparison
    #[arg(long)]
    db_dir: Option<PathBuf>,

    /// Materialize empty databases from the catalog into --db-dir first
    #[arg(long)]
    build_dbs: bool,

    /// Per-query execution timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Evaluate only the first N pairs (-1 for all)
    #[arg(long, default_value_t = -1)]
    samples: i64,

    /// Output directory
    #[arg(long, default_value = "sqleval-output")]
    output_dir: PathBuf,

    /// Output name; defaults to the predictions file stem
    #[arg(long)]
    name: Option<String>,

    /// Don't write result files
    #[arg(long)]
    no_save: bool,

    /// Print verbose diagnostics
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Collect inputs
    let mut predictions = match dataset::load_predictions(&cli.predictions) {
        Ok(predictions) => predictions,
        Err(e) => {
            eprintln!("Error reading predictions: {e}");
            process::exit(2);
        }
    };
    let mut examples = match dataset::load_examples(&cli.dataset) {
        Ok(examples) => examples,
        Err(e) => {
            eprintln!("Error reading dataset: {e}");
            process::exit(2);
        }
    };
    let catalog = match SchemaCatalog::load(&cli.tables) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error loading schema catalog: {e}");
            process::exit(2);
        }
    };

    if cli.verbose {
        eprintln!(
            "Loaded {} predictions, {} gold examples, {} schemas",
            predictions.len(),
            examples.len(),
            catalog.len()
        );
    }

    if cli.samples >= 0 {
        let limit = cli.samples as usize;
        predictions.truncate(limit);
        examples.truncate(limit);
    }

    let gold: Vec<String> = examples.iter().map(|example| example.query.clone()).collect();
    let db_ids: Vec<String> = examples.iter().map(|example| example.db_id.clone()).collect();

    // Materialize databases when requested
    if cli.build_dbs {
        let Some(db_dir) = &cli.db_dir else {
            eprintln!("--build-dbs requires --db-dir");
            process::exit(2);
        };
        let referenced: BTreeSet<&String> = db_ids.iter().collect();
        for db_id in referenced {
            let Some(schema) = catalog.get(db_id) else {
                eprintln!("No schema for {db_id}, skipping materialization");
                continue;
            };
            match materialize::materialize(schema, db_dir) {
                Ok(path) => {
                    if cli.verbose {
                        eprintln!("Materialized {}", path.display());
                    }
                }
                Err(e) => {
                    eprintln!("Error materializing {db_id}: {e}");
                    process::exit(2);
                }
            }
        }
    }

    // Evaluate
    let mut evaluator = Evaluator::new(&catalog);
    if let Some(db_dir) = &cli.db_dir {
        evaluator =
            evaluator.with_executor(SqlExecutor::new(db_dir, Duration::from_secs(cli.timeout_secs)));
    }

    let evaluation = match evaluator.evaluate(&predictions, &gold, &db_ids) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            eprintln!("Evaluation error: {e}");
            process::exit(2);
        }
    };

    print_summary(&evaluation.summary);

    // Write output
    if !cli.no_save {
        let name = cli.name.clone().unwrap_or_else(|| {
            cli.predictions
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("evaluation")
                .to_string()
        });
        if let Err(e) = formatter::write_output(&cli.output_dir, &name, &evaluation) {
            eprintln!("Error writing output: {e}");
            process::exit(2);
        }
        println!("Results written to {}", cli.output_dir.display());
    }
}

fn print_summary(summary: &EvaluationSummary) {
    println!("=== Evaluation Summary ===");
    println!("Total pairs: {}", summary.total_pairs);
    println!("Exact match: {:.1}%", summary.exact_match_rate * 100.0);
    println!(
        "Syntax validity: {:.1}%",
        summary.syntax_validity_rate * 100.0
    );
    if let Some(execution) = &summary.execution {
        println!(
            "Execution accuracy: {:.1}% ({} of {} executed pairs)",
            execution.execution_accuracy * 100.0,
            execution.exact_matches,
            execution.both_succeeded
        );
        println!("Row F1: {:.3}", execution.avg_f1);
    }

    println!();
    println!("Component F1:");
    for (clause, scores) in &summary.clause_scores {
        println!("  {clause}: {:.3}", scores.f1);
    }

    if !summary.difficulty_breakdown.is_empty() {
        println!();
        println!("Difficulty breakdown:");
        for (difficulty, slice) in &summary.difficulty_breakdown {
            println!(
                "  {difficulty}: {:.1}% exact ({} pairs, {:.1}%)",
                slice.exact_match_rate * 100.0,
                slice.count,
                slice.share * 100.0
            );
        }
    }

    let issues = summary.pairs_with_unresolved_aliases
        + summary.parse_degradations
        + summary.missing_schemas;
    if issues > 0 {
        println!();
        println!(
            "Issues: {} unresolved-alias pairs, {} parse degradations, {} missing schemas",
            summary.pairs_with_unresolved_aliases,
            summary.parse_degradations,
            summary.missing_schemas
        );
    }
}
