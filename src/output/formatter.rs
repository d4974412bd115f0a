use std::path::{Component, Path};

use crate::evaluator::BatchEvaluation;
use crate::output::report;

/// Write all output files to the specified directory: the detailed results
/// JSON and the markdown report.
pub fn write_output(
    output_dir: &Path,
    name: &str,
    evaluation: &BatchEvaluation,
) -> Result<(), String> {
    validate_output_name(name)?;

    std::fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create output directory: {e}"))?;

    let results_path = output_dir.join(format!("{name}_results.json"));
    let results_content = serde_json::to_string_pretty(evaluation)
        .map_err(|e| format!("Failed to serialize results: {e}"))?;
    std::fs::write(&results_path, &results_content)
        .map_err(|e| format!("Failed to write {}: {e}", results_path.display()))?;

    let report_path = output_dir.join(format!("{name}_report.md"));
    let report_content = report::build_report(evaluation);
    std::fs::write(&report_path, &report_content)
        .map_err(|e| format!("Failed to write {}: {e}", report_path.display()))?;

    Ok(())
}

fn validate_output_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Output name must not be empty".to_string());
    }
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        return Err(format!(
            "Invalid output name '{name}': absolute paths are not allowed"
        ));
    }
    if candidate.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    }) {
        return Err(format!(
            "Invalid output name '{name}': traversal segments are not allowed"
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!(
            "Invalid output name '{name}': path separators are not allowed"
        ));
    }
    Ok(())
}
