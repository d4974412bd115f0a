use std::path::Path;

use serde::Deserialize;

/// One gold example of the benchmark dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetExample {
    /// Database the question targets.
    pub db_id: String,
    /// Natural-language question (kept for result records, not evaluated).
    #[serde(default)]
    pub question: String,
    /// Gold SQL query.
    pub query: String,
}

/// Load gold examples from a JSON list of `{question, query, db_id}` records.
pub fn load_examples(path: &Path) -> Result<Vec<DatasetExample>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid dataset {}: {e}", path.display()))
}

/// Load predictions from a text file, one SQL query per line, positionally
/// aligned with the dataset. Blank lines stay as empty predictions so the
/// alignment survives.
pub fn load_predictions(path: &Path) -> Result<Vec<String>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(content.lines().map(|line| line.trim().to_string()).collect())
}
