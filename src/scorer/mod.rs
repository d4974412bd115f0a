/// Set-based component precision/recall/F1 accumulation per clause.
pub mod component;
/// Structural difficulty classification of gold queries.
pub mod difficulty;
