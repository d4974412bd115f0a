use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::schema::catalog::Schema;

/// Create `<dir>/<db_id>.sqlite` with one empty table per catalog table.
///
/// Building the databases is plain glue (the engine only ever reads them);
/// identifiers are sanitized to the underscore form queries use.
pub fn materialize(schema: &Schema, dir: &Path) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create database directory: {e}"))?;
    let path = dir.join(format!("{}.sqlite", schema.db_id));
    let conn = Connection::open(&path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?;

    for (table_index, table) in schema.table_names.iter().enumerate() {
        let mut definitions = Vec::new();
        let mut key_columns = Vec::new();
        for (column_index, (owner, column)) in schema.column_names.iter().enumerate() {
            if *owner < 0 || *owner as usize != table_index {
                continue;
            }
            let name = sanitize_identifier(column);
            let column_type = schema
                .column_types
                .get(column_index)
                .map(String::as_str)
                .unwrap_or("text");
            definitions.push(format!("\"{}\" {}", name, sqlite_type(column_type)));
            if schema.primary_keys.contains(&column_index) {
                key_columns.push(format!("\"{name}\""));
            }
        }
        if definitions.is_empty() {
            continue;
        }
        if !key_columns.is_empty() {
            definitions.push(format!("PRIMARY KEY ({})", key_columns.join(", ")));
        }
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            sanitize_identifier(table),
            definitions.join(", ")
        );
        conn.execute(&statement, [])
            .map_err(|e| format!("Failed to create table '{table}' in {}: {e}", schema.db_id))?;
    }
    Ok(path)
}

/// Canonicalize a catalog name into an SQLite-safe identifier.
///
/// Rules:
/// - lowercase ASCII letters, keep other letters as-is
/// - replace runs of non-identifier characters with a single `_`
/// - trim leading/trailing `_`
/// - if empty, return `"unknown"`
/// - if starting with a digit, prefix with `"t_"`
pub fn sanitize_identifier(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut previous_was_underscore = false;

    for ch in name.trim().chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_alphanumeric() || lower == '_' {
            if lower == '_' {
                if previous_was_underscore {
                    continue;
                }
                previous_was_underscore = true;
            } else {
                previous_was_underscore = false;
            }
            sanitized.push(lower);
        } else if !previous_was_underscore {
            sanitized.push('_');
            previous_was_underscore = true;
        }
    }

    let trimmed = sanitized.trim_matches('_').to_string();
    let identifier = if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed
    };

    if identifier
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_digit())
    {
        return format!("t_{identifier}");
    }

    identifier
}

fn sqlite_type(label: &str) -> &'static str {
    match label.to_lowercase().as_str() {
        "int" | "integer" | "bigint" | "smallint" | "bool" | "boolean" => "INTEGER",
        "real" | "float" | "double" | "decimal" | "numeric" | "number" => "REAL",
        _ => "TEXT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_identifier_normalizes_separators_and_digits() {
        assert_eq!(sanitize_identifier("Ten Hoc-Sinh"), "ten_hoc_sinh");
        assert_eq!(sanitize_identifier("___"), "unknown");
        assert_eq!(sanitize_identifier("1_lop"), "t_1_lop");
    }

    #[test]
    fn sqlite_type_maps_catalog_labels() {
        assert_eq!(sqlite_type("number"), "REAL");
        assert_eq!(sqlite_type("Integer"), "INTEGER");
        assert_eq!(sqlite_type("varchar"), "TEXT");
    }
}
