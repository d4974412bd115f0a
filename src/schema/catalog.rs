use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::parser::normalize::canonical_token;

/// One schema entry of the catalog document (`tables.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRecord {
    /// Benchmark identifier of the database.
    pub db_id: String,
    /// Ordered table names.
    pub table_names: Vec<String>,
    /// `(table_index, column_name)` pairs; index -1 is reserved for `*`.
    pub column_names: Vec<(i64, String)>,
    /// Column type labels, parallel to `column_names`.
    #[serde(default)]
    pub column_types: Vec<String>,
    /// `(child_column, parent_column)` index pairs.
    #[serde(default)]
    pub foreign_keys: Vec<(usize, usize)>,
    /// Column indices forming primary keys.
    #[serde(default)]
    pub primary_keys: Vec<usize>,
}

impl SchemaRecord {
    /// Check internal consistency. A malformed record (out-of-range table or
    /// column index) is a contract violation, reported immediately.
    pub fn validate(&self) -> Result<(), String> {
        for (table_index, column) in &self.column_names {
            if *table_index != -1
                && (*table_index < 0 || *table_index as usize >= self.table_names.len())
            {
                return Err(format!(
                    "Schema '{}': column '{}' references table index {} out of range",
                    self.db_id, column, table_index
                ));
            }
        }
        let columns = self.column_names.len();
        for (child, parent) in &self.foreign_keys {
            if *child >= columns || *parent >= columns {
                return Err(format!(
                    "Schema '{}': foreign key ({child}, {parent}) out of range",
                    self.db_id
                ));
            }
        }
        for key in &self.primary_keys {
            if *key >= columns {
                return Err(format!(
                    "Schema '{}': primary key {key} out of range",
                    self.db_id
                ));
            }
        }
        Ok(())
    }
}

/// A validated schema with lookup tables for binding. Immutable after load
/// and freely shareable across comparisons.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Benchmark identifier of the database this schema describes.
    pub db_id: String,
    /// Table names as listed in the catalog document.
    pub table_names: Vec<String>,
    /// `(table_index, column_name)` pairs; index -1 is the `*` wildcard.
    pub column_names: Vec<(i64, String)>,
    /// Column type labels, parallel to `column_names`.
    pub column_types: Vec<String>,
    /// `(child_column, parent_column)` index pairs.
    pub foreign_keys: Vec<(usize, usize)>,
    /// Column indices forming primary keys.
    pub primary_keys: Vec<usize>,
    tables: HashSet<String>,
    column_tables: HashMap<String, Vec<String>>,
}

impl Schema {
    /// Build a schema from a validated catalog record.
    pub fn from_record(record: SchemaRecord) -> Result<Self, String> {
        record.validate()?;

        let tables: HashSet<String> = record
            .table_names
            .iter()
            .map(|name| canonical_token(name))
            .collect();

        let mut column_tables: HashMap<String, Vec<String>> = HashMap::new();
        for (table_index, column) in &record.column_names {
            if *table_index < 0 {
                continue;
            }
            let table = canonical_token(&record.table_names[*table_index as usize]);
            let entry = column_tables.entry(canonical_token(column)).or_default();
            if !entry.contains(&table) {
                entry.push(table);
            }
        }

        Ok(Schema {
            db_id: record.db_id,
            table_names: record.table_names,
            column_names: record.column_names,
            column_types: record.column_types,
            foreign_keys: record.foreign_keys,
            primary_keys: record.primary_keys,
            tables,
            column_tables,
        })
    }

    /// A schema with no tables, used when a db_id has no catalog entry so the
    /// pipeline can still run with binding disabled.
    pub fn empty(db_id: &str) -> Self {
        Schema {
            db_id: db_id.to_string(),
            table_names: Vec::new(),
            column_names: Vec::new(),
            column_types: Vec::new(),
            foreign_keys: Vec::new(),
            primary_keys: Vec::new(),
            tables: HashSet::new(),
            column_tables: HashMap::new(),
        }
    }

    /// True when `name` (underscore/space/case-insensitive) is a table.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains(&canonical_token(name))
    }

    /// Canonical names of every table carrying a column named `column`.
    pub fn tables_with_column(&self, column: &str) -> &[String] {
        self.column_tables
            .get(&canonical_token(column))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// All schemas of a dataset, keyed by db_id. Loaded once, read-only.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: HashMap<String, Schema>,
}

impl SchemaCatalog {
    /// Load and validate a catalog document (a JSON list of schema records).
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let records: Vec<SchemaRecord> = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid schema catalog {}: {e}", path.display()))?;
        Self::from_records(records)
    }

    /// Build a catalog from in-memory records, validating each.
    pub fn from_records(records: Vec<SchemaRecord>) -> Result<Self, String> {
        let mut schemas = HashMap::new();
        for record in records {
            let schema = Schema::from_record(record)?;
            schemas.insert(schema.db_id.clone(), schema);
        }
        Ok(SchemaCatalog { schemas })
    }

    /// Look up the schema for a db_id.
    pub fn get(&self, db_id: &str) -> Option<&Schema> {
        self.schemas.get(db_id)
    }

    /// Number of schemas in the catalog.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True when the catalog holds no schemas.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
