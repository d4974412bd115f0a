/// Schema-aware binding of column references to qualified names.
pub mod binder;
/// Schema catalog records, validation, and per-db lookup tables.
pub mod catalog;
/// SQLite materialization of catalog schemas (CREATE TABLE generation).
pub mod materialize;
