#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use sqleval::schema::catalog::{Schema, SchemaCatalog, SchemaRecord};
use sqleval::schema::materialize;

/// Schema record for the `truong_hoc` fixture database: a student table and
/// a class table linked by `lop_id`.
pub fn student_record() -> SchemaRecord {
    SchemaRecord {
        db_id: "truong_hoc".to_string(),
        table_names: vec!["hoc_sinh".to_string(), "lop".to_string()],
        column_names: vec![
            (-1, "*".to_string()),
            (0, "ten_hoc_sinh".to_string()),
            (0, "tuoi".to_string()),
            (0, "lop_id".to_string()),
            (1, "lop_id".to_string()),
            (1, "ten_lop".to_string()),
        ],
        column_types: vec![
            "text".to_string(),
            "text".to_string(),
            "number".to_string(),
            "number".to_string(),
            "number".to_string(),
            "text".to_string(),
        ],
        foreign_keys: vec![(3, 4)],
        primary_keys: vec![1, 5],
    }
}

/// Catalog holding only the student fixture schema.
pub fn student_catalog() -> SchemaCatalog {
    SchemaCatalog::from_records(vec![student_record()]).expect("fixture record should validate")
}

/// The student fixture schema on its own.
pub fn student_schema() -> Schema {
    Schema::from_record(student_record()).expect("fixture record should validate")
}

/// Unique path under the system temp directory.
pub fn unique_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{nanos}"))
}

/// Materialize the student database into `dir` and seed it with five
/// students across two classes.
pub fn build_student_db(dir: &PathBuf) -> PathBuf {
    let schema = student_schema();
    let path = materialize::materialize(&schema, dir).expect("materialization should succeed");

    let conn = Connection::open(&path).expect("fixture database should open");
    conn.execute_batch(
        "INSERT INTO lop (lop_id, ten_lop) VALUES (1, 'lop mot'), (2, 'lop hai');
         INSERT INTO hoc_sinh (ten_hoc_sinh, tuoi, lop_id) VALUES
             ('an', 17, 1),
             ('binh', 18, 1),
             ('chi', 19, 2),
             ('dung', 20, 2),
             ('em', 21, 2);",
    )
    .expect("fixture rows should insert");
    path
}
