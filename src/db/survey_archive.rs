use std::error::Error;

use duckdb::{params_from_iter, Connection};
use itertools::Itertools;
use log::info;

use crate::kobo::export::Dataset;

/// Target of the load: one table in one schema of a DuckDB file.  Every
/// run replaces the table contents wholesale.
#[derive(Clone)]
pub struct SurveyArchive {
    pub duckdb_path: String,
    pub schema: String,
    pub table: String,
}

impl SurveyArchive {
    /// Open the database and replace the table with `data`.  Returns the
    /// number of rows loaded.
    pub fn replace(&self, data: &Dataset) -> Result<usize, Box<dyn Error>> {
        let conn = Connection::open(&self.duckdb_path)?;
        replace_table(&conn, &self.schema, &self.table, data)
    }

    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// Full-replace load: ensure the schema exists, then drop and recreate
/// the table and insert every row, all inside one transaction.  Columns
/// are VARCHAR; empty cells load as NULL.
pub fn replace_table(
    conn: &Connection,
    schema: &str,
    table: &str,
    data: &Dataset,
) -> Result<usize, Box<dyn Error>> {
    if data.columns.is_empty() {
        return Err(Box::from("refusing to load a dataset with no columns"));
    }

    let column_defs = data
        .columns
        .iter()
        .map(|column| format!("\"{}\" VARCHAR", column))
        .join(", ");
    conn.execute_batch(&format!(
        r#"
BEGIN;
CREATE SCHEMA IF NOT EXISTS "{schema}";
DROP TABLE IF EXISTS "{schema}"."{table}";
CREATE TABLE "{schema}"."{table}" ({column_defs});
        "#
    ))?;

    let placeholders = data.columns.iter().map(|_| "?").join(", ");
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO \"{}\".\"{}\" VALUES ({});",
        schema, table, placeholders
    ))?;
    for row in &data.rows {
        stmt.execute(params_from_iter(row.iter().map(|cell| {
            if cell.is_empty() {
                None
            } else {
                Some(cell.as_str())
            }
        })))?;
    }
    conn.execute_batch("COMMIT;")?;

    info!("replaced {}.{}", schema, table);
    Ok(data.rows.len())
}
