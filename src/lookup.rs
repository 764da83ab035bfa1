use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// One result row, columns in statement order.
pub type Row = Vec<String>;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Read-only key/value store consulted by message handlers.
pub trait LookupService {
    /// Run `statement` and return every row. An empty result is not an error.
    fn query(&self, statement: &str) -> Result<Vec<Row>, LookupError>;
}

/// A SQLite credentials database.
///
/// The file is opened read-only for each query, so it can be replaced or
/// created while the module is running.
#[derive(Debug, Clone)]
pub struct SqliteLookup {
    path: PathBuf,
}

impl SqliteLookup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LookupService for SqliteLookup {
    fn query(&self, statement: &str) -> Result<Vec<Row>, LookupError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(statement)?;
        let columns = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..columns)
                    .map(|i| row.get::<_, Value>(i).map(value_text))
                    .collect::<rusqlite::Result<Row>>()
            })?
            .collect::<rusqlite::Result<Vec<Row>>>()?;
        Ok(rows)
    }
}

/// Render a column value the way it would travel in a protocol field.
fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(dir: &TempDir, sql: &str) -> PathBuf {
        let path = dir.path().join("credentials.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(sql).unwrap();
        path
    }

    #[test]
    fn returns_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let path = seed(
            &dir,
            "CREATE TABLE yatet (username TEXT, password TEXT);
             INSERT INTO yatet VALUES ('alice', 'secret1');
             INSERT INTO yatet VALUES ('bob', 'secret2');",
        );

        let rows = SqliteLookup::new(path)
            .query("SELECT username,password FROM yatet")
            .unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["alice".to_string(), "secret1".to_string()],
                vec!["bob".to_string(), "secret2".to_string()],
            ]
        );
    }

    #[test]
    fn empty_table_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, "CREATE TABLE yatet (username TEXT, password TEXT);");

        let rows = SqliteLookup::new(path)
            .query("SELECT username,password FROM yatet")
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn non_text_columns_are_rendered() {
        let dir = TempDir::new().unwrap();
        let path = seed(
            &dir,
            "CREATE TABLE yatet (username TEXT, password);
             INSERT INTO yatet VALUES ('carol', 1234);
             INSERT INTO yatet VALUES (NULL, NULL);",
        );

        let rows = SqliteLookup::new(path)
            .query("SELECT username,password FROM yatet")
            .unwrap();
        assert_eq!(rows[0], vec!["carol".to_string(), "1234".to_string()]);
        assert_eq!(rows[1], vec![String::new(), String::new()]);
    }

    #[test]
    fn missing_database_is_an_error() {
        let dir = TempDir::new().unwrap();
        let lookup = SqliteLookup::new(dir.path().join("absent.db"));
        assert!(lookup.query("SELECT 1").is_err());
        assert!(!lookup.path().exists());
    }
}
