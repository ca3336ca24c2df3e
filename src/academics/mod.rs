//! Read-only access to the academic records table.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::TwinError;

const ACADEMICS_QUERY: &str = "SELECT * FROM academics";

/// Source of the rendered academics table.
#[async_trait]
pub trait AcademicsStore: Send + Sync {
    /// Return the whole table rendered as text.
    async fn query(&self) -> Result<String, TwinError>;
}

/// Academics table stored in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteAcademics {
    path: PathBuf,
}

impl SqliteAcademics {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn query_blocking(path: &Path) -> Result<String, TwinError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(ACADEMICS_QUERY)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query([])?;
        let mut cells = Vec::new();
        while let Some(row) = rows.next()? {
            let mut line = Vec::with_capacity(width);
            for i in 0..width {
                line.push(render_value(row.get_ref(i)?));
            }
            cells.push(line);
        }

        Ok(render_table(&columns, &cells))
    }
}

#[async_trait]
impl AcademicsStore for SqliteAcademics {
    async fn query(&self) -> Result<String, TwinError> {
        debug!(path = %self.path.display(), "Querying academics");
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::query_blocking(&path))
            .await
            .map_err(|e| TwinError::InvalidState(format!("academics query task failed: {e}")))?
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Render rows as an aligned text table with a leading row-index column.
///
/// The index column is left-aligned, data columns are right-aligned, and
/// columns are separated by two spaces.
pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return format!("Empty table\nColumns: [{}]", columns.join(", "));
    }

    let index: Vec<String> = (0..rows.len()).map(|i| i.to_string()).collect();
    let index_width = index.iter().map(|s| s.chars().count()).max().unwrap_or(0);

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut header = " ".repeat(index_width);
    for (name, width) in columns.iter().zip(&widths) {
        header.push_str(&format!("  {name:>width$}"));
    }
    lines.push(header);

    for (idx, row) in index.iter().zip(rows) {
        let mut line = format!("{idx:<index_width$}");
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or_default();
            line.push_str(&format!("  {cell:>width$}"));
        }
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn seed(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("academics.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE academics (degree TEXT, institution TEXT, year INTEGER, gpa REAL);
             INSERT INTO academics VALUES ('B.Tech', 'IIT Delhi', 2016, 8.7);
             INSERT INTO academics VALUES ('MS', 'Stanford', 2019, NULL);",
        )
        .unwrap();
        path
    }

    #[test]
    fn renders_aligned_table() {
        let columns = vec!["degree".to_string(), "year".to_string()];
        let rows = vec![
            vec!["B.Tech".to_string(), "2016".to_string()],
            vec!["MS".to_string(), "2019".to_string()],
        ];
        assert_eq!(
            render_table(&columns, &rows),
            "   degree  year\n0  B.Tech  2016\n1      MS  2019"
        );
    }

    #[test]
    fn renders_empty_table_with_columns() {
        let columns = vec!["degree".to_string(), "year".to_string()];
        assert_eq!(render_table(&columns, &[]), "Empty table\nColumns: [degree, year]");
    }

    #[tokio::test]
    async fn sqlite_store_returns_all_rows() {
        let dir = TempDir::new().unwrap();
        let store = SqliteAcademics::new(seed(&dir));

        let table = store.query().await.unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("institution"));
        assert!(lines[1].contains("IIT Delhi") && lines[1].contains("8.7"));
        assert!(lines[2].contains("Stanford"));
    }

    #[tokio::test]
    async fn missing_database_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = SqliteAcademics::new(dir.path().join("absent.db"));
        assert!(matches!(store.query().await, Err(TwinError::Storage(_))));
    }
}
