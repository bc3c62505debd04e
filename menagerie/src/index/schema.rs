//! Database schema for the search index

use crate::error::Result;
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
-- Indexed documents. A shared index may hold several document types, so
-- documents are keyed by (doc_type, doc_id) rather than by rowid.
CREATE VIRTUAL TABLE IF NOT EXISTS documents USING fts5(
    doc_type UNINDEXED,
    doc_id UNINDEXED,
    name,
    promoted UNINDEXED,
    indexed_at UNINDEXED,
    tokenize='unicode61 remove_diacritics 0'
);

-- Index state (schema version, index name)
CREATE TABLE IF NOT EXISTS index_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Ensure the index schema exists and carries the given index name
pub fn ensure_schema(conn: &Connection, index_name: &str) -> Result<()> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='index_state'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT INTO index_state (key, value) VALUES ('schema_version', ?1), ('index_name', ?2)",
            [SCHEMA_VERSION.to_string(), index_name.to_string()],
        )?;

        tracing::info!(
            "Created search index '{}' schema version {}",
            index_name,
            SCHEMA_VERSION
        );
    }

    Ok(())
}

/// Name the index was created with
pub fn stored_index_name(conn: &Connection) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM index_state WHERE key = 'index_name'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn, "animal").unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"index_state".to_string()));
        assert_eq!(stored_index_name(&conn).unwrap().as_deref(), Some("animal"));
    }

    #[test]
    fn test_idempotent_schema_keeps_first_name() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn, "animal").unwrap();
        ensure_schema(&conn, "other").unwrap();

        assert_eq!(stored_index_name(&conn).unwrap().as_deref(), Some("animal"));
    }
}
