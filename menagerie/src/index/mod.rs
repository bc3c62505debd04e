//! Search index mirror
//!
//! A document index kept consistent with the record store. The store pushes
//! every saved animal here and removes every deleted one. Queries come in as a
//! [`SearchQuery`] and go out as [`RawHits`]: document payloads plus the sort
//! key each hit was ranked by, the same shape a remote search engine returns.
//!
//! [`SqliteIndex`] keeps the documents in an FTS5 table. FTS5 narrows the
//! candidates, the `phrase_prefix` SQL function enforces token positions, and
//! the `animal_score` SQL function supplies the sort key.

mod functions;
mod schema;

use crate::error::{Error, Result};
use crate::model::{Animal, ANIMAL_DOC_TYPE};
use crate::search::SearchQuery;
use chrono::Utc;
use rusqlite::{params, Connection, ToSql};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Operations the service needs from a search index
pub trait SearchIndex {
    /// Insert or replace the document for this animal
    fn save(&self, animal: &Animal) -> Result<()>;

    /// Remove the animal's document, if any
    fn delete_by_id(&self, id: i64) -> Result<()>;

    /// Run a query and return the raw, ranked hits
    fn execute(&self, query: &SearchQuery) -> Result<RawHits>;
}

/// A document as held by the index
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexDocument {
    pub doc_type: String,
    pub doc_id: i64,
    pub name: String,
    pub promoted: bool,
    pub indexed_at: String,
}

impl IndexDocument {
    pub fn from_animal(animal: &Animal) -> Self {
        IndexDocument {
            doc_type: ANIMAL_DOC_TYPE.to_string(),
            doc_id: animal.id,
            name: animal.name.clone(),
            promoted: animal.promoted,
            indexed_at: Utc::now().to_rfc3339(),
        }
    }
}

/// One ranked hit
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawHit {
    /// Document type the hit belongs to
    pub doc_type: String,
    /// Document payload
    pub source: serde_json::Value,
    /// Sort key values, rendered as strings
    pub sort: Vec<String>,
}

/// Ranked hits for one page plus the total number of matches
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawHits {
    pub hits: Vec<RawHit>,
    pub total: u64,
}

/// FTS5-backed search index
pub struct SqliteIndex {
    conn: Connection,
    path: PathBuf,
    name: String,
}

impl SqliteIndex {
    /// Open or create an index database at the given path
    pub fn open<P: AsRef<Path>>(path: P, name: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn, path, name)
    }

    /// Open an in-memory index (for testing)
    pub fn open_memory(name: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, PathBuf::from(":memory:"), name)
    }

    fn init(conn: Connection, path: PathBuf, name: &str) -> Result<Self> {
        schema::ensure_schema(&conn, name)?;
        functions::register(&conn)?;

        if let Some(stored) = schema::stored_index_name(&conn)? {
            if stored != name {
                return Err(Error::IndexError(format!(
                    "{} holds index '{}', not '{}'",
                    path.display(),
                    stored,
                    name
                )));
            }
        }

        Ok(SqliteIndex {
            conn,
            path,
            name: name.to_string(),
        })
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace a document of any type
    pub fn save_document(&self, doc: &IndexDocument) -> Result<()> {
        // FTS5 has no upsert, so replace by delete + insert
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM documents WHERE doc_type = ?1 AND doc_id = ?2",
            params![doc.doc_type, doc.doc_id],
        )?;
        tx.execute(
            "INSERT INTO documents (doc_type, doc_id, name, promoted, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![doc.doc_type, doc.doc_id, doc.name, doc.promoted, doc.indexed_at],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove a document of any type
    pub fn delete_document(&self, doc_type: &str, doc_id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM documents WHERE doc_type = ?1 AND doc_id = ?2",
            params![doc_type, doc_id],
        )?;
        Ok(())
    }

    /// Get a document by type and id
    pub fn get_document(&self, doc_type: &str, doc_id: i64) -> Result<Option<IndexDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_type, CAST(doc_id AS INTEGER), name, CAST(promoted AS INTEGER), indexed_at
             FROM documents WHERE doc_type = ?1 AND doc_id = ?2",
        )?;
        let mut rows = stmt.query(params![doc_type, doc_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(IndexDocument {
                doc_type: row.get(0)?,
                doc_id: row.get(1)?,
                name: row.get(2)?,
                promoted: row.get(3)?,
                indexed_at: row.get(4)?,
            })),
            None => Ok(None),
        }
    }

    /// Count documents, optionally of a single type
    pub fn count(&self, doc_type: Option<&str>) -> Result<u64> {
        let count: i64 = match doc_type {
            Some(doc_type) => self.conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE doc_type = ?1",
                [doc_type],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    /// Get database file size in bytes
    pub fn database_size(&self) -> Result<u64> {
        if self.path.to_str() == Some(":memory:") {
            return Ok(0);
        }
        let metadata = std::fs::metadata(&self.path)?;
        Ok(metadata.len())
    }
}

impl SearchIndex for SqliteIndex {
    fn save(&self, animal: &Animal) -> Result<()> {
        self.save_document(&IndexDocument::from_animal(animal))
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        self.delete_document(ANIMAL_DOC_TYPE, id)
    }

    fn execute(&self, query: &SearchQuery) -> Result<RawHits> {
        if query.index != self.name {
            return Err(Error::IndexError(format!(
                "Unknown index '{}' (this index is '{}')",
                query.index, self.name
            )));
        }

        let term = query.phrase.terms().join(" ");
        let slop = query.phrase.slop() as i64;
        let salt = i64::from(query.sort.salt);
        let fts = query.phrase.fts_expression();
        let window = query.page.sql_window();
        let (limit, offset) = window.unwrap_or((0, 0));

        let mut filter = String::from("phrase_prefix(name, ?1, ?2)");
        let mut args: Vec<&dyn ToSql> = vec![&term as &dyn ToSql, &slop];
        if let Some(fts) = fts.as_ref() {
            filter.push_str(" AND documents MATCH ?3");
            args.push(fts);
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM documents WHERE {}", filter),
            args.as_slice(),
            |row| row.get(0),
        )?;

        if window.is_none() {
            return Ok(RawHits {
                hits: Vec::new(),
                total: total as u64,
            });
        }

        let n = args.len();
        let sql = format!(
            "SELECT doc_type, CAST(doc_id AS INTEGER) AS id, name, CAST(promoted AS INTEGER),
                    animal_score(?{salt_arg}, CAST(doc_id AS INTEGER), CAST(promoted AS INTEGER)) AS score
             FROM documents
             WHERE {filter}
             ORDER BY score DESC, id ASC
             LIMIT ?{limit_arg} OFFSET ?{offset_arg}",
            salt_arg = n + 1,
            filter = filter,
            limit_arg = n + 2,
            offset_arg = n + 3,
        );
        args.push(&salt);
        args.push(&limit);
        args.push(&offset);

        tracing::debug!(
            "Executing index query on '{}' (fts: {:?}, salt: {})",
            self.name,
            fts,
            salt
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let hits = stmt
            .query_map(args.as_slice(), |row| {
                let doc_type: String = row.get(0)?;
                let id: i64 = row.get(1)?;
                let name: String = row.get(2)?;
                let promoted: bool = row.get(3)?;
                let score: f64 = row.get(4)?;
                Ok(RawHit {
                    doc_type,
                    source: json!({ "id": id, "name": name, "promoted": promoted }),
                    sort: vec![score.to_string()],
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(RawHits {
            hits,
            total: total as u64,
        })
    }
}
