//! Record store for animals
//!
//! The store is the source of truth. It owns an SQLite database with one
//! `animals` table; the search index only ever holds copies of these rows.

mod schema;

use crate::error::{Error, Result};
use crate::model::Animal;
use crate::page::{Page, PageRequest};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::{Path, PathBuf};

/// The record store
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Store { conn, path };
        schema::ensure_schema(&store.conn)?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store {
            conn,
            path: PathBuf::from(":memory:"),
        };
        schema::ensure_schema(&store.conn)?;
        Ok(store)
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new animal and return it with its assigned id
    pub fn insert(&self, name: &str, promoted: bool) -> Result<Animal> {
        self.conn
            .execute(
                "INSERT INTO animals (name, promoted) VALUES (?1, ?2)",
                params![name, promoted],
            )
            .map_err(|e| map_unique_violation(e, name))?;

        Ok(Animal {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            promoted,
        })
    }

    /// Overwrite an existing animal
    pub fn update(&self, animal: &Animal) -> Result<Animal> {
        let changed = self
            .conn
            .execute(
                "UPDATE animals SET name = ?1, promoted = ?2 WHERE id = ?3",
                params![animal.name, animal.promoted, animal.id],
            )
            .map_err(|e| map_unique_violation(e, &animal.name))?;

        if changed == 0 {
            return Err(Error::AnimalNotFound(animal.id));
        }
        Ok(animal.clone())
    }

    /// Get an animal by id
    pub fn find_by_id(&self, id: i64) -> Result<Option<Animal>> {
        let animal = self
            .conn
            .query_row(
                "SELECT id, name, promoted FROM animals WHERE id = ?1",
                [id],
                animal_from_row,
            )
            .optional()?;
        Ok(animal)
    }

    /// Get one page of animals ordered by id
    pub fn find_all(&self, request: &PageRequest) -> Result<Page<Animal>> {
        let total = self.count()?;
        let Some((limit, offset)) = request.sql_window() else {
            return Ok(Page::new(Vec::new(), request.clone(), total));
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, name, promoted FROM animals ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let animals = stmt
            .query_map(
                params![limit, offset],
                animal_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Page::new(animals, request.clone(), total))
    }

    /// Every stored animal, ordered by id
    pub fn list_all(&self) -> Result<Vec<Animal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, promoted FROM animals ORDER BY id")?;
        let animals = stmt
            .query_map([], animal_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(animals)
    }

    /// Delete an animal by id
    pub fn delete_by_id(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM animals WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::AnimalNotFound(id));
        }
        Ok(())
    }

    /// Count stored animals
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM animals", [], |row| row.get(0))?;
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

fn animal_from_row(row: &Row<'_>) -> rusqlite::Result<Animal> {
    Ok(Animal {
        id: row.get(0)?,
        name: row.get(1)?,
        promoted: row.get(2)?,
    })
}

fn map_unique_violation(err: rusqlite::Error, name: &str) -> Error {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        Error::DuplicateName(name.to_string())
    } else {
        Error::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let store = Store::open_memory().unwrap();
        assert_eq!(store.path().to_str(), Some(":memory:"));
        assert_eq!(store.database_size().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_find() {
        let store = Store::open_memory().unwrap();

        let otter = store.insert("Otter", false).unwrap();
        let lynx = store.insert("Lynx", true).unwrap();
        assert!(otter.id > 0);
        assert!(lynx.id > otter.id);

        let found = store.find_by_id(lynx.id).unwrap().unwrap();
        assert_eq!(found, lynx);
        assert!(store.find_by_id(9999).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_name() {
        let store = Store::open_memory().unwrap();
        store.insert("Otter", false).unwrap();

        let err = store.insert("Otter", true).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(name) if name == "Otter"));
    }

    #[test]
    fn test_update() {
        let store = Store::open_memory().unwrap();
        let mut animal = store.insert("Otter", false).unwrap();

        animal.name = "Sea Otter".to_string();
        animal.promoted = true;
        store.update(&animal).unwrap();

        let found = store.find_by_id(animal.id).unwrap().unwrap();
        assert_eq!(found.name, "Sea Otter");
        assert!(found.promoted);

        let missing = Animal {
            id: 4242,
            name: "Ghost".to_string(),
            promoted: false,
        };
        assert!(matches!(
            store.update(&missing).unwrap_err(),
            Error::AnimalNotFound(4242)
        ));
    }

    #[test]
    fn test_delete() {
        let store = Store::open_memory().unwrap();
        let animal = store.insert("Otter", false).unwrap();

        store.delete_by_id(animal.id).unwrap();
        assert!(store.find_by_id(animal.id).unwrap().is_none());
        assert!(matches!(
            store.delete_by_id(animal.id).unwrap_err(),
            Error::AnimalNotFound(_)
        ));
    }

    #[test]
    fn test_find_all_paged() {
        let store = Store::open_memory().unwrap();
        for name in ["Ant", "Bee", "Cat", "Dog", "Eel"] {
            store.insert(name, false).unwrap();
        }

        let page = store.find_all(&PageRequest::of(0, 2)).unwrap();
        assert_eq!(page.total, 5);
        let names: Vec<&str> = page.content.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ant", "Bee"]);

        let page = store.find_all(&PageRequest::of(2, 2)).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].name, "Eel");

        let page = store.find_all(&PageRequest::of(5, 2)).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn test_find_all_far_past_end_is_empty() {
        let store = Store::open_memory().unwrap();
        for name in ["Ant", "Bee", "Cat"] {
            store.insert(name, false).unwrap();
        }

        let page = store
            .find_all(&PageRequest::of(100_000_000_000_000_000, 100))
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 3);

        let page = store.find_all(&PageRequest::of(usize::MAX, usize::MAX)).unwrap();
        assert!(page.is_empty());
    }
}
