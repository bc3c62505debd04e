//! # Menagerie
//!
//! Animal records backed by SQLite, mirrored into a full-text index, with a
//! seed-stable ranked search.
//!
//! Menagerie provides:
//! - **Record store** for animals (id, unique name, promoted flag)
//! - **Search index mirror** via SQLite FTS5, kept in step on every write
//! - **Ranked search**: phrase-prefix matching on the name, ordered by a
//!   salted pseudo-random score that keeps promoted animals on top and
//!   reshuffles everything else per seed
//! - **MCP server** for AI agent integration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use menagerie::{AnimalDto, AnimalService, PageRequest, SqliteIndex, Store};
//!
//! let store = Store::open("~/.cache/menagerie/animals.sqlite").unwrap();
//! let index = SqliteIndex::open("~/.cache/menagerie/index.sqlite", "animal").unwrap();
//! let service = AnimalService::new(store, index, "animal");
//!
//! service.create(&AnimalDto::new("Big Brown Bear", true)).unwrap();
//!
//! // Same seed, same order
//! let page = service.search("big bro", "my-session", &PageRequest::of(0, 20)).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod mcp;
pub mod model;
pub mod page;
pub mod search;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use index::{SearchIndex, SqliteIndex};
pub use model::{Animal, AnimalDto};
pub use page::{Page, PageRequest};
pub use search::{SearchQuery, Searcher};
pub use service::{AnimalService, ReindexStats};
pub use store::Store;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn data_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("menagerie")
}

/// Default record store path
pub fn default_db_path() -> std::path::PathBuf {
    data_dir().join("animals.sqlite")
}

/// Default search index path
pub fn default_index_path() -> std::path::PathBuf {
    data_dir().join("index.sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_are_distinct() {
        assert_ne!(default_db_path(), default_index_path());
        assert!(default_db_path().ends_with("menagerie/animals.sqlite"));
    }
}
