//! Animal service
//!
//! Ties the record store, the search index mirror and the ranked search
//! together. Writes go to the store first and are then mirrored into the
//! index. The two steps are not atomic: the store is the source of truth, an
//! index failure is logged and swallowed, and [`AnimalService::reindex_all`]
//! repairs any drift.

use crate::error::{Error, Result};
use crate::index::SearchIndex;
use crate::model::{Animal, AnimalDto};
use crate::page::{Page, PageRequest};
use crate::search::Searcher;
use crate::store::Store;
use std::time::{Duration, Instant};

/// Statistics from a reindex
#[derive(Debug, Clone, Default)]
pub struct ReindexStats {
    /// Animals pushed into the index
    pub indexed: usize,
    /// Animals the index rejected
    pub errors: usize,
    /// Time taken
    pub duration: Duration,
}

/// Service for managing animals
pub struct AnimalService<I: SearchIndex> {
    store: Store,
    index: I,
    index_name: String,
}

impl<I: SearchIndex> AnimalService<I> {
    pub fn new(store: Store, index: I, index_name: impl Into<String>) -> Self {
        AnimalService {
            store,
            index,
            index_name: index_name.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Create a new animal
    pub fn create(&self, dto: &AnimalDto) -> Result<AnimalDto> {
        tracing::debug!("Request to create Animal : {:?}", dto);
        if dto.id.is_some() {
            return Err(Error::Validation(
                "A new animal cannot already have an ID".to_string(),
            ));
        }
        let name = dto.require_name()?;

        let animal = self.store.insert(name, dto.promoted)?;
        self.mirror_save(&animal);
        Ok(animal.into())
    }

    /// Update an existing animal
    pub fn update(&self, dto: &AnimalDto) -> Result<AnimalDto> {
        tracing::debug!("Request to update Animal : {:?}", dto);
        let id = dto
            .id
            .ok_or_else(|| Error::Validation("Invalid id".to_string()))?;
        let name = dto.require_name()?;

        let animal = self.store.update(&Animal {
            id,
            name: name.to_string(),
            promoted: dto.promoted,
        })?;
        self.mirror_save(&animal);
        Ok(animal.into())
    }

    /// Create or update depending on whether the DTO carries an id
    pub fn save(&self, dto: &AnimalDto) -> Result<AnimalDto> {
        match dto.id {
            None => self.create(dto),
            Some(_) => self.update(dto),
        }
    }

    /// Get one page of animals, unscored
    pub fn find_all(&self, request: &PageRequest) -> Result<Page<AnimalDto>> {
        tracing::debug!("Request to get all Animals");
        if request.size == 0 {
            return Err(Error::InvalidQuery("page size must be greater than 0".to_string()));
        }
        Ok(self.store.find_all(request)?.map(AnimalDto::from))
    }

    /// Get one animal by id
    pub fn find_one(&self, id: i64) -> Result<Option<AnimalDto>> {
        tracing::debug!("Request to get Animal : {}", id);
        Ok(self.store.find_by_id(id)?.map(AnimalDto::from))
    }

    /// Delete an animal by id
    pub fn delete(&self, id: i64) -> Result<()> {
        tracing::debug!("Request to delete Animal : {}", id);
        self.store.delete_by_id(id)?;
        if let Err(e) = self.index.delete_by_id(id) {
            tracing::warn!("Animal {} deleted but index removal failed: {}", id, e);
        }
        Ok(())
    }

    /// Ranked search for animals matching `term`, shuffled under `seed`
    pub fn search(&self, term: &str, seed: &str, request: &PageRequest) -> Result<Page<AnimalDto>> {
        tracing::debug!("Request to search for a page of Animals for query {}", term);
        Searcher::new(&self.index, &self.index_name).search(term, seed, request)
    }

    /// Push every stored animal into the index
    pub fn reindex_all(&self) -> Result<ReindexStats> {
        tracing::info!("Reindexing all Animals into '{}'", self.index_name);
        let start = Instant::now();
        let mut stats = ReindexStats::default();

        for animal in self.store.list_all()? {
            match self.index.save(&animal) {
                Ok(()) => stats.indexed += 1,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!("Error indexing animal {}: {}", animal.id, e);
                }
            }
        }

        stats.duration = start.elapsed();
        tracing::info!(
            "Reindexed {} animals ({} errors) in {:?}",
            stats.indexed,
            stats.errors,
            stats.duration
        );
        Ok(stats)
    }

    fn mirror_save(&self, animal: &Animal) {
        if let Err(e) = self.index.save(animal) {
            tracing::warn!("Animal {} saved but indexing failed: {}", animal.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RawHits, SqliteIndex};
    use crate::search::SearchQuery;
    use std::cell::Cell;

    fn service() -> AnimalService<SqliteIndex> {
        AnimalService::new(
            Store::open_memory().unwrap(),
            SqliteIndex::open_memory("animal").unwrap(),
            "animal",
        )
    }

    /// Index that can be switched off to simulate an unreachable mirror
    struct FlakyIndex {
        inner: SqliteIndex,
        down: Cell<bool>,
    }

    impl FlakyIndex {
        fn check(&self) -> Result<()> {
            if self.down.get() {
                Err(Error::IndexError("index unreachable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl SearchIndex for FlakyIndex {
        fn save(&self, animal: &Animal) -> Result<()> {
            self.check()?;
            self.inner.save(animal)
        }

        fn delete_by_id(&self, id: i64) -> Result<()> {
            self.check()?;
            self.inner.delete_by_id(id)
        }

        fn execute(&self, query: &SearchQuery) -> Result<RawHits> {
            self.check()?;
            self.inner.execute(query)
        }
    }

    #[test]
    fn test_create_mirrors_into_index() {
        let service = service();
        let created = service.create(&AnimalDto::new("Otter", true)).unwrap();

        assert!(created.id.is_some());
        assert!(created.score.is_none());
        assert_eq!(service.index().count(Some("animal")).unwrap(), 1);
    }

    #[test]
    fn test_create_rejects_id_before_touching_store() {
        let service = service();
        let err = service
            .create(&AnimalDto::new("Otter", false).with_id(5))
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(service.store().count().unwrap(), 0);
        assert_eq!(service.index().count(None).unwrap(), 0);
    }

    #[test]
    fn test_create_requires_name() {
        let service = service();
        let err = service.create(&AnimalDto::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg == "name is required"));
        assert_eq!(service.store().count().unwrap(), 0);
    }

    #[test]
    fn test_update() {
        let service = service();
        let created = service.create(&AnimalDto::new("Otter", false)).unwrap();
        let id = created.id.unwrap();

        let updated = service
            .save(&AnimalDto::new("Sea Otter", true).with_id(id))
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Sea Otter"));

        let page = service.search("sea", "x", &PageRequest::of(0, 10)).unwrap();
        assert_eq!(page.content.len(), 1);
        assert!(page.content[0].promoted);
    }

    #[test]
    fn test_update_errors() {
        let service = service();
        let err = service.update(&AnimalDto::new("Otter", false)).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg == "Invalid id"));

        let err = service
            .update(&AnimalDto::new("Otter", false).with_id(77))
            .unwrap_err();
        assert!(matches!(err, Error::AnimalNotFound(77)));
    }

    #[test]
    fn test_delete() {
        let service = service();
        let id = service.create(&AnimalDto::new("Otter", false)).unwrap().id.unwrap();

        service.delete(id).unwrap();
        assert!(service.find_one(id).unwrap().is_none());
        assert_eq!(service.index().count(None).unwrap(), 0);
        assert!(matches!(service.delete(id).unwrap_err(), Error::AnimalNotFound(_)));
    }

    #[test]
    fn test_find_all_has_no_scores() {
        let service = service();
        for name in ["Ant", "Bee", "Cat"] {
            service.create(&AnimalDto::new(name, false)).unwrap();
        }

        let page = service.find_all(&PageRequest::of(0, 2)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.content.len(), 2);
        assert!(page.content.iter().all(|d| d.score.is_none()));
    }

    #[test]
    fn test_index_failure_does_not_fail_write() {
        let index = FlakyIndex {
            inner: SqliteIndex::open_memory("animal").unwrap(),
            down: Cell::new(true),
        };
        let service = AnimalService::new(Store::open_memory().unwrap(), index, "animal");

        let created = service.create(&AnimalDto::new("Otter", false)).unwrap();
        assert!(created.id.is_some());
        assert_eq!(service.index().inner.count(None).unwrap(), 0);

        // Repair drift once the index is back
        service.index().down.set(false);
        let stats = service.reindex_all().unwrap();
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.errors, 0);

        let page = service.search("otter", "s", &PageRequest::of(0, 10)).unwrap();
        assert_eq!(page.content.len(), 1);
    }

    #[test]
    fn test_reindex_counts_errors() {
        let index = FlakyIndex {
            inner: SqliteIndex::open_memory("animal").unwrap(),
            down: Cell::new(false),
        };
        let service = AnimalService::new(Store::open_memory().unwrap(), index, "animal");
        service.create(&AnimalDto::new("Otter", false)).unwrap();
        service.create(&AnimalDto::new("Lynx", false)).unwrap();

        service.index().down.set(true);
        let stats = service.reindex_all().unwrap();
        assert_eq!(stats.indexed, 0);
        assert_eq!(stats.errors, 2);
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let service = service();
        service.create(&AnimalDto::new("Otter", false)).unwrap();
        service.create(&AnimalDto::new("Lynx", true)).unwrap();

        service.reindex_all().unwrap();
        service.reindex_all().unwrap();
        assert_eq!(service.index().count(None).unwrap(), 2);
    }
}
