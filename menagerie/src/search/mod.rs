//! Ranked search over the index mirror
//!
//! A search takes a free-text term and a caller-supplied seed. The term
//! becomes a phrase-prefix match on the animal name; the seed becomes a salt
//! that drives a per-document pseudo-random score. Promoted animals get a
//! boost large enough to always rank above the rest, and the remaining order
//! is a shuffle that stays the same for as long as the caller keeps the seed.

pub mod extract;
pub mod phrase;
pub mod scoring;

use crate::error::{Error, Result};
use crate::index::SearchIndex;
use crate::model::AnimalDto;
use crate::page::{Page, PageRequest};

pub use extract::extract_results;
pub use phrase::PhrasePrefix;
pub use scoring::{document_score, salt_from_seed};

/// Token positions a phrase-prefix match may stray over
pub const PHRASE_PREFIX_SLOP: usize = 3;

/// Descending sort on the salted document score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSort {
    pub salt: i32,
}

/// Everything the index needs to run one ranked search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Index the query is addressed to
    pub index: String,
    /// Match clause on the name field
    pub phrase: PhrasePrefix,
    /// Sort clause; always score descending
    pub sort: ScoreSort,
    /// Page window, never carrying a caller sort
    pub page: PageRequest,
}

impl SearchQuery {
    /// Build the query for `term` under `seed`
    ///
    /// Any sort on `page` is dropped: results are always ordered by score.
    pub fn new(index: &str, term: &str, seed: &str, page: &PageRequest) -> Self {
        SearchQuery {
            index: index.to_string(),
            phrase: PhrasePrefix::new(term, PHRASE_PREFIX_SLOP),
            sort: ScoreSort {
                salt: salt_from_seed(seed),
            },
            page: page.without_sort(),
        }
    }
}

/// Runs ranked searches against an index
pub struct Searcher<'a, I: SearchIndex + ?Sized> {
    index: &'a I,
    index_name: &'a str,
}

impl<'a, I: SearchIndex + ?Sized> Searcher<'a, I> {
    pub fn new(index: &'a I, index_name: &'a str) -> Self {
        Searcher { index, index_name }
    }

    /// One page of animals matching `term`, ranked under `seed`
    pub fn search(&self, term: &str, seed: &str, page: &PageRequest) -> Result<Page<AnimalDto>> {
        if page.size == 0 {
            return Err(Error::InvalidQuery("page size must be greater than 0".to_string()));
        }

        let query = SearchQuery::new(self.index_name, term, seed, page);
        if !page.sort.is_empty() {
            tracing::debug!("Ignoring caller sort {:?}; search results are ranked by score", page.sort);
        }

        let hits = self.index.execute(&query)?;
        extract_results(hits, query.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SqliteIndex;
    use crate::model::Animal;

    fn index_with(animals: &[(i64, &str, bool)]) -> SqliteIndex {
        let index = SqliteIndex::open_memory("animal").unwrap();
        for &(id, name, promoted) in animals {
            index
                .save(&Animal {
                    id,
                    name: name.to_string(),
                    promoted,
                })
                .unwrap();
        }
        index
    }

    #[test]
    fn test_query_discards_caller_sort() {
        let page = PageRequest {
            page: 1,
            size: 9,
            sort: vec!["name,asc".to_string(), "id,desc".to_string()],
        };
        let query = SearchQuery::new("animal", "cat", "abc", &page);
        assert!(query.page.sort.is_empty());
        assert_eq!(query.page.page, 1);
        assert_eq!(query.page.size, 9);
        assert_eq!(query.sort.salt, salt_from_seed("abc"));
        assert_eq!(query.phrase.slop(), PHRASE_PREFIX_SLOP);
    }

    #[test]
    fn test_search_scores_and_order() {
        let index = index_with(&[
            (1, "Cat", false),
            (2, "Catfish", false),
            (3, "Wild Cat", true),
            (4, "Dog", false),
        ]);
        let searcher = Searcher::new(&index, "animal");

        let page = searcher.search("cat", "s1", &PageRequest::of(0, 10)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.content[0].id, Some(3));

        let salt = salt_from_seed("s1");
        for dto in &page.content {
            assert_eq!(
                dto.score,
                Some(document_score(salt, dto.id.unwrap(), dto.promoted))
            );
        }
    }

    #[test]
    fn test_search_same_seed_is_reproducible() {
        let animals: Vec<(i64, String, bool)> = (1..=25)
            .map(|i| (i, format!("Parrot {}", i), i % 7 == 0))
            .collect();
        let refs: Vec<(i64, &str, bool)> = animals
            .iter()
            .map(|(i, n, p)| (*i, n.as_str(), *p))
            .collect();
        let index = index_with(&refs);
        let searcher = Searcher::new(&index, "animal");

        let first = searcher.search("parrot", "session", &PageRequest::of(0, 25)).unwrap();
        let second = searcher.search("parrot", "session", &PageRequest::of(0, 25)).unwrap();
        assert_eq!(first.content, second.content);

        let other = searcher.search("parrot", "another", &PageRequest::of(0, 25)).unwrap();
        let ids = |p: &Page<AnimalDto>| p.content.iter().map(|d| d.id).collect::<Vec<_>>();
        assert_ne!(ids(&first), ids(&other));
    }

    #[test]
    fn test_search_no_matches() {
        let index = index_with(&[(1, "Cat", false)]);
        let searcher = Searcher::new(&index, "animal");

        let page = searcher.search("zebra", "", &PageRequest::of(0, 10)).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_search_rejects_zero_size() {
        let index = index_with(&[]);
        let searcher = Searcher::new(&index, "animal");

        let err = searcher.search("cat", "", &PageRequest::of(0, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }
}
