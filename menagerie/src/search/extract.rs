//! Turns raw index hits into a page of scored animals

use crate::error::{Error, Result};
use crate::index::{RawHit, RawHits};
use crate::model::{Animal, AnimalDto, ANIMAL_DOC_TYPE};
use crate::page::{Page, PageRequest};

/// Map raw hits into scored DTOs
///
/// Hits of any other document type are dropped. The page total is the index's
/// total hit count.
pub fn extract_results(hits: RawHits, request: PageRequest) -> Result<Page<AnimalDto>> {
    let content = hits
        .hits
        .into_iter()
        .filter(|hit| hit.doc_type.eq_ignore_ascii_case(ANIMAL_DOC_TYPE))
        .map(scored_dto)
        .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(content, request, hits.total))
}

fn scored_dto(hit: RawHit) -> Result<AnimalDto> {
    let key = hit
        .sort
        .first()
        .ok_or_else(|| Error::IndexError("Hit carries no sort key".to_string()))?;
    let score: f64 = key
        .parse()
        .map_err(|_| Error::IndexError(format!("Sort key is not a number: {}", key)))?;

    let animal: Animal = serde_json::from_value(hit.source)
        .map_err(|e| Error::IndexError(format!("Malformed animal document: {}", e)))?;

    Ok(AnimalDto::from(animal).with_score(score))
}
