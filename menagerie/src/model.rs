//! Animal entity and its transfer object

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Document type of animals in the search index
pub const ANIMAL_DOC_TYPE: &str = "animal";

/// An animal as stored in the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub promoted: bool,
}

/// Transfer shape used by the service and its callers
///
/// `score` is only set on search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimalDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub promoted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl AnimalDto {
    /// A DTO for a not-yet-created animal
    pub fn new(name: impl Into<String>, promoted: bool) -> Self {
        AnimalDto {
            id: None,
            name: Some(name.into()),
            promoted,
            score: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// The trimmed name, or a validation error when it is missing or blank
    pub fn require_name(&self) -> Result<&str> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(Error::Validation("name is required".to_string())),
        }
    }
}

impl From<Animal> for AnimalDto {
    fn from(animal: Animal) -> Self {
        AnimalDto {
            id: Some(animal.id),
            name: Some(animal.name),
            promoted: animal.promoted,
            score: None,
        }
    }
}
