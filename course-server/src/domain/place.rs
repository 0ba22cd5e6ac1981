//! Search hits, saved places and scored candidates.

use serde::{Deserialize, Serialize};

use super::{Category, Coord};

fn default_confidence() -> f64 {
    0.5
}

/// One result from the search collaborator, consumed once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub name: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub coordinates: Option<Coord>,

    /// Free-text category as reported by the source ("카페", "restaurant", ...).
    #[serde(default)]
    pub category_hint: String,

    /// Source confidence in [0, 1]. Higher wins when duplicates merge.
    #[serde(default = "default_confidence")]
    pub source_confidence: f64,

    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default)]
    pub review_count: Option<u32>,

    /// Query that produced this hit. Hits for the same place from two
    /// different queries count as corroborated.
    #[serde(default)]
    pub source_query: Option<String>,
}

impl RawHit {
    /// Minimal hit with a name and coordinates, for fixtures and tests.
    pub fn new(name: impl Into<String>, coordinates: Coord, category_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            coordinates: Some(coordinates),
            category_hint: category_hint.into(),
            source_confidence: default_confidence(),
            rating: None,
            review_count: None,
            source_query: None,
        }
    }

    pub fn with_rating(mut self, rating: f64, review_count: u32) -> Self {
        self.rating = Some(rating);
        self.review_count = Some(review_count);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.source_confidence = confidence;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.source_query = Some(query.into());
        self
    }
}

/// A place the user saved beforehand. Always included in the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlace {
    pub name: String,
    pub coordinates: Coord,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// A deduplicated, scored place in the candidate pool.
///
/// `trust_score` is fixed when the candidate is built. `original_index` is
/// the position in the ranked pool and is what course indices refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePlace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub coordinates: Coord,
    pub category: Category,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub trust_score: f64,
    pub original_index: usize,
    pub is_user_saved: bool,
    #[serde(default)]
    pub corroborated: bool,
}

/// Rewrite `original_index` to match each candidate's position.
pub fn reindex(pool: &mut [CandidatePlace]) {
    for (i, place) in pool.iter_mut().enumerate() {
        place.original_index = i;
    }
}
