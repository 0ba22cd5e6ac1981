//! Search backend that serves hits from a JSON file.
//!
//! Useful for development without search credentials. The file holds a
//! list of [`RawHit`]s. Hits tagged with a `source_query` are returned for
//! that query only; untagged hits are returned for every query.

use std::path::Path;
use std::sync::Arc;

use crate::domain::RawHit;

use super::{PlaceSearch, SearchError};

#[derive(Debug, Clone)]
pub struct FixtureSearch {
    hits: Arc<Vec<RawHit>>,
}

impl FixtureSearch {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SearchError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let hits: Vec<RawHit> = serde_json::from_str(&json).map_err(|e| SearchError::Json {
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Self::from_hits(hits))
    }

    pub fn from_hits(hits: Vec<RawHit>) -> Self {
        Self {
            hits: Arc::new(hits),
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl PlaceSearch for FixtureSearch {
    async fn search(&self, query: &str) -> Result<Vec<RawHit>, SearchError> {
        Ok(self
            .hits
            .iter()
            .filter(|h| h.source_query.as_deref().is_none_or(|q| q == query))
            .cloned()
            .map(|mut h| {
                h.source_query = Some(query.to_string());
                h
            })
            .collect())
    }
}
