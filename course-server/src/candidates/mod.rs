//! Candidate scoring: merge raw search hits into a ranked, deduplicated pool.
//!
//! Hits are grouped by [`DedupKey`] (normalised name plus a ~50 m grid cell).
//! Each group keeps the fields of its highest-confidence hit, borrowing
//! rating, reviews and address from the others when that hit lacks them.
//! Saved places seed their own groups and absorb any hits that collide with
//! them. The pool is ranked pinned-first, then by trust score, with ties
//! left in discovery order.

mod config;
mod normalize;
mod score;

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::domain::{CandidatePlace, Category, Coord, RawHit, SavedPlace, reindex};

pub use config::ScoringConfig;
pub use normalize::{DedupKey, clean_name, normalize_name, short_title};
pub use score::{TrustInputs, trust_score};

/// Result of scoring: a usable pool, or the survivors of a pool too small
/// to build a course from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoredPool {
    Ready(Vec<CandidatePlace>),
    Insufficient {
        candidates: Vec<CandidatePlace>,
        required: usize,
    },
}

impl ScoredPool {
    pub fn candidates(&self) -> &[CandidatePlace] {
        match self {
            ScoredPool::Ready(c) | ScoredPool::Insufficient { candidates: c, .. } => c,
        }
    }

    pub fn into_candidates(self) -> Vec<CandidatePlace> {
        match self {
            ScoredPool::Ready(c) | ScoredPool::Insufficient { candidates: c, .. } => c,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, ScoredPool::Insufficient { .. })
    }
}

/// A place being assembled from one or more hits.
struct Group {
    discovery: usize,
    pinned: bool,
    name: String,
    address: Option<String>,
    coordinates: Coord,
    category: Category,
    confidence: f64,
    rating: Option<(f64, f64)>,
    review_count: Option<(u32, f64)>,
    queries: BTreeSet<String>,
}

impl Group {
    fn from_saved(place: &SavedPlace, discovery: usize) -> Self {
        Self {
            discovery,
            pinned: true,
            name: place.name.trim().to_string(),
            address: place.address.clone(),
            coordinates: place.coordinates,
            category: place
                .category
                .as_deref()
                .map(Category::from_hint)
                .unwrap_or(Category::Other),
            confidence: f64::INFINITY,
            rating: None,
            review_count: None,
            queries: BTreeSet::new(),
        }
    }

    fn from_hit(hit: &RawHit, name: String, coordinates: Coord, discovery: usize) -> Self {
        let confidence = hit.source_confidence;
        Self {
            discovery,
            pinned: false,
            name,
            address: hit.address.clone(),
            coordinates,
            category: Category::from_hint(&hit.category_hint),
            confidence,
            rating: hit.rating.filter(|r| *r > 0.0).map(|r| (r, confidence)),
            review_count: hit.review_count.map(|n| (n, confidence)),
            queries: hit.source_query.iter().cloned().collect(),
        }
    }

    /// Fold another hit for the same place into this group.
    fn absorb(&mut self, hit: &RawHit, name: String, coordinates: Coord) {
        let confidence = hit.source_confidence;

        if !self.pinned && confidence > self.confidence {
            self.name = name;
            self.coordinates = coordinates;
            self.confidence = confidence;
            let category = Category::from_hint(&hit.category_hint);
            if category != Category::Other || self.category == Category::Other {
                self.category = category;
            }
            if hit.address.is_some() {
                self.address = hit.address.clone();
            }
        } else if self.address.is_none() {
            self.address = hit.address.clone();
        }

        if self.pinned && self.category == Category::Other {
            self.category = Category::from_hint(&hit.category_hint);
        }

        if let Some(r) = hit.rating.filter(|r| *r > 0.0) {
            if self.rating.is_none_or(|(_, c)| confidence > c) {
                self.rating = Some((r, confidence));
            }
        }
        if let Some(n) = hit.review_count {
            if self.review_count.is_none_or(|(_, c)| confidence > c) {
                self.review_count = Some((n, confidence));
            }
        }
        if let Some(q) = &hit.source_query {
            self.queries.insert(q.clone());
        }
    }

    fn into_candidate(self, config: &ScoringConfig) -> CandidatePlace {
        let rating = self.rating.map(|(r, _)| r);
        let review_count = self.review_count.map(|(n, _)| n).unwrap_or(0);
        let corroborated = self.queries.len() >= 2;
        let trust = trust_score(
            &TrustInputs {
                rating,
                review_count,
                corroborated,
                category: self.category,
            },
            config,
        );

        CandidatePlace {
            name: self.name,
            address: self.address,
            coordinates: self.coordinates,
            category: self.category,
            rating,
            review_count,
            trust_score: trust,
            original_index: self.discovery,
            is_user_saved: self.pinned,
            corroborated,
        }
    }
}

/// Builds the ranked candidate pool.
#[derive(Debug, Clone, Default)]
pub struct CandidateScorer {
    config: ScoringConfig,
}

impl CandidateScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn dedup_key(&self, name: &str, at: Coord) -> DedupKey {
        DedupKey::new(name, at, self.config.dedup_grid_m)
    }

    /// Merge, score and rank `hits`, with `pinned` places always first.
    pub fn score(&self, hits: &[RawHit], pinned: &[SavedPlace]) -> ScoredPool {
        let mut groups: Vec<Group> = Vec::new();
        let mut by_key: HashMap<DedupKey, usize> = HashMap::new();

        for saved in pinned {
            let key = self.dedup_key(saved.name.trim(), saved.coordinates);
            if by_key.contains_key(&key) {
                debug!(name = %saved.name, "duplicate saved place merged");
                continue;
            }
            by_key.insert(key, groups.len());
            groups.push(Group::from_saved(saved, groups.len()));
        }

        let (mut located, mut unnamed) = (0usize, 0usize);
        for hit in hits {
            let Some(coordinates) = hit.coordinates.and_then(|c| c.validated().ok()) else {
                continue;
            };
            located += 1;

            let name = clean_name(&hit.name);
            let key = self.dedup_key(&name, coordinates);
            if key.name().is_empty() {
                unnamed += 1;
                continue;
            }

            match by_key.get(&key) {
                Some(&slot) => groups[slot].absorb(hit, name, coordinates),
                None => {
                    by_key.insert(key, groups.len());
                    groups.push(Group::from_hit(hit, name, coordinates, groups.len()));
                }
            }
        }

        let merged = groups.len();
        let mut candidates: Vec<CandidatePlace> = groups
            .into_iter()
            .map(|g| g.into_candidate(&self.config))
            .filter(|c| self.passes_quality_floor(c))
            .collect();

        // Stable: pinned keep input order, ties keep discovery order.
        candidates.sort_by(|a, b| {
            b.is_user_saved
                .cmp(&a.is_user_saved)
                .then_with(|| {
                    if a.is_user_saved {
                        std::cmp::Ordering::Equal
                    } else {
                        b.trust_score.total_cmp(&a.trust_score)
                    }
                })
                .then_with(|| a.original_index.cmp(&b.original_index))
        });

        let pinned_count = candidates.iter().filter(|c| c.is_user_saved).count();
        candidates.truncate(self.config.max_candidates.max(pinned_count));
        reindex(&mut candidates);

        debug!(
            hits = hits.len(),
            located,
            unnamed,
            merged,
            pinned = pinned_count,
            kept = candidates.len(),
            "scored candidate pool"
        );

        if candidates.len() < self.config.min_viable {
            ScoredPool::Insufficient {
                candidates,
                required: self.config.min_viable,
            }
        } else {
            ScoredPool::Ready(candidates)
        }
    }

    fn passes_quality_floor(&self, place: &CandidatePlace) -> bool {
        if place.is_user_saved || !place.category.is_dining() {
            return true;
        }
        match (self.config.min_dining_rating, place.rating) {
            (Some(floor), Some(rating)) => rating >= floor,
            _ => true,
        }
    }
}
