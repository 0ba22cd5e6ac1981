//! The assembled course and its structural invariants.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::category::breaks_continuity;
use super::{CandidatePlace, DomainError};

/// An ordered selection of stops from a candidate pool.
///
/// Construction checks that `sequence` is a permutation of `places`,
/// that every index exists in the pool, that every stop has a visit
/// duration, and that no two dining stops are adjacent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    places: Vec<usize>,
    sequence: Vec<usize>,
    durations: BTreeMap<usize, u32>,
}

impl Course {
    pub fn new(
        pool: &[CandidatePlace],
        places: Vec<usize>,
        sequence: Vec<usize>,
        durations: BTreeMap<usize, u32>,
    ) -> Result<Self, DomainError> {
        if places.is_empty() {
            return Err(DomainError::EmptyCourse);
        }

        let mut seen = HashSet::with_capacity(places.len());
        for &index in &places {
            if index >= pool.len() {
                return Err(DomainError::IndexOutOfRange {
                    index,
                    len: pool.len(),
                });
            }
            if !seen.insert(index) {
                return Err(DomainError::DuplicateIndex(index));
            }
        }

        if sequence.len() != places.len() {
            return Err(DomainError::SequenceMismatch {
                places: places.len(),
                sequence: sequence.len(),
            });
        }
        let mut remaining = seen;
        for &index in &sequence {
            if !remaining.remove(&index) {
                return Err(DomainError::NotInPlaces(index));
            }
        }

        if let Some(&missing) = places.iter().find(|i| !durations.contains_key(i)) {
            return Err(DomainError::MissingDuration(missing));
        }

        if let Some(position) = sequence
            .windows(2)
            .position(|w| breaks_continuity(pool[w[0]].category, pool[w[1]].category))
        {
            return Err(DomainError::ConsecutiveDining { position });
        }

        Ok(Self {
            places,
            sequence,
            durations,
        })
    }

    /// Selected pool indices, in selection order.
    pub fn places(&self) -> &[usize] {
        &self.places
    }

    /// Visiting order.
    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    /// Visit duration per pool index, in minutes.
    pub fn durations(&self) -> &BTreeMap<usize, u32> {
        &self.durations
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Minutes spent at stops, excluding travel.
    pub fn visit_minutes(&self) -> u32 {
        self.durations.values().sum()
    }

    /// Consecutive `(from, to)` pool index pairs in visiting order.
    pub fn legs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sequence.windows(2).map(|w| (w[0], w[1]))
    }
}
