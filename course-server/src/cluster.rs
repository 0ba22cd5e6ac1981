//! Density-based clustering of candidate locations.
//!
//! DBSCAN over haversine metres. Points that are not density-reachable
//! from any core point get their own singleton cluster, so every input
//! has exactly one label. Labels are assigned in input order, which makes
//! the result deterministic for a fixed input ordering.

use std::collections::VecDeque;

use tracing::debug;

use crate::domain::geo::centroid;
use crate::domain::{CandidatePlace, Category, Coord, TransportMode, reindex};

/// Bonus applied to clusters that can host a complete outing.
const COMPLETE_OUTING_BONUS: f64 = 1.5;

/// Clustering parameters.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Neighbourhood radius for walking courses.
    pub walking_eps_m: f64,

    /// Neighbourhood radius for driving and transit courses.
    pub default_eps_m: f64,

    /// Minimum neighbourhood size (including the point) for a core point.
    pub min_points: usize,

    /// Pools at or below this size are not clustered.
    pub activation_threshold: usize,
}

impl ClusterConfig {
    pub fn eps_for(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_eps_m,
            TransportMode::Driving | TransportMode::Transit => self.default_eps_m,
        }
    }

    pub fn with_min_points(mut self, n: usize) -> Self {
        self.min_points = n;
        self
    }

    pub fn with_activation_threshold(mut self, n: usize) -> Self {
        self.activation_threshold = n;
        self
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            walking_eps_m: 1_300.0,
            default_eps_m: 10_000.0,
            min_points: 3,
            activation_threshold: 8,
        }
    }
}

/// Cluster label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub usize);

/// One label per input point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    labels: Vec<ClusterId>,
    cluster_count: usize,
}

impl ClusterAssignment {
    pub fn labels(&self) -> &[ClusterId] {
        &self.labels
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Input indices carrying `id`, ascending.
    pub fn members(&self, id: ClusterId) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == id)
            .map(|(i, _)| i)
            .collect()
    }
}

/// DBSCAN with a fixed radius and density threshold.
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    eps_m: f64,
    min_points: usize,
}

impl ClusterEngine {
    pub fn new(eps_m: f64, min_points: usize) -> Self {
        Self {
            eps_m,
            min_points: min_points.max(1),
        }
    }

    pub fn for_mode(config: &ClusterConfig, mode: TransportMode) -> Self {
        Self::new(config.eps_for(mode), config.min_points)
    }

    fn region(&self, points: &[Coord], i: usize) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| points[i].distance_m(p) <= self.eps_m)
            .map(|(j, _)| j)
            .collect()
    }

    pub fn assign(&self, points: &[Coord]) -> ClusterAssignment {
        let n = points.len();
        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut next = 0usize;

        for i in 0..n {
            if visited[i] {
                continue;
            }
            visited[i] = true;

            let neighbours = self.region(points, i);
            if neighbours.len() < self.min_points {
                continue;
            }

            let id = next;
            next += 1;
            labels[i] = Some(id);

            let mut queue: VecDeque<usize> = neighbours.into();
            while let Some(j) = queue.pop_front() {
                if labels[j].is_none() {
                    labels[j] = Some(id);
                }
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                let reach = self.region(points, j);
                if reach.len() >= self.min_points {
                    queue.extend(reach);
                }
            }
        }

        let dense = next;
        let labels = labels
            .into_iter()
            .map(|l| {
                ClusterId(l.unwrap_or_else(|| {
                    next += 1;
                    next - 1
                }))
            })
            .collect();

        debug!(points = n, dense, total = next, eps_m = self.eps_m, "clustered");

        ClusterAssignment {
            labels,
            cluster_count: next,
        }
    }

    /// Narrow `pool` to its most attractive cluster.
    ///
    /// Pinned places are always kept. When the cluster (plus pinned) holds
    /// fewer than `min_size` places, the nearest remaining candidates to
    /// the cluster centroid are added. Pool order is preserved and
    /// `original_index` is rewritten to the new positions.
    pub fn focus(&self, pool: &[CandidatePlace], min_size: usize) -> Vec<CandidatePlace> {
        if pool.is_empty() {
            return Vec::new();
        }

        let points: Vec<Coord> = pool.iter().map(|p| p.coordinates).collect();
        let assignment = self.assign(&points);

        let Some(best) = (0..assignment.cluster_count())
            .map(ClusterId)
            .max_by(|a, b| {
                attractiveness(pool, &assignment.members(*a))
                    .total_cmp(&attractiveness(pool, &assignment.members(*b)))
                    .then(b.cmp(a))
            })
        else {
            return pool.to_vec();
        };

        let members = assignment.members(best);
        let mut keep: Vec<bool> = assignment
            .labels()
            .iter()
            .zip(pool)
            .map(|(l, p)| *l == best || p.is_user_saved)
            .collect();

        let mut kept = keep.iter().filter(|k| **k).count();
        if kept < min_size {
            if let Some(centre) = centroid(members.iter().map(|&i| points[i])) {
                let mut rest: Vec<usize> = (0..pool.len()).filter(|&i| !keep[i]).collect();
                rest.sort_by(|&a, &b| {
                    centre
                        .distance_m(&points[a])
                        .total_cmp(&centre.distance_m(&points[b]))
                        .then(a.cmp(&b))
                });
                for i in rest.into_iter().take(min_size - kept) {
                    keep[i] = true;
                    kept += 1;
                }
            }
        }

        let mut focused: Vec<CandidatePlace> = pool
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(p, _)| p.clone())
            .collect();
        reindex(&mut focused);

        debug!(
            cluster = best.0,
            members = members.len(),
            kept = focused.len(),
            dropped = pool.len() - focused.len(),
            "focused candidate pool"
        );

        focused
    }
}

/// size × distinct-categories², boosted when the cluster can host a meal,
/// a coffee and something to do.
fn attractiveness(pool: &[CandidatePlace], members: &[usize]) -> f64 {
    let mut categories: Vec<Category> = members.iter().map(|&i| pool[i].category).collect();
    categories.sort();
    categories.dedup();

    let has = |c: Category| categories.contains(&c);
    let has_outing = categories
        .iter()
        .any(|c| !c.is_dining() && *c != Category::Other);
    let bonus = if has(Category::Food) && has(Category::Cafe) && has_outing {
        COMPLETE_OUTING_BONUS
    } else {
        1.0
    };

    let diversity = categories.len() as f64;
    members.len() as f64 * diversity * diversity * bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::offset_m;

    fn base() -> Coord {
        Coord::new(37.5445, 127.0560).unwrap()
    }

    fn place(i: usize, north: f64, east: f64, category: Category) -> CandidatePlace {
        CandidatePlace {
            name: format!("p{i}"),
            address: None,
            coordinates: offset_m(base(), north, east),
            category,
            rating: None,
            review_count: 0,
            trust_score: 0.5,
            original_index: i,
            is_user_saved: false,
            corroborated: false,
        }
    }

    #[test]
    fn two_groups_and_noise() {
        let points = vec![
            offset_m(base(), 0.0, 0.0),
            offset_m(base(), 100.0, 0.0),
            offset_m(base(), 0.0, 100.0),
            offset_m(base(), 20_000.0, 0.0),
            offset_m(base(), 20_100.0, 0.0),
            offset_m(base(), 20_000.0, 100.0),
            offset_m(base(), -50_000.0, 0.0),
        ];
        let assignment = ClusterEngine::new(500.0, 3).assign(&points);
        let labels = assignment.labels();

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
        assert_eq!(labels[6], ClusterId(2));
        assert_eq!(assignment.cluster_count(), 3);
    }

    #[test]
    fn border_point_joins_cluster_found_later() {
        // Point 0 is visited first and is not core, but it is within eps of
        // core point 1, so it must end up in that cluster, not as noise.
        let points = vec![
            offset_m(base(), -400.0, 0.0),
            offset_m(base(), 0.0, 0.0),
            offset_m(base(), 100.0, 0.0),
            offset_m(base(), 200.0, 0.0),
        ];
        let assignment = ClusterEngine::new(450.0, 3).assign(&points);
        assert_eq!(assignment.cluster_count(), 1);
        assert!(assignment.labels().iter().all(|l| *l == ClusterId(0)));
    }

    #[test]
    fn all_noise_gives_singletons() {
        let points: Vec<_> = (0..4)
            .map(|i| offset_m(base(), i as f64 * 5_000.0, 0.0))
            .collect();
        let assignment = ClusterEngine::new(100.0, 2).assign(&points);
        assert_eq!(assignment.cluster_count(), 4);
        let ids: Vec<_> = assignment.labels().iter().map(|l| l.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn eps_depends_on_mode() {
        let config = ClusterConfig::default();
        assert_eq!(config.eps_for(TransportMode::Walking), 1_300.0);
        assert_eq!(config.eps_for(TransportMode::Transit), 10_000.0);
    }

    #[test]
    fn focus_prefers_diverse_cluster_and_keeps_pinned() {
        let mut pool = vec![
            // Diverse cluster near base.
            place(0, 0.0, 0.0, Category::Food),
            place(1, 50.0, 0.0, Category::Cafe),
            place(2, 0.0, 50.0, Category::Museum),
            // Larger but monotonous cluster 30 km away.
            place(3, 30_000.0, 0.0, Category::Shopping),
            place(4, 30_050.0, 0.0, Category::Shopping),
            place(5, 30_000.0, 50.0, Category::Shopping),
            place(6, 30_050.0, 50.0, Category::Shopping),
            // Far pinned place.
            place(7, -40_000.0, 0.0, Category::Landmark),
        ];
        pool[7].is_user_saved = true;

        let focused = ClusterEngine::new(1_300.0, 3).focus(&pool, 3);
        let names: Vec<_> = focused.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["p0", "p1", "p2", "p7"]);
        assert!(focused.iter().enumerate().all(|(i, p)| p.original_index == i));
    }

    #[test]
    fn focus_pads_with_nearest() {
        let pool = vec![
            place(0, 0.0, 0.0, Category::Food),
            place(1, 50.0, 0.0, Category::Cafe),
            place(2, 0.0, 50.0, Category::Museum),
            place(3, 9_000.0, 0.0, Category::Landmark),
            place(4, 3_000.0, 0.0, Category::Landmark),
        ];
        let focused = ClusterEngine::new(1_300.0, 3).focus(&pool, 4);
        let names: Vec<_> = focused.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["p0", "p1", "p2", "p4"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn points_strategy() -> impl Strategy<Value = Vec<Coord>> {
            prop::collection::vec((-3_000.0f64..3_000.0, -3_000.0f64..3_000.0), 0..30)
                .prop_map(|v| v.into_iter().map(|(n, e)| offset_m(base(), n, e)).collect())
        }

        proptest! {
            #[test]
            fn every_point_labelled_and_deterministic(
                points in points_strategy(),
                eps in 50.0f64..2_000.0,
                min_points in 1usize..5,
            ) {
                let engine = ClusterEngine::new(eps, min_points);
                let a = engine.assign(&points);
                let b = engine.assign(&points);
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(a.labels().len(), points.len());
                for l in a.labels() {
                    prop_assert!(l.0 < a.cluster_count());
                }
                for id in 0..a.cluster_count() {
                    prop_assert!(!a.members(ClusterId(id)).is_empty());
                }
            }

            #[test]
            fn min_points_one_means_no_singleton_noise(
                points in points_strategy(),
            ) {
                // With min_points = 1 every point is core, so clusters are
                // exactly the eps-connected components.
                let engine = ClusterEngine::new(500.0, 1);
                let a = engine.assign(&points);
                for (i, p) in points.iter().enumerate() {
                    for (j, q) in points.iter().enumerate() {
                        if p.distance_m(q) <= 500.0 {
                            prop_assert_eq!(a.labels()[i], a.labels()[j]);
                        }
                    }
                }
            }
        }
    }
}
