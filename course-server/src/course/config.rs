//! Assembly configuration and per-category defaults.

use std::time::Duration;

use crate::domain::{Category, TransportMode};

/// Visit time and spend assumed for a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProfile {
    /// Minutes spent at the stop.
    pub visit_minutes: u32,
    /// Estimated spend per person (KRW).
    pub cost_per_person: f64,
}

/// Defaults per category. Museums take longest, then cafés, then sights.
#[derive(Debug, Clone)]
pub struct CategoryProfiles {
    pub food: CategoryProfile,
    pub cafe: CategoryProfile,
    pub museum: CategoryProfile,
    pub landmark: CategoryProfile,
    pub activity: CategoryProfile,
    pub shopping: CategoryProfile,
    pub other: CategoryProfile,
}

impl CategoryProfiles {
    pub fn get(&self, category: Category) -> CategoryProfile {
        match category {
            Category::Food => self.food,
            Category::Cafe => self.cafe,
            Category::Museum => self.museum,
            Category::Landmark => self.landmark,
            Category::Activity => self.activity,
            Category::Shopping => self.shopping,
            Category::Other => self.other,
        }
    }
}

impl Default for CategoryProfiles {
    fn default() -> Self {
        let p = |visit_minutes, cost_per_person| CategoryProfile {
            visit_minutes,
            cost_per_person,
        };
        Self {
            food: p(60, 15_000.0),
            cafe: p(45, 8_000.0),
            museum: p(90, 10_000.0),
            landmark: p(40, 0.0),
            activity: p(75, 15_000.0),
            shopping: p(50, 20_000.0),
            other: p(45, 5_000.0),
        }
    }
}

/// Per-step distance ceilings by transport mode, in metres.
#[derive(Debug, Clone, Copy)]
pub struct StepDistanceLimits {
    pub walking_m: f64,
    pub driving_m: f64,
    pub transit_m: f64,
}

impl StepDistanceLimits {
    pub fn for_mode(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_m,
            TransportMode::Driving => self.driving_m,
            TransportMode::Transit => self.transit_m,
        }
    }
}

impl Default for StepDistanceLimits {
    fn default() -> Self {
        Self {
            walking_m: 3_000.0,
            driving_m: 30_000.0,
            transit_m: 20_000.0,
        }
    }
}

/// Configuration for course assembly.
#[derive(Debug, Clone)]
pub struct AssemblyConfig {
    /// Stops per course when the request does not say.
    pub default_stop_count: usize,

    /// Pools smaller than this cannot produce a course.
    pub min_candidates: usize,

    /// Maximum propose-route-verify rounds.
    pub max_iterations: usize,

    /// Wall-clock budget for all rounds together.
    pub time_budget: Duration,

    /// Deadline for one proposer call.
    pub proposal_timeout: Duration,

    /// Longest acceptable travel time between consecutive stops.
    pub max_step_minutes: f64,

    /// Longest acceptable travel distance between consecutive stops.
    pub max_step_distance: StepDistanceLimits,

    /// Most stops of one category, pinned places excepted.
    pub max_per_category: usize,

    /// Accepted range for proposer-supplied visit durations.
    pub override_minutes: (u32, u32),

    pub profiles: CategoryProfiles,
}

impl AssemblyConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n.max(1);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_proposal_timeout(mut self, timeout: Duration) -> Self {
        self.proposal_timeout = timeout;
        self
    }

    pub fn with_max_step_minutes(mut self, minutes: f64) -> Self {
        self.max_step_minutes = minutes;
        self
    }

    pub fn with_max_per_category(mut self, n: usize) -> Self {
        self.max_per_category = n.max(1);
        self
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            default_stop_count: 5,
            min_candidates: 3,
            max_iterations: 10,
            time_budget: Duration::from_secs(5 * 60),
            proposal_timeout: Duration::from_secs(60),
            max_step_minutes: 30.0,
            max_step_distance: StepDistanceLimits::default(),
            max_per_category: 2,
            override_minutes: (10, 240),
            profiles: CategoryProfiles::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AssemblyConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.time_budget, Duration::from_secs(300));
        assert_eq!(config.max_step_minutes, 30.0);
        assert_eq!(config.default_stop_count, 5);
    }

    #[test]
    fn museum_longer_than_cafe_longer_than_landmark() {
        let p = CategoryProfiles::default();
        let minutes = |c| p.get(c).visit_minutes;
        assert!(minutes(Category::Museum) > minutes(Category::Cafe));
        assert!(minutes(Category::Cafe) > minutes(Category::Landmark));
    }

    #[test]
    fn distance_limit_by_mode() {
        let limits = StepDistanceLimits::default();
        assert_eq!(limits.for_mode(TransportMode::Walking), 3_000.0);
        assert!(limits.for_mode(TransportMode::Driving) > limits.for_mode(TransportMode::Transit));
    }
}
