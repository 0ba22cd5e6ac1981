//! Scoring configuration.

/// Named coefficients and limits for candidate scoring.
///
/// The weights are normalised by their sum, so they only need to be
/// meaningful relative to each other.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Weight of the normalised rating (rating / 5).
    pub rating_weight: f64,

    /// Weight of the log-scaled review count.
    pub review_weight: f64,

    /// Bonus weight when a second, independent query found the same place.
    pub corroboration_weight: f64,

    /// Review count at which the review term saturates to 1.0.
    pub review_saturation: u32,

    /// Normalised rating assumed for unrated non-dining places.
    /// Activities and sights are often unrated without being bad.
    pub unrated_prior: f64,

    /// Dining places rated below this are dropped (pinned places never are).
    pub min_dining_rating: Option<f64>,

    /// Maximum pool size, pinned places excluded from the cut.
    pub max_candidates: usize,

    /// Pools smaller than this are reported as insufficient.
    pub min_viable: usize,

    /// Dedup grid cell size in metres.
    pub dedup_grid_m: f64,
}

impl ScoringConfig {
    pub fn with_weights(mut self, rating: f64, reviews: f64, corroboration: f64) -> Self {
        self.rating_weight = rating;
        self.review_weight = reviews;
        self.corroboration_weight = corroboration;
        self
    }

    pub fn with_max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = n;
        self
    }

    pub fn with_min_viable(mut self, n: usize) -> Self {
        self.min_viable = n;
        self
    }

    pub fn with_min_dining_rating(mut self, rating: Option<f64>) -> Self {
        self.min_dining_rating = rating;
        self
    }

    pub fn with_dedup_grid(mut self, metres: f64) -> Self {
        self.dedup_grid_m = metres;
        self
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rating_weight: 0.6,
            review_weight: 0.3,
            corroboration_weight: 0.1,
            review_saturation: 1000,
            unrated_prior: 0.8,
            min_dining_rating: Some(4.0),
            max_candidates: 20,
            min_viable: 3,
            dedup_grid_m: 50.0,
        }
    }
}
