//! Trust score.

use crate::domain::Category;

use super::ScoringConfig;

/// Inputs to the trust score for one merged place.
#[derive(Debug, Clone, Copy)]
pub struct TrustInputs {
    pub rating: Option<f64>,
    pub review_count: u32,
    pub corroborated: bool,
    pub category: Category,
}

/// Weighted trust score in [0, 1].
///
/// A zero rating is treated as "unrated", since sources report missing
/// ratings as 0.
pub fn trust_score(inputs: &TrustInputs, config: &ScoringConfig) -> f64 {
    let rating = match inputs.rating {
        Some(r) if r > 0.0 => (r / 5.0).clamp(0.0, 1.0),
        _ if inputs.category.is_dining() => 0.0,
        _ => config.unrated_prior.clamp(0.0, 1.0),
    };

    let saturation = f64::from(config.review_saturation.max(1));
    let reviews = (f64::from(inputs.review_count).ln_1p() / saturation.ln_1p()).min(1.0);

    let corroboration = if inputs.corroborated { 1.0 } else { 0.0 };

    let total_weight = config.rating_weight + config.review_weight + config.corroboration_weight;
    if total_weight <= 0.0 {
        return 0.0;
    }

    let weighted = config.rating_weight * rating
        + config.review_weight * reviews
        + config.corroboration_weight * corroboration;

    (weighted / total_weight).clamp(0.0, 1.0)
}
