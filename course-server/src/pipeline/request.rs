//! Pipeline input and its validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{SavedPlace, TransportMode};

use super::PipelineError;

/// Most stops a request may ask for.
pub const MAX_STOPS: usize = 10;

/// Group size assumed when the request does not say.
pub const DEFAULT_GROUP_SIZE: u32 = 2;

/// Group size as sent by clients: `2` or `"2명"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSize {
    Count(u32),
    Text(String),
}

impl GroupSize {
    /// The first number in the value, if it is at least one.
    pub fn resolve(&self) -> Option<u32> {
        match self {
            GroupSize::Count(n) => Some(*n),
            GroupSize::Text(s) => {
                let digits: String = s
                    .chars()
                    .skip_while(|c| !c.is_ascii_digit())
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().ok()
            }
        }
        .filter(|&n| n >= 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A course request as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub theme: String,
    pub location: String,
    #[serde(default, alias = "group-size")]
    pub group_size: Option<GroupSize>,
    #[serde(default, alias = "date-range")]
    pub date_range: Option<DateRange>,
    #[serde(default, alias = "preferred-transport")]
    pub preferred_transport: Vec<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default, alias = "saved-places")]
    pub saved_places: Vec<SavedPlace>,
    #[serde(default, alias = "stop-count")]
    pub stop_count: Option<usize>,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidRequest {
    pub theme: String,
    pub location: String,
    pub group_size: u32,
    pub date_range: Option<DateRange>,
    pub mode: TransportMode,
    pub budget: Option<f64>,
    pub saved_places: Vec<SavedPlace>,
    pub stop_count: usize,
}

impl PlanRequest {
    /// Check and normalise the request.
    pub fn validate(self, default_stops: usize) -> Result<ValidRequest, PipelineError> {
        let invalid = |msg: String| Err(PipelineError::InvalidRequest(msg));

        let theme = self.theme.trim().to_string();
        let location = self.location.trim().to_string();
        if theme.is_empty() || location.is_empty() {
            return invalid("theme and location are required".to_string());
        }

        let group_size = match &self.group_size {
            None => DEFAULT_GROUP_SIZE,
            Some(g) => match g.resolve() {
                Some(n) => n,
                None => return invalid(format!("group size {g:?} is not a positive number")),
            },
        };

        if let Some(range) = self.date_range {
            if range.start > range.end {
                return invalid(format!(
                    "date range starts {} after it ends {}",
                    range.start, range.end
                ));
            }
        }

        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget <= 0.0 {
                return invalid(format!("budget must be positive, got {budget}"));
            }
        }

        let stop_count = self.stop_count.unwrap_or(default_stops);
        if !(1..=MAX_STOPS).contains(&stop_count) {
            return invalid(format!("stop count must be 1 to {MAX_STOPS}, got {stop_count}"));
        }

        for saved in &self.saved_places {
            if saved.coordinates.validated().is_err() {
                return invalid(format!("saved place {} has invalid coordinates", saved.name));
            }
        }

        Ok(ValidRequest {
            theme,
            location,
            group_size,
            date_range: self.date_range,
            mode: TransportMode::resolve(&self.preferred_transport),
            budget: self.budget,
            saved_places: self.saved_places,
            stop_count,
        })
    }
}
