//! Transport modes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::mentions;

/// How the group moves between consecutive stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walking,
    Driving,
    /// Any public-transit combination (bus, subway, rail).
    Transit,
}

const TRANSIT_WORDS: &[&str] = &[
    "대중교통", "지하철", "버스", "전철", "transit", "subway", "metro", "bus", "train",
];
const WALKING_WORDS: &[&str] = &["도보", "걷기", "걸어서", "walk", "walking", "foot"];
const DRIVING_WORDS: &[&str] = &["자동차", "차량", "자가용", "택시", "drive", "driving", "car", "taxi"];

impl TransportMode {
    /// Parse a single preference word.
    pub fn from_word(word: &str) -> Option<Self> {
        let word = word.trim().to_lowercase();
        let hit = |words: &[&str]| words.iter().any(|w| mentions(&word, w));
        if hit(TRANSIT_WORDS) {
            Some(TransportMode::Transit)
        } else if hit(WALKING_WORDS) {
            Some(TransportMode::Walking)
        } else if hit(DRIVING_WORDS) {
            Some(TransportMode::Driving)
        } else {
            None
        }
    }

    /// Resolve a preference list to the single mode used for routing.
    ///
    /// Any transit preference wins, since only the general provider can
    /// plan it and walking legs are part of a transit itinerary anyway.
    /// Otherwise the first recognised word decides. Defaults to walking.
    ///
    /// ```
    /// use course_server::domain::TransportMode;
    ///
    /// let prefs = vec!["도보".to_string(), "지하철".to_string()];
    /// assert_eq!(TransportMode::resolve(&prefs), TransportMode::Transit);
    /// assert_eq!(TransportMode::resolve::<&str>(&[]), TransportMode::Walking);
    /// ```
    pub fn resolve<S: AsRef<str>>(preferred: &[S]) -> Self {
        let parsed: Vec<_> = preferred
            .iter()
            .filter_map(|w| Self::from_word(w.as_ref()))
            .collect();
        if parsed.contains(&TransportMode::Transit) {
            return TransportMode::Transit;
        }
        parsed.first().copied().unwrap_or(TransportMode::Walking)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Driving => "driving",
            TransportMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_korean_words() {
        assert_eq!(TransportMode::from_word("도보"), Some(TransportMode::Walking));
        assert_eq!(TransportMode::from_word("자동차"), Some(TransportMode::Driving));
        assert_eq!(TransportMode::from_word("버스"), Some(TransportMode::Transit));
        assert_eq!(TransportMode::from_word("자전거"), None);
    }

    #[test]
    fn english_words_match_whole_tokens() {
        assert_eq!(TransportMode::from_word("business class"), None);
        assert_eq!(TransportMode::from_word("scarf"), None);
        assert_eq!(TransportMode::from_word("by bus"), Some(TransportMode::Transit));
        assert_eq!(TransportMode::from_word("Walking"), Some(TransportMode::Walking));
        assert_eq!(TransportMode::from_word("rental cars"), Some(TransportMode::Driving));
    }

    #[test]
    fn first_non_transit_word_decides() {
        let prefs = ["자동차", "도보"];
        assert_eq!(TransportMode::resolve(&prefs), TransportMode::Driving);
    }

    #[test]
    fn unknown_words_default_to_walking() {
        assert_eq!(TransportMode::resolve(&["hovercraft"]), TransportMode::Walking);
    }
}
