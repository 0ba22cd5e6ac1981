//! Place categories and free-text category parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse place category used for continuity, diversity and duration rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Cafe,
    Museum,
    Landmark,
    Activity,
    Shopping,
    Other,
}

/// Keyword table, checked in order. Earlier rows win on overlap, so
/// "전시 카페" parses as a cafe.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Cafe,
        &["카페", "디저트", "베이커리", "cafe", "coffee", "dessert", "bakery"],
    ),
    (
        Category::Food,
        &[
            "식당", "맛집", "식사", "음식", "레스토랑", "restaurant", "food", "dining", "bistro",
        ],
    ),
    (
        Category::Museum,
        &["박물관", "미술관", "갤러리", "전시", "museum", "gallery", "exhibition"],
    ),
    (
        Category::Landmark,
        &["관광지", "명소", "공원", "궁", "landmark", "sight", "park", "palace"],
    ),
    (
        Category::Activity,
        &["활동", "체험", "팝업", "공방", "activity", "experience", "popup", "workshop"],
    ),
    (
        Category::Shopping,
        &["쇼핑", "시장", "상점", "편집숍", "shopping", "market", "store", "shop"],
    ),
];

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Cafe,
        Category::Museum,
        Category::Landmark,
        Category::Activity,
        Category::Shopping,
        Category::Other,
    ];

    /// Parse a free-text hint (Korean or English) into a category.
    ///
    /// Unknown or empty hints map to [`Category::Other`].
    ///
    /// # Examples
    ///
    /// ```
    /// use course_server::domain::Category;
    ///
    /// assert_eq!(Category::from_hint("성수 맛집"), Category::Food);
    /// assert_eq!(Category::from_hint("Cafe"), Category::Cafe);
    /// assert_eq!(Category::from_hint(""), Category::Other);
    /// ```
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.trim().to_lowercase();
        if hint.is_empty() {
            return Category::Other;
        }
        if let Some(exact) = Self::ALL.iter().find(|c| c.as_str() == hint) {
            return *exact;
        }
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| mentions(&hint, w)))
            .map(|(c, _)| *c)
            .unwrap_or(Category::Other)
    }

    /// Food and cafe stops may not follow one another in a course.
    pub fn is_dining(self) -> bool {
        matches!(self, Category::Food | Category::Cafe)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Cafe => "cafe",
            Category::Museum => "museum",
            Category::Landmark => "landmark",
            Category::Activity => "activity",
            Category::Shopping => "shopping",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether lowercased `text` mentions the keyword `word`.
///
/// Latin keywords must be a whole token, optionally pluralised with `s`,
/// so "park" does not match "parking". Korean keywords of two or more
/// syllables match anywhere, since Korean compounds them ("국립중앙박물관").
/// A one-syllable Korean keyword must end a token ("경복궁", not "궁금").
pub(crate) fn mentions(text: &str, word: &str) -> bool {
    let mut tokens = text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty());
    if word.is_ascii() {
        tokens.any(|t| t == word || t.strip_suffix('s') == Some(word))
    } else if word.chars().count() == 1 {
        tokens.any(|t| t.ends_with(word))
    } else {
        text.contains(word)
    }
}

/// True when placing `next` right after `prev` breaks course continuity.
pub fn breaks_continuity(prev: Category, next: Category) -> bool {
    prev.is_dining() && next.is_dining()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_korean_hints() {
        assert_eq!(Category::from_hint("식당"), Category::Food);
        assert_eq!(Category::from_hint("카페"), Category::Cafe);
        assert_eq!(Category::from_hint("관광지"), Category::Landmark);
        assert_eq!(Category::from_hint("활동"), Category::Activity);
        assert_eq!(Category::from_hint("쇼핑"), Category::Shopping);
        assert_eq!(Category::from_hint("기타"), Category::Other);
        assert_eq!(Category::from_hint("국립중앙박물관"), Category::Museum);
    }

    #[test]
    fn exact_names_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::from_hint(c.as_str()), c);
        }
    }

    #[test]
    fn keywords_do_not_match_inside_other_words() {
        assert_eq!(Category::from_hint("궁금한 곳"), Category::Other);
        assert_eq!(Category::from_hint("parking lot"), Category::Other);
        assert_eq!(Category::from_hint("bookstore"), Category::Other);
        assert_eq!(Category::from_hint("경복궁"), Category::Landmark);
        assert_eq!(Category::from_hint("City Parks"), Category::Landmark);
        assert_eq!(Category::from_hint("Coffee & Dessert"), Category::Cafe);
        assert_eq!(Category::from_hint("pop-up store"), Category::Shopping);
    }

    #[test]
    fn cafe_wins_over_exhibition() {
        assert_eq!(Category::from_hint("전시 카페"), Category::Cafe);
    }

    #[test]
    fn dining_pairs_break_continuity() {
        assert!(breaks_continuity(Category::Food, Category::Food));
        assert!(breaks_continuity(Category::Food, Category::Cafe));
        assert!(breaks_continuity(Category::Cafe, Category::Cafe));
        assert!(!breaks_continuity(Category::Food, Category::Museum));
        assert!(!breaks_continuity(Category::Landmark, Category::Cafe));
    }
}
