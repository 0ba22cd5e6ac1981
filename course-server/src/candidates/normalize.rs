//! Place-name cleanup and the dedup key.

use crate::domain::Coord;

/// Blog and listicle noise that shows up in scraped titles.
const JUNK_WORDS: &[&str] = &[
    "네이버 블로그",
    "네이버 포스트",
    "티스토리",
    "인스타그램",
    "Instagram",
    "유튜브",
    "YouTube",
    "트립닷컴",
    "나무위키",
    "총정리",
    "추천",
    "BEST",
    "TOP",
];

const SEPARATORS: &[char] = &['-', '|', ':', '[', ']', '(', ')', '/', '·'];

/// Metres per degree of latitude.
const M_PER_DEG: f64 = 111_320.0;

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip platform noise and separators from a scraped title.
///
/// ```
/// use course_server::candidates::clean_name;
///
/// assert_eq!(clean_name("[성수] 어니언 - 네이버 블로그"), "성수 어니언");
/// ```
pub fn clean_name(raw: &str) -> String {
    let mut name = collapse_whitespace(&raw.replace(SEPARATORS, " "));
    loop {
        let stripped = JUNK_WORDS
            .iter()
            .fold(name.clone(), |acc, junk| acc.replace(junk, ""));
        let stripped = collapse_whitespace(&stripped);
        if stripped == name {
            return name;
        }
        name = stripped;
    }
}

/// Cleaned name shortened to the leading words, for geocoding queries.
/// Long titles usually lead with the venue name.
pub fn short_title(raw: &str) -> String {
    let cleaned = clean_name(raw);
    let words: Vec<_> = cleaned.split_whitespace().collect();
    if words.len() > 3 {
        words[..2].join(" ")
    } else {
        cleaned
    }
}

/// Case- and punctuation-insensitive form of a name.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Identity of a place for deduplication: normalised name plus a grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    name: String,
    cell: (i64, i64),
}

impl DedupKey {
    pub fn new(name: &str, at: Coord, grid_m: f64) -> Self {
        let grid_m = grid_m.max(1.0);
        let row = (at.lat * M_PER_DEG / grid_m).floor() as i64;
        // Longitude cells shrink with latitude; use the row centre so every
        // point in a row shares one cell width.
        let row_lat = (row as f64 + 0.5) * grid_m / M_PER_DEG;
        let m_per_deg_lng = M_PER_DEG * row_lat.to_radians().cos().max(1e-6);
        let col = (at.lng * m_per_deg_lng / grid_m).floor() as i64;

        Self {
            name: normalize_name(name),
            cell: (row, col),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::offset_m;

    fn origin() -> Coord {
        Coord::new(37.5445, 127.0560).unwrap()
    }

    #[test]
    fn cleans_blog_titles() {
        assert_eq!(clean_name("성수 카페 어니언 | 티스토리"), "성수 카페 어니언");
        assert_eq!(clean_name("BEST 5 (성수) 맛집 총정리"), "5 성수 맛집");
        assert_eq!(clean_name("  plain   name "), "plain name");
    }

    #[test]
    fn junk_removal_reaches_fixed_point() {
        assert_eq!(clean_name("추추천천 카페"), "카페");
        assert_eq!(clean_name("네이버 TOP 블로그 카페"), "카페");
    }

    #[test]
    fn short_title_keeps_leading_words() {
        assert_eq!(short_title("성수동 베이크모굴 실내 놀거리 데이트"), "성수동 베이크모굴");
        assert_eq!(short_title("대림창고 갤러리"), "대림창고 갤러리");
    }

    #[test]
    fn normalize_ignores_case_and_punctuation() {
        assert_eq!(normalize_name("Cafe Onion!"), normalize_name("cafe-onion"));
        assert_eq!(normalize_name("어니언 성수"), "어니언성수");
    }

    #[test]
    fn same_name_nearby_collides() {
        let a = DedupKey::new("Onion", origin(), 50.0);
        let b = DedupKey::new("onion!", origin(), 50.0);
        assert_eq!(a, b);
    }

    #[test]
    fn far_apart_does_not_collide() {
        let a = DedupKey::new("Onion", origin(), 50.0);
        let b = DedupKey::new("Onion", offset_m(origin(), 500.0, 0.0), 50.0);
        assert_ne!(a, b);
    }

    #[test]
    fn different_names_do_not_collide() {
        let a = DedupKey::new("Onion", origin(), 50.0);
        let b = DedupKey::new("Daelim", origin(), 50.0);
        assert_ne!(a, b);
    }
}
