use regex::{Regex, RegexBuilder};

use crate::error::{MapError, Result};
use crate::layer::Layer;
use crate::marker::Marker;

/// Shorter search-box input is ignored.
pub const MIN_QUERY_CHARS: usize = 3;

/// Case-insensitive name matcher.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    regex: Regex,
}

impl SearchQuery {
    /// Match `text` literally as a substring.
    pub fn literal(text: &str) -> Result<Self> {
        Self::pattern(&regex::escape(text))
    }

    /// Match a caller-supplied pattern.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Self::build(pattern).map_err(|e| MapError::config("search pattern", e.to_string()))
    }

    /// Search-box semantics: literal, and only once the input is long enough.
    pub fn from_input(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.chars().count() < MIN_QUERY_CHARS {
            return None;
        }
        Self::literal(input).ok()
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    fn build(pattern: &str) -> std::result::Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(|regex| Self { regex })
    }
}

/// Markers whose name matches, in declaration order. Hidden markers match too.
pub fn find_markers<'a>(layer: &'a Layer, query: &SearchQuery) -> Vec<&'a Marker> {
    layer
        .markers()
        .iter()
        .filter(|m| query.is_match(m.name()))
        .collect()
}

pub fn find_marker_by_id<'a>(layer: &'a Layer, id: &str) -> Option<&'a Marker> {
    layer.marker(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::PlanePoint;

    fn layer() -> Layer {
        let mut layer = Layer::unbounded("Overworld");
        for (id, name) in [
            ("w1", "Warp Point (Tal Tal)"),
            ("h1", "Heart Piece"),
            ("w2", "warp point (Ukuku)"),
            ("q1", "Question? Mark"),
        ] {
            let mut marker = Marker::new(id, name, PlanePoint::default(), "Misc");
            if id == "w2" {
                marker.force_hide();
            }
            layer.push_marker(marker).expect("unique");
        }
        layer
    }

    fn ids(markers: Vec<&Marker>) -> Vec<&str> {
        markers.into_iter().map(Marker::id).collect()
    }

    #[test]
    fn case_insensitive_in_declaration_order_including_hidden() {
        let layer = layer();
        let query = SearchQuery::from_input("WARP").expect("long enough");
        assert_eq!(ids(find_markers(&layer, &query)), vec!["w1", "w2"]);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let layer = layer();
        let query = SearchQuery::from_input("n? m").expect("long enough");
        assert_eq!(ids(find_markers(&layer, &query)), vec!["q1"]);
        let query = SearchQuery::literal("(tal").expect("escaped");
        assert_eq!(ids(find_markers(&layer, &query)), vec!["w1"]);
    }

    #[test]
    fn short_input_is_ignored() {
        assert!(SearchQuery::from_input("wa").is_none());
        assert!(SearchQuery::from_input("  wa  ").is_none());
        assert!(SearchQuery::from_input("war").is_some());
    }

    #[test]
    fn explicit_pattern_supported() {
        let layer = layer();
        let query = SearchQuery::pattern("^(heart|question)").expect("valid pattern");
        assert_eq!(ids(find_markers(&layer, &query)), vec!["h1", "q1"]);
        assert!(SearchQuery::pattern("(").is_err());
    }

    #[test]
    fn lookup_by_id_is_exact() {
        let layer = layer();
        assert_eq!(find_marker_by_id(&layer, "h1").map(Marker::name), Some("Heart Piece"));
        assert!(find_marker_by_id(&layer, "H1").is_none());
    }
}
