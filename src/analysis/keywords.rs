//! Keyword classifier
//!
//! Menu screens are recognized by vocabulary: a set of case-insensitive
//! regular expressions is run over the recognized text and every pattern
//! that matches anywhere is reported.

use regex::{Regex, RegexBuilder};

use crate::error::{DetectorError, Result};

/// A compiled, ordered set of keyword patterns
#[derive(Debug, Clone)]
pub struct KeywordSet {
    patterns: Vec<Regex>,
}

impl KeywordSet {
    /// Compile patterns; any invalid pattern fails the whole set
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| DetectorError::Pattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Source text of every pattern found in `text`, in set order
    pub fn matches(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        self.patterns
            .iter()
            .filter(|pattern| pattern.is_match(&haystack))
            .map(|pattern| pattern.as_str().to_string())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_KEYWORDS;

    fn defaults() -> KeywordSet {
        KeywordSet::compile(&DEFAULT_KEYWORDS[..]).unwrap()
    }

    #[test]
    fn test_press_start_screen() {
        let hits = defaults().matches("PRESS START");
        assert_eq!(hits, vec![r"\bpress\s+start\b", r"\bstart\b"]);
    }

    #[test]
    fn test_case_insensitive() {
        let set = KeywordSet::compile(&[r"\bstart\b"]).unwrap();
        assert_eq!(set.matches("START"), set.matches("start"));
        assert_eq!(set.matches("StArT").len(), 1);
    }

    #[test]
    fn test_word_boundaries() {
        let set = defaults();
        assert!(set.matches("starting line").is_empty());
        assert!(set.matches("selection").is_empty());
        assert!(set.matches("menus").is_empty());
    }

    #[test]
    fn test_optional_plural() {
        let set = defaults();
        assert_eq!(set.matches("OPTIONS"), vec![r"\boptions?\b"]);
        assert_eq!(set.matches("option"), vec![r"\boptions?\b"]);
    }

    #[test]
    fn test_phrase_across_whitespace() {
        let set = defaults();
        let hits = set.matches("press    start");
        assert!(hits.contains(&r"\bpress\s+start\b".to_string()));
    }

    #[test]
    fn test_gameplay_text_has_no_hits() {
        assert!(defaults().matches("HP 120 / 150  LV 7  GOLD 3302").is_empty());
        assert!(defaults().matches("").is_empty());
    }

    #[test]
    fn test_pattern_source_is_kept_verbatim() {
        let set = KeywordSet::compile(&["CONTINUE", r"New\s+Game"]).unwrap();
        assert_eq!(set.matches("continue / new game"), vec!["CONTINUE", r"New\s+Game"]);
    }

    #[test]
    fn test_invalid_pattern_fails_whole_set() {
        let err = KeywordSet::compile(&[r"\bstart\b", "(unclosed"]).unwrap_err();
        match err {
            DetectorError::Pattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = KeywordSet::compile::<&str>(&[]).unwrap();
        assert_eq!(set.len(), 0);
        assert!(set.matches("press start").is_empty());
    }
}
