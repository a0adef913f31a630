//! OCR (Optical Character Recognition) module
//!
//! The engine itself sits behind [`OcrEngine`] so the pipeline never depends
//! on a particular backend. [`extract_text`] turns the engine's per-token
//! output into the joined text and average confidence used for classification.

use image::GrayImage;
use tracing::debug;

use crate::error::Result;

/// A text recognition backend
pub trait OcrEngine: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Recognize word tokens in reading order
    fn recognize(&self, image: &GrayImage) -> Result<Vec<OcrToken>>;
}

/// Single token as reported by an engine
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    /// Recognized text, possibly empty or whitespace for layout boxes
    pub text: String,
    /// Confidence exactly as the engine reported it (0-100 when numeric)
    pub confidence: String,
}

impl OcrToken {
    pub fn new(text: impl Into<String>, confidence: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.into(),
        }
    }
}

/// Text recognized in one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrResult {
    /// Trimmed, non-empty words in engine order
    pub words: Vec<String>,
    /// Parseable confidences of the retained words
    pub confidences: Vec<f64>,
}

impl OcrResult {
    /// Build from raw tokens, dropping blank text and unparseable confidences
    pub fn from_tokens(tokens: Vec<OcrToken>) -> Self {
        let mut result = Self::default();
        for token in tokens {
            let word = token.text.trim();
            if word.is_empty() {
                continue;
            }
            result.words.push(word.to_string());
            if let Ok(confidence) = token.confidence.trim().parse::<f64>() {
                result.confidences.push(confidence);
            }
        }
        result
    }

    /// Words joined with single spaces
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Mean confidence, 0.0 when nothing parseable was recognized
    pub fn average_confidence(&self) -> f64 {
        if self.confidences.is_empty() {
            return 0.0;
        }
        self.confidences.iter().sum::<f64>() / self.confidences.len() as f64
    }
}

/// Run one OCR pass and collect the recognized words
pub fn extract_text(engine: &dyn OcrEngine, image: &GrayImage) -> Result<OcrResult> {
    let tokens = engine.recognize(image)?;
    let token_count = tokens.len();
    let result = OcrResult::from_tokens(tokens);
    debug!(
        "{} returned {} tokens, {} words kept, {} confidences",
        engine.name(),
        token_count,
        result.words.len(),
        result.confidences.len()
    );
    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DetectorError;

    /// Engine returning canned tokens regardless of the image
    pub(crate) struct FakeOcr {
        pub tokens: Vec<OcrToken>,
    }

    impl FakeOcr {
        pub(crate) fn new(tokens: &[(&str, &str)]) -> Self {
            Self {
                tokens: tokens.iter().map(|(t, c)| OcrToken::new(*t, *c)).collect(),
            }
        }
    }

    impl OcrEngine for FakeOcr {
        fn name(&self) -> &str {
            "fake"
        }

        fn recognize(&self, _image: &GrayImage) -> Result<Vec<OcrToken>> {
            Ok(self.tokens.clone())
        }
    }

    /// Engine that always fails
    pub(crate) struct BrokenOcr;

    impl OcrEngine for BrokenOcr {
        fn name(&self) -> &str {
            "broken"
        }

        fn recognize(&self, _image: &GrayImage) -> Result<Vec<OcrToken>> {
            Err(DetectorError::ocr("engine crashed"))
        }
    }

    #[test]
    fn test_blank_tokens_are_dropped() {
        let engine = FakeOcr::new(&[("", "-1"), ("  ", "-1"), (" PRESS ", "91"), ("\t", "-1"), ("START", "85")]);
        let result = extract_text(&engine, &GrayImage::new(1, 1)).unwrap();
        assert_eq!(result.words, vec!["PRESS", "START"]);
        assert_eq!(result.text(), "PRESS START");
        assert_eq!(result.confidences, vec![91.0, 85.0]);
        assert!((result.average_confidence() - 88.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_confidence_is_skipped() {
        let engine = FakeOcr::new(&[("PRESS", "80"), ("START", "bad")]);
        let result = extract_text(&engine, &GrayImage::new(1, 1)).unwrap();
        assert_eq!(result.text(), "PRESS START");
        assert_eq!(result.confidences, vec![80.0]);
        assert_eq!(result.average_confidence(), 80.0);
    }

    #[test]
    fn test_no_tokens_means_zero_confidence() {
        let engine = FakeOcr::new(&[]);
        let result = extract_text(&engine, &GrayImage::new(1, 1)).unwrap();
        assert!(result.words.is_empty());
        assert_eq!(result.text(), "");
        assert_eq!(result.average_confidence(), 0.0);
    }

    #[test]
    fn test_fractional_confidences() {
        let result = OcrResult::from_tokens(vec![OcrToken::new("a", "96.5"), OcrToken::new("b", "90.25")]);
        assert!((result.average_confidence() - 93.375).abs() < 1e-9);
    }

    #[test]
    fn test_engine_failure_propagates() {
        let err = extract_text(&BrokenOcr, &GrayImage::new(1, 1)).unwrap_err();
        assert!(matches!(err, DetectorError::OcrEngine(_)));
    }
}
