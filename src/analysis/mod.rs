//! Menu Analysis
//!
//! Composes the capture, vision and keyword layers into the two supported
//! operations: analyze a named capture, or analyze the newest one.
//! Every call runs the whole pipeline on its own data; the detector holds
//! only immutable configuration and can be shared across threads.

pub mod keywords;

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::capture::{self, CaptureImage};
use crate::config::AppConfig;
use crate::error::Result;
use crate::vision::{self, OcrEngine};

pub use keywords::KeywordSet;

/// Outcome of analyzing one capture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisVerdict {
    /// Capture name as requested, or the newest file's name
    pub filename: String,
    /// True when at least one keyword pattern matched
    pub is_menu: bool,
    /// Mean OCR confidence rounded to one decimal place
    pub avg_conf: f64,
    /// Source text of the matching patterns
    pub keywords_hit: Vec<String>,
    /// Leading characters of the recognized text
    pub text_excerpt: String,
}

/// Verdict for the newest capture plus the files it was chosen from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestVerdict {
    #[serde(flatten)]
    pub verdict: AnalysisVerdict,
    /// Most recent capture names, newest first
    pub debug_recent_files: Vec<String>,
}

/// Menu screen detector
pub struct MenuDetector {
    config: AppConfig,
    engine: Arc<dyn OcrEngine>,
    default_keywords: KeywordSet,
}

impl MenuDetector {
    /// Create a detector; fails if the default keyword set does not compile
    pub fn new(config: AppConfig, engine: Arc<dyn OcrEngine>) -> Result<Self> {
        let default_keywords = KeywordSet::compile(config.classifier.default_keywords.as_slice())?;
        info!(
            "Menu detector ready: captures={:?}, engine={}, {} default keywords",
            config.captures.dir,
            engine.name(),
            default_keywords.len()
        );
        Ok(Self {
            config,
            engine,
            default_keywords,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Analyze a capture by name, optionally with caller keyword patterns
    ///
    /// An absent or empty keyword list uses the default set.
    pub fn analyze_named(&self, filename: &str, keywords: Option<&[String]>) -> Result<AnalysisVerdict> {
        let path = capture::resolve_named(&self.config.captures.dir, filename)?;

        let custom = match keywords {
            Some(patterns) if !patterns.is_empty() => Some(KeywordSet::compile(patterns)?),
            _ => None,
        };
        let keyword_set = custom.as_ref().unwrap_or(&self.default_keywords);

        self.analyze_path(&path, filename, keyword_set)
    }

    /// Analyze the most recently modified capture with the default keywords
    pub fn analyze_latest(&self) -> Result<LatestVerdict> {
        let captures = &self.config.captures;
        let latest = capture::locate_latest(&captures.dir, &captures.extensions, captures.recent_listing_limit)?;

        let filename = latest
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let verdict = self.analyze_path(&latest.path, &filename, &self.default_keywords)?;
        Ok(LatestVerdict {
            verdict,
            debug_recent_files: latest.recent,
        })
    }

    /// Decode, normalize, recognize and classify a single capture
    pub fn analyze_path(&self, path: &Path, filename: &str, keywords: &KeywordSet) -> Result<AnalysisVerdict> {
        let start = Instant::now();

        let frame = CaptureImage::open(path)?;
        let decoded = start.elapsed();
        let (width, height) = frame.dimensions();

        let normalized = vision::normalize(&frame, &self.config.preprocessing);
        let preprocessed = start.elapsed();

        let ocr = vision::extract_text(self.engine.as_ref(), &normalized)?;
        let recognized = start.elapsed();

        let text = ocr.text();
        let keywords_hit = keywords.matches(&text);

        debug!(
            "Pipeline timings for {} ({}x{}): decode {:?}, preprocess {:?}, ocr {:?}",
            filename,
            width,
            height,
            decoded,
            preprocessed - decoded,
            recognized - preprocessed
        );

        let verdict = AnalysisVerdict {
            filename: filename.to_string(),
            is_menu: !keywords_hit.is_empty(),
            avg_conf: round_one_decimal(ocr.average_confidence()),
            keywords_hit,
            text_excerpt: excerpt(&text, self.config.classifier.excerpt_chars),
        };

        info!(
            "Analyzed {} in {:?}: is_menu={}, avg_conf={}, hits={:?}",
            filename,
            start.elapsed(),
            verdict.is_menu,
            verdict.avg_conf,
            verdict.keywords_hit
        );

        Ok(verdict)
    }
}

/// Round to one decimal, ties to even
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// First `max_chars` characters of `text`
fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
