//! Error taxonomy for the analysis pipeline
//!
//! Setup code (CLI, config loading) uses `anyhow`; everything a request can
//! fail with is one of these variants so the transport can map it to a status.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single analysis request
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Named capture missing, or no eligible captures in the directory
    #[error("{0}")]
    NotFound(String),

    /// Capture exists but could not be decoded as an image
    #[error("Failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Caller-supplied keyword is not a valid regular expression
    #[error("Invalid keyword pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Filename would resolve outside the captures root
    #[error("Path escapes captures directory: {0}")]
    PathEscape(String),

    /// OCR engine missing, crashed, or produced unreadable output
    #[error("OCR engine error: {0}")]
    OcrEngine(String),

    /// Request exceeded its hard deadline
    #[error("Analysis timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DetectorError {
    pub fn ocr(message: impl Into<String>) -> Self {
        Self::OcrEngine(message.into())
    }

    /// True for errors caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Pattern { .. } | Self::PathEscape(_))
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_verbatim() {
        let err = DetectorError::NotFound("File not found: title.png".to_string());
        assert_eq!(err.to_string(), "File not found: title.png");
    }

    #[test]
    fn test_client_error_classification() {
        let source = regex::Regex::new("(").unwrap_err();
        let pattern = DetectorError::Pattern { pattern: "(".to_string(), source };
        assert!(pattern.is_client_error());
        assert!(pattern.to_string().contains("'('"));

        assert!(DetectorError::PathEscape("../x.png".to_string()).is_client_error());
        assert!(!DetectorError::NotFound("x".to_string()).is_client_error());
        assert!(!DetectorError::ocr("boom").is_client_error());
        assert!(!DetectorError::Timeout { seconds: 5 }.is_client_error());
    }
}
