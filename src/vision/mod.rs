//! Vision/OCR Layer
//!
//! Normalizes captures for OCR and extracts their text.
//! OCR backends implement [`OcrEngine`]:
//! - Tesseract command line tool (production)
//! - Deterministic fakes in tests

pub mod ocr;
pub mod ocr_preprocess;
pub mod tesseract;

pub use ocr::{extract_text, OcrEngine};
pub use ocr_preprocess::normalize;
pub use tesseract::TesseractCli;
