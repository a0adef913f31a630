//! Tesseract OCR backend
//!
//! Drives the `tesseract` executable in TSV mode, which reports one row per
//! layout box with its confidence and text. Each call works in a private
//! temporary directory and is killed if it outlives its deadline.

use image::GrayImage;
use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::OcrConfig;
use crate::error::{DetectorError, Result};

use super::ocr::{OcrEngine, OcrToken};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Number of columns in a TSV row (`level` through `text`)
const TSV_COLUMNS: usize = 12;
const TSV_CONF: usize = 10;
const TSV_TEXT: usize = 11;

/// OCR engine backed by the tesseract command line tool
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    language: String,
    page_seg_mode: Option<u8>,
    timeout: Duration,
}

impl TesseractCli {
    /// Create an engine from OCR settings
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            language: config.language.clone(),
            page_seg_mode: config.page_seg_mode,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Check that the executable runs and return its version line
    pub fn probe(&self) -> Result<String> {
        let output = Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| DetectorError::ocr(format!("Failed to execute {}: {}", self.command, e)))?;

        // Older releases print the version on stderr
        let combined = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let version = combined
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("unknown")
            .to_string();

        info!("OCR engine available: {}", version);
        Ok(version)
    }

    fn spawn(&self, input: &Path, output_base: &Path, stderr: File) -> Result<Child> {
        let mut command = Command::new(&self.command);
        command.arg(input).arg(output_base).arg("-l").arg(&self.language);
        if let Some(psm) = self.page_seg_mode {
            command.arg("--psm").arg(psm.to_string());
        }
        command
            .arg("tsv")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| DetectorError::ocr(format!("Failed to execute {}: {}", self.command, e)))
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(DetectorError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<Vec<OcrToken>> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("frame.png");
        let output_base = workdir.path().join("tokens");
        let stderr_path = workdir.path().join("stderr.log");

        image
            .save(&input)
            .map_err(|e| DetectorError::ocr(format!("Failed to write OCR input: {}", e)))?;

        let start = Instant::now();
        let mut child = self.spawn(&input, &output_base, File::create(&stderr_path)?)?;
        let status = self.wait_with_deadline(&mut child)?;

        if !status.success() {
            let stderr = std::fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(DetectorError::ocr(format!(
                "{} exited with {}: {}",
                self.command,
                status,
                stderr.trim()
            )));
        }

        let tsv = std::fs::read_to_string(output_base.with_extension("tsv"))
            .map_err(|e| DetectorError::ocr(format!("Missing OCR output: {}", e)))?;
        let tokens = parse_tsv(&tsv);

        debug!("tesseract finished in {:?}: {} rows", start.elapsed(), tokens.len());
        Ok(tokens)
    }
}

/// Parse tesseract TSV output into tokens, keeping row order
///
/// Layout rows (page, block, line) carry empty text and are kept; the
/// extractor drops them. Short rows are ignored.
pub fn parse_tsv(tsv: &str) -> Vec<OcrToken> {
    tsv.lines()
        .filter(|line| !line.starts_with("level\t"))
        .filter_map(|line| {
            let columns: Vec<&str> = line.splitn(TSV_COLUMNS, '\t').collect();
            if columns.len() < TSV_COLUMNS {
                return None;
            }
            Some(OcrToken::new(columns[TSV_TEXT], columns[TSV_CONF]))
        })
        .collect()
}
