//! Application Configuration
//!
//! Detector settings stored in TOML format. Everything the pipeline needs is
//! carried here and handed to the detector at construction.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::keywords::KeywordSet;

/// Default menu-like keyword patterns
pub const DEFAULT_KEYWORDS: [&str; 5] = [
    r"\bpress\s+start\b",
    r"\bstart\b",
    r"\boptions?\b",
    r"\bselect\b",
    r"\bmenu\b",
];

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Captures directory settings
    pub captures: CapturesConfig,
    /// Image normalization settings
    pub preprocessing: PreprocessingConfig,
    /// OCR engine settings
    pub ocr: OcrConfig,
    /// Keyword classifier settings
    pub classifier: ClassifierConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// Where captures are read from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapturesConfig {
    /// Root directory, populated by an external capture process
    pub dir: PathBuf,
    /// Eligible file extensions (case-sensitive, without the dot)
    pub extensions: Vec<String>,
    /// How many recent file names to report for diagnostics
    pub recent_listing_limit: usize,
}

impl Default for CapturesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/data/captures"),
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            recent_listing_limit: 10,
        }
    }
}

/// Grayscale normalization applied before OCR
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Bilateral filter neighborhood diameter in pixels
    pub diameter: u32,
    /// Intensity-domain sigma of the bilateral filter
    pub sigma_color: f32,
    /// Spatial-domain sigma of the bilateral filter
    pub sigma_space: f32,
    /// Linear contrast gain
    pub contrast_alpha: f32,
    /// Linear brightness offset
    pub contrast_beta: f32,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            diameter: 7,
            sigma_color: 50.0,
            sigma_space: 50.0,
            contrast_alpha: 1.2,
            contrast_beta: 10.0,
        }
    }
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable (name on PATH or absolute path)
    pub tesseract_cmd: String,
    /// Tesseract language code(s), e.g. "eng" or "eng+jpn"
    pub language: String,
    /// Page segmentation mode; engine default when unset
    pub page_seg_mode: Option<u8>,
    /// Kill the engine process after this many seconds
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            language: "eng".to_string(),
            page_seg_mode: None,
            timeout_secs: 30,
        }
    }
}

/// Keyword classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Patterns used when the caller supplies none
    pub default_keywords: Vec<String>,
    /// Length of the text excerpt in characters
    pub excerpt_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            excerpt_chars: 300,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Hard deadline for a single analysis request
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.captures.extensions.is_empty() {
            bail!("captures.extensions must not be empty");
        }
        if self.captures.recent_listing_limit == 0 {
            bail!("captures.recent_listing_limit must be at least 1");
        }
        if self.preprocessing.diameter == 0 {
            bail!("preprocessing.diameter must be at least 1");
        }
        if self.preprocessing.sigma_color <= 0.0 || self.preprocessing.sigma_space <= 0.0 {
            bail!("preprocessing sigmas must be positive");
        }
        if self.ocr.timeout_secs == 0 || self.server.request_timeout_secs == 0 {
            bail!("timeouts must be at least one second");
        }
        if self.classifier.default_keywords.is_empty() {
            bail!("classifier.default_keywords must not be empty");
        }
        KeywordSet::compile(self.classifier.default_keywords.as_slice())
            .context("classifier.default_keywords contains an invalid pattern")?;
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Get the per-user configuration directory
pub fn config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "menudetector", "MenuDetector")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Load configuration from an explicit path, the user config file, or defaults
pub fn load_or_default(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(dir) = config_dir() {
        let config_path = dir.join("config.toml");
        if config_path.exists() {
            let config = load_config(&config_path)
                .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
            info!("Loaded configuration from {:?}", config_path);
            return Ok(config);
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}
