//! Capture Layer
//!
//! Captures are written into a shared directory by an external process.
//! This layer only reads that directory: it picks the newest eligible file
//! and resolves caller-supplied names without letting them leave the root.

pub mod frame;

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::error::{DetectorError, Result};

pub use frame::CaptureImage;

/// Newest capture plus a short recency listing for diagnostics
#[derive(Debug, Clone)]
pub struct LatestCapture {
    /// Path of the most recently modified capture
    pub path: PathBuf,
    /// File names of the most recent captures, newest first
    pub recent: Vec<String>,
}

/// Find the most recently modified capture in `dir`
///
/// Only direct children whose extension is one of `extensions` (compared
/// case-sensitively) are eligible. Hidden files are skipped, so a capture
/// still being written as `.name.png` is never picked. Candidates are gathered per extension in
/// the given order, sorted by name within an extension, then stably sorted by
/// modification time so ties keep that order.
pub fn locate_latest(dir: &Path, extensions: &[String], listing_limit: usize) -> Result<LatestCapture> {
    let mut candidates: Vec<(PathBuf, SystemTime)> = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries.collect::<std::io::Result<Vec<_>>>()?,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    for extension in extensions {
        let mut group: Vec<PathBuf> = entries
            .iter()
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension.as_str()))
            .collect();
        group.sort();

        for path in group {
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {
                    let modified = meta.modified()?;
                    candidates.push((path, modified));
                }
                Ok(_) => {}
                // Capture process may delete files between listing and stat
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!("Capture vanished while scanning: {:?}", path);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    if candidates.is_empty() {
        let kinds: Vec<String> = extensions.iter().map(|e| e.to_uppercase()).collect();
        return Err(DetectorError::NotFound(format!(
            "No {} images found in {}",
            kinds.join("/"),
            dir.display()
        )));
    }

    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let recent = candidates
        .iter()
        .take(listing_limit)
        .filter_map(|(path, _)| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();

    let path = candidates.swap_remove(0).0;
    debug!("Newest capture of {}: {:?}", candidates.len() + 1, path);

    Ok(LatestCapture { path, recent })
}

/// Resolve a caller-supplied file name against the captures root
///
/// The name must be relative and free of `..`; the resolved file must exist
/// and, after following symlinks, still live under the root.
pub fn resolve_named(root: &Path, filename: &str) -> Result<PathBuf> {
    let requested = Path::new(filename);

    for component in requested.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DetectorError::PathEscape(filename.to_string()));
            }
        }
    }

    let candidate = root.join(requested);
    if filename.is_empty() || !candidate.is_file() {
        return Err(DetectorError::NotFound(format!("File not found: {}", filename)));
    }

    let canonical_root = root.canonicalize()?;
    let canonical = candidate.canonicalize()?;
    if !canonical.starts_with(&canonical_root) {
        return Err(DetectorError::PathEscape(filename.to_string()));
    }

    Ok(canonical)
}
