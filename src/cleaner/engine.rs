use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::common::config::ImportConfig;
use crate::common::errors::{ImportError, Result};
use crate::common::safety;

/// Clean mode determines whether anything is actually removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanMode {
    /// Report what would be removed without touching the tree
    DryRun,
    /// Remove stale entries for real
    Delete,
}

impl std::fmt::Display for CleanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanMode::DryRun => write!(f, "dry_run"),
            CleanMode::Delete => write!(f, "delete"),
        }
    }
}

/// One file or directory removed (or that would be removed) by a clean
#[derive(Debug, Clone, Serialize)]
pub struct RemovedEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size_bytes: u64,
}

/// Report from a clean operation
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub mode: CleanMode,
    pub destination: PathBuf,
    pub removed: Vec<RemovedEntry>,
    /// Top-level entries left alone because they are clean-excluded
    pub kept: Vec<PathBuf>,
    pub bytes_freed: u64,
}

impl CleanReport {
    fn new(mode: CleanMode, destination: &Path) -> Self {
        Self {
            mode,
            destination: destination.to_path_buf(),
            removed: Vec::new(),
            kept: Vec::new(),
            bytes_freed: 0,
        }
    }

    fn record(&mut self, path: PathBuf, is_dir: bool, size_bytes: u64) {
        self.bytes_freed += size_bytes;
        self.removed.push(RemovedEntry {
            path,
            is_dir,
            size_bytes,
        });
    }
}

/// Remove stale artifacts from the destination tree.
///
/// Top-level entries are removed unless clean-excluded. The source dropbox is
/// special: its directory skeleton stays, every non-excluded file inside it
/// is removed, and its nested build-artifacts folder is removed outright.
/// A missing destination is not an error. Filesystem errors abort the clean
/// and may leave it half done.
pub fn clean(config: &ImportConfig, mode: CleanMode) -> Result<CleanReport> {
    safety::ensure_safe_destination(config)?;

    let dest = &config.destination;
    let mut report = CleanReport::new(mode, dest);

    if !dest.exists() {
        debug!(path = %dest.display(), "destination does not exist, nothing to clean");
        return Ok(report);
    }

    let mut entries = std::fs::read_dir(dest)
        .map_err(ImportError::io(dest))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(ImportError::io(dest))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let path = entry.path();
        let file_type = entry.file_type().map_err(ImportError::io(&path))?;

        if name == config.source_dropbox.as_str() {
            if file_type.is_dir() {
                clean_dropbox(config, &path, mode, &mut report)?;
            }
        } else if config.is_clean_excluded(&name) {
            report.kept.push(path);
        } else if file_type.is_dir() {
            let size = dir_size(&path);
            if mode == CleanMode::Delete {
                debug!(path = %path.display(), "removing directory");
                std::fs::remove_dir_all(&path).map_err(ImportError::io(&path))?;
            }
            report.record(path, true, size);
        } else {
            // plain files and symlinks, which are never followed
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if mode == CleanMode::Delete {
                debug!(path = %path.display(), "removing file");
                std::fs::remove_file(&path).map_err(ImportError::io(&path))?;
            }
            report.record(path, false, size);
        }
    }

    info!(
        removed = report.removed.len(),
        kept = report.kept.len(),
        bytes = report.bytes_freed,
        mode = %mode,
        "clean finished"
    );

    Ok(report)
}

fn clean_dropbox(
    config: &ImportConfig,
    dropbox: &Path,
    mode: CleanMode,
    report: &mut CleanReport,
) -> Result<()> {
    let artifacts = dropbox.join(&config.build_artifacts_dir);

    let walker = WalkDir::new(dropbox)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != artifacts.as_path());

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        if config.is_clean_excluded(entry.file_name()) {
            continue;
        }

        let path = entry.path().to_path_buf();
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if mode == CleanMode::Delete {
            debug!(path = %path.display(), "removing source file");
            std::fs::remove_file(&path).map_err(ImportError::io(&path))?;
        }
        report.record(path, false, size);
    }

    if artifacts.exists() {
        let size = dir_size(&artifacts);
        if mode == CleanMode::Delete {
            debug!(path = %artifacts.display(), "removing build artifacts");
            std::fs::remove_dir_all(&artifacts).map_err(ImportError::io(&artifacts))?;
        }
        report.record(artifacts, true, size);
    }

    Ok(())
}

/// Total size of the regular files under `path` (logical length)
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_missing_destination_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = ImportConfig::with_defaults(dir.path()).unwrap();
        let report = clean(&config, CleanMode::Delete).unwrap();
        assert!(report.removed.is_empty());
        assert!(!config.destination.exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ImportConfig::with_defaults(dir.path()).unwrap();
        touch(&config.destination.join("stale.h"));
        touch(&config.dropbox_path().join("old.S"));

        let report = clean(&config, CleanMode::DryRun).unwrap();
        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.bytes_freed, 8);
        assert!(config.destination.join("stale.h").exists());
        assert!(config.dropbox_path().join("old.S").exists());
    }

    #[test]
    fn test_artifacts_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = ImportConfig::with_defaults(dir.path()).unwrap();
        touch(&config.dropbox_path().join("CMakeFiles/a.o"));
        touch(&config.dropbox_path().join("CMakeFiles/b.o"));

        let report = clean(&config, CleanMode::Delete).unwrap();
        assert_eq!(report.removed.len(), 1);
        assert!(report.removed[0].is_dir);
        assert_eq!(report.removed[0].size_bytes, 8);
        assert!(!config.dropbox_path().join("CMakeFiles").exists());
        assert!(config.dropbox_path().is_dir());
    }

    #[test]
    fn test_dir_size_sums_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a/b/c.txt"));
        touch(&dir.path().join("d.txt"));
        assert_eq!(dir_size(dir.path()), 8);
    }
}
