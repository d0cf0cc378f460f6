use std::path::{Path, PathBuf};
use tracing::debug;

use super::config::ImportConfig;
use super::errors::{ImportError, Result};

/// Directory the importer is expected to be launched from
pub const UTIL_DIR_NAME: &str = "util";

/// Verify we were launched from `<project root>/util` and return the project root.
pub fn check_working_dir(cwd: &Path) -> Result<PathBuf> {
    let is_util = cwd
        .file_name()
        .map(|name| name == UTIL_DIR_NAME)
        .unwrap_or(false);

    match cwd.parent() {
        Some(root) if is_util => Ok(root.to_path_buf()),
        _ => Err(ImportError::WrongWorkingDir {
            cwd: cwd.to_path_buf(),
        }),
    }
}

/// Pick the project root: an explicit root wins, otherwise the working
/// directory must be the project's `util` folder.
pub fn resolve_project_root(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let root = match explicit {
        Some(root) if root.is_absolute() => root.to_path_buf(),
        Some(root) => cwd.join(root),
        None => check_working_dir(cwd)?,
    };
    std::fs::canonicalize(&root).map_err(ImportError::io(&root))
}

/// Create the downloads folder if it does not exist yet
pub fn init_downloads_folder(config: &ImportConfig) -> Result<()> {
    let dir = &config.downloads_dir;
    if !dir.exists() {
        debug!(path = %dir.display(), "creating downloads folder");
        std::fs::create_dir_all(dir).map_err(ImportError::io(dir))?;
    }
    Ok(())
}
