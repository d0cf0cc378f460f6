use std::path::{Component, Path};

use super::config::ImportConfig;
use super::errors::{ImportError, Result};

/// System paths that must never be cleaned or overwritten.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/bin",
    "/boot",
    "/dev",
    "/etc",
    "/home",
    "/lib",
    "/opt",
    "/proc",
    "/sbin",
    "/sys",
    "/tmp",
    "/usr",
    "/var",
    "/System",
    "/Library",
    "/Applications",
    "/Users",
    "/Volumes",
];

/// Check if a path is a system location or the home directory
pub fn is_protected(path: &Path) -> bool {
    if path.parent().is_none() {
        // filesystem root, or a bare drive prefix on Windows
        return true;
    }

    let path_str = path.to_string_lossy();
    if PROTECTED_PATHS.iter().any(|p| path_str == *p) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        if path == home {
            return true;
        }
    }

    false
}

/// Refuse destinations that would let a clean wipe something it shouldn't.
///
/// The destination must be a proper descendant of the project root, must not
/// climb out with `..`, and must not be a protected system path.
pub fn ensure_safe_destination(config: &ImportConfig) -> Result<()> {
    let dest = &config.destination;

    if is_protected(dest) {
        return Err(ImportError::ProtectedPath {
            path: dest.clone(),
            reason: "system or home directory".to_string(),
        });
    }

    if dest.components().any(|c| c == Component::ParentDir) {
        return Err(ImportError::ProtectedPath {
            path: dest.clone(),
            reason: "destination may not contain '..'".to_string(),
        });
    }

    if dest == &config.project_root {
        return Err(ImportError::ProtectedPath {
            path: dest.clone(),
            reason: "destination is the project root".to_string(),
        });
    }

    if !dest.starts_with(&config.project_root) {
        return Err(ImportError::ProtectedPath {
            path: dest.clone(),
            reason: format!(
                "destination is outside the project root '{}'",
                config.project_root.display()
            ),
        });
    }

    Ok(())
}
