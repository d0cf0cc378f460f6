use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::errors::{ImportError, Result};

/// Name of the optional settings file at the project root
pub const SETTINGS_FILE_NAME: &str = ".propimport.toml";

/// User-editable settings, read from `.propimport.toml`.
///
/// Every field has a default so a partial file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Destination folder, relative to the project root
    #[serde(default = "default_destination")]
    pub destination: String,

    /// Subfolder of the destination that receives source files
    #[serde(default = "default_source_dropbox")]
    pub source_dropbox: String,

    /// Build output folder nested in the dropbox, removed on clean
    #[serde(default = "default_build_artifacts_dir")]
    pub build_artifacts_dir: String,

    /// Source-object manifest consumed by the build (never generated here)
    #[serde(default = "default_object_list")]
    pub object_list: String,

    /// Folder for upstream checkouts, relative to the project root
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,

    /// Git URL of the upstream repository
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Directory name of the local clone inside the downloads folder
    #[serde(default = "default_upstream_name")]
    pub upstream_name: String,

    /// Folder inside the clone that gets vendored
    #[serde(default = "default_library_subdir")]
    pub library_subdir: String,

    /// Names that survive a clean
    #[serde(default = "default_clean_excludes")]
    pub clean_excludes: Vec<String>,

    /// File names always eligible for copying
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<String>,

    /// Glob patterns identifying assembly sources
    #[serde(default = "default_asm_patterns")]
    pub asm_patterns: Vec<String>,

    /// Git executable name or path
    #[serde(default = "default_git_program")]
    pub git_program: String,
}

fn default_destination() -> String {
    "libpropeller".to_string()
}
fn default_source_dropbox() -> String {
    "source".to_string()
}
fn default_build_artifacts_dir() -> String {
    "CMakeFiles".to_string()
}
fn default_object_list() -> String {
    "libpropellerObjects.cmake".to_string()
}
fn default_downloads_dir() -> String {
    ".external_downloads".to_string()
}
fn default_upstream_url() -> String {
    "https://github.com/libpropeller/libpropeller.git".to_string()
}
fn default_upstream_name() -> String {
    "libpropeller".to_string()
}
fn default_library_subdir() -> String {
    "libpropeller".to_string()
}
fn default_clean_excludes() -> Vec<String> {
    [
        "cog",
        "cmm",
        "lmm",
        "xmm-split",
        "xmm-single",
        "xmmc",
        "CMakeLists.txt",
        "libpropeller.cmake",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_whitelist() -> Vec<String> {
    vec!["numbers.cpp".to_string()]
}
fn default_asm_patterns() -> Vec<String> {
    vec!["*.s".to_string(), "*.S".to_string()]
}
fn default_git_program() -> String {
    "git".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            source_dropbox: default_source_dropbox(),
            build_artifacts_dir: default_build_artifacts_dir(),
            object_list: default_object_list(),
            downloads_dir: default_downloads_dir(),
            upstream_url: default_upstream_url(),
            upstream_name: default_upstream_name(),
            library_subdir: default_library_subdir(),
            clean_excludes: default_clean_excludes(),
            whitelist: default_whitelist(),
            asm_patterns: default_asm_patterns(),
            git_program: default_git_program(),
        }
    }
}

impl Settings {
    /// Default settings file location for a project
    pub fn default_path(project_root: &Path) -> PathBuf {
        project_root.join(SETTINGS_FILE_NAME)
    }

    /// Load settings from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(ImportError::io(path))?;
        toml::from_str(&contents).map_err(|e| ImportError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load settings from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write settings to `path` as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(ImportError::io(dir))?;
        }
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(ImportError::io(path))
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ImportError::Config {
            path: PathBuf::from("<settings>"),
            message: e.to_string(),
        })
    }
}

/// Resolved, immutable configuration for one import run.
///
/// Built once at startup from a project root and [`Settings`], then passed
/// by reference to every operation.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub project_root: PathBuf,
    pub destination: PathBuf,
    pub source_dropbox: String,
    pub build_artifacts_dir: String,
    pub object_list: String,
    pub downloads_dir: PathBuf,
    pub upstream_url: String,
    pub upstream_name: String,
    pub clone_path: PathBuf,
    pub library_subdir: String,
    pub clean_excludes: BTreeSet<String>,
    pub whitelist: BTreeSet<String>,
    pub asm_patterns: Vec<glob::Pattern>,
    pub git_program: String,
}

impl ImportConfig {
    /// Resolve settings against a project root
    pub fn new(project_root: impl Into<PathBuf>, settings: &Settings) -> Result<Self> {
        let project_root = project_root.into();
        let downloads_dir = project_root.join(&settings.downloads_dir);

        let asm_patterns = settings
            .asm_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|source| ImportError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            destination: project_root.join(&settings.destination),
            clone_path: downloads_dir.join(&settings.upstream_name),
            downloads_dir,
            project_root,
            source_dropbox: settings.source_dropbox.clone(),
            build_artifacts_dir: settings.build_artifacts_dir.clone(),
            object_list: settings.object_list.clone(),
            upstream_url: settings.upstream_url.clone(),
            upstream_name: settings.upstream_name.clone(),
            library_subdir: settings.library_subdir.clone(),
            clean_excludes: settings.clean_excludes.iter().cloned().collect(),
            whitelist: settings.whitelist.iter().cloned().collect(),
            asm_patterns,
            git_program: settings.git_program.clone(),
        })
    }

    /// Resolve default settings against a project root
    pub fn with_defaults(project_root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(project_root, &Settings::default())
    }

    /// `<destination>/<source_dropbox>`
    pub fn dropbox_path(&self) -> PathBuf {
        self.destination.join(&self.source_dropbox)
    }

    /// `<clone>/<library_subdir>`, the tree that gets vendored
    pub fn library_path(&self) -> PathBuf {
        self.clone_path.join(&self.library_subdir)
    }

    /// Places the build may keep the source-object manifest
    pub fn object_list_candidates(&self) -> [PathBuf; 2] {
        [
            self.dropbox_path().join(&self.object_list),
            self.destination.join(&self.object_list),
        ]
    }

    pub fn is_clean_excluded(&self, name: &OsStr) -> bool {
        self.clean_excludes.contains(&*name.to_string_lossy())
    }

    pub fn is_whitelisted(&self, name: &OsStr) -> bool {
        self.whitelist.contains(&*name.to_string_lossy())
    }

    /// Check a file name against the assembly-source patterns (case sensitive)
    pub fn is_asm_file(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        self.asm_patterns.iter().any(|p| p.matches(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = ImportConfig::with_defaults("/work/PropWare").unwrap();
        assert_eq!(config.destination, PathBuf::from("/work/PropWare/libpropeller"));
        assert_eq!(
            config.dropbox_path(),
            PathBuf::from("/work/PropWare/libpropeller/source")
        );
        assert_eq!(
            config.clone_path,
            PathBuf::from("/work/PropWare/.external_downloads/libpropeller")
        );
        assert_eq!(
            config.library_path(),
            PathBuf::from("/work/PropWare/.external_downloads/libpropeller/libpropeller")
        );
    }

    #[test]
    fn test_asm_patterns_are_case_sensitive_per_pattern() {
        let config = ImportConfig::with_defaults("/p").unwrap();
        assert!(config.is_asm_file(OsStr::new("pwm32.S")));
        assert!(config.is_asm_file(OsStr::new("serial.s")));
        assert!(!config.is_asm_file(OsStr::new("serial.spin")));
        assert!(!config.is_asm_file(OsStr::new("numbers.cpp")));
    }

    #[test]
    fn test_excludes_and_whitelist() {
        let config = ImportConfig::with_defaults("/p").unwrap();
        assert!(config.is_clean_excluded(OsStr::new("CMakeLists.txt")));
        assert!(config.is_clean_excluded(OsStr::new("xmm-split")));
        assert!(!config.is_clean_excluded(OsStr::new("numbers.cpp")));
        assert!(config.is_whitelisted(OsStr::new("numbers.cpp")));
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: Settings = toml::from_str("git_program = \"/opt/git/bin/git\"\n").unwrap();
        assert_eq!(settings.git_program, "/opt/git/bin/git");
        assert_eq!(settings.destination, "libpropeller");
        assert_eq!(settings.clean_excludes.len(), 8);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let settings = Settings {
            asm_patterns: vec!["[".to_string()],
            ..Settings::default()
        };
        let err = ImportConfig::new("/p", &settings).unwrap_err();
        assert!(matches!(err, ImportError::Pattern { .. }));
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = Settings::default_path(dir.path());
        let mut settings = Settings::default();
        settings.whitelist.push("extra.cpp".to_string());
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_malformed_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "whitelist = 3").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(ImportError::Config { .. })
        ));
    }
}
