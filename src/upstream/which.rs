use std::path::{Path, PathBuf};

/// Resolve `program` to an executable file.
///
/// A name containing a path separator is checked as-is; a bare name is looked
/// up in every `PATH` entry (with `PATHEXT` suffixes on Windows).
pub fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return with_extensions(candidate).into_iter().find(|p| is_executable(p));
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| with_extensions(&dir.join(program)))
        .find(|p| is_executable(p))
}

#[cfg(windows)]
fn with_extensions(base: &Path) -> Vec<PathBuf> {
    let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    let mut out = vec![base.to_path_buf()];
    for ext in pathext.split(';').filter(|e| !e.is_empty()) {
        let mut name: std::ffi::OsString = base.as_os_str().to_os_string();
        name.push(ext);
        out.push(PathBuf::from(name));
    }
    out
}

#[cfg(not(windows))]
fn with_extensions(base: &Path) -> Vec<PathBuf> {
    vec![base.to_path_buf()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
