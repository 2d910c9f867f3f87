use std::path::{Path, PathBuf};

use crate::config::GateProfile;

pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Resolve the project directory: explicit flag, then $CLAUDE_PROJECT_DIR,
/// then the current working directory.
pub fn resolve_project_dir(flag: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Some(dir) = std::env::var_os(PROJECT_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Base name of the project directory, for display.
pub fn project_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| project_dir.display().to_string())
}

/// First profile whose marker file exists in the project directory.
pub fn detect_profile<'a>(
    project_dir: &Path,
    profiles: &'a [GateProfile],
) -> Option<&'a GateProfile> {
    profiles
        .iter()
        .find(|p| project_dir.join(&p.marker).exists())
}
