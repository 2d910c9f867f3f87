use anyhow::{bail, Context, Result};
use glob::Pattern;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::presets::{BUILTIN_FORMATTERS, BUILTIN_PROFILES, DEFAULT_KEYWORDS};

pub const CONFIG_FILENAME: &str = "quality-hooks.yaml";

/// Placeholder in formatter commands, replaced by the quoted file path
pub const FILE_PLACEHOLDER: &str = "{file}";

/// A single gate step
#[derive(Debug, Clone, Deserialize)]
pub struct GateCheck {
    /// Name of the check (shown in the block report)
    pub name: String,
    /// Primary shell command
    pub command: String,
    /// Runs only when the primary command fails
    pub fallback: Option<String>,
    /// Optional: check only applies if this path exists (relative to project dir)
    pub path_exists: Option<String>,
}

/// Checks that apply when a marker file is present
#[derive(Debug, Clone, Deserialize)]
pub struct GateProfile {
    pub name: String,
    /// Marker file (relative to project dir) that selects this profile
    pub marker: String,
    pub checks: Vec<GateCheck>,
}

/// Format check for files matching any of `paths`
#[derive(Debug, Clone, Deserialize)]
pub struct Formatter {
    pub name: String,
    /// Glob patterns, matched against the full path and the file name
    pub paths: Vec<String>,
    /// Shell command containing `{file}`
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub git_secs: u64,
    pub format_secs: u64,
    pub check_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            git_secs: 5,
            format_secs: 30,
            check_secs: 120,
        }
    }
}

impl Timeouts {
    pub fn git(&self) -> Duration {
        Duration::from_secs(self.git_secs)
    }

    pub fn format(&self) -> Duration {
        Duration::from_secs(self.format_secs)
    }

    pub fn check(&self) -> Duration {
        Duration::from_secs(self.check_secs)
    }
}

/// Raw configuration structure (as parsed from YAML)
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HooksConfigRaw {
    /// Built-in profile names to keep, in order
    presets: Option<Vec<String>>,
    /// Custom profiles, tried before presets
    profiles: Option<Vec<GateProfile>>,
    /// Custom formatters, tried before built-ins
    formatters: Option<Vec<Formatter>>,
    keywords: Option<Vec<String>>,
    #[serde(default)]
    timeouts: Timeouts,
}

/// Resolved configuration (presets expanded, every list defined)
#[derive(Debug, Clone)]
pub struct HooksConfig {
    /// Checked in order, first marker present wins
    pub profiles: Vec<GateProfile>,
    /// Checked in order, first matching glob wins
    pub formatters: Vec<Formatter>,
    /// Prompt words (lowercase) that trigger the quality gate note
    pub keywords: Vec<String>,
    pub timeouts: Timeouts,
}

impl Default for HooksConfig {
    fn default() -> Self {
        HooksConfig {
            profiles: BUILTIN_PROFILES.clone(),
            formatters: BUILTIN_FORMATTERS.clone(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Resolves preset names to their built-in profiles
fn resolve_presets(preset_names: &[String], config_path: &Path) -> Result<Vec<GateProfile>> {
    let mut profiles = Vec::new();

    for name in preset_names {
        match BUILTIN_PROFILES.iter().find(|p| &p.name == name) {
            Some(profile) => profiles.push(profile.clone()),
            None => {
                let known: Vec<&str> = BUILTIN_PROFILES.iter().map(|p| p.name.as_str()).collect();
                bail!(
                    "Invalid config at {}: unknown preset '{}' (known: {})",
                    config_path.display(),
                    name,
                    known.join(", ")
                );
            }
        }
    }

    Ok(profiles)
}

fn validate_profile(profile: &GateProfile, config_path: &Path) -> Result<()> {
    if profile.name.is_empty() {
        bail!(
            "Invalid config at {}: profile missing 'name'",
            config_path.display()
        );
    }
    if profile.marker.is_empty() {
        bail!(
            "Invalid config at {}: profile '{}' missing 'marker'",
            config_path.display(),
            profile.name
        );
    }
    if profile.checks.is_empty() {
        bail!(
            "Invalid config at {}: profile '{}' has no checks",
            config_path.display(),
            profile.name
        );
    }
    for check in &profile.checks {
        if check.name.is_empty() || check.command.trim().is_empty() {
            bail!(
                "Invalid config at {}: every check in profile '{}' needs 'name' and 'command'",
                config_path.display(),
                profile.name
            );
        }
    }
    Ok(())
}

fn validate_formatter(formatter: &Formatter, config_path: &Path) -> Result<()> {
    if formatter.name.is_empty() {
        bail!(
            "Invalid config at {}: formatter missing 'name'",
            config_path.display()
        );
    }
    if formatter.paths.is_empty() {
        bail!(
            "Invalid config at {}: formatter '{}' missing 'paths'",
            config_path.display(),
            formatter.name
        );
    }
    for path in &formatter.paths {
        Pattern::new(path).with_context(|| {
            format!(
                "Invalid config at {}: formatter '{}' has invalid glob '{}'",
                config_path.display(),
                formatter.name,
                path
            )
        })?;
    }
    if !formatter.command.contains(FILE_PLACEHOLDER) {
        bail!(
            "Invalid config at {}: formatter '{}' command must contain '{}'",
            config_path.display(),
            formatter.name,
            FILE_PLACEHOLDER
        );
    }
    Ok(())
}

/// A zero timeout would fail every command before it starts
fn validate_timeouts(timeouts: &Timeouts, config_path: &Path) -> Result<()> {
    for (field, secs) in [
        ("git_secs", timeouts.git_secs),
        ("format_secs", timeouts.format_secs),
        ("check_secs", timeouts.check_secs),
    ] {
        if secs == 0 {
            bail!(
                "Invalid config at {}: timeouts.{} must be greater than zero",
                config_path.display(),
                field
            );
        }
    }
    Ok(())
}

/// Loads and parses a quality-hooks.yaml config file.
/// Custom profiles and formatters take precedence over built-ins.
pub fn load_config(config_path: &Path) -> Result<HooksConfig> {
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

    // An empty file parses as YAML null
    if content.trim().is_empty() {
        return Ok(HooksConfig::default());
    }

    let parsed: HooksConfigRaw = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", config_path.display()))?;
    validate_timeouts(&parsed.timeouts, config_path)?;

    let user_profiles = parsed.profiles.unwrap_or_default();
    for profile in &user_profiles {
        validate_profile(profile, config_path)?;
    }

    let user_formatters = parsed.formatters.unwrap_or_default();
    for formatter in &user_formatters {
        validate_formatter(formatter, config_path)?;
    }

    let preset_profiles = match &parsed.presets {
        Some(names) => resolve_presets(names, config_path)?,
        None => BUILTIN_PROFILES.clone(),
    };

    // Merge: user entries first, then built-ins
    let mut profiles = user_profiles;
    profiles.extend(preset_profiles);

    let mut formatters = user_formatters;
    formatters.extend(BUILTIN_FORMATTERS.iter().cloned());

    let keywords = match parsed.keywords {
        Some(words) => words.iter().map(|w| w.to_lowercase()).collect(),
        None => HooksConfig::default().keywords,
    };

    Ok(HooksConfig {
        profiles,
        formatters,
        keywords,
        timeouts: parsed.timeouts,
    })
}

/// Loads quality-hooks.yaml from the project directory if present.
/// A broken config never breaks a hook: it is logged and the defaults apply.
pub fn load_project_config(project_dir: &Path) -> HooksConfig {
    let config_path = project_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return HooksConfig::default();
    }

    match load_config(&config_path) {
        Ok(config) => {
            tracing::debug!(path = %config_path.display(), "loaded config");
            config
        }
        Err(e) => {
            tracing::warn!(error = ?e, "ignoring invalid config");
            HooksConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir, content: &str) -> std::path::PathBuf {
        let config_path = temp.path().join(CONFIG_FILENAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    fn test_load_config_with_custom_profile() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            &temp,
            r#"
profiles:
  - name: rust
    marker: Cargo.toml
    checks:
      - name: Lint
        command: cargo clippy
      - name: Tests
        command: cargo test
        fallback: make test
"#,
        );

        let config = load_config(&config_path).unwrap();
        let names: Vec<&str> = config.profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "python", "node"]);
        assert_eq!(config.profiles[0].checks[1].fallback.as_deref(), Some("make test"));
    }

    #[test]
    fn test_presets_select_and_order_builtins() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "presets: [node]\n");

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].name, "node");
    }

    #[test]
    fn test_empty_presets_disable_gate() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "presets: []\n");

        let config = load_config(&config_path).unwrap();
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_unknown_preset_fails() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "presets: [cobol]\n");

        let err = load_config(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown preset 'cobol'"));
    }

    #[test]
    fn test_profile_without_checks_fails() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            &temp,
            r#"
profiles:
  - name: empty
    marker: Makefile
    checks: []
"#,
        );

        assert!(load_config(&config_path).is_err());
    }

    #[test]
    fn test_formatter_requires_placeholder() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            &temp,
            r#"
formatters:
  - name: rustfmt
    paths: ["*.rs"]
    command: rustfmt --check
"#,
        );

        assert!(load_config(&config_path).is_err());
    }

    #[test]
    fn test_custom_formatter_precedes_builtins() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            &temp,
            r#"
formatters:
  - name: ruff
    paths: ["*.py"]
    command: ruff format --check {file}
"#,
        );

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.formatters[0].name, "ruff");
        assert!(config.formatters.iter().any(|f| f.name == "black"));
    }

    #[test]
    fn test_keywords_and_timeouts() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            &temp,
            r#"
keywords: [Rebase, commit]
timeouts:
  check_secs: 600
"#,
        );

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.keywords, vec!["rebase", "commit"]);
        assert_eq!(config.timeouts.check(), Duration::from_secs(600));
        assert_eq!(config.timeouts.git(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "timeouts:\n  check_secs: 0\n");

        let err = load_config(&config_path).unwrap_err();
        assert!(err.to_string().contains("timeouts.check_secs"));

        let config = load_project_config(temp.path());
        assert_eq!(config.timeouts.check_secs, 120);
    }

    #[test]
    fn test_unknown_field_fails() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "chekcs: []\n");

        assert!(load_config(&config_path).is_err());
    }

    #[test]
    fn test_project_config_missing_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_project_config(temp.path());
        assert_eq!(config.profiles.len(), BUILTIN_PROFILES.len());
        assert_eq!(config.timeouts.check_secs, 120);
    }

    #[test]
    fn test_project_config_invalid_uses_defaults() {
        let temp = TempDir::new().unwrap();
        write_config(&temp, "profiles: [not, a, mapping]\n");

        let config = load_project_config(temp.path());
        assert_eq!(config.profiles.len(), BUILTIN_PROFILES.len());
    }
}
