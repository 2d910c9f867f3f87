//! PostToolUse after Write/Edit. Advisory only: the edit has already happened.

use glob::Pattern;
use std::path::Path;

use super::{HookEnv, Outcome};
use crate::config::{Formatter, FILE_PLACEHOLDER};
use crate::exec::shell_quote;
use crate::input::HookInput;

/// Check if a file path matches a glob pattern
fn file_matches_pattern(file_path: &str, pattern: &Pattern) -> bool {
    if pattern.matches(file_path) {
        return true;
    }

    // Also try just the filename, so "*.py" matches "src/app/main.py"
    Path::new(file_path)
        .file_name()
        .is_some_and(|name| pattern.matches(name.to_string_lossy().as_ref()))
}

/// First formatter with a glob matching the file
pub fn formatter_for<'a>(file_path: &str, formatters: &'a [Formatter]) -> Option<&'a Formatter> {
    formatters.iter().find(|f| {
        f.paths
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| file_matches_pattern(file_path, &p))
    })
}

pub fn run(input: &HookInput, env: &HookEnv) -> Outcome {
    let file_path = input.file_path();
    if file_path.is_empty() {
        return Outcome::Allow;
    }

    let Some(formatter) = formatter_for(file_path, &env.config.formatters) else {
        tracing::debug!(file_path, "no formatter for file");
        return Outcome::Allow;
    };

    let command = formatter
        .command
        .replace(FILE_PLACEHOLDER, &shell_quote(file_path));
    let result = env
        .runner
        .run(&command, env.project_dir, env.config.timeouts.format());
    tracing::debug!(
        formatter = %formatter.name,
        file_path,
        success = result.success,
        "format check"
    );

    if result.success {
        Outcome::Allow
    } else {
        Outcome::Print(format!(
            "File {} needs formatting - consider running 'make format'",
            file_path
        ))
    }
}
