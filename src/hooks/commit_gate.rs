//! PreToolUse on Bash: block `git commit` until lint, type check and tests pass.
//!
//! Detection is a plain regex search over the raw command line, so anything
//! that merely mentions `git commit` (an `echo`, a comment) also triggers the
//! gate.

use regex::Regex;
use std::sync::LazyLock;

use super::{HookEnv, Outcome};
use crate::checks::runner::run_checks;
use crate::input::HookInput;
use crate::project::detect_profile;

const SHELL_TOOL: &str = "Bash";

#[allow(clippy::unwrap_used)]
static COMMIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"git\s+commit").unwrap());

pub fn is_commit_command(command: &str) -> bool {
    COMMIT_PATTERN.is_match(command)
}

/// Render the stderr report for a blocked commit
fn block_report(failures: &[String]) -> String {
    let mut report = String::from("🚨 Quality checks failed - commit blocked:\n");
    for name in failures {
        report.push_str(&format!("  ❌ {} failed\n", name));
    }
    report.push_str("\nFix these issues before committing. Run 'make check' to see details.");
    report
}

pub fn run(input: &HookInput, env: &HookEnv) -> Outcome {
    if input.tool_name() != SHELL_TOOL || !is_commit_command(input.command()) {
        return Outcome::Allow;
    }

    let Some(profile) = detect_profile(env.project_dir, &env.config.profiles) else {
        tracing::debug!(
            project_dir = %env.project_dir.display(),
            "commit: no known project type, allowing"
        );
        return Outcome::Allow;
    };
    tracing::debug!(profile = %profile.name, "commit: running quality gate");

    let failures: Vec<String> = run_checks(
        profile,
        env.project_dir,
        env.runner,
        env.config.timeouts.check(),
    )
    .into_iter()
    .filter(|r| !r.passed)
    .map(|r| r.check_name)
    .collect();

    if failures.is_empty() {
        tracing::debug!("commit: all checks pass");
        Outcome::Allow
    } else {
        tracing::debug!(?failures, "commit: blocking");
        Outcome::Block(block_report(&failures))
    }
}
