//! UserPromptSubmit: stdout is appended to the conversation context.

use chrono::NaiveDateTime;
use std::path::Path;
use std::time::Duration;

use super::{HookEnv, Outcome};
use crate::exec::CommandRunner;
use crate::input::HookInput;
use crate::project::project_name;

const GATE_NOTE: &str = "Note: Quality gates will run before any git commits";
const DIRTY_LINE: &str = "Git status: Uncommitted changes present";
const DETACHED_HEAD: &str = "HEAD (detached)";

/// Branch and dirty state of the project's repository
#[derive(Debug, PartialEq, Eq)]
pub struct GitInfo {
    pub branch: String,
    pub has_changes: bool,
}

/// Query git for the current branch and working tree state.
/// None when the branch can't be determined (not a repo, no git, timeout).
pub fn git_info(
    runner: &dyn CommandRunner,
    project_dir: &Path,
    timeout: Duration,
) -> Option<GitInfo> {
    let branch = runner.run("git branch --show-current", project_dir, timeout);
    if !branch.success {
        tracing::debug!(stderr = %branch.stderr.trim(), "no git branch");
        return None;
    }

    let branch = match branch.stdout.trim() {
        "" => DETACHED_HEAD.to_string(),
        name => name.to_string(),
    };

    let status = runner.run("git status --porcelain", project_dir, timeout);
    let has_changes = status.success && !status.stdout.trim().is_empty();

    Some(GitInfo {
        branch,
        has_changes,
    })
}

fn mentions_keyword(prompt: &str, keywords: &[String]) -> bool {
    let prompt = prompt.to_lowercase();
    keywords.iter().any(|k| prompt.contains(k.as_str()))
}

/// Build the context block for a prompt at the given time.
pub fn annotate(input: &HookInput, env: &HookEnv, now: NaiveDateTime) -> Outcome {
    let mut lines = vec![
        format!("Current time: {}", now.format("%Y-%m-%d %H:%M:%S")),
        format!("Project directory: {}", project_name(env.project_dir)),
    ];

    if let Some(info) = git_info(env.runner, env.project_dir, env.config.timeouts.git()) {
        lines.push(format!("Git branch: {}", info.branch));
        if info.has_changes {
            lines.push(DIRTY_LINE.to_string());
        }
    }

    if mentions_keyword(&input.prompt, &env.config.keywords) {
        lines.push(GATE_NOTE.to_string());
    }

    Outcome::Print(lines.join("\n"))
}

pub fn run(input: &HookInput, env: &HookEnv) -> Outcome {
    annotate(input, env, chrono::Local::now().naive_local())
}
