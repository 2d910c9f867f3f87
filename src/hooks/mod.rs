use std::path::Path;
use std::process::ExitCode;

use crate::config::HooksConfig;
use crate::exec::CommandRunner;
use crate::input::HookInput;

pub mod commit_gate;
pub mod context;
pub mod format_check;

/// Exit status that tells the host to cancel the tool call
pub const BLOCK_EXIT_CODE: u8 = 2;

/// Everything a hook may consult besides its input.
pub struct HookEnv<'a> {
    pub project_dir: &'a Path,
    pub config: &'a HooksConfig,
    pub runner: &'a dyn CommandRunner,
}

/// What a hook tells its host.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0, no output
    Allow,
    /// Exit 0, text on stdout
    Print(String),
    /// Exit 2, text on stderr
    Block(String),
}

impl Outcome {
    pub fn exit_status(&self) -> u8 {
        match self {
            Outcome::Allow | Outcome::Print(_) => 0,
            Outcome::Block(_) => BLOCK_EXIT_CODE,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

/// Tools whose PostToolUse events carry a freshly written file
const EDIT_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Route on hook_event_name so one registration can serve every event.
pub fn dispatch(input: &HookInput, env: &HookEnv) -> Outcome {
    match input.hook_event_name.as_str() {
        "UserPromptSubmit" => context::run(input, env),
        "PostToolUse" if EDIT_TOOLS.contains(&input.tool_name()) => format_check::run(input, env),
        "PreToolUse" => commit_gate::run(input, env),
        other => {
            tracing::debug!(event = other, tool = input.tool_name(), "nothing to do");
            Outcome::Allow
        }
    }
}
