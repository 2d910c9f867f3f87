use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod checks;
mod config;
mod exec;
mod hooks;
mod input;
mod presets;
mod project;

use exec::ShellRunner;
use hooks::{HookEnv, Outcome};
use input::HookInput;

/// Env var holding a tracing filter; logging stays off when unset
const LOG_ENV: &str = "QUALITY_HOOKS_LOG";
const LOG_FILENAME: &str = "quality-hooks.log";

/// Non-blocking error status for a broken hook registration.
/// clap's own usage status (2) would read as a block to the host.
const USAGE_EXIT_CODE: u8 = 1;

#[derive(Parser)]
#[command(name = "quality-hooks", version, about)]
struct Cli {
    /// Project directory (defaults to $CLAUDE_PROJECT_DIR, then the cwd)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Clone, Copy)]
enum Cmd {
    /// UserPromptSubmit: print time, project and git context
    Context,
    /// PostToolUse (Write/Edit): advise when the edited file needs formatting
    FormatCheck,
    /// PreToolUse (Bash): block `git commit` until lint, types and tests pass
    CommitGate,
    /// Route on hook_event_name to one of the hooks above
    Dispatch,
}

/// Log to $TMPDIR/quality-hooks.log when QUALITY_HOOKS_LOG is set.
/// stdout and stderr belong to the hook protocol.
fn init_logging() {
    let Ok(directives) = std::env::var(LOG_ENV) else {
        return;
    };
    let path = std::env::temp_dir().join(LOG_FILENAME);
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            tracing::warn!(error = %e, "invalid command line");
            let _ = e.print();
            return ExitCode::from(USAGE_EXIT_CODE);
        }
    };

    // Unreadable or malformed input must never disturb the host
    let input = match read_input() {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable hook input");
            return ExitCode::SUCCESS;
        }
    };

    tracing::debug!(
        event = %input.hook_event_name,
        session = %input.session_id,
        cwd = %input.cwd,
        tool = input.tool_name.as_deref().unwrap_or("None"),
        "hook invoked"
    );

    let project_dir = project::resolve_project_dir(cli.project_dir);
    let config = config::load_project_config(&project_dir);
    let env = HookEnv {
        project_dir: &project_dir,
        config: &config,
        runner: &ShellRunner,
    };

    let outcome = match cli.command {
        Cmd::Context => hooks::context::run(&input, &env),
        Cmd::FormatCheck => hooks::format_check::run(&input, &env),
        Cmd::CommitGate => hooks::commit_gate::run(&input, &env),
        Cmd::Dispatch => hooks::dispatch(&input, &env),
    };

    emit(&outcome);
    outcome.exit_code()
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn emit(outcome: &Outcome) {
    match outcome {
        Outcome::Allow => {}
        Outcome::Print(text) => println!("{}", text),
        Outcome::Block(text) => eprintln!("{}", text),
    }
}

fn read_input() -> Result<HookInput> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let input: HookInput = serde_json::from_str(&buffer)?;
    Ok(input)
}
