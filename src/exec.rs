use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CheckResult {
    pub fn failed(stderr: impl Into<String>) -> Self {
        CheckResult {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs shell command lines. Never fails: spawn errors, timeouts and
/// non-zero exits all come back as `success == false`.
pub trait CommandRunner {
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> CheckResult;
}

/// Runs commands through the platform shell.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> CheckResult {
        match run_with_timeout(command, cwd, timeout) {
            Ok(result) => {
                tracing::debug!(command, success = result.success, "command finished");
                result
            }
            Err(e) => {
                tracing::debug!(command, error = %e, "command failed to run");
                CheckResult::failed(format!("{:#}", e))
            }
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

fn run_with_timeout(command: &str, cwd: &Path, timeout: Duration) -> Result<CheckResult> {
    let mut child = shell_command(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn `{}` in {}", command, cwd.display()))?;

    // Drain both pipes while waiting so a chatty child can't fill them and stall.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().context("Failed to poll child")? {
            // A backgrounded grandchild can keep the pipes open past the
            // shell's exit; output still pending at the deadline is dropped.
            return Ok(CheckResult {
                success: status.success(),
                stdout: collect(stdout, deadline),
                stderr: collect(stderr, deadline),
            });
        }
        if Instant::now() >= deadline {
            kill_and_reap(&mut child);
            // Grandchildren may still hold the pipes open, so the reader
            // threads are left detached rather than joined.
            return Ok(CheckResult::failed(format!(
                "Command timed out after {}s",
                timeout.as_secs_f32()
            )));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });
    rx
}

/// Wait for a reader until the deadline; a reader still blocked then is left detached.
fn collect(rx: Option<Receiver<String>>, deadline: Instant) -> String {
    rx.and_then(|rx| {
        rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .ok()
    })
    .unwrap_or_default()
}

/// Quote a value for interpolation into a `sh -c` command line.
#[cfg(unix)]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Quote a value for interpolation into a `cmd /C` command line.
#[cfg(windows)]
pub fn shell_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}



#[cfg(all(test, windows))]
mod windows_tests {
    use super::*;

    #[test]
    fn test_shell_quote_uses_double_quotes() {
        assert_eq!(shell_quote(r"src\a b.py"), r#""src\a b.py""#);
        assert_eq!(shell_quote(r#"say "hi".py"#), r#""say ""hi"".py""#);
    }
}
