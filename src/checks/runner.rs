use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::{GateCheck, GateProfile};
use crate::exec::CommandRunner;

/// Result of running a single gate check
#[derive(Debug, PartialEq, Eq)]
pub struct StepResult {
    pub check_name: String,
    pub passed: bool,
}

/// Run every applicable check of a profile, in order.
/// No short-circuit: a failing check never stops later ones.
pub fn run_checks(
    profile: &GateProfile,
    project_dir: &Path,
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> Vec<StepResult> {
    profile
        .checks
        .iter()
        .filter(|check| applies(check, project_dir))
        .map(|check| run_single_check(check, project_dir, runner, timeout))
        .collect()
}

/// Check the path_exists condition
fn applies(check: &GateCheck, project_dir: &Path) -> bool {
    check
        .path_exists
        .as_ref()
        .is_none_or(|path| project_dir.join(path).exists())
}

/// Primary command, then the fallback only if the primary did not succeed.
/// Both share one timeout budget.
fn run_single_check(
    check: &GateCheck,
    project_dir: &Path,
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> StepResult {
    let deadline = Instant::now() + timeout;
    let mut passed = runner.run(&check.command, project_dir, timeout).success;

    if !passed {
        if let Some(fallback) = &check.fallback {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(check = %check.name, "no time left for fallback");
            } else {
                tracing::debug!(
                    check = %check.name,
                    fallback = %fallback,
                    "primary failed, trying fallback"
                );
                passed = runner.run(fallback, project_dir, remaining).success;
            }
        }
    }

    tracing::debug!(check = %check.name, passed, "gate check");
    StepResult {
        check_name: check.name.clone(),
        passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::fake::FakeRunner;
    use crate::exec::CheckResult;
    use std::fs;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(120);

    fn make_check(name: &str, command: &str, fallback: Option<&str>) -> GateCheck {
        GateCheck {
            name: name.to_string(),
            command: command.to_string(),
            fallback: fallback.map(String::from),
            path_exists: None,
        }
    }

    fn make_profile(checks: Vec<GateCheck>) -> GateProfile {
        GateProfile {
            name: "test".to_string(),
            marker: "Makefile".to_string(),
            checks,
        }
    }

    #[test]
    fn test_fallback_skipped_when_primary_passes() {
        let profile = make_profile(vec![make_check("Lint", "primary", Some("fallback"))]);
        let runner = FakeRunner::new();

        let results = run_checks(&profile, Path::new("/p"), &runner, TIMEOUT);
        assert!(results[0].passed);
        assert_eq!(runner.commands(), vec!["primary"]);
    }

    #[test]
    fn test_fallback_rescues_failed_primary() {
        let profile = make_profile(vec![make_check("Lint", "primary", Some("fallback"))]);
        let runner = FakeRunner::new().fail("primary");

        let results = run_checks(&profile, Path::new("/p"), &runner, TIMEOUT);
        assert!(results[0].passed);
        assert_eq!(runner.commands(), vec!["primary", "fallback"]);
    }

    #[test]
    fn test_fallback_gets_remaining_budget() {
        let profile = make_profile(vec![make_check("Tests", "primary", Some("fallback"))]);
        let runner = FakeRunner::new().fail("primary");

        run_checks(&profile, Path::new("/p"), &runner, TIMEOUT);
        let calls = runner.calls.borrow();
        assert_eq!(calls[0].2, TIMEOUT);
        assert!(calls[1].2 <= TIMEOUT);
        assert!(!calls[1].2.is_zero());
    }

    /// Primary that uses up the whole budget before failing
    struct SlowFailRunner;

    impl CommandRunner for SlowFailRunner {
        fn run(&self, command: &str, _cwd: &Path, timeout: Duration) -> CheckResult {
            assert_eq!(command, "primary", "fallback must not run");
            std::thread::sleep(timeout);
            CheckResult::failed("timed out")
        }
    }

    #[test]
    fn test_exhausted_budget_skips_fallback() {
        let profile = make_profile(vec![make_check("Tests", "primary", Some("fallback"))]);

        let results = run_checks(
            &profile,
            Path::new("/p"),
            &SlowFailRunner,
            Duration::from_millis(20),
        );
        assert!(!results[0].passed);
    }

    #[test]
    fn test_both_fail() {
        let profile = make_profile(vec![make_check("Lint", "primary", Some("fallback"))]);
        let runner = FakeRunner::new().fail("primary").fail("fallback");

        let results = run_checks(&profile, Path::new("/p"), &runner, TIMEOUT);
        assert!(!results[0].passed);
    }

    #[test]
    fn test_no_short_circuit() {
        let profile = make_profile(vec![
            make_check("A", "cmd-a", None),
            make_check("B", "cmd-b", None),
            make_check("C", "cmd-c", None),
        ]);
        let runner = FakeRunner::new().fail("cmd-a");

        let results = run_checks(&profile, Path::new("/p"), &runner, TIMEOUT);
        let passed: Vec<bool> = results.iter().map(|r| r.passed).collect();
        assert_eq!(passed, vec![false, true, true]);
        assert_eq!(runner.commands(), vec!["cmd-a", "cmd-b", "cmd-c"]);
    }

    #[test]
    fn test_path_exists_condition() {
        let temp = TempDir::new().unwrap();
        let mut conditional = make_check("Type check", "tsc", None);
        conditional.path_exists = Some("tsconfig.json".to_string());
        let profile = make_profile(vec![make_check("Lint", "lint", None), conditional]);

        let runner = FakeRunner::new();
        let results = run_checks(&profile, temp.path(), &runner, TIMEOUT);
        assert_eq!(results.len(), 1);

        fs::write(temp.path().join("tsconfig.json"), "{}").unwrap();
        let runner = FakeRunner::new();
        let results = run_checks(&profile, temp.path(), &runner, TIMEOUT);
        assert_eq!(results.len(), 2);
        assert_eq!(runner.commands(), vec!["lint", "tsc"]);
    }
}
