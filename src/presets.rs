use crate::config::{Formatter, GateCheck, GateProfile};
use std::sync::LazyLock;

/// Prompt words that earn the quality gate note
pub const DEFAULT_KEYWORDS: &[&str] = &["commit", "git", "push", "merge"];

fn check(name: &str, command: &str, fallback: Option<&str>) -> GateCheck {
    GateCheck {
        name: name.to_string(),
        command: command.to_string(),
        fallback: fallback.map(String::from),
        path_exists: None,
    }
}

/// Built-in gate profiles, in detection order.
/// Can be narrowed or reordered in quality-hooks.yaml via `presets: [...]`.
pub static BUILTIN_PROFILES: LazyLock<Vec<GateProfile>> = LazyLock::new(|| {
    vec![
        GateProfile {
            name: "python".to_string(),
            marker: "pyproject.toml".to_string(),
            checks: vec![
                check("Lint", "poetry run flake8 src/ tests/", Some("make lint")),
                check("Type check", "poetry run mypy src/", Some("make type-check")),
                check("Tests", "poetry run pytest", Some("make test")),
            ],
        },
        GateProfile {
            name: "node".to_string(),
            marker: "package.json".to_string(),
            checks: vec![
                check("Lint", "npm run lint", Some("make lint")),
                GateCheck {
                    path_exists: Some("tsconfig.json".to_string()),
                    ..check("Type check", "npx tsc --noEmit", None)
                },
                check("Tests", "npm test", Some("make test")),
            ],
        },
    ]
});

pub static BUILTIN_FORMATTERS: LazyLock<Vec<Formatter>> = LazyLock::new(|| {
    vec![
        Formatter {
            name: "black".to_string(),
            paths: vec!["*.py".to_string()],
            command: "black --check {file}".to_string(),
        },
        Formatter {
            name: "prettier".to_string(),
            paths: ["*.js", "*.jsx", "*.ts", "*.tsx"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            command: "npx prettier --check {file}".to_string(),
        },
    ]
});
