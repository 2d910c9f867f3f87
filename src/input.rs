use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Input JSON from Claude Code hook system.
///
/// Every field is optional: the host sends different subsets per event.
/// Missing, null and wrongly typed values all fall back to the default, so
/// only invalid JSON or a bare scalar payload counts as malformed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HookInput {
    #[serde(deserialize_with = "or_default")]
    pub hook_event_name: String,
    #[serde(deserialize_with = "or_default")]
    pub session_id: String,
    #[serde(deserialize_with = "or_default")]
    pub cwd: String,
    /// Submitted prompt (UserPromptSubmit only)
    #[serde(deserialize_with = "or_default")]
    pub prompt: String,
    /// Tool name (only present for PreToolUse/PostToolUse events)
    #[serde(deserialize_with = "or_default")]
    pub tool_name: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub tool_input: ToolInput,
}

/// Tool-specific arguments. Only the fields the hooks look at are kept.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToolInput {
    /// Target of Write/Edit
    #[serde(deserialize_with = "or_default")]
    pub file_path: Option<String>,
    /// Shell command of Bash
    #[serde(deserialize_with = "or_default")]
    pub command: Option<String>,
}

/// Accept any JSON value, keeping it only if it has the expected shape
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl HookInput {
    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    pub fn file_path(&self) -> &str {
        self.tool_input.file_path.as_deref().unwrap_or("")
    }

    pub fn command(&self) -> &str {
        self.tool_input.command.as_deref().unwrap_or("")
    }
}
