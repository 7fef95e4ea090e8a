//! Task definitions
//!
//! ```json
//! { "id": "readme", "type": "write",
//!   "config": { "path": "README.md", "file": "templates/readme.hbs" },
//!   "dependencies": ["src-dir"], "required": false }
//! ```
//!
//! `type` selects the executor; `config` is that executor's payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::OverrideStrategy;
use super::enabled::Enabled;
use super::source::Source;

/// Task type. Known kinds carry a field-group table used when merging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskKind {
    Write,
    Copy,
    Move,
    Rename,
    Delete,
    Mkdir,
    Exec,
    ExecFile,
    /// Any executor registered under another name
    Other(String),
}

/// Groups of config keys that are mutually exclusive for one task kind.
pub type FieldGroups = &'static [&'static [&'static str]];

const WRITE_GROUPS: FieldGroups = &[&["content", "file"]];
const COPY_GROUPS: FieldGroups = &[&["from", "glob"]];
const EXEC_GROUPS: FieldGroups = &[&["command", "script"]];
const NO_GROUPS: FieldGroups = &[];

impl TaskKind {
    pub fn as_str(&self) -> &str {
        match self {
            TaskKind::Write => "write",
            TaskKind::Copy => "copy",
            TaskKind::Move => "move",
            TaskKind::Rename => "rename",
            TaskKind::Delete => "delete",
            TaskKind::Mkdir => "mkdir",
            TaskKind::Exec => "exec",
            TaskKind::ExecFile => "exec-file",
            TaskKind::Other(name) => name,
        }
    }

    /// Mutually exclusive config field groups for this kind
    pub fn exclusive_groups(&self) -> FieldGroups {
        match self {
            TaskKind::Write => WRITE_GROUPS,
            TaskKind::Copy | TaskKind::Move => COPY_GROUPS,
            TaskKind::Exec => EXEC_GROUPS,
            TaskKind::Rename
            | TaskKind::Delete
            | TaskKind::Mkdir
            | TaskKind::ExecFile
            | TaskKind::Other(_) => NO_GROUPS,
        }
    }
}

impl From<String> for TaskKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "write" => TaskKind::Write,
            "copy" => TaskKind::Copy,
            "move" => TaskKind::Move,
            "rename" => TaskKind::Rename,
            "delete" => TaskKind::Delete,
            "mkdir" => TaskKind::Mkdir,
            "exec" => TaskKind::Exec,
            "exec-file" => TaskKind::ExecFile,
            _ => TaskKind::Other(value),
        }
    }
}

impl From<TaskKind> for String {
    fn from(kind: TaskKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work handed to an executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Enabled>,
    /// Defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub override_strategy: Option<OverrideStrategy>,
    #[serde(skip)]
    pub source: Option<Source>,
    #[serde(skip)]
    pub config_enabled: Option<Enabled>,
}

impl TaskDefinition {
    /// Failure of a required task fails the run
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }

    /// String config value
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    /// Boolean config value (absent → false)
    pub fn config_flag(&self, key: &str) -> bool {
        self.config.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_kind_roundtrips_known_and_custom() {
        assert_eq!(TaskKind::from("write".to_string()), TaskKind::Write);
        assert_eq!(TaskKind::from("exec-file".to_string()), TaskKind::ExecFile);
        let custom = TaskKind::from("npm-install".to_string());
        assert_eq!(custom, TaskKind::Other("npm-install".into()));
        assert_eq!(custom.to_string(), "npm-install");
    }

    #[test]
    fn test_write_has_content_file_group() {
        let groups = TaskKind::Write.exclusive_groups();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].contains(&"content"));
        assert!(groups[0].contains(&"file"));
        assert!(TaskKind::Mkdir.exclusive_groups().is_empty());
    }

    #[test]
    fn test_task_parses_with_defaults() {
        let task: TaskDefinition = serde_json::from_value(json!({
            "id": "readme",
            "type": "write",
            "config": {"path": "README.md", "content": "# hi"}
        }))
        .unwrap();

        assert_eq!(task.kind, TaskKind::Write);
        assert!(task.is_required());
        assert!(task.dependencies.is_empty());
        assert_eq!(task.config_str("path"), Some("README.md"));
        assert!(!task.config_flag("overwrite"));
    }

    #[test]
    fn test_optional_task() {
        let task: TaskDefinition = serde_json::from_value(json!({
            "id": "fmt", "type": "exec", "config": {"command": "cargo fmt"}, "required": false
        }))
        .unwrap();
        assert!(!task.is_required());
    }
}
