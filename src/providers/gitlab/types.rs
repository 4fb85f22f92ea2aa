use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A GitLab group (namespace that holds projects and subgroups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub full_path: String,
    pub web_url: String,
    /// `None` for top-level groups
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// The group (or user namespace) a project belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub full_path: String,
}

/// A GitLab project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    pub web_url: String,
    pub namespace: Namespace,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentState {
    Available,
    Stopping,
    Stopped,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for EnvironmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "available",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A deployment target of a project (e.g. production, staging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    pub name: String,
    pub state: EnvironmentState,
    #[serde(default)]
    pub external_url: Option<String>,
}

impl Environment {
    pub fn is_available(&self) -> bool {
        self.state == EnvironmentState::Available
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    #[default]
    EnvVar,
    File,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVar => f.write_str("Variable"),
            Self::File => f.write_str("File"),
        }
    }
}

/// A CI/CD variable owned by a group or a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub masked: bool,
    #[serde(default)]
    pub variable_type: VariableType,
    /// Group variables carry no scope on GitLab Free
    #[serde(default)]
    pub environment_scope: Option<String>,
}

pub const ALL_ENVIRONMENTS_SCOPE: &str = "*";

/// Payload for creating or updating a project variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVariable {
    pub key: String,
    pub value: String,
    pub environment_scope: String,
    pub protected: bool,
    pub masked: bool,
    pub variable_type: VariableType,
}

impl NewVariable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            environment_scope: ALL_ENVIRONMENTS_SCOPE.to_string(),
            protected: false,
            masked: false,
            variable_type: VariableType::EnvVar,
        }
    }
}

/// The authenticated user, as returned by `GET /user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_unknown_state() {
        let env: Environment = serde_json::from_str(
            r#"{"id": 3, "name": "review/fix", "state": "scheduled_for_deletion"}"#,
        )
        .unwrap();
        assert_eq!(env.state, EnvironmentState::Unknown);
        assert!(!env.is_available());
        assert_eq!(env.external_url, None);
    }

    #[test]
    fn test_variable_defaults() {
        let variable: Variable =
            serde_json::from_str(r#"{"key": "API_URL", "value": "https://api"}"#).unwrap();
        assert!(!variable.protected);
        assert!(!variable.masked);
        assert_eq!(variable.variable_type, VariableType::EnvVar);
        assert_eq!(variable.environment_scope, None);
    }

    #[test]
    fn test_group_ignores_extra_fields() {
        let group: Group = serde_json::from_str(
            r#"{
                "id": 2, "name": "DGTI", "path": "dgti", "full_path": "dgti",
                "web_url": "https://gitlab.com/groups/dgti", "parent_id": null,
                "visibility": "private", "projects": []
            }"#,
        )
        .unwrap();
        assert!(group.is_top_level());
    }

    #[test]
    fn test_new_variable_defaults_to_all_environments() {
        let payload = serde_json::to_value(NewVariable::new("KEY", "value")).unwrap();
        assert_eq!(payload["environment_scope"], "*");
        assert_eq!(payload["variable_type"], "env_var");
        assert_eq!(payload["protected"], false);
    }
}
