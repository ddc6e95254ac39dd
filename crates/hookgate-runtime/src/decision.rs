//! Host-neutral hook decision and the JSON form jobs may print on stdout.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Three-way verdict, plus the values a malformed producer might send
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Permission {
    Allow,
    Deny,
    Ask,
    /// Empty string: no verdict given, treated as allow
    #[default]
    Unspecified,
    /// Anything unrecognized; rendered as a protocol violation
    Other(String),
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        match value.as_str() {
            "allow" => Permission::Allow,
            "deny" => Permission::Deny,
            "ask" => Permission::Ask,
            "" => Permission::Unspecified,
            _ => Permission::Other(value),
        }
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Allow => f.write_str("allow"),
            Permission::Deny => f.write_str("deny"),
            Permission::Ask => f.write_str("ask"),
            Permission::Unspecified => Ok(()),
            Permission::Other(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed hook response JSON: {0}")]
pub struct ProtocolError(#[from] serde_json::Error);

/// Outcome of one hook run, before it is rendered for a host
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(default)]
    pub permission: Permission,
    /// `Some(false)` stops the host regardless of `permission`
    #[serde(default, rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_: Option<bool>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub agent_message: String,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            permission: Permission::Allow,
            ..Self::default()
        }
    }

    pub fn deny(user_message: impl Into<String>, agent_message: impl Into<String>) -> Self {
        Self {
            permission: Permission::Deny,
            user_message: user_message.into(),
            agent_message: agent_message.into(),
            continue_: None,
        }
    }

    pub fn ask(user_message: impl Into<String>, agent_message: impl Into<String>) -> Self {
        Self {
            permission: Permission::Ask,
            user_message: user_message.into(),
            agent_message: agent_message.into(),
            continue_: None,
        }
    }

    /// Stop the host outright
    pub fn halt(user_message: impl Into<String>, agent_message: impl Into<String>) -> Self {
        Self {
            continue_: Some(false),
            ..Self::deny(user_message, agent_message)
        }
    }

    pub fn with_messages(
        mut self,
        user_message: impl Into<String>,
        agent_message: impl Into<String>,
    ) -> Self {
        self.user_message = user_message.into();
        self.agent_message = agent_message.into();
        self
    }

    pub fn is_allow(&self) -> bool {
        self.continue_ != Some(false)
            && matches!(self.permission, Permission::Allow | Permission::Unspecified)
    }

    /// Parse the decision a job printed on stdout.
    ///
    /// Empty or non-JSON output means the job expressed no opinion. Output that
    /// starts like a JSON object but does not parse is a protocol error.
    pub fn from_output(output: &str) -> Result<Option<Self>, ProtocolError> {
        let trimmed = output.trim();
        if !trimmed.starts_with('{') {
            return Ok(None);
        }
        let mut decision: Decision = serde_json::from_str(trimmed)?;
        if decision.agent_message.is_empty() {
            decision.agent_message = decision.user_message.clone();
        }
        Ok(Some(decision))
    }
}
