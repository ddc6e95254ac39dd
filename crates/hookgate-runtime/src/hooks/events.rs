use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tool::ToolKind;

/// Agent host that delivered the event and expects the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    /// Event-handler protocol: approve / block / allow / post-block
    Claude,
    /// JSON permission protocol with native ask support
    Cursor,
}

impl Host {
    /// Guess the host from a raw stdin payload
    pub fn detect(payload: &Value) -> Self {
        if payload.get("cursor_version").is_some() {
            return Host::Cursor;
        }
        match payload["hook_event_name"].as_str() {
            Some(name) if name.starts_with(|c: char| c.is_ascii_lowercase()) => Host::Cursor,
            _ => Host::Claude,
        }
    }

    /// Whether the host can render a confirmation prompt itself
    pub fn supports_ask(&self) -> bool {
        matches!(self, Host::Cursor)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Claude => f.write_str("claude"),
            Host::Cursor => f.write_str("cursor"),
        }
    }
}

/// Host-neutral hook lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Before a tool runs
    PreToolUse,
    /// After a tool ran
    PostToolUse,
    /// User submitted a prompt
    UserPromptSubmit,
    /// Agent finished responding
    Stop,
    SubagentStop,
    Notification,
    PreCompact,
    SessionStart,
    SessionEnd,
    /// Event name without a typed representation; handled from the raw payload
    Other(String),
}

impl EventKind {
    /// Parse either vocabulary (`PreToolUse` or `beforeShellExecution`)
    pub fn parse(name: &str) -> Self {
        match name {
            "PreToolUse" | "beforeShellExecution" | "beforeMCPExecution" | "beforeReadFile" => {
                EventKind::PreToolUse
            }
            "PostToolUse" | "afterFileEdit" => EventKind::PostToolUse,
            "UserPromptSubmit" | "beforeSubmitPrompt" => EventKind::UserPromptSubmit,
            "Stop" | "stop" => EventKind::Stop,
            "SubagentStop" => EventKind::SubagentStop,
            "Notification" => EventKind::Notification,
            "PreCompact" => EventKind::PreCompact,
            "SessionStart" => EventKind::SessionStart,
            "SessionEnd" => EventKind::SessionEnd,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PreToolUse => "PreToolUse",
            EventKind::PostToolUse => "PostToolUse",
            EventKind::UserPromptSubmit => "UserPromptSubmit",
            EventKind::Stop => "Stop",
            EventKind::SubagentStop => "SubagentStop",
            EventKind::Notification => "Notification",
            EventKind::PreCompact => "PreCompact",
            EventKind::SessionStart => "SessionStart",
            EventKind::SessionEnd => "SessionEnd",
            EventKind::Other(name) => name,
        }
    }

    /// Whether the event has a typed representation
    pub fn is_native(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }

    pub fn is_pre_action(&self) -> bool {
        matches!(self, EventKind::PreToolUse)
    }

    pub fn is_post_action(&self) -> bool {
        matches!(self, EventKind::PostToolUse)
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        EventKind::parse(&name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool invocation carried by tool-use events
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub kind: ToolKind,
    pub input: Value,
}

/// One event as delivered by the host on stdin
#[derive(Debug, Clone)]
pub struct HookEvent {
    pub host: Host,
    pub kind: EventKind,
    pub session_id: Option<String>,
    pub cwd: Option<PathBuf>,
    pub tool: Option<ToolCall>,
    /// Prompt text for prompt-submission events
    pub prompt: Option<String>,
    /// Payload exactly as received, for pass-through to child processes
    pub raw: String,
}

impl HookEvent {
    pub fn new(host: Host, kind: EventKind) -> Self {
        Self {
            host,
            kind,
            session_id: None,
            cwd: None,
            tool: None,
            prompt: None,
            raw: String::new(),
        }
    }

    pub fn with_tool(mut self, kind: ToolKind, input: Value) -> Self {
        self.tool = Some(ToolCall { kind, input });
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Parse a host payload into a typed event
    pub fn parse(host: Host, raw: &str) -> Result<Self> {
        let payload: Value = serde_json::from_str(raw).context("Event payload is not valid JSON")?;
        let name = payload["hook_event_name"]
            .as_str()
            .context("Event payload missing 'hook_event_name'")?;

        let mut event = HookEvent::new(host, EventKind::parse(name)).with_raw(raw);
        event.session_id = payload["session_id"]
            .as_str()
            .or_else(|| payload["conversation_id"].as_str())
            .map(str::to_string);
        event.prompt = payload["prompt"].as_str().map(str::to_string);

        let cwd = payload["cwd"]
            .as_str()
            .or_else(|| payload["workspace_roots"][0].as_str());
        event.cwd = cwd.map(PathBuf::from);

        event.tool = match host {
            Host::Claude => payload["tool_name"].as_str().map(|tool_name| ToolCall {
                kind: ToolKind::parse(tool_name),
                input: payload["tool_input"].clone(),
            }),
            Host::Cursor => cursor_tool_call(name, &payload),
        };

        Ok(event)
    }

    pub fn tool_kind(&self) -> Option<&ToolKind> {
        self.tool.as_ref().map(|t| &t.kind)
    }

    /// Path the tool targets, if the tool takes one
    pub fn target_path(&self) -> Option<&str> {
        let tool = self.tool.as_ref()?;
        let field = tool.kind.path_field()?;
        tool.input[field].as_str()
    }

    /// Files changed by the tool; only post-action events report any
    pub fn changed_files(&self) -> Vec<String> {
        if !self.kind.is_post_action() {
            return Vec::new();
        }
        match &self.tool {
            Some(tool) if tool.kind.edits_files() => {
                self.target_path().map(|p| vec![p.to_string()]).unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }
}

/// Cursor reports tool details in event-specific fields
fn cursor_tool_call(event_name: &str, payload: &Value) -> Option<ToolCall> {
    match event_name {
        "beforeShellExecution" => Some(ToolCall {
            kind: ToolKind::Bash,
            input: json!({ "command": payload["command"], "cwd": payload["cwd"] }),
        }),
        "beforeMCPExecution" => {
            let name = payload["tool_name"].as_str().unwrap_or("MCP");
            Some(ToolCall {
                kind: ToolKind::Mcp(name.to_string()),
                input: payload["tool_input"].clone(),
            })
        }
        "beforeReadFile" => Some(ToolCall {
            kind: ToolKind::Read,
            input: json!({ "file_path": payload["file_path"] }),
        }),
        "afterFileEdit" => Some(ToolCall {
            kind: ToolKind::Edit,
            input: json!({ "file_path": payload["file_path"], "edits": payload["edits"] }),
        }),
        _ => None,
    }
}
