//! Render a host-neutral [`Decision`] in the calling host's wire format.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::decision::{Decision, Permission};
use crate::hooks::events::{EventKind, Host};

/// Record of a confirmation request, written to the side-channel log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskEntry {
    pub job: String,
    pub event: EventKind,
    pub host: Host,
    pub user_message: String,
    pub agent_message: String,
    pub note: String,
}

/// Side channel for decisions the host may not be able to show natively
pub trait DecisionLog: Send + Sync {
    fn record_ask(&self, entry: &AskEntry);
}

/// Default sink: one structured `warn!` per entry
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDecisionLog;

impl DecisionLog for TracingDecisionLog {
    fn record_ask(&self, entry: &AskEntry) {
        warn!(
            job = %entry.job,
            event = %entry.event,
            host = %entry.host,
            user_message = %entry.user_message,
            agent_message = %entry.agent_message,
            note = %entry.note,
            "Hook requested confirmation"
        );
    }
}

/// Event-handler host primitives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaudeResponse {
    /// Pre-action approval, optionally with messages
    Approve {
        user_message: Option<String>,
        agent_message: Option<String>,
    },
    /// Pre-action block
    Block {
        user_message: String,
        agent_message: String,
        stop: bool,
    },
    /// Non-blocking pass for every other event
    Allow {
        user_message: Option<String>,
        agent_message: Option<String>,
    },
    /// Block raised after the action already happened
    PostBlock {
        user_message: String,
        agent_message: String,
        stop: bool,
    },
}

/// JSON permission host response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorResponse {
    pub permission: Permission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_message: Option<String>,
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResponse {
    Claude {
        event: EventKind,
        response: ClaudeResponse,
    },
    Cursor(CursorResponse),
}

impl HostResponse {
    /// Response used when no hook has an opinion
    pub fn plain_allow(host: Host, event: &EventKind) -> Self {
        match host {
            Host::Claude if event.is_pre_action() => HostResponse::Claude {
                event: event.clone(),
                response: ClaudeResponse::Approve {
                    user_message: None,
                    agent_message: None,
                },
            },
            Host::Claude => HostResponse::Claude {
                event: event.clone(),
                response: ClaudeResponse::Allow {
                    user_message: None,
                    agent_message: None,
                },
            },
            Host::Cursor => HostResponse::Cursor(CursorResponse {
                permission: Permission::Allow,
                user_message: None,
                agent_message: None,
                continue_: None,
            }),
        }
    }

    pub fn is_blocking(&self) -> bool {
        match self {
            HostResponse::Claude { response, .. } => matches!(
                response,
                ClaudeResponse::Block { .. } | ClaudeResponse::PostBlock { .. }
            ),
            HostResponse::Cursor(r) => r.permission == Permission::Deny,
        }
    }

    /// JSON written to stdout
    pub fn to_json(&self) -> Value {
        match self {
            HostResponse::Claude { event, response } => claude_json(event, response),
            HostResponse::Cursor(r) => serde_json::to_value(r).unwrap_or_else(|_| json!({})),
        }
    }
}

fn claude_json(event: &EventKind, response: &ClaudeResponse) -> Value {
    let mut out = Map::new();
    match response {
        ClaudeResponse::Approve {
            user_message,
            agent_message,
        } => {
            out.insert("decision".into(), json!("approve"));
            if let Some(agent) = agent_message {
                out.insert("reason".into(), json!(agent));
            }
            if let Some(user) = user_message {
                out.insert("systemMessage".into(), json!(user));
            }
        }
        ClaudeResponse::Block {
            user_message,
            agent_message,
            stop,
        }
        | ClaudeResponse::PostBlock {
            user_message,
            agent_message,
            stop,
        } => {
            out.insert("decision".into(), json!("block"));
            out.insert("reason".into(), json!(agent_message));
            out.insert("systemMessage".into(), json!(user_message));
            if *stop {
                out.insert("continue".into(), json!(false));
                out.insert("stopReason".into(), json!(user_message));
            }
        }
        ClaudeResponse::Allow {
            user_message,
            agent_message,
        } => {
            if let Some(user) = user_message {
                out.insert("systemMessage".into(), json!(user));
            }
            if let Some(agent) = agent_message {
                if accepts_additional_context(event) {
                    out.insert(
                        "hookSpecificOutput".into(),
                        json!({ "hookEventName": event.as_str(), "additionalContext": agent }),
                    );
                } else {
                    out.insert("reason".into(), json!(agent));
                }
            }
        }
    }
    Value::Object(out)
}

fn accepts_additional_context(event: &EventKind) -> bool {
    matches!(
        event,
        EventKind::PostToolUse | EventKind::UserPromptSubmit | EventKind::SessionStart
    )
}

/// Pure renderer from [`Decision`] to [`HostResponse`] for one host
#[derive(Clone)]
pub struct ResponseTranslator {
    host: Host,
    log: Arc<dyn DecisionLog>,
}

impl ResponseTranslator {
    pub fn new(host: Host, log: Arc<dyn DecisionLog>) -> Self {
        Self { host, log }
    }

    pub fn host(&self) -> Host {
        self.host
    }

    pub fn translate(&self, job_name: &str, event: &EventKind, decision: &Decision) -> HostResponse {
        if decision.continue_ == Some(false) {
            let (user, agent) = fallback_messages(decision, || blocked_phrase(job_name));
            return self.block(event, user, agent, true);
        }

        match &decision.permission {
            Permission::Deny => {
                let (user, agent) = fallback_messages(decision, || blocked_phrase(job_name));
                self.block(event, user, agent, false)
            }
            Permission::Ask => {
                let (user, agent) = fallback_messages(decision, || {
                    format!("Hook '{}' requests confirmation", job_name)
                });
                self.ask(job_name, event, user, agent)
            }
            Permission::Allow | Permission::Unspecified => {
                if decision.user_message.is_empty() && decision.agent_message.is_empty() {
                    return HostResponse::plain_allow(self.host, event);
                }
                let (user, agent) = fallback_messages(decision, || {
                    format!("Hook '{}' allowed execution", job_name)
                });
                self.allow_with_messages(event, user, agent)
            }
            Permission::Other(value) => {
                let message = format!(
                    "Hook '{}' returned unrecognized permission '{}'; blocking",
                    job_name, value
                );
                self.block(event, message.clone(), message, false)
            }
        }
    }

    fn block(&self, event: &EventKind, user: String, agent: String, stop: bool) -> HostResponse {
        match self.host {
            Host::Claude => {
                let response = if event.is_pre_action() {
                    ClaudeResponse::Block {
                        user_message: user,
                        agent_message: agent,
                        stop,
                    }
                } else {
                    ClaudeResponse::PostBlock {
                        user_message: user,
                        agent_message: agent,
                        stop,
                    }
                };
                HostResponse::Claude {
                    event: event.clone(),
                    response,
                }
            }
            Host::Cursor => HostResponse::Cursor(CursorResponse {
                permission: Permission::Deny,
                user_message: Some(user),
                agent_message: Some(agent),
                continue_: stop.then_some(false),
            }),
        }
    }

    fn ask(&self, job_name: &str, event: &EventKind, user: String, agent: String) -> HostResponse {
        let note = if self.host.supports_ask() {
            "rendered as native confirmation"
        } else {
            "host has no confirmation primitive at the hook layer; allowed with messages"
        };
        self.log.record_ask(&AskEntry {
            job: job_name.to_string(),
            event: event.clone(),
            host: self.host,
            user_message: user.clone(),
            agent_message: agent.clone(),
            note: note.to_string(),
        });

        match self.host {
            Host::Cursor => HostResponse::Cursor(CursorResponse {
                permission: Permission::Ask,
                user_message: Some(user),
                agent_message: Some(agent),
                continue_: None,
            }),
            Host::Claude => self.allow_with_messages(event, user, agent),
        }
    }

    fn allow_with_messages(&self, event: &EventKind, user: String, agent: String) -> HostResponse {
        match self.host {
            Host::Claude => {
                let response = if event.is_pre_action() {
                    ClaudeResponse::Approve {
                        user_message: Some(user),
                        agent_message: Some(agent),
                    }
                } else {
                    ClaudeResponse::Allow {
                        user_message: Some(user),
                        agent_message: Some(agent),
                    }
                };
                HostResponse::Claude {
                    event: event.clone(),
                    response,
                }
            }
            Host::Cursor => HostResponse::Cursor(CursorResponse {
                permission: Permission::Allow,
                user_message: Some(user),
                agent_message: Some(agent),
                continue_: None,
            }),
        }
    }
}

fn blocked_phrase(job_name: &str) -> String {
    format!("Blocked execution by hook '{}'", job_name)
}

/// User message falls back to `default`; agent message falls back to the user message
fn fallback_messages(decision: &Decision, default: impl FnOnce() -> String) -> (String, String) {
    let user = if decision.user_message.is_empty() {
        default()
    } else {
        decision.user_message.clone()
    };
    let agent = if decision.agent_message.is_empty() {
        user.clone()
    } else {
        decision.agent_message.clone()
    };
    (user, agent)
}
