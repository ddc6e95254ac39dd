use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use hookgate_runtime::{
    Decision, EventKind, ExecutionContext, Hook, HookEvent, SecuritySettings, ToolKind,
};
use tracing::{info, warn};

pub const SECURITY_KEY: &str = "security";

/// Default dangerous patterns blocked regardless of config
const BUILTIN_BLOCKLIST: &[&str] = &[
    "rm -rf /",
    "rm -rf /*",
    "rm -rf ~",
    "rm -fr /",
    ":(){ :|:& };:",
    "mkfs",
    "> /dev/sd",
    "> /dev/nvme",
    "dd if=",
    "chmod -r 777 /",
    "chown -r root /",
    "git push --force origin main",
    "${ifs}",
];

const PRE_ACTION: &[EventKind] = &[EventKind::PreToolUse];

/// Screens shell commands for destructive patterns and asks before edits to secrets
pub struct SecurityHook {
    settings: SecuritySettings,
}

impl SecurityHook {
    pub fn new(settings: SecuritySettings) -> Self {
        Self { settings }
    }

    pub fn from_context(ctx: Arc<ExecutionContext>) -> Self {
        Self::new(ctx.settings.security.clone())
    }

    /// Config patterns plus the optional patterns file.
    /// An unreadable file is logged and skipped so the host keeps working.
    fn extra_patterns(&self) -> Vec<String> {
        let mut patterns = self.settings.blocklist.clone();
        if let Some(path) = &self.settings.patterns_file {
            match std::fs::read_to_string(path) {
                Ok(content) => patterns.extend(parse_patterns(&content)),
                Err(e) => {
                    warn!(path = ?path, error = %e, "Could not load blocked patterns, using built-ins only");
                }
            }
        }
        patterns
    }

    fn check_command(&self, cmd: &str) -> Decision {
        let normalized = normalize_command(cmd);

        for pattern in BUILTIN_BLOCKLIST {
            if contains_pattern(&normalized, pattern) {
                return blocked(cmd, pattern);
            }
        }
        if pipes_download_to_shell(&normalized) {
            return blocked(cmd, "download piped to shell");
        }
        for pattern in self.extra_patterns() {
            if contains_pattern(&normalized, &normalize_command(&pattern)) {
                return blocked(cmd, &pattern);
            }
        }
        Decision::allow()
    }

    fn check_edit(&self, path: &str) -> Decision {
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for pattern in &self.settings.sensitive_paths {
            let Ok(glob) = glob::Pattern::new(pattern) else {
                warn!(pattern = %pattern, "Invalid sensitive path pattern, ignoring");
                continue;
            };
            if glob.matches(path) || glob.matches(&file_name) {
                return Decision::ask(
                    format!("Allow edit to sensitive file {}?", path),
                    format!(
                        "{} matches sensitive pattern '{}'; the user must confirm this edit",
                        path, pattern
                    ),
                );
            }
        }
        Decision::allow()
    }
}

fn blocked(cmd: &str, pattern: &str) -> Decision {
    info!(cmd, pattern, "Blocked dangerous command");
    Decision::deny(
        format!("Blocked dangerous command (pattern '{}')", pattern),
        format!(
            "The command `{}` matches the blocked pattern '{}'. Do not retry it; find a safer alternative.",
            cmd, pattern
        ),
    )
}

/// Lowercase and collapse whitespace so spacing tricks don't dodge a pattern
fn normalize_command(cmd: &str) -> String {
    cmd.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Substring match; a pattern ending in `/` must not be followed by more path
fn contains_pattern(cmd: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = cmd[start..].find(pattern) {
        let end = start + pos + pattern.len();
        if !pattern.ends_with('/') {
            return true;
        }
        match cmd[end..].chars().next() {
            None | Some(' ' | '*' | ';' | '&' | '|') => return true,
            _ => {}
        }
        start += pos + pattern.chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// `curl ... | sh` and friends
fn pipes_download_to_shell(cmd: &str) -> bool {
    let segments: Vec<&str> = cmd.split('|').collect();
    segments.windows(2).any(|pair| {
        let fetches = pair[0]
            .split_whitespace()
            .any(|word| word == "curl" || word == "wget");
        let runs_shell = matches!(
            pair[1].split_whitespace().next(),
            Some("sh" | "bash" | "zsh" | "sudo")
        );
        fetches && runs_shell
    })
}

fn parse_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Hook for SecurityHook {
    fn key(&self) -> &str {
        SECURITY_KEY
    }

    fn name(&self) -> &str {
        "Security screen"
    }

    fn description(&self) -> &str {
        "Blocks destructive shell commands and asks before edits to sensitive files"
    }

    fn enabled(&self) -> bool {
        self.settings.enabled
    }

    fn events(&self) -> &[EventKind] {
        PRE_ACTION
    }

    async fn run(&self, event: &HookEvent) -> Result<Decision> {
        let Some(tool) = &event.tool else {
            return Ok(Decision::allow());
        };
        let decision = match &tool.kind {
            ToolKind::Bash => match tool.input["command"].as_str() {
                Some(cmd) => self.check_command(cmd),
                None => Decision::allow(),
            },
            ToolKind::Write | ToolKind::Edit | ToolKind::MultiEdit | ToolKind::NotebookEdit => {
                match event.target_path() {
                    Some(path) => self.check_edit(path),
                    None => Decision::allow(),
                }
            }
            ToolKind::Read
            | ToolKind::Glob
            | ToolKind::Grep
            | ToolKind::WebFetch
            | ToolKind::WebSearch
            | ToolKind::Task
            | ToolKind::Mcp(_) => Decision::allow(),
            ToolKind::Unknown(name) => {
                info!(tool = %name, "Unknown tool, not screened");
                Decision::allow()
            }
        };
        Ok(decision)
    }
}
