//! Configured jobs: shell commands gated by `skip` / `only` expressions.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::decision::Decision;
use crate::executor::{CommandSpec, ExecError};
use crate::expr::{self, Bindings};
use crate::hooks::{EventKind, ExecutionContext, Hook, HookEvent};

/// Declarative job as read from configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    pub name: String,

    /// Shell command; bound variables are exported to its environment
    pub run: String,

    #[serde(default = "default_event")]
    pub event: EventKind,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Do not run when this evaluates true
    #[serde(default)]
    pub skip: Option<String>,

    /// Run only when this evaluates true
    #[serde(default)]
    pub only: Option<String>,

    /// Tool names that trigger the job; empty means any
    #[serde(default)]
    pub tools: Vec<String>,

    /// Changed-file patterns; only matching files are passed on
    #[serde(default)]
    pub glob: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Seconds; unset uses the runtime default, 0 waits forever
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

fn default_event() -> EventKind {
    EventKind::PostToolUse
}

fn default_true() -> bool {
    true
}

impl JobConfig {
    pub fn new(name: impl Into<String>, run: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run: run.into(),
            event: default_event(),
            description: None,
            enabled: true,
            skip: None,
            only: None,
            tools: Vec::new(),
            glob: Vec::new(),
            env: BTreeMap::new(),
            timeout: None,
            work_dir: None,
        }
    }
}

/// Variables every job can reference
pub mod vars {
    pub const EVENT_NAME: &str = "EVENT_NAME";
    pub const TOOL_NAME: &str = "TOOL_NAME";
    pub const PROJECT_ROOT: &str = "PROJECT_ROOT";
    pub const FILES_CHANGED: &str = "FILES_CHANGED";
    pub const FILE_PATH: &str = "FILE_PATH";
    pub const FILE_NAME: &str = "FILE_NAME";
    pub const USER_PROMPT: &str = "USER_PROMPT";
}

/// Assemble the variable bindings for one event.
/// `files` is the already-filtered changed-file list.
pub fn bind_event(event: &HookEvent, project_root: &Path, files: &[String]) -> Bindings {
    let mut bindings = HashMap::new();
    bindings.insert(vars::EVENT_NAME.to_string(), event.kind.to_string());
    bindings.insert(
        vars::TOOL_NAME.to_string(),
        event.tool_kind().map(|k| k.to_string()).unwrap_or_default(),
    );
    bindings.insert(
        vars::PROJECT_ROOT.to_string(),
        project_root.display().to_string(),
    );

    if event.kind.is_post_action() {
        bindings.insert(vars::FILES_CHANGED.to_string(), files.join(" "));
        if let Some(first) = files.first() {
            bindings.insert(vars::FILE_PATH.to_string(), first.clone());
            let name = Path::new(first)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            bindings.insert(vars::FILE_NAME.to_string(), name);
        }
    }

    if event.kind == EventKind::UserPromptSubmit {
        bindings.insert(
            vars::USER_PROMPT.to_string(),
            event.prompt.clone().unwrap_or_default(),
        );
    }

    bindings
}

/// Hook that runs one configured job
pub struct JobHook {
    config: JobConfig,
    ctx: Arc<ExecutionContext>,
    /// Raw payload of the event being handled, piped to the child
    last_payload: Mutex<Option<String>>,
    description: String,
}

impl JobHook {
    pub fn new(config: JobConfig, ctx: Arc<ExecutionContext>) -> Self {
        let description = config
            .description
            .clone()
            .unwrap_or_else(|| format!("Runs `{}` on {}", config.run, config.event));
        Self {
            config,
            ctx,
            last_payload: Mutex::new(None),
            description,
        }
    }

    /// Whether this event is the one the job is configured for
    fn accepts(&self, event: &HookEvent) -> bool {
        if event.kind.is_native() {
            return event.kind == self.config.event;
        }

        // No typed form: confirm the event name from the payload itself
        let payload: Value = match serde_json::from_str(&event.raw) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job = %self.config.name, error = %e, "Unreadable event payload, ignoring");
                return false;
            }
        };
        payload["hook_event_name"]
            .as_str()
            .map(|name| EventKind::parse(name) == self.config.event)
            .unwrap_or(false)
    }

    fn tool_matches(&self, event: &HookEvent) -> bool {
        if self.config.tools.is_empty() {
            return true;
        }
        match event.tool_kind() {
            Some(kind) => self.config.tools.iter().any(|t| t == kind.as_str()),
            None => false,
        }
    }

    fn filter_files(&self, files: Vec<String>) -> Result<Vec<String>> {
        if self.config.glob.is_empty() {
            return Ok(files);
        }
        let patterns = self
            .config
            .glob
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .with_context(|| format!("Job '{}' has invalid glob '{}'", self.config.name, p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(files
            .into_iter()
            .filter(|file| {
                let name = Path::new(file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                patterns
                    .iter()
                    .any(|p| p.matches(file) || p.matches(&name))
            })
            .collect())
    }

    fn should_run(&self, bindings: &Bindings) -> Result<bool> {
        if let Some(skip) = &self.config.skip {
            let skipped = expr::evaluate(skip, bindings)
                .with_context(|| format!("Job '{}' has invalid skip expression", self.config.name))?;
            if skipped {
                debug!(job = %self.config.name, "Skip condition met");
                return Ok(false);
            }
        }
        if let Some(only) = &self.config.only {
            let wanted = expr::evaluate(only, bindings)
                .with_context(|| format!("Job '{}' has invalid only expression", self.config.name))?;
            if !wanted {
                debug!(job = %self.config.name, "Only condition not met");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn timeout(&self) -> Option<Duration> {
        let secs = self
            .config
            .timeout
            .unwrap_or(self.ctx.settings.runtime.default_timeout_secs);
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    fn command_spec(&self, bindings: &Bindings) -> CommandSpec {
        let mut env: HashMap<String, String> = bindings.clone();
        for (key, value) in &self.config.env {
            env.insert(key.clone(), expr::substitute(value, bindings));
        }
        let stdin = self
            .last_payload
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        CommandSpec {
            command: self.config.run.clone(),
            cwd: self.config.work_dir.clone(),
            env,
            stdin,
            timeout: self.timeout(),
        }
    }

    fn failure(&self, detail: String) -> Decision {
        Decision::deny(format!("Job '{}' failed", self.config.name), detail)
    }
}

#[async_trait]
impl Hook for JobHook {
    fn key(&self) -> &str {
        &self.config.name
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    async fn run(&self, event: &HookEvent) -> Result<Decision> {
        if !self.accepts(event) || !self.tool_matches(event) {
            return Ok(Decision::allow());
        }
        if !event.raw.is_empty() {
            *self.last_payload.lock().unwrap_or_else(|e| e.into_inner()) = Some(event.raw.clone());
        }

        let files = self.filter_files(event.changed_files())?;
        if event.kind.is_post_action() && !self.config.glob.is_empty() && files.is_empty() {
            debug!(job = %self.config.name, "No changed file matches job globs");
            return Ok(Decision::allow());
        }

        let bindings = bind_event(event, self.ctx.project_root(), &files);
        if !self.should_run(&bindings)? {
            return Ok(Decision::allow());
        }

        let spec = self.command_spec(&bindings);
        info!(job = %self.config.name, cmd = %spec.command, "Running job");

        match self.ctx.executor.execute(spec).await {
            Ok(output) if output.success() => {
                let decision = Decision::from_output(&output.stdout)
                    .with_context(|| format!("Job '{}' printed a malformed response", self.config.name))?;
                Ok(decision.unwrap_or_else(Decision::allow))
            }
            Ok(output) => {
                let status = output
                    .status
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                warn!(job = %self.config.name, status = %status, "Job failed");
                let combined = output.combined();
                let detail = if combined.is_empty() {
                    format!("Job '{}' exited with status {}", self.config.name, status)
                } else {
                    format!(
                        "Job '{}' exited with status {}:\n{}",
                        self.config.name, status, combined
                    )
                };
                Ok(self.failure(detail))
            }
            Err(ExecError::Timeout(limit)) => {
                warn!(job = %self.config.name, timeout_secs = limit.as_secs(), "Job timed out");
                Ok(self.failure(format!(
                    "Job '{}' timed out after {}s",
                    self.config.name,
                    limit.as_secs()
                )))
            }
            Err(e) => {
                warn!(job = %self.config.name, error = %e, "Job could not run");
                Ok(self.failure(format!("Job '{}' could not run: {}", self.config.name, e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Permission;
    use crate::hooks::Host;
    use crate::executor::CommandOutput;
    use crate::test_support::{context_with, MockExecutor};
    use crate::tool::ToolKind;
    use serde_json::json;

    fn post_write(path: &str) -> HookEvent {
        HookEvent::new(Host::Claude, EventKind::PostToolUse)
            .with_tool(ToolKind::Write, json!({ "file_path": path }))
            .with_raw(format!(
                r#"{{"hook_event_name":"PostToolUse","tool_name":"Write","tool_input":{{"file_path":"{}"}}}}"#,
                path
            ))
    }

    fn job(config: JobConfig, executor: Arc<MockExecutor>) -> JobHook {
        JobHook::new(config, Arc::new(context_with(executor)))
    }

    #[test]
    fn test_bindings_for_post_action() {
        let event = post_write("src/app.py");
        let b = bind_event(&event, Path::new("/proj"), &["src/app.py".to_string()]);
        assert_eq!(b[vars::EVENT_NAME], "PostToolUse");
        assert_eq!(b[vars::TOOL_NAME], "Write");
        assert_eq!(b[vars::PROJECT_ROOT], "/proj");
        assert_eq!(b[vars::FILES_CHANGED], "src/app.py");
        assert_eq!(b[vars::FILE_PATH], "src/app.py");
        assert_eq!(b[vars::FILE_NAME], "app.py");
        assert!(!b.contains_key(vars::USER_PROMPT));
    }

    #[test]
    fn test_bindings_for_pre_action_and_prompt() {
        let event = HookEvent::new(Host::Claude, EventKind::PreToolUse)
            .with_tool(ToolKind::Bash, json!({"command": "ls"}));
        let b = bind_event(&event, Path::new("/proj"), &[]);
        assert!(!b.contains_key(vars::FILES_CHANGED));
        assert!(!b.contains_key(vars::FILE_PATH));

        let event = HookEvent::new(Host::Claude, EventKind::UserPromptSubmit).with_prompt("hi");
        let b = bind_event(&event, Path::new("/proj"), &[]);
        assert_eq!(b[vars::USER_PROMPT], "hi");
        assert_eq!(b[vars::TOOL_NAME], "");
    }

    #[tokio::test]
    async fn test_skip_prevents_execution() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let mut config = JobConfig::new("audit", "true");
        config.event = EventKind::PreToolUse;
        config.skip = Some("${TOOL_NAME} == \"Read\"".into());
        let hook = job(config, executor.clone());

        let event = HookEvent::new(Host::Claude, EventKind::PreToolUse)
            .with_tool(ToolKind::Read, json!({"file_path": "x"}));
        let decision = hook.run(&event).await.unwrap();
        assert!(decision.is_allow());
        assert_eq!(executor.calls(), 0);

        let event = HookEvent::new(Host::Claude, EventKind::PreToolUse)
            .with_tool(ToolKind::Bash, json!({"command": "ls"}));
        hook.run(&event).await.unwrap();
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_only_matches_any_changed_file() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let mut config = JobConfig::new("ruff", "ruff check $FILES_CHANGED");
        config.only = Some("${FILES_CHANGED} matches *.py".into());
        let hook = job(config, executor.clone());

        hook.run(&post_write("a.py")).await.unwrap();
        assert_eq!(executor.calls(), 1);

        let bindings: Bindings = [(vars::FILES_CHANGED.to_string(), "a.py b.txt".to_string())]
            .into_iter()
            .collect();
        assert!(hook.should_run(&bindings).unwrap());

        hook.run(&post_write("notes.txt")).await.unwrap();
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_glob_filters_changed_files() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let mut config = JobConfig::new("fmt", "gofmt -w $FILES_CHANGED");
        config.glob = vec!["*.go".into()];
        let hook = job(config, executor.clone());

        hook.run(&post_write("README.md")).await.unwrap();
        assert_eq!(executor.calls(), 0);

        hook.run(&post_write("/repo/cmd/main.go")).await.unwrap();
        assert_eq!(executor.calls(), 1);
        let spec = executor.last_spec().unwrap();
        assert_eq!(spec.env[vars::FILES_CHANGED], "/repo/cmd/main.go");
        assert_eq!(spec.env[vars::FILE_NAME], "main.go");
    }

    #[tokio::test]
    async fn test_failure_becomes_deny_with_output() {
        let executor = Arc::new(MockExecutor::returning(Ok(CommandOutput {
            status: Some(2),
            stdout: "app.py:1:1: F401 unused import".into(),
            stderr: String::new(),
        })));
        let hook = job(JobConfig::new("ruff", "ruff check"), executor);

        let decision = hook.run(&post_write("app.py")).await.unwrap();
        assert_eq!(decision.permission, Permission::Deny);
        assert_eq!(decision.user_message, "Job 'ruff' failed");
        assert!(decision.agent_message.contains("F401 unused import"));
        assert!(decision.agent_message.contains("status 2"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_deny() {
        let executor = Arc::new(MockExecutor::returning(Err(ExecError::Timeout(
            Duration::from_secs(5),
        ))));
        let mut config = JobConfig::new("slow", "sleep 60");
        config.timeout = Some(5);
        let hook = job(config, executor.clone());

        let decision = hook.run(&post_write("a.rs")).await.unwrap();
        assert_eq!(decision.permission, Permission::Deny);
        assert!(decision.agent_message.contains("timed out after 5s"));
        assert_eq!(
            executor.last_spec().unwrap().timeout,
            Some(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_default_timeout_applies_when_unset() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let hook = job(JobConfig::new("quick", "true"), executor.clone());
        hook.run(&post_write("a.rs")).await.unwrap();
        assert_eq!(
            executor.last_spec().unwrap().timeout,
            Some(Duration::from_secs(60))
        );
    }

    #[tokio::test]
    async fn test_zero_timeout_waits_forever() {
        let config: JobConfig = toml::from_str("name = 'x'\nrun = 'true'\ntimeout = 0").unwrap();
        assert_eq!(config.timeout, Some(0));

        let executor = Arc::new(MockExecutor::succeeding(""));
        let hook = job(config, executor.clone());
        hook.run(&post_write("a.rs")).await.unwrap();
        assert_eq!(executor.last_spec().unwrap().timeout, None);
    }

    #[tokio::test]
    async fn test_only_matches_with_no_changed_files() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let mut config = JobConfig::new("ruff", "ruff check $FILES_CHANGED");
        config.only = Some("${FILES_CHANGED} matches *.py".into());
        let hook = job(config, executor.clone());

        let event = HookEvent::new(Host::Claude, EventKind::PostToolUse)
            .with_tool(ToolKind::Bash, json!({"command": "ls"}));
        assert!(hook.run(&event).await.unwrap().is_allow());
        assert_eq!(executor.calls(), 0);

        let mut config = JobConfig::new("docs", "true");
        config.skip = Some("${FILES_CHANGED} regex \\.md$".into());
        let hook = job(config, executor.clone());
        hook.run(&event).await.unwrap();
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_expression_is_config_error() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let mut config = JobConfig::new("bad", "true");
        config.only = Some("${FILES_CHANGED} regex (".into());
        let hook = job(config, executor.clone());

        let err = hook.run(&post_write("a.py")).await.unwrap_err();
        assert!(err.to_string().contains("invalid only expression"));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_stdout_decision_is_honored() {
        let executor = Arc::new(MockExecutor::succeeding(
            r#"{"permission":"ask","userMessage":"Confirm?"}"#,
        ));
        let hook = job(JobConfig::new("review", "review.sh"), executor);
        let decision = hook.run(&post_write("a.py")).await.unwrap();
        assert_eq!(decision.permission, Permission::Ask);
        assert_eq!(decision.agent_message, "Confirm?");
    }

    #[tokio::test]
    async fn test_malformed_stdout_is_error() {
        let executor = Arc::new(MockExecutor::succeeding(r#"{"permission": "#));
        let hook = job(JobConfig::new("review", "review.sh"), executor);
        let err = hook.run(&post_write("a.py")).await.unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[tokio::test]
    async fn test_other_event_ignored() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let hook = job(JobConfig::new("fmt", "true"), executor.clone());
        let event = HookEvent::new(Host::Claude, EventKind::Stop);
        assert!(hook.run(&event).await.unwrap().is_allow());
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_raw_payload_event_name_confirmed() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let mut config = JobConfig::new("teardown", "true");
        config.event = EventKind::Other("Teardown".into());
        let hook = job(config, executor.clone());

        let event = HookEvent::new(Host::Claude, EventKind::Other("Teardown".into()))
            .with_raw(r#"{"hook_event_name":"Teardown"}"#);
        hook.run(&event).await.unwrap();
        assert_eq!(executor.calls(), 1);
        assert_eq!(
            executor.last_spec().unwrap().stdin.as_deref(),
            Some(r#"{"hook_event_name":"Teardown"}"#)
        );

        let unreadable =
            HookEvent::new(Host::Claude, EventKind::Other("Teardown".into())).with_raw("{oops");
        assert!(hook.run(&unreadable).await.unwrap().is_allow());
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_tools_filter_and_env_substitution() {
        let executor = Arc::new(MockExecutor::succeeding(""));
        let mut config = JobConfig::new("edits", "true");
        config.tools = vec!["Edit".into()];
        config.env.insert("TARGET".into(), "${PROJECT_ROOT}/${FILE_NAME}".into());
        config.work_dir = Some(PathBuf::from("/tmp"));
        let hook = job(config, executor.clone());

        hook.run(&post_write("a.rs")).await.unwrap();
        assert_eq!(executor.calls(), 0);

        let event = HookEvent::new(Host::Claude, EventKind::PostToolUse)
            .with_tool(ToolKind::Edit, json!({"file_path": "src/lib.rs"}));
        hook.run(&event).await.unwrap();
        let spec = executor.last_spec().unwrap();
        assert_eq!(spec.env["TARGET"], "/project/lib.rs");
        assert_eq!(spec.cwd, Some(PathBuf::from("/tmp")));
        assert!(spec.stdin.is_none());
    }
}
