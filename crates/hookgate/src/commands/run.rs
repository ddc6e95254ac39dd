use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use hookgate_runtime::{dispatch, HookEvent, Host, Settings};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::cli::HostArg;

const PROJECT_DIR_VARS: &[&str] = &["CLAUDE_PROJECT_DIR", "CURSOR_PROJECT_DIR"];

pub async fn execute(key: &str, host: HostArg, settings: Settings) -> Result<()> {
    let settings = Arc::new(settings);
    let registry = super::build_registry(settings.clone())?;
    if !registry.contains(key) {
        anyhow::bail!("hook '{}' not registered", key);
    }

    let mut raw = String::new();
    if let Err(e) = tokio::io::stdin().read_to_string(&mut raw).await {
        warn!(error = %e, "Could not read event payload, allowing");
        println!("{{}}");
        return Ok(());
    }
    let Some(event) = parse_event(&raw, host) else {
        println!("{{}}");
        return Ok(());
    };

    let root = project_root(&settings, &event);
    let ctx = registry
        .context()
        .with_host(event.host)
        .with_project_root(root);
    registry.set_context(ctx);

    let hook = registry.create(key)?;
    info!(hook = %key, event = %event.kind, host = %event.host, "Dispatching event");
    let response = dispatch(hook.as_ref(), &event, &registry.context().translator()).await?;

    println!("{}", response.to_json());
    Ok(())
}

/// Typed event, or `None` when the payload is unusable (fail-open)
fn parse_event(raw: &str, host: HostArg) -> Option<HookEvent> {
    let payload: Value = match serde_json::from_str(raw) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Event payload is not JSON, allowing");
            return None;
        }
    };
    let host = host.forced().unwrap_or_else(|| Host::detect(&payload));
    match HookEvent::parse(host, raw) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "Unusable event payload, allowing");
            None
        }
    }
}

/// Config override, then the payload's cwd, then the host's env var, then the current dir
fn project_root(settings: &Settings, event: &HookEvent) -> PathBuf {
    if let Some(root) = &settings.runtime.project_root {
        return root.clone();
    }
    if let Some(cwd) = &event.cwd {
        return cwd.clone();
    }
    PROJECT_DIR_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookgate_runtime::EventKind;

    #[test]
    fn test_parse_event_detects_host() {
        let event = parse_event(r#"{"hook_event_name":"beforeShellExecution","command":"ls"}"#, HostArg::Auto)
            .unwrap();
        assert_eq!(event.host, Host::Cursor);
        assert_eq!(event.kind, EventKind::PreToolUse);

        let event = parse_event(r#"{"hook_event_name":"Stop"}"#, HostArg::Cursor).unwrap();
        assert_eq!(event.host, Host::Cursor);
    }

    #[test]
    fn test_parse_event_fails_open() {
        assert!(parse_event("", HostArg::Auto).is_none());
        assert!(parse_event("not json", HostArg::Auto).is_none());
        assert!(parse_event(r#"{"tool_name":"Bash"}"#, HostArg::Auto).is_none());
    }

    #[test]
    fn test_project_root_prefers_config() {
        let mut settings = Settings::default();
        let event = HookEvent::new(Host::Claude, EventKind::Stop).with_cwd("/from/payload");
        assert_eq!(project_root(&settings, &event), PathBuf::from("/from/payload"));

        settings.runtime.project_root = Some(PathBuf::from("/from/config"));
        assert_eq!(project_root(&settings, &event), PathBuf::from("/from/config"));
    }
}
