pub mod init;
pub mod list;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use hookgate_adapters::{register_builtin_hooks, register_jobs, ShellExecutor};
use hookgate_runtime::{ExecutionContext, HookRegistry, Host, Settings};

/// Registry with the built-in hooks plus one hook per configured job.
/// The context is provisional until an event reports its host and project.
pub fn build_registry(settings: Arc<Settings>) -> Result<HookRegistry> {
    let root = settings
        .runtime
        .project_root
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let jobs = settings.jobs.clone();

    let ctx = ExecutionContext::new(Host::Claude, root, settings, Arc::new(ShellExecutor::new()));
    let registry = HookRegistry::new(ctx);
    register_builtin_hooks(&registry)?;
    register_jobs(&registry, &jobs)?;
    Ok(registry)
}
