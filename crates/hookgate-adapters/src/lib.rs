pub mod file_guard_hook;
pub mod security_hook;
pub mod shell_executor;

pub use file_guard_hook::{FileGuardHook, FILE_GUARD_KEY};
pub use security_hook::{SecurityHook, SECURITY_KEY};
pub use shell_executor::ShellExecutor;

use std::collections::HashMap;

use anyhow::{bail, Result};
use hookgate_runtime::{hook_factory, HookFactory, HookRegistry, JobConfig, JobHook};

/// Register the fixed set of built-in hooks.
pub fn register_builtin_hooks(registry: &HookRegistry) -> Result<()> {
    let mut batch: HashMap<String, HookFactory> = HashMap::new();
    batch.insert(
        SECURITY_KEY.to_string(),
        hook_factory(SecurityHook::from_context),
    );
    batch.insert(
        FILE_GUARD_KEY.to_string(),
        hook_factory(FileGuardHook::from_context),
    );
    registry.register_batch(batch)
}

/// Register one hook per configured job, keyed by job name. All or nothing.
pub fn register_jobs(registry: &HookRegistry, jobs: &[JobConfig]) -> Result<()> {
    let mut batch: HashMap<String, HookFactory> = HashMap::new();
    for job in jobs {
        if batch.contains_key(&job.name) {
            bail!("job '{}' defined more than once", job.name);
        }
        let config = job.clone();
        batch.insert(
            job.name.clone(),
            hook_factory(move |ctx| JobHook::new(config.clone(), ctx)),
        );
    }
    registry.register_batch(batch)
}
