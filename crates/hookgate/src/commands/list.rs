use std::sync::Arc;

use anyhow::Result;
use hookgate_runtime::Settings;

pub fn execute(settings: Settings) -> Result<()> {
    let registry = super::build_registry(Arc::new(settings))?;
    let hooks = registry.list();

    println!("Registered hooks:");
    for key in registry.keys() {
        let Some(hook) = hooks.get(&key) else {
            continue;
        };
        let state = if hook.enabled() { "enabled" } else { "disabled" };
        println!("  {} ({}, {}): {}", key, hook.name(), state, hook.description());
    }
    Ok(())
}
