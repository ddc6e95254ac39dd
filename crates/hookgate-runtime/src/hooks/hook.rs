use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::decision::Decision;
use crate::response::{HostResponse, ResponseTranslator};

use super::events::{EventKind, HookEvent};

/// A check that runs against one host event
#[async_trait]
pub trait Hook: Send + Sync {
    /// Registry key
    fn key(&self) -> &str;

    /// Display name, also used in rendered messages
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Disabled hooks are never run
    fn enabled(&self) -> bool {
        true
    }

    /// Events this hook handles (empty: all events)
    fn events(&self) -> &[EventKind] {
        &[]
    }

    /// Inspect the event and produce a host-neutral decision
    async fn run(&self, event: &HookEvent) -> Result<Decision>;
}

/// Run `hook` if it applies to `event` and render the result for the host
pub async fn dispatch(
    hook: &dyn Hook,
    event: &HookEvent,
    translator: &ResponseTranslator,
) -> Result<HostResponse> {
    let subscribed = hook.events().is_empty() || hook.events().contains(&event.kind);
    if !hook.enabled() || !subscribed {
        debug!(hook = hook.key(), event = %event.kind, "Hook not applicable, allowing");
        return Ok(HostResponse::plain_allow(translator.host(), &event.kind));
    }

    let decision = hook.run(event).await?;
    debug!(
        hook = hook.key(),
        event = %event.kind,
        permission = %decision.permission,
        "Hook finished"
    );
    Ok(translator.translate(hook.name(), &event.kind, &decision))
}
