pub mod decision;
pub mod executor;
pub mod expr;
pub mod hooks;
pub mod job;
pub mod response;
pub mod settings;
pub mod tool;

#[cfg(test)]
pub(crate) mod test_support;

pub use decision::{Decision, Permission, ProtocolError};
pub use executor::{CommandExecutor, CommandOutput, CommandSpec, ExecError};
pub use expr::{evaluate, Bindings, ExprError};
pub use hooks::registry::hook_factory;
pub use hooks::{
    dispatch, EventKind, ExecutionContext, Hook, HookEvent, HookFactory, HookRegistry, Host,
    ToolCall,
};
pub use job::{JobConfig, JobHook};
pub use response::{
    AskEntry, ClaudeResponse, CursorResponse, DecisionLog, HostResponse, ResponseTranslator,
    TracingDecisionLog,
};
pub use settings::{FileGuardSettings, RuntimeSettings, SecuritySettings, Settings};
pub use tool::ToolKind;

/// Initialize structured JSON logging on stderr; stdout carries host responses
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
