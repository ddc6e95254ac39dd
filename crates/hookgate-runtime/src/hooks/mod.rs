pub mod context;
pub mod events;
pub mod hook;
pub mod registry;

pub use context::ExecutionContext;
pub use events::{EventKind, Host, HookEvent, ToolCall};
pub use hook::{dispatch, Hook};
pub use registry::{HookFactory, HookRegistry};
