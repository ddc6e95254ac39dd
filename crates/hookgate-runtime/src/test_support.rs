use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::{CommandExecutor, CommandOutput, CommandSpec, ExecError};
use crate::hooks::{ExecutionContext, Host};
use crate::settings::Settings;

enum Canned {
    Output(CommandOutput),
    Timeout(Duration),
    Spawn(String),
}

/// Executor that records specs and replays a canned result
pub struct MockExecutor {
    canned: Canned,
    calls: AtomicUsize,
    last: Mutex<Option<CommandSpec>>,
}

impl MockExecutor {
    pub fn succeeding(stdout: &str) -> Self {
        Self::returning(Ok(CommandOutput {
            status: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }))
    }

    pub fn returning(result: Result<CommandOutput, ExecError>) -> Self {
        let canned = match result {
            Ok(output) => Canned::Output(output),
            Err(ExecError::Timeout(limit)) => Canned::Timeout(limit),
            Err(e) => Canned::Spawn(e.to_string()),
        };
        Self {
            canned,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_spec(&self) -> Option<CommandSpec> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(&self, spec: CommandSpec) -> Result<CommandOutput, ExecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(spec);
        match &self.canned {
            Canned::Output(output) => Ok(output.clone()),
            Canned::Timeout(limit) => Err(ExecError::Timeout(*limit)),
            Canned::Spawn(message) => Err(ExecError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                message.clone(),
            ))),
        }
    }
}

pub fn context_with(executor: Arc<MockExecutor>) -> ExecutionContext {
    ExecutionContext::new(
        Host::Claude,
        "/project",
        Arc::new(Settings::default()),
        executor,
    )
}

pub fn test_context() -> ExecutionContext {
    context_with(Arc::new(MockExecutor::succeeding("")))
}
