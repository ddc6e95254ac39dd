use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures that prevent a command from producing an exit status
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("command I/O failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("command timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// One shell command to run for a job
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub command: String,
    pub cwd: Option<PathBuf>,
    /// Added on top of the inherited process environment
    pub env: HashMap<String, String>,
    /// Bytes written to the child's stdin, then stdin is closed
    pub stdin: Option<String>,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout and stderr joined for display
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Runs external commands on behalf of jobs
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, spec: CommandSpec) -> Result<CommandOutput, ExecError>;
}
