use std::process::Stdio;

use async_trait::async_trait;
use hookgate_runtime::{CommandExecutor, CommandOutput, CommandSpec, ExecError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs job commands through `sh -c`
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    /// Use a different POSIX shell binary
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, spec: CommandSpec) -> Result<CommandOutput, ExecError> {
        // Audit log: record exact command being executed
        info!(cmd = %spec.command, cwd = ?spec.cwd, "Executing job command");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&spec.command)
            .envs(&spec.env)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout kills the child
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(ExecError::Spawn)?;

        if let (Some(input), Some(mut stdin)) = (spec.stdin, child.stdin.take()) {
            // Written from a task so a child that never reads cannot stall the wait
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    debug!(error = %e, "Child closed stdin early");
                }
            });
        }

        let wait = child.wait_with_output();
        let output = match spec.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result.map_err(ExecError::Io)?,
                Err(_) => {
                    warn!(cmd = %spec.command, timeout_secs = limit.as_secs(), "Command timed out, killed");
                    return Err(ExecError::Timeout(limit));
                }
            },
            None => wait.await.map_err(ExecError::Io)?,
        };

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
