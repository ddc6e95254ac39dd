//! Settings shared by every hook through the execution context.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::job::JobConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub runtime: RuntimeSettings,

    #[serde(default)]
    pub security: SecuritySettings,

    #[serde(default)]
    pub file_guard: FileGuardSettings,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeSettings {
    /// Overrides the project root reported by the host
    #[serde(default)]
    pub project_root: Option<PathBuf>,

    /// Timeout for jobs that set none; 0 waits forever
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecuritySettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Extra dangerous substrings for shell commands
    #[serde(default)]
    pub blocklist: Vec<String>,

    /// File with one pattern per line; `#` starts a comment
    #[serde(default)]
    pub patterns_file: Option<PathBuf>,

    /// Globs for files whose edits need confirmation
    #[serde(default = "default_sensitive_paths")]
    pub sensitive_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileGuardSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Globs exempt from the project-root check
    #[serde(default)]
    pub allow_outside: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_sensitive_paths() -> Vec<String> {
    [".env", ".env.*", "*.pem", "*.key", "**/.ssh/*", "**/id_rsa*"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            project_root: None,
            default_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            blocklist: Vec::new(),
            patterns_file: None,
            sensitive_paths: default_sensitive_paths(),
        }
    }
}

impl Default for FileGuardSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            allow_outside: Vec::new(),
        }
    }
}
