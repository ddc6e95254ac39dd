use anyhow::Result;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# hookgate configuration

[runtime]
# project_root = "~/src/app"    # default: payload cwd, then CLAUDE_PROJECT_DIR / CURSOR_PROJECT_DIR
default_timeout_secs = 60       # for jobs without a timeout; 0 waits forever

[security]
enabled = true
blocklist = []                  # extra dangerous substrings, matched case-insensitively
# patterns_file = "~/.config/hookgate/blocked.txt"
sensitive_paths = [".env", ".env.*", "*.pem", "*.key", "**/.ssh/*", "**/id_rsa*"]

[file_guard]
enabled = true
allow_outside = []              # globs editable outside the project root

# Jobs run a shell command for one event. Bound variables (EVENT_NAME, TOOL_NAME,
# PROJECT_ROOT, FILES_CHANGED, FILE_PATH, FILE_NAME, USER_PROMPT) are exported
# to the command and usable as ${NAME} in skip / only / env.
#
# [[jobs]]
# name = "ruff"
# event = "PostToolUse"
# run = "ruff check $FILES_CHANGED"
# glob = ["*.py"]
# skip = "${TOOL_NAME} == 'Read'"
# timeout = 30
"#;

/// Initialize a new config file
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);
    Ok(())
}
