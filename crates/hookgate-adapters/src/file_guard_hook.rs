use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use hookgate_runtime::{Decision, EventKind, ExecutionContext, FileGuardSettings, Hook, HookEvent};
use tracing::{info, warn};

pub const FILE_GUARD_KEY: &str = "file-guard";

const PRE_ACTION: &[EventKind] = &[EventKind::PreToolUse];

/// Project-scoped edit guard: denies file edits that escape the project root.
/// Paths are resolved lexically so targets that don't exist yet are handled too.
pub struct FileGuardHook {
    root: PathBuf,
    settings: FileGuardSettings,
}

impl FileGuardHook {
    pub fn new(root: impl AsRef<Path>, settings: FileGuardSettings) -> Self {
        Self {
            root: normalize_path(root.as_ref()),
            settings,
        }
    }

    pub fn from_context(ctx: Arc<ExecutionContext>) -> Self {
        Self::new(ctx.project_root(), ctx.settings.file_guard.clone())
    }

    /// Resolve a tool-provided path against the project root
    pub fn resolve(&self, input_path: &str) -> PathBuf {
        normalize_path(&self.root.join(input_path))
    }

    fn exempt(&self, resolved: &Path) -> bool {
        let text = resolved.to_string_lossy();
        self.settings.allow_outside.iter().any(|pattern| {
            match glob::Pattern::new(pattern) {
                Ok(glob) => glob.matches(&text),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Invalid allow_outside pattern, ignoring");
                    false
                }
            }
        })
    }

    fn check(&self, input_path: &str) -> Decision {
        let resolved = self.resolve(input_path);
        if resolved.starts_with(&self.root) || self.exempt(&resolved) {
            return Decision::allow();
        }
        info!(path = ?resolved, root = ?self.root, "Edit outside project root denied");
        Decision::deny(
            format!("Blocked edit outside the project: {}", resolved.display()),
            format!(
                "Path traversal denied: {:?} resolves to {:?}, outside project root {:?}. Only edit files inside the project.",
                input_path, resolved, self.root
            ),
        )
    }
}

/// Normalize a path by resolving `.` and `..` components without filesystem access.
fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for c in path.components() {
        match c {
            Component::ParentDir => {
                // Only pop normal components, never pop root/prefix
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                }
            }
            Component::CurDir => {}
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

#[async_trait]
impl Hook for FileGuardHook {
    fn key(&self) -> &str {
        FILE_GUARD_KEY
    }

    fn name(&self) -> &str {
        "File guard"
    }

    fn description(&self) -> &str {
        "Denies file edits that resolve outside the project root"
    }

    fn enabled(&self) -> bool {
        self.settings.enabled
    }

    fn events(&self) -> &[EventKind] {
        PRE_ACTION
    }

    async fn run(&self, event: &HookEvent) -> Result<Decision> {
        let edits = event.tool_kind().map_or(false, |kind| kind.edits_files());
        match (edits, event.target_path()) {
            (true, Some(path)) => Ok(self.check(path)),
            _ => Ok(Decision::allow()),
        }
    }
}
