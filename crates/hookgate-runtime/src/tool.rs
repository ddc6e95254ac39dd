use std::fmt;

/// Tools an agent host can report in a tool-use event.
/// Names outside the known set land in `Unknown` so callers must handle them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Bash,
    Read,
    Write,
    Edit,
    MultiEdit,
    NotebookEdit,
    Glob,
    Grep,
    WebFetch,
    WebSearch,
    Task,
    /// MCP tool, carries the full `mcp__server__tool` name
    Mcp(String),
    Unknown(String),
}

impl ToolKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "Bash" | "Shell" => ToolKind::Bash,
            "Read" => ToolKind::Read,
            "Write" => ToolKind::Write,
            "Edit" => ToolKind::Edit,
            "MultiEdit" => ToolKind::MultiEdit,
            "NotebookEdit" => ToolKind::NotebookEdit,
            "Glob" => ToolKind::Glob,
            "Grep" => ToolKind::Grep,
            "WebFetch" => ToolKind::WebFetch,
            "WebSearch" => ToolKind::WebSearch,
            "Task" => ToolKind::Task,
            other if other.starts_with("mcp__") || other == "MCP" => {
                ToolKind::Mcp(other.to_string())
            }
            other => ToolKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Bash => "Bash",
            ToolKind::Read => "Read",
            ToolKind::Write => "Write",
            ToolKind::Edit => "Edit",
            ToolKind::MultiEdit => "MultiEdit",
            ToolKind::NotebookEdit => "NotebookEdit",
            ToolKind::Glob => "Glob",
            ToolKind::Grep => "Grep",
            ToolKind::WebFetch => "WebFetch",
            ToolKind::WebSearch => "WebSearch",
            ToolKind::Task => "Task",
            ToolKind::Mcp(name) | ToolKind::Unknown(name) => name,
        }
    }

    /// Whether the tool writes to files on disk
    pub fn edits_files(&self) -> bool {
        matches!(
            self,
            ToolKind::Write | ToolKind::Edit | ToolKind::MultiEdit | ToolKind::NotebookEdit
        )
    }

    /// Input field holding the target path, for tools that have one
    pub fn path_field(&self) -> Option<&'static str> {
        match self {
            ToolKind::Read | ToolKind::Write | ToolKind::Edit | ToolKind::MultiEdit => {
                Some("file_path")
            }
            ToolKind::NotebookEdit => Some("notebook_path"),
            ToolKind::Glob | ToolKind::Grep => Some("path"),
            ToolKind::Bash
            | ToolKind::WebFetch
            | ToolKind::WebSearch
            | ToolKind::Task
            | ToolKind::Mcp(_)
            | ToolKind::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
