use clap::{Parser, Subcommand, ValueEnum};
use hookgate_runtime::Host;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum HostArg {
    /// Detect from the payload (default)
    Auto,
    /// Event-handler host: approve/block decisions
    Claude,
    /// JSON-permission host: allow/deny/ask
    Cursor,
}

impl HostArg {
    /// Forced host, or `None` to detect from the payload
    pub fn forced(self) -> Option<Host> {
        match self {
            HostArg::Auto => None,
            HostArg::Claude => Some(Host::Claude),
            HostArg::Cursor => Some(Host::Cursor),
        }
    }
}

#[derive(Parser)]
#[command(name = "hookgate")]
#[command(about = "Policy hooks for AI coding agents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (default: ./hookgate.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Handle one hook event read from stdin
    Run {
        /// Hook key: a built-in (security, file-guard) or a job name
        key: String,
        /// Response format to write
        #[arg(long, default_value = "auto", value_enum)]
        host: HostArg,
    },
    /// List registered hooks
    List,
    /// Initialize a new config file
    Init {
        /// Path for new config file
        #[arg(default_value = "hookgate.toml")]
        path: PathBuf,
    },
}
