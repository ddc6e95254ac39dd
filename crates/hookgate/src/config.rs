use anyhow::{Context, Result};
use hookgate_runtime::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "hookgate.toml";

/// Load config from an explicit path, else `./hookgate.toml`, else defaults.
/// Only an explicit path is required to exist.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                debug!("No config file, using defaults");
                return Ok(Settings::default());
            }
            default
        }
    };

    let content =
        fs::read_to_string(&path).context(format!("Failed to read config file: {:?}", path))?;
    let settings = parse_config(&content)
        .with_context(|| format!("Failed to parse TOML config: {:?}", path))?;
    Ok(settings)
}

pub fn parse_config(content: &str) -> Result<Settings> {
    let mut settings: Settings = toml::from_str(content)?;
    expand_paths(&mut settings);
    Ok(settings)
}

/// `~/...` in path settings refers to the home directory
fn expand_paths(settings: &mut Settings) {
    if let Some(root) = settings.runtime.project_root.as_mut() {
        *root = expand(root);
    }
    if let Some(file) = settings.security.patterns_file.as_mut() {
        *file = expand(file);
    }
    for job in &mut settings.jobs {
        if let Some(dir) = job.work_dir.as_mut() {
            *dir = expand(dir);
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
