use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::executor::CommandExecutor;
use crate::response::{DecisionLog, ResponseTranslator, TracingDecisionLog};
use crate::settings::Settings;

use super::events::Host;

/// Collaborators shared by every hook a registry creates
#[derive(Clone)]
pub struct ExecutionContext {
    pub host: Host,
    pub project_root: PathBuf,
    pub settings: Arc<Settings>,
    pub executor: Arc<dyn CommandExecutor>,
    pub log: Arc<dyn DecisionLog>,
}

impl ExecutionContext {
    pub fn new(
        host: Host,
        project_root: impl Into<PathBuf>,
        settings: Arc<Settings>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            host,
            project_root: project_root.into(),
            settings,
            executor,
            log: Arc::new(TracingDecisionLog),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn DecisionLog>) -> Self {
        self.log = log;
        self
    }

    /// Copy of this context for a different host
    pub fn with_host(&self, host: Host) -> Self {
        Self {
            host,
            ..self.clone()
        }
    }

    pub fn with_project_root(&self, project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..self.clone()
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn translator(&self) -> ResponseTranslator {
        ResponseTranslator::new(self.host, self.log.clone())
    }
}
