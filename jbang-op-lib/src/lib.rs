pub mod config;
pub mod executor;
pub mod log;
pub mod platform;
pub mod project;

pub use config::Config;
pub use executor::{ExitStatusError, JBangOperation, EXIT_FAILURE, EXIT_SUCCESS};
pub use log::{LogSink, MemorySink, TracingSink};
pub use platform::{OsName, Platform, SystemPlatform};
pub use project::{BaseProject, Project};

use anyhow::Result;
use std::path::{Path, PathBuf};

/// What a host needs to run operations: the resolved configuration and
/// the project it works on.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub project: BaseProject,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, start_dir: &Path) -> Result<Self> {
        let config = Config::load_with_override(config_path, start_dir)?;
        let project = BaseProject::discover(start_dir);

        Ok(Self { config, project })
    }

    /// A fresh operation bound to the project and configured.
    pub fn operation(&self) -> JBangOperation {
        self.config
            .configure(JBangOperation::new().with_project(&self.project))
    }
}
