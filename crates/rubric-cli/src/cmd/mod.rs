pub mod catalog;
pub mod init;
pub mod report;
pub mod run;
pub mod score;
pub mod verdict;

use anyhow::Context;
use rubric_core::catalog::Catalog;
use rubric_core::config::Config;
use std::path::{Path, PathBuf};

/// An initialized project: its config and the catalog that config selects.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub catalog: Catalog,
}

impl Project {
    /// Open an initialized project. Fails if `rubric init` has not run.
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        Self::with_config(root, config)
    }

    /// Open a project, using default config when uninitialized.
    pub fn open_or_default(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load_or_default(root).context("failed to load config")?;
        Self::with_config(root, config)
    }

    fn with_config(root: &Path, config: Config) -> anyhow::Result<Self> {
        let catalog = config
            .load_catalog(root)
            .context("failed to load catalog")?;
        tracing::debug!(catalog = catalog.version(), "project opened");
        Ok(Self {
            root: root.to_path_buf(),
            config,
            catalog,
        })
    }
}
