use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::engine::ResolutionEngine;
use crate::error::{KrError, Result};
use crate::graph::DependencyGraph;
use crate::store::ModuleStore;

pub struct AppContext {
    pub kr_root: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    pub store: Arc<ModuleStore>,
    pub graph: Arc<DependencyGraph>,
    pub output_format: OutputFormat,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let discovered = discover_root()?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| default_config_path(&discovered));
        let config = Config::load(cli.config.as_deref(), &discovered)?;

        // A configured store root takes precedence over discovery.
        let kr_root = config.store.root.clone().unwrap_or(discovered);

        let store = Arc::new(ModuleStore::open(&kr_root)?);
        let graph = Arc::new(DependencyGraph::build(&store)?);

        Ok(Self {
            kr_root,
            config_path,
            config,
            store,
            graph,
            output_format: cli.output_format(),
            verbosity: cli.verbose,
        })
    }

    /// Build an engine over this context's store and graph.
    #[must_use]
    pub fn engine(&self) -> ResolutionEngine {
        ResolutionEngine::new(
            Arc::clone(&self.store),
            Arc::clone(&self.graph),
            self.config.budget.ceiling,
        )
    }

}

/// Locate the store root: `KR_ROOT`, else a `.kr` directory found walking up
/// from the current directory, else the platform data dir.
pub fn discover_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("KR_ROOT") {
        return Ok(PathBuf::from(root));
    }
    let cwd = std::env::current_dir()?;
    if let Some(found) = find_upwards(&cwd, ".kr") {
        return Ok(found);
    }

    let data_dir =
        dirs::data_dir().ok_or_else(|| KrError::Config("data directory not found".to_string()))?;
    Ok(data_dir.join("kr"))
}

fn default_config_path(kr_root: &Path) -> PathBuf {
    if kr_root.ends_with(".kr") {
        kr_root.join("config.toml")
    } else {
        dirs::config_dir()
            .unwrap_or_else(|| kr_root.to_path_buf())
            .join("kr/config.toml")
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
