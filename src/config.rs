use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KrError, Result};

pub const DEFAULT_CEILING: u64 = 8000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
}

impl Config {
    /// Load config by merging global then project files, or a single
    /// explicit file (`--config` / `KR_CONFIG`), then apply env overrides.
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("KR_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&root.join("config.toml"))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&config_dir.join("kr/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| KrError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| KrError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(store) = patch.store {
            if let Some(root) = store.root {
                self.store.root = Some(root);
            }
        }
        if let Some(budget) = patch.budget {
            if let Some(ceiling) = budget.ceiling {
                self.budget.ceiling = ceiling;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var("KR_BUDGET_CEILING") {
            let ceiling = raw.parse::<u64>().map_err(|_| {
                KrError::Config(format!("KR_BUDGET_CEILING must be an integer, got '{raw}'"))
            })?;
            self.budget.ceiling = ceiling;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Store root override; discovery applies when unset.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Default per-session ceiling in cost units.
    pub ceiling: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    budget: Option<BudgetPatch>,
}

#[derive(Debug, Deserialize)]
struct StorePatch {
    root: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct BudgetPatch {
    ceiling: Option<u64>,
}
