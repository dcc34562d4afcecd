//! Module Store: eager manifest scan, lazy tier content.
//!
//! Manifests are loaded and validated at startup; a missing or malformed
//! manifest, or a tier content file that does not exist, aborts the open.
//! Tier content bytes are read lazily on first access and cached read-only,
//! with a per-(module, level) single-flight guard so concurrent sessions
//! never duplicate I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{KrError, Result};
use crate::manifest::{ManifestParser, ModuleManifest};

pub const MODULES_DIR: &str = "modules";
pub const MANIFEST_FILE: &str = "module.toml";

type TierKey = (String, u8);
type ContentSlot = Arc<Mutex<Option<Arc<str>>>>;

#[derive(Debug)]
pub struct ModuleStore {
    root: PathBuf,
    modules: HashMap<String, StoredModule>,
    content: Mutex<HashMap<TierKey, ContentSlot>>,
}

#[derive(Debug)]
struct StoredModule {
    manifest: ModuleManifest,
    dir: PathBuf,
}

impl ModuleStore {
    /// Scan `root/modules` and validate every manifest. Fails fast on the
    /// first configuration error, naming the offending module or file.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let modules_dir = root.join(MODULES_DIR);
        if !modules_dir.is_dir() {
            return Err(KrError::Config(format!(
                "module store has no '{MODULES_DIR}' directory under {}",
                root.display()
            )));
        }

        let mut manifest_paths: Vec<PathBuf> = WalkDir::new(&modules_dir)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE)
            .map(|e| e.into_path())
            .collect();
        // Deterministic scan order regardless of filesystem walk order.
        manifest_paths.sort();

        let mut modules = HashMap::new();
        for path in manifest_paths {
            let manifest = ManifestParser::parse_path(&path)?;
            let dir = path
                .parent()
                .ok_or_else(|| {
                    KrError::Config(format!("manifest has no parent dir: {}", path.display()))
                })?
                .to_path_buf();

            validate_tier_content(&manifest, &dir)?;

            let id = manifest.id.clone();
            if modules
                .insert(id.clone(), StoredModule { manifest, dir })
                .is_some()
            {
                return Err(KrError::Config(format!(
                    "duplicate module id '{id}' (second definition at {})",
                    path.display()
                )));
            }
        }

        debug!(target: "store", root = %root.display(), modules = modules.len(), "store opened");
        Ok(Self {
            root,
            modules,
            content: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModuleManifest> {
        self.modules.get(id).map(|m| &m.manifest)
    }

    pub fn manifest(&self, id: &str) -> Result<&ModuleManifest> {
        self.get(id)
            .ok_or_else(|| KrError::ModuleNotFound(id.to_string()))
    }

    /// All module ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All manifests, sorted by id.
    #[must_use]
    pub fn manifests(&self) -> Vec<&ModuleManifest> {
        let mut all: Vec<&ModuleManifest> = self.modules.values().map(|m| &m.manifest).collect();
        all.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        all
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Fetch tier content, reading it from disk at most once per
    /// (module, level) for the lifetime of the store.
    pub fn tier_content(&self, id: &str, level: u8) -> Result<Arc<str>> {
        let module = self
            .modules
            .get(id)
            .ok_or_else(|| KrError::ModuleNotFound(id.to_string()))?;
        let tier = module
            .manifest
            .tier(level)
            .ok_or_else(|| KrError::TierNotFound {
                id: id.to_string(),
                level,
            })?;

        let slot = {
            let mut map = self.content.lock();
            map.entry((id.to_string(), level))
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };

        // Single-flight: whoever holds the slot lock first does the read;
        // later arrivals see the populated cache.
        let mut guard = slot.lock();
        if let Some(cached) = guard.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let path = module.dir.join(&tier.content);
        let text = std::fs::read_to_string(&path).map_err(|err| {
            KrError::Config(format!("read tier content {}: {err}", path.display()))
        })?;
        debug!(target: "store", module = id, level, bytes = text.len(), "tier content loaded");
        let content: Arc<str> = Arc::from(text);
        *guard = Some(Arc::clone(&content));
        Ok(content)
    }
}

fn validate_tier_content(manifest: &ModuleManifest, dir: &Path) -> Result<()> {
    for tier in &manifest.tiers {
        let path = dir.join(&tier.content);
        if !path.is_file() {
            return Err(KrError::InvalidManifest {
                id: manifest.id.clone(),
                message: format!(
                    "tier {} content file missing: {}",
                    tier.level,
                    path.display()
                ),
            });
        }
    }
    Ok(())
}
