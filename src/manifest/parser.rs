use std::path::Path;

use crate::error::{KrError, Result};

use super::types::{ManifestDoc, ModuleManifest};

pub struct ManifestParser;

impl ManifestParser {
    pub fn parse_str(content: &str, source: &Path) -> Result<ModuleManifest> {
        let doc: ManifestDoc = toml::from_str(content).map_err(|err| {
            KrError::Config(format!("manifest parse error ({}): {err}", source.display()))
        })?;
        doc.into_manifest()
    }

    pub fn parse_path(path: &Path) -> Result<ModuleManifest> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| KrError::Config(format!("read manifest {}: {err}", path.display())))?;
        Self::parse_str(&content, path)
    }
}
