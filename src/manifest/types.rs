use serde::{Deserialize, Serialize};

use crate::error::{KrError, Result};

/// A knowledge module: manifest metadata plus an ordered list of disclosure
/// tiers, least to most detailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub id: String,
    pub kind: ModuleKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Module ids this module requires, in declaration order.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Opaque trigger vocabulary for the external classifier. Never matched
    /// against by the engine.
    #[serde(default)]
    pub triggers: Vec<String>,
    pub tiers: Vec<TierSpec>,
}

impl ModuleManifest {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(KrError::InvalidManifest {
                id: self.id.clone(),
                message: "module id must be non-empty".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(KrError::InvalidManifest {
                id: self.id.clone(),
                message: "module name must be non-empty".to_string(),
            });
        }
        if self.requires.iter().any(|dep| dep == &self.id) {
            return Err(KrError::InvalidManifest {
                id: self.id.clone(),
                message: "module must not require itself".to_string(),
            });
        }
        if self.tiers.is_empty() {
            return Err(KrError::InvalidManifest {
                id: self.id.clone(),
                message: "module must declare at least one tier".to_string(),
            });
        }
        // Tier inclusion is prefix-closed, so levels must be contiguous from 1.
        for (idx, tier) in self.tiers.iter().enumerate() {
            let expected = idx as u8 + 1;
            if tier.level != expected {
                return Err(KrError::InvalidManifest {
                    id: self.id.clone(),
                    message: format!(
                        "tier levels must be contiguous from 1; found level {} at position {}",
                        tier.level, expected
                    ),
                });
            }
            if tier.content.trim().is_empty() {
                return Err(KrError::InvalidManifest {
                    id: self.id.clone(),
                    message: format!("tier {} has an empty content path", tier.level),
                });
            }
        }
        Ok(())
    }

    /// Highest declared tier level.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.tiers.len() as u8
    }

    /// The tier at `level`, if declared.
    #[must_use]
    pub fn tier(&self, level: u8) -> Option<&TierSpec> {
        if level == 0 {
            return None;
        }
        self.tiers.get(level as usize - 1)
    }

    /// Sum of all declared tier costs.
    #[must_use]
    pub fn total_cost(&self) -> u64 {
        self.tiers.iter().map(|t| u64::from(t.cost)).sum()
    }
}

/// What sort of knowledge unit a module is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Agent,
    Skill,
    Command,
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::Skill => write!(f, "skill"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// One disclosure level of a module's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSpec {
    /// 1 = always-resident metadata, 2 = summary, 3.. = on-demand detail.
    pub level: u8,
    /// Size cost in budget units (tokens).
    pub cost: u32,
    /// Content file path, relative to the module directory.
    pub content: String,
}

/// TOML document shape for `module.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDoc {
    pub module: ManifestHeader,
    #[serde(default)]
    pub tiers: Vec<TierSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub id: String,
    pub kind: ModuleKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
}

impl ManifestDoc {
    pub fn into_manifest(self) -> Result<ModuleManifest> {
        let manifest = ModuleManifest {
            id: self.module.id,
            kind: self.module.kind,
            name: self.module.name,
            description: self.module.description,
            requires: self.module.requires,
            triggers: self.module.triggers,
            tiers: self.tiers,
        };
        manifest.validate()?;
        Ok(manifest)
    }
}
