//! Module manifests: the authoring format for knowledge modules.

pub mod parser;
pub mod types;

pub use parser::ManifestParser;
pub use types::{ManifestDoc, ModuleKind, ModuleManifest, TierSpec};
