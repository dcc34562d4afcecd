//! kr validate - Check every manifest and the dependency graph

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::store::ModuleStore;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Store root to validate (defaults to the discovered root)
    pub root: Option<PathBuf>,
}

#[derive(Serialize)]
struct ValidateReport {
    root: PathBuf,
    modules: usize,
    edges: usize,
}

pub fn run_without_context(format: OutputFormat, args: &ValidateArgs) -> Result<()> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => crate::app::discover_root()?,
    };
    run_with_root(format, &root)
}

pub fn run_with_root(format: OutputFormat, root: &Path) -> Result<()> {
    // Opening the store and building the graph IS the validation: manifest
    // errors, duplicate ids, dangling requires, and cycles all surface here.
    let store = ModuleStore::open(root)?;
    let graph = DependencyGraph::build(&store)?;
    debug!(target: "validate", modules = store.len(), "store valid");

    match format {
        OutputFormat::Json => emit_json(&robot_ok(ValidateReport {
            root: root.to_path_buf(),
            modules: store.len(),
            edges: graph.edge_count(),
        })),
        OutputFormat::Human => {
            let mut layout = HumanLayout::new();
            layout
                .title("Store valid")
                .kv("root", &root.display().to_string())
                .kv("modules", &store.len().to_string())
                .kv("dependencies", &graph.edge_count().to_string());
            emit_human(layout);
            Ok(())
        }
    }
}
