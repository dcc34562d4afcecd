//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use kr::{DependencyGraph, ModuleStore, ResolutionEngine};

/// Write a module directory with a manifest and one content file per tier.
pub fn write_module(root: &Path, id: &str, requires: &[&str], tier_costs: &[u32]) {
    let dir = root.join("modules").join(id);
    std::fs::create_dir_all(&dir).unwrap();
    let requires_toml = requires
        .iter()
        .map(|r| format!("\"{r}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut manifest = format!(
        "[module]\n\
         id = \"{id}\"\n\
         kind = \"skill\"\n\
         name = \"{id}\"\n\
         requires = [{requires_toml}]\n"
    );
    for (idx, cost) in tier_costs.iter().enumerate() {
        let level = idx + 1;
        manifest.push_str(&format!(
            "\n[[tiers]]\nlevel = {level}\ncost = {cost}\ncontent = \"tier{level}.md\"\n"
        ));
        std::fs::write(dir.join(format!("tier{level}.md")), format!("{id} tier {level}")).unwrap();
    }
    std::fs::write(dir.join("module.toml"), manifest).unwrap();
}

/// Build a store rooted in a fresh tempdir.
pub fn store_with(modules: &[(&str, &[&str], &[u32])]) -> (tempfile::TempDir, Arc<ModuleStore>) {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("modules")).unwrap();
    for (id, requires, costs) in modules {
        write_module(tmp.path(), id, requires, costs);
    }
    let store = Arc::new(ModuleStore::open(tmp.path()).unwrap());
    (tmp, store)
}

/// Store, graph, and engine in one step.
pub fn engine_with(
    modules: &[(&str, &[&str], &[u32])],
    ceiling: u64,
) -> (tempfile::TempDir, ResolutionEngine) {
    let (tmp, store) = store_with(modules);
    let graph = Arc::new(DependencyGraph::build(&store).unwrap());
    (tmp, ResolutionEngine::new(store, graph, ceiling))
}

pub fn cand(id: &str, score: f64, level: u8) -> kr::Candidate {
    kr::Candidate {
        module_id: id.to_string(),
        score,
        requested_level: level,
    }
}
