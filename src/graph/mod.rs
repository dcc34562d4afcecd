//! Dependency graph over module manifests.
//!
//! Built once at startup from every manifest in the store. Dangling edges
//! and cycles are configuration errors detected here, never at resolution
//! time.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{KrError, Result};
use crate::store::ModuleStore;

#[derive(Debug)]
pub struct DependencyGraph {
    /// Outgoing edges in manifest declaration order.
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build and fully validate the graph: every edge target must exist and
    /// the edge set must be acyclic.
    pub fn build(store: &ModuleStore) -> Result<Self> {
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        for manifest in store.manifests() {
            for dep in &manifest.requires {
                if store.get(dep).is_none() {
                    return Err(KrError::UnknownDependency {
                        from: manifest.id.clone(),
                        to: dep.clone(),
                    });
                }
            }
            edges.insert(manifest.id.clone(), manifest.requires.clone());
        }

        let graph = Self { edges };
        graph.check_acyclic()?;
        debug!(target: "graph", nodes = graph.edges.len(), edges = graph.edge_count(), "graph built");
        Ok(graph)
    }

    /// The module itself plus all transitive dependencies, dependencies
    /// before dependents. Sibling order follows manifest declaration order,
    /// so expansion is reproducible across runs.
    pub fn expand(&self, id: &str) -> Result<Vec<String>> {
        if !self.edges.contains_key(id) {
            return Err(KrError::ModuleNotFound(id.to_string()));
        }
        let mut order = Vec::new();
        let mut visited = std::collections::HashSet::new();
        self.visit(id, &mut visited, &mut order);
        Ok(order)
    }

    fn visit(
        &self,
        id: &str,
        visited: &mut std::collections::HashSet<String>,
        order: &mut Vec<String>,
    ) {
        if !visited.insert(id.to_string()) {
            return;
        }
        // Acyclicity was proven at build time, so plain DFS terminates.
        if let Some(deps) = self.edges.get(id) {
            for dep in deps {
                self.visit(dep, visited, order);
            }
        }
        order.push(id.to_string());
    }

    /// Direct dependencies of `id`, declaration order.
    #[must_use]
    pub fn requires(&self, id: &str) -> &[String] {
        self.edges.get(id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// All edges as (from, to) pairs, sorted for stable output.
    #[must_use]
    pub fn edge_list(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .edges
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.clone(), to.clone())))
            .collect();
        out.sort();
        out
    }

    /// Export the edge set in GraphViz DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut lines = vec!["digraph modules {".to_string()];
        let mut nodes: Vec<&String> = self.edges.keys().collect();
        nodes.sort();
        for node in nodes {
            lines.push(format!("  \"{node}\";"));
        }
        for (from, to) in self.edge_list() {
            lines.push(format!("  \"{from}\" -> \"{to}\";"));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }

    fn check_acyclic(&self) -> Result<()> {
        let mut marks: HashMap<&str, CycleMark> = HashMap::new();
        let mut roots: Vec<&String> = self.edges.keys().collect();
        roots.sort(); // deterministic error reporting

        for root in roots {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            let mut path: Vec<&str> = Vec::new();
            self.dfs_cycle(root, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn dfs_cycle<'a>(
        &'a self,
        id: &'a str,
        marks: &mut HashMap<&'a str, CycleMark>,
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        marks.insert(id, CycleMark::Visiting);
        path.push(id);
        if let Some(deps) = self.edges.get(id) {
            for dep in deps {
                match marks.get(dep.as_str()) {
                    None => self.dfs_cycle(dep, marks, path)?,
                    Some(CycleMark::Visiting) => {
                        // Slice the path from the first occurrence of `dep`
                        // so the error names the actual cycle.
                        let start = path.iter().position(|p| *p == dep.as_str()).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(ToString::to_string).collect();
                        cycle.push(dep.clone());
                        return Err(KrError::CyclicDependency { cycle });
                    }
                    Some(CycleMark::Done) => {}
                }
            }
        }
        path.pop();
        marks.insert(id, CycleMark::Done);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CycleMark {
    Visiting,
    Done,
}
