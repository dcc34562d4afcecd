//! The core resolution algorithm.
//!
//! Takes an externally scored candidate list, expands dependencies, walks
//! tiers prefix-closed, and fits as much as the session budget allows.
//! Budget exhaustion is a per-candidate outcome, not an error: a candidate
//! whose chain no longer fits is recorded as rejected and resolution moves
//! on to the next, lower-scored candidate.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::budget::BudgetTracker;
use crate::graph::DependencyGraph;
use crate::session::SessionCache;
use crate::store::ModuleStore;
use tracing::{debug, trace};

/// A module proposed by the external classifier.
///
/// Scores are comparable within one resolve call and carry no meaning across
/// calls. `requested_level` above the module's highest declared tier is
/// clamped silently; 0 is treated as 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub module_id: String,
    pub score: f64,
    #[serde(default = "default_level")]
    pub requested_level: u8,
}

fn default_level() -> u8 {
    1
}

/// One load instruction: fetch tier `level` of `module_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadEntry {
    pub module_id: String,
    pub level: u8,
    pub cost: u32,
}

/// Why a candidate produced no load entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The candidate's chain did not fit in the remaining budget.
    BudgetExhausted,
    /// The candidate id is not in the module store.
    UnknownModule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub module_id: String,
    pub reason: RejectReason,
}

/// The resolver's output: ordered tier loads plus rejection bookkeeping.
/// Immutable once returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadPlan {
    pub entries: Vec<LoadEntry>,
    pub total_cost: u64,
    pub rejected: Vec<RejectedCandidate>,
}

impl LoadPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, module_id: &str, level: u8) -> bool {
        self.entries
            .iter()
            .any(|e| e.module_id == module_id && e.level == level)
    }
}

pub struct Resolver<'a> {
    store: &'a ModuleStore,
    graph: &'a DependencyGraph,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(store: &'a ModuleStore, graph: &'a DependencyGraph) -> Self {
        Self { store, graph }
    }

    /// Resolve one candidate list against a session's cache and budget.
    ///
    /// Candidates are processed in descending score order; the sort is
    /// stable, so equal scores keep the caller's declaration order. Within a
    /// candidate, dependency-chain members load tier 1 only, while the
    /// candidate itself loads up to its (clamped) requested level. A failed
    /// reservation abandons the rest of that candidate's chain, leaving
    /// every touched module at a valid tier prefix, and moves on.
    pub fn resolve(
        &self,
        candidates: &[Candidate],
        cache: &mut SessionCache,
        budget: &mut BudgetTracker,
    ) -> LoadPlan {
        let mut ordered: Vec<&Candidate> = candidates.iter().collect();
        ordered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let mut plan = LoadPlan::default();

        'candidates: for candidate in ordered {
            let Some(manifest) = self.store.get(&candidate.module_id) else {
                debug!(target: "resolver", module = %candidate.module_id, "unknown candidate dropped");
                plan.rejected.push(RejectedCandidate {
                    module_id: candidate.module_id.clone(),
                    reason: RejectReason::UnknownModule,
                });
                continue;
            };
            let requested = candidate.requested_level.max(1).min(manifest.max_level());

            let Ok(chain) = self.graph.expand(&candidate.module_id) else {
                // The graph is built from the same store, so this only
                // happens if store and graph instances are mismatched.
                plan.rejected.push(RejectedCandidate {
                    module_id: candidate.module_id.clone(),
                    reason: RejectReason::UnknownModule,
                });
                continue;
            };

            for member in &chain {
                let target = if *member == candidate.module_id {
                    requested
                } else {
                    1
                };
                // Chain members are validated at graph build, so the
                // manifest and every tier up to `target` exist.
                let Some(member_manifest) = self.store.get(member) else {
                    continue;
                };

                for level in 1..=target {
                    if cache.already_loaded_at_least(member, level) {
                        continue;
                    }
                    let Some(tier) = member_manifest.tier(level) else {
                        continue;
                    };
                    if budget.try_reserve(u64::from(tier.cost)) {
                        trace!(target: "resolver", module = %member, level, cost = tier.cost, "tier reserved");
                        plan.entries.push(LoadEntry {
                            module_id: member.clone(),
                            level,
                            cost: tier.cost,
                        });
                        plan.total_cost += u64::from(tier.cost);
                        cache.record_loaded(member, level);
                    } else {
                        // Abandon this candidate's whole remaining chain so
                        // no module is left with a tier gap; later, cheaper
                        // candidates still get a chance at the remainder.
                        debug!(
                            target: "resolver",
                            candidate = %candidate.module_id,
                            module = %member,
                            level,
                            remaining = budget.remaining(),
                            "budget exhausted for candidate"
                        );
                        plan.rejected.push(RejectedCandidate {
                            module_id: candidate.module_id.clone(),
                            reason: RejectReason::BudgetExhausted,
                        });
                        continue 'candidates;
                    }
                }
            }
        }

        debug!(
            target: "resolver",
            entries = plan.entries.len(),
            rejected = plan.rejected.len(),
            total_cost = plan.total_cost,
            "plan assembled"
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    // =========================================
    // Test Helpers
    // =========================================

    fn write_module(root: &Path, id: &str, requires: &[&str], tier_costs: &[u32]) {
        let dir = root.join("modules").join(id);
        std::fs::create_dir_all(&dir).unwrap();
        let requires_toml = requires
            .iter()
            .map(|r| format!("\"{r}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let mut manifest = format!(
            "[module]\nid = \"{id}\"\nkind = \"skill\"\nname = \"{id}\"\nrequires = [{requires_toml}]\n"
        );
        for (idx, cost) in tier_costs.iter().enumerate() {
            let level = idx + 1;
            manifest.push_str(&format!(
                "\n[[tiers]]\nlevel = {level}\ncost = {cost}\ncontent = \"tier{level}.md\"\n"
            ));
            std::fs::write(dir.join(format!("tier{level}.md")), id).unwrap();
        }
        std::fs::write(dir.join("module.toml"), manifest).unwrap();
    }

    fn fixture(modules: &[(&str, &[&str], &[u32])]) -> (tempfile::TempDir, ModuleStore, DependencyGraph) {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("modules")).unwrap();
        for (id, requires, costs) in modules {
            write_module(tmp.path(), id, requires, costs);
        }
        let store = ModuleStore::open(tmp.path()).unwrap();
        let graph = DependencyGraph::build(&store).unwrap();
        (tmp, store, graph)
    }

    fn cand(id: &str, score: f64, level: u8) -> Candidate {
        Candidate {
            module_id: id.to_string(),
            score,
            requested_level: level,
        }
    }

    fn entry_ids(plan: &LoadPlan) -> Vec<(String, u8)> {
        plan.entries
            .iter()
            .map(|e| (e.module_id.clone(), e.level))
            .collect()
    }

    // =========================================
    // Basic Resolution
    // =========================================

    #[test]
    fn resolve_single_candidate() {
        let (_tmp, store, graph) = fixture(&[("skill-a", &[], &[100, 400])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(1000);

        let plan = resolver.resolve(&[cand("skill-a", 0.9, 2)], &mut cache, &mut budget);
        assert_eq!(
            entry_ids(&plan),
            vec![("skill-a".to_string(), 1), ("skill-a".to_string(), 2)]
        );
        assert_eq!(plan.total_cost, 500);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn resolve_expands_dependencies_first() {
        let (_tmp, store, graph) = fixture(&[
            ("skill-a", &["skill-c"], &[100, 400]),
            ("skill-c", &[], &[50]),
        ]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(1000);

        let plan = resolver.resolve(&[cand("skill-a", 0.9, 2)], &mut cache, &mut budget);
        assert_eq!(
            entry_ids(&plan),
            vec![
                ("skill-c".to_string(), 1),
                ("skill-a".to_string(), 1),
                ("skill-a".to_string(), 2),
            ]
        );
    }

    #[test]
    fn dependencies_load_tier_one_only() {
        let (_tmp, store, graph) = fixture(&[
            ("skill-a", &["skill-c"], &[100]),
            ("skill-c", &[], &[50, 500, 5000]),
        ]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(10_000);

        let plan = resolver.resolve(&[cand("skill-a", 0.9, 1)], &mut cache, &mut budget);
        assert!(plan.contains("skill-c", 1));
        assert!(!plan.contains("skill-c", 2));
        assert_eq!(plan.total_cost, 150);
    }

    #[test]
    fn requested_level_clamped_to_max_tier() {
        let (_tmp, store, graph) = fixture(&[("skill-a", &[], &[100, 400])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(10_000);

        let plan = resolver.resolve(&[cand("skill-a", 0.9, 9)], &mut cache, &mut budget);
        assert_eq!(plan.entries.len(), 2);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn requested_level_zero_treated_as_one() {
        let (_tmp, store, graph) = fixture(&[("skill-a", &[], &[100, 400])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(10_000);

        let plan = resolver.resolve(&[cand("skill-a", 0.9, 0)], &mut cache, &mut budget);
        assert_eq!(entry_ids(&plan), vec![("skill-a".to_string(), 1)]);
    }

    // =========================================
    // Ordering
    // =========================================

    #[test]
    fn candidates_processed_by_descending_score() {
        let (_tmp, store, graph) =
            fixture(&[("low", &[], &[10]), ("high", &[], &[10])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(100);

        let plan = resolver.resolve(
            &[cand("low", 0.1, 1), cand("high", 0.9, 1)],
            &mut cache,
            &mut budget,
        );
        assert_eq!(
            entry_ids(&plan),
            vec![("high".to_string(), 1), ("low".to_string(), 1)]
        );
    }

    #[test]
    fn equal_scores_keep_declaration_order() {
        let (_tmp, store, graph) =
            fixture(&[("first", &[], &[10]), ("second", &[], &[10])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(100);

        let plan = resolver.resolve(
            &[cand("first", 0.5, 1), cand("second", 0.5, 1)],
            &mut cache,
            &mut budget,
        );
        assert_eq!(
            entry_ids(&plan),
            vec![("first".to_string(), 1), ("second".to_string(), 1)]
        );
    }

    // =========================================
    // Budget Handling
    // =========================================

    #[test]
    fn budget_failure_abandons_chain_not_later_candidates() {
        let (_tmp, store, graph) = fixture(&[
            ("big", &[], &[10, 10_000]),
            ("small", &[], &[10]),
        ]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(100);

        let plan = resolver.resolve(
            &[cand("big", 0.9, 2), cand("small", 0.5, 1)],
            &mut cache,
            &mut budget,
        );
        // big@1 fit, big@2 did not; small still resolved.
        assert!(plan.contains("big", 1));
        assert!(!plan.contains("big", 2));
        assert!(plan.contains("small", 1));
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected[0].module_id, "big");
        assert_eq!(plan.rejected[0].reason, RejectReason::BudgetExhausted);
    }

    #[test]
    fn budget_failure_in_dependency_skips_dependent() {
        let (_tmp, store, graph) = fixture(&[
            ("skill-a", &["huge-dep"], &[10]),
            ("huge-dep", &[], &[10_000]),
            ("skill-b", &[], &[10]),
        ]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(100);

        let plan = resolver.resolve(
            &[cand("skill-a", 0.9, 1), cand("skill-b", 0.5, 1)],
            &mut cache,
            &mut budget,
        );
        assert!(!plan.contains("skill-a", 1));
        assert!(!plan.contains("huge-dep", 1));
        assert!(plan.contains("skill-b", 1));
        assert_eq!(plan.rejected[0].module_id, "skill-a");
    }

    #[test]
    fn plan_cost_never_exceeds_ceiling() {
        let (_tmp, store, graph) = fixture(&[
            ("a", &[], &[40, 40]),
            ("b", &[], &[40]),
            ("c", &[], &[40]),
        ]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(100);

        let plan = resolver.resolve(
            &[cand("a", 0.9, 2), cand("b", 0.8, 1), cand("c", 0.7, 1)],
            &mut cache,
            &mut budget,
        );
        assert!(plan.total_cost <= 100);
        assert_eq!(budget.consumed(), plan.total_cost);
    }

    // =========================================
    // Cache / Idempotence
    // =========================================

    #[test]
    fn second_resolve_is_empty_delta() {
        let (_tmp, store, graph) = fixture(&[
            ("skill-a", &["skill-c"], &[100, 400]),
            ("skill-c", &[], &[50]),
        ]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(10_000);

        let candidates = [cand("skill-a", 0.9, 2)];
        let first = resolver.resolve(&candidates, &mut cache, &mut budget);
        assert_eq!(first.entries.len(), 3);

        let second = resolver.resolve(&candidates, &mut cache, &mut budget);
        assert!(second.is_empty());
        assert_eq!(second.total_cost, 0);
    }

    #[test]
    fn upgrade_loads_only_missing_tiers() {
        let (_tmp, store, graph) = fixture(&[("skill-a", &[], &[100, 400, 900])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(10_000);

        resolver.resolve(&[cand("skill-a", 0.9, 1)], &mut cache, &mut budget);
        let upgrade = resolver.resolve(&[cand("skill-a", 0.9, 3)], &mut cache, &mut budget);
        assert_eq!(
            entry_ids(&upgrade),
            vec![("skill-a".to_string(), 2), ("skill-a".to_string(), 3)]
        );
    }

    #[test]
    fn shared_dependency_loaded_once() {
        let (_tmp, store, graph) = fixture(&[
            ("a", &["base"], &[10]),
            ("b", &["base"], &[10]),
            ("base", &[], &[10]),
        ]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(1000);

        let plan = resolver.resolve(
            &[cand("a", 0.9, 1), cand("b", 0.8, 1)],
            &mut cache,
            &mut budget,
        );
        let base_loads = plan
            .entries
            .iter()
            .filter(|e| e.module_id == "base")
            .count();
        assert_eq!(base_loads, 1);
    }

    // =========================================
    // Lookup Failures
    // =========================================

    #[test]
    fn unknown_candidate_rejected_not_fatal() {
        let (_tmp, store, graph) = fixture(&[("real", &[], &[10])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(1000);

        let plan = resolver.resolve(
            &[cand("ghost", 0.9, 1), cand("real", 0.5, 1)],
            &mut cache,
            &mut budget,
        );
        assert!(plan.contains("real", 1));
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected[0].reason, RejectReason::UnknownModule);
    }

    #[test]
    fn empty_candidate_list_yields_empty_plan() {
        let (_tmp, store, graph) = fixture(&[("real", &[], &[10])]);
        let resolver = Resolver::new(&store, &graph);
        let mut cache = SessionCache::new();
        let mut budget = BudgetTracker::new(1000);

        let plan = resolver.resolve(&[], &mut cache, &mut budget);
        assert!(plan.is_empty());
        assert!(plan.rejected.is_empty());
    }
}
